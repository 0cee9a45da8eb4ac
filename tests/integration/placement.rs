//! Deferred placement handles passed through GeneratorParams.

use crate::integration::test_utils::{
    constant_image, func_input, named, params, plus, stub, target, typed_buffer_input,
};
use genstub::{
    Buffer, BufferParam, Func, GeneratorParamMap, Placement, PlacementHandle, RawValue,
    ScalarType, StubError, Var,
};

fn simple_with_handle(handle: &PlacementHandle) -> Func {
    let inputs = named(vec![
        ("typed_buffer_input", typed_buffer_input().into()),
        ("func_input", func_input().into()),
        ("float_arg", 3.5.into()),
    ]);
    let gp = params(vec![("compute_level", handle.into())]);
    stub("simplestub")
        .generate(&target(), inputs, &gp)
        .unwrap()
        .func()
        .unwrap()
}

fn realize_2x2(f: &Func) -> (Buffer, genstub::engine::LoweredPipeline) {
    let buffer = Buffer::new(ScalarType::Float32, &[2, 2, 1]);
    let pipeline = f.realize_into(&[buffer.clone()], &target()).unwrap();
    (buffer, pipeline)
}

#[test]
fn test_handle_set_after_generation() {
    let handle = PlacementHandle::new();
    let simple_output = simple_with_handle(&handle);
    assert!(!handle.is_set());

    let x = Var::new("x");
    let computed_output = plus(&simple_output, 3);
    assert!(handle.set(Placement::at(&computed_output, &x)));

    let (buffer, pipeline) = realize_2x2(&computed_output);
    assert_eq!(buffer.get(&[0, 0, 0]).unwrap(), 3.5 + 3.0 + 123.0);
    assert_eq!(buffer.get(&[0, 1, 0]).unwrap(), 4.5 + 3.0 + 123.0);
    assert_eq!(buffer.get(&[1, 0, 0]).unwrap(), 4.5 + 3.0 + 123.0);
    assert_eq!(buffer.get(&[1, 1, 0]).unwrap(), 5.5 + 3.0 + 123.0);

    let stage = pipeline.stage("simple_output").unwrap();
    assert_eq!(
        stage.placement,
        Placement::At {
            func: "computed_output".to_string(),
            var: "x".to_string(),
        }
    );
    assert_eq!(pipeline.stage("computed_output").unwrap().placement, Placement::Root);
}

#[test]
fn test_unset_handle_uses_declared_default() {
    let handle = PlacementHandle::new();
    let simple_output = simple_with_handle(&handle);
    let computed_output = plus(&simple_output, 3);

    let (_, pipeline) = realize_2x2(&computed_output);
    assert_eq!(
        pipeline.stage("simple_output").unwrap().placement,
        Placement::Root
    );
    assert_eq!(handle.frozen(), Some(Placement::Root));
    assert!(!handle.is_set());
}

#[test]
fn test_late_set_is_ignored() {
    let handle = PlacementHandle::new();
    let simple_output = simple_with_handle(&handle);
    let computed_output = plus(&simple_output, 3);
    let x = Var::new("x");
    handle.set(Placement::at(&computed_output, &x));

    let (first, _) = realize_2x2(&computed_output);
    assert!(handle.is_frozen());
    assert!(!handle.set(Placement::Inline));

    let (second, pipeline) = realize_2x2(&computed_output);
    assert_eq!(first.to_vec(), second.to_vec());
    assert_eq!(
        pipeline.stage("simple_output").unwrap().placement,
        Placement::at(&computed_output, &x)
    );
}

#[test]
fn test_placement_param_from_string() {
    let inputs = named(vec![
        ("typed_buffer_input", typed_buffer_input().into()),
        ("func_input", func_input().into()),
        ("float_arg", 3.5.into()),
    ]);
    let gp = params(vec![("compute_level", "inline".into())]);
    let simple_output = stub("simplestub")
        .generate(&target(), inputs, &gp)
        .unwrap()
        .func()
        .unwrap();
    let computed_output = plus(&simple_output, 3);

    let (_, pipeline) = realize_2x2(&computed_output);
    assert_eq!(
        pipeline.stage("simple_output").unwrap().placement,
        Placement::Inline
    );
}

#[test]
fn test_default_handle_is_fresh_per_call() {
    let inputs = || {
        named(vec![
            ("typed_buffer_input", typed_buffer_input().into()),
            ("func_input", func_input().into()),
            ("float_arg", 3.5.into()),
        ])
    };
    let first = stub("simplestub")
        .generate(&target(), inputs(), &GeneratorParamMap::new())
        .unwrap()
        .func()
        .unwrap();
    let second = stub("simplestub")
        .generate(&target(), inputs(), &GeneratorParamMap::new())
        .unwrap()
        .func()
        .unwrap();

    let first_handle = first.placement_handle().unwrap();
    let second_handle = second.placement_handle().unwrap();
    assert!(!first_handle.ptr_eq(&second_handle));
    assert_eq!(first_handle.effective(), Placement::Root);
}

#[test]
fn test_failed_generate_leaves_supplied_handle_untouched() {
    let image = constant_image();
    let input = BufferParam::named(ScalarType::UInt8, 3, "input");
    input.set(&image).unwrap();
    let inputs = named(vec![
        ("typed_buffer_input", (&image).into()),
        ("untyped_buffer_input", (&image).into()),
        ("simple_input", (&input).into()),
        ("array_input", RawValue::List(vec![(&input).into()])),
        ("float_arg", 1.25.into()),
        ("int_arg", RawValue::List(Vec::new())),
    ]);
    let handle = PlacementHandle::new();
    let before = handle.effective();
    let gp = params(vec![("intermediate_level", (&handle).into())]);

    let err = stub("complexstub")
        .generate(&target(), inputs, &gp)
        .unwrap_err();
    assert!(matches!(err, StubError::GenerationFailed(_)));
    assert_eq!(handle.effective(), before);
    assert!(!handle.is_set());
    assert!(!handle.is_frozen());
}

#[test]
fn test_shared_handle_keeps_each_generators_default() {
    let handle = PlacementHandle::new();
    let simple_output = simple_with_handle(&handle);
    assert_eq!(handle.effective(), Placement::Inline);
    assert_eq!(
        simple_output.placement_handle().unwrap().effective(),
        Placement::Root
    );
}
