//! Integration tests for the simplestub generator: both calling modes,
//! GeneratorParam overrides, and every binding failure.

use crate::integration::test_utils::{
    func_input, named, params, realize_and_check, stub, target, typed_buffer_input,
};
use genstub::generators::builtin_registry;
use genstub::{
    Buffer, GeneratorParamMap, RawValue, ScalarType, StubError, StubInputs, UnknownInputPolicy,
};

fn positional(values: Vec<RawValue>) -> StubInputs {
    StubInputs::Positional(values)
}

fn realize(inputs: StubInputs, gp: &GeneratorParamMap) -> Vec<f64> {
    let f = stub("simplestub")
        .generate(&target(), inputs, gp)
        .unwrap()
        .func()
        .unwrap();
    let buffer = Buffer::new(ScalarType::Float32, &[2, 2, 1]);
    f.realize_into(&[buffer.clone()], &target()).unwrap();
    buffer.to_vec()
}

#[test]
fn test_positional_inputs() {
    let f = stub("simplestub")
        .generate(
            &target(),
            positional(vec![
                typed_buffer_input().into(),
                func_input().into(),
                3.5.into(),
            ]),
            &GeneratorParamMap::new(),
        )
        .unwrap()
        .func()
        .unwrap();

    assert_eq!(f.name(), "simple_output");
    assert_eq!(f.types().unwrap(), vec![ScalarType::Float32]);
    realize_and_check(&f, 0.0);
}

#[test]
fn test_named_inputs() {
    let inputs = named(vec![
        ("typed_buffer_input", typed_buffer_input().into()),
        ("func_input", func_input().into()),
        ("float_arg", 3.5.into()),
    ]);
    let f = stub("simplestub")
        .generate(&target(), inputs, &GeneratorParamMap::new())
        .unwrap()
        .func()
        .unwrap();
    realize_and_check(&f, 0.0);
}

#[test]
fn test_generator_param_offset() {
    let inputs = named(vec![
        ("typed_buffer_input", typed_buffer_input().into()),
        ("func_input", func_input().into()),
        ("float_arg", 3.5.into()),
    ]);
    let gp = params(vec![("offset", RawValue::Int(42))]);
    let f = stub("simplestub")
        .generate(&target(), inputs, &gp)
        .unwrap()
        .func()
        .unwrap();
    realize_and_check(&f, 42.0);
}

#[test]
fn test_generator_param_offset_as_string() {
    let inputs = named(vec![
        ("typed_buffer_input", typed_buffer_input().into()),
        ("func_input", func_input().into()),
        ("float_arg", 3.5.into()),
    ]);
    let gp = params(vec![("offset", "42".into())]);
    let f = stub("simplestub")
        .generate(&target(), inputs, &gp)
        .unwrap()
        .func()
        .unwrap();
    realize_and_check(&f, 42.0);
}

#[test]
fn test_calling_modes_agree() {
    let typed = typed_buffer_input();
    let func = func_input();
    let by_position = realize(
        positional(vec![(&typed).into(), (&func).into(), 3.5.into()]),
        &GeneratorParamMap::new(),
    );
    let by_name = realize(
        named(vec![
            ("float_arg", 3.5.into()),
            ("func_input", (&func).into()),
            ("typed_buffer_input", (&typed).into()),
        ]),
        &GeneratorParamMap::new(),
    );
    assert_eq!(by_position, by_name);
}

#[test]
fn test_named_optional_scalar_uses_default() {
    let inputs = named(vec![
        ("typed_buffer_input", typed_buffer_input().into()),
        ("func_input", func_input().into()),
    ]);
    let values = realize(inputs, &GeneratorParamMap::new());
    // func_input(0, 0, 0) + 0 + 123 + 1.0
    assert_eq!(values[0], 124.0);
}

#[test]
fn test_buffer_accepted_as_graph_input() {
    let source = Buffer::new(ScalarType::Int32, &[10, 10, 3]);
    source.fill(2.0);
    let values = realize(
        positional(vec![
            typed_buffer_input().into(),
            source.into(),
            3.5.into(),
        ]),
        &GeneratorParamMap::new(),
    );
    assert!(values.iter().all(|v| *v == 2.0 + 123.0 + 3.5));
}

#[test]
fn test_too_many_positional_inputs() {
    let err = stub("simplestub")
        .generate(
            &target(),
            positional(vec![
                typed_buffer_input().into(),
                func_input().into(),
                3.5.into(),
                4.0.into(),
            ]),
            &GeneratorParamMap::new(),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        StubError::ArgumentCountMismatch {
            expected: 3,
            got: 4
        }
    ));
    assert_eq!(err.to_string(), "Expected exactly 3 inputs but got 4");
}

#[test]
fn test_string_input_fails_before_count() {
    let err = stub("simplestub")
        .generate(
            &target(),
            positional(vec![3.141592.into(), "happy".into()]),
            &GeneratorParamMap::new(),
        )
        .unwrap_err();
    assert!(matches!(err, StubError::TypeCoercionFailure(_)));
    assert!(err
        .to_string()
        .starts_with("Unable to cast str instance to Func<*>(3) for input 'func_input'"));
}

#[test]
fn test_float_rejected_for_buffer() {
    let err = stub("simplestub")
        .generate(
            &target(),
            positional(vec![3.141592.into(), func_input().into(), 3.5.into()]),
            &GeneratorParamMap::new(),
        )
        .unwrap_err();
    assert!(matches!(err, StubError::TypeCoercionFailure(_)));
    assert!(err.to_string().contains("for input 'typed_buffer_input'"));
}

#[test]
fn test_out_of_range_scalar_rejected() {
    let err = stub("simplestub")
        .generate(
            &target(),
            positional(vec![
                typed_buffer_input().into(),
                func_input().into(),
                101.0.into(),
            ]),
            &GeneratorParamMap::new(),
        )
        .unwrap_err();
    assert!(err.to_string().contains("101 is outside [0, 100]"));
}

#[test]
fn test_missing_named_inputs_reported_in_declared_order() {
    let err = stub("simplestub")
        .generate(
            &target(),
            named(vec![("float_arg", 3.5.into())]),
            &GeneratorParamMap::new(),
        )
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "The input 'typed_buffer_input' must be specified."
    );

    let err = stub("simplestub")
        .generate(
            &target(),
            named(vec![("typed_buffer_input", typed_buffer_input().into())]),
            &GeneratorParamMap::new(),
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "The input 'func_input' must be specified.");
}

#[test]
fn test_unknown_generator_param() {
    let inputs = named(vec![
        ("typed_buffer_input", typed_buffer_input().into()),
        ("func_input", func_input().into()),
        ("float_arg", 3.5.into()),
    ]);
    let gp = params(vec![("nonexistent_generator_param", "wat".into())]);
    let err = stub("simplestub")
        .generate(&target(), inputs, &gp)
        .unwrap_err();
    assert!(matches!(err, StubError::UnknownGeneratorParam { .. }));
    assert_eq!(
        err.to_string(),
        "Generator 'simplestub' has no GeneratorParam named 'nonexistent_generator_param'"
    );
}

#[test]
fn test_unknown_named_input_policies() {
    let inputs = || {
        named(vec![
            ("typed_buffer_input", typed_buffer_input().into()),
            ("func_input", func_input().into()),
            ("float_arg", 3.5.into()),
            ("extra", RawValue::Int(1)),
        ])
    };

    for policy in [UnknownInputPolicy::Ignore, UnknownInputPolicy::Warn] {
        let outputs = stub("simplestub")
            .with_policy(policy)
            .generate(&target(), inputs(), &GeneratorParamMap::new());
        assert!(outputs.is_ok());
    }

    let err = stub("simplestub")
        .with_policy(UnknownInputPolicy::Reject)
        .generate(&target(), inputs(), &GeneratorParamMap::new())
        .unwrap_err();
    assert_eq!(err.to_string(), "Expected exactly 3 inputs but got 4");
}

#[test]
fn test_unknown_generator_id() {
    let registry = builtin_registry().unwrap();
    let err = genstub::generate(
        &registry,
        "nosuchstub",
        &target(),
        StubInputs::Positional(Vec::new()),
        &GeneratorParamMap::new(),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Unknown generator: 'nosuchstub'");
}
