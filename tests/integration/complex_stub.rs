//! Integration tests for the complexstub generator: array inputs, tuple and
//! array outputs, type-valued GeneratorParams, and buffers computed while
//! generating.

use crate::integration::test_utils::{constant_image, named, params, stub, target};
use genstub::{
    Buffer, BufferParam, Func, GeneratorParamMap, OutputValue, RawValue, ScalarType, StubError,
    StubInputs, StubOutputs,
};

fn bound_input(image: &Buffer) -> BufferParam {
    let input = BufferParam::named(ScalarType::UInt8, 3, "input");
    input.set(image).unwrap();
    input
}

fn complex_inputs(image: &Buffer) -> StubInputs {
    let input = bound_input(image);
    named(vec![
        ("typed_buffer_input", image.into()),
        ("untyped_buffer_input", image.into()),
        ("simple_input", (&input).into()),
        (
            "array_input",
            RawValue::List(vec![(&input).into(), (&input).into()]),
        ),
        ("float_arg", 1.25.into()),
        ("int_arg", RawValue::List(vec![RawValue::Int(33), RawValue::Int(33)])),
    ])
}

fn complex_params() -> GeneratorParamMap {
    params(vec![
        ("untyped_buffer_output_type", "uint8".into()),
        ("vectorize", RawValue::Bool(true)),
    ])
}

fn generate_complex() -> Vec<OutputValue> {
    let image = constant_image();
    let outputs = stub("complexstub")
        .generate(&target(), complex_inputs(&image), &complex_params())
        .unwrap();
    assert!(matches!(outputs, StubOutputs::Tuple(_)));
    assert_eq!(outputs.len(), 6);
    outputs.into_vec()
}

fn func(value: &OutputValue) -> &Func {
    value.as_func().unwrap()
}

/// Visit every coordinate of a 3-D buffer.
fn for_each_xyc(buffer: &Buffer, mut check: impl FnMut(i64, i64, i64, f64)) {
    let extents = buffer.extents().to_vec();
    for x in 0..extents[0] as i64 {
        for y in 0..extents[1] as i64 {
            for c in 0..extents[2] as i64 {
                check(x, y, c, buffer.get(&[x, y, c]).unwrap());
            }
        }
    }
}

#[test]
fn test_outputs_in_declared_order() {
    let names: Vec<String> = generate_complex()
        .iter()
        .map(|value| match value {
            OutputValue::Func(f) => f.name().to_string(),
            OutputValue::Array(_) => "array_output".to_string(),
        })
        .collect();
    assert_eq!(
        names,
        vec![
            "simple_output",
            "tuple_output",
            "array_output",
            "typed_buffer_output",
            "untyped_buffer_output",
            "static_compiled_buffer_output",
        ]
    );
}

#[test]
fn test_simple_output() {
    let outputs = generate_complex();
    let realized = func(&outputs[0]).realize(&[32, 32, 3], &target()).unwrap();
    let buffer = realized.buffer();
    assert_eq!(buffer.ty(), ScalarType::Float32);
    for_each_xyc(buffer, |x, y, c, v| assert_eq!(v, (x + y + c) as f64));
}

#[test]
fn test_tuple_output() {
    let outputs = generate_complex();
    let tuple_output = func(&outputs[1]);
    assert_eq!(
        tuple_output.types().unwrap(),
        vec![ScalarType::Float32, ScalarType::Float32]
    );

    let realized = tuple_output.realize(&[32, 32, 3], &target()).unwrap();
    assert_eq!(realized.len(), 2);
    for_each_xyc(&realized[0], |x, y, c, v| {
        assert_eq!(v, (x + y + c) as f64 * 1.25)
    });
    for_each_xyc(&realized[1], |x, y, c, v| {
        assert_eq!(v, (x + y + c) as f64 * 1.25 + 33.0)
    });
}

#[test]
fn test_array_output() {
    let outputs = generate_complex();
    let array_output = outputs[2].as_array().unwrap();
    assert_eq!(array_output.len(), 2);

    for f in array_output {
        assert_eq!(f.dimensions(), Some(2));
        let realized = f.realize(&[32, 32], &target()).unwrap();
        let buffer = realized.buffer();
        assert_eq!(buffer.ty(), ScalarType::Int16);
        for x in 0..32i64 {
            for y in 0..32i64 {
                assert_eq!(buffer.get(&[x, y]).unwrap(), (x + y + 33) as f64);
            }
        }
    }
}

#[test]
fn test_buffer_outputs() {
    let outputs = generate_complex();

    let typed = func(&outputs[3]).realize(&[32, 32, 3], &target()).unwrap();
    assert_eq!(typed.buffer().ty(), ScalarType::Float32);
    for_each_xyc(typed.buffer(), |x, y, c, v| assert_eq!(v, (x + y + c) as f64));

    let untyped = func(&outputs[4]).realize(&[32, 32, 3], &target()).unwrap();
    assert_eq!(untyped.buffer().ty(), ScalarType::UInt8);
    for_each_xyc(untyped.buffer(), |x, y, c, v| {
        assert_eq!(v, (x + y + c) as f64)
    });
}

#[test]
fn test_static_compiled_buffer_output() {
    let outputs = generate_complex();
    let realized = func(&outputs[5]).realize(&[4, 4, 1], &target()).unwrap();
    let buffer = realized.buffer();
    assert_eq!(buffer.ty(), ScalarType::UInt8);
    for_each_xyc(buffer, |x, y, c, v| assert_eq!(v, (x + y + c + 42) as f64));
}

#[test]
fn test_untyped_output_follows_type_param() {
    let image = constant_image();
    let outputs = stub("complexstub")
        .generate(&target(), complex_inputs(&image), &GeneratorParamMap::new())
        .unwrap()
        .into_vec();
    assert_eq!(
        func(&outputs[4]).types().unwrap(),
        vec![ScalarType::Float32]
    );
}

#[test]
fn test_vectorize_param_reaches_schedule() {
    let image = constant_image();
    for (vectorize, expected) in [(true, Some(("x".to_string(), 8))), (false, None)] {
        let gp = params(vec![("vectorize", RawValue::Bool(vectorize))]);
        let outputs = stub("complexstub")
            .generate(&target(), complex_inputs(&image), &gp)
            .unwrap()
            .into_vec();
        let pipeline = func(&outputs[1]).lower(&target()).unwrap();
        let stage = pipeline.stage("intermediate").unwrap();
        assert_eq!(stage.vectorize, expected);
        assert_eq!(stage.placement, genstub::Placement::Root);
    }
}

#[test]
fn test_positional_inputs_match_named() {
    let image = constant_image();
    let input = bound_input(&image);
    let positional = StubInputs::Positional(vec![
        (&image).into(),
        (&image).into(),
        (&input).into(),
        RawValue::List(vec![(&input).into(), (&input).into()]),
        1.25.into(),
        RawValue::List(vec![RawValue::Int(33), RawValue::Int(33)]),
    ]);
    let by_position = stub("complexstub")
        .generate(&target(), positional, &complex_params())
        .unwrap()
        .into_vec();
    let by_name = generate_complex();

    let realize = |value: &OutputValue| {
        func(value)
            .realize(&[32, 32, 3], &target())
            .unwrap()
            .buffer()
            .to_vec()
    };
    assert_eq!(realize(&by_position[1]), realize(&by_name[1]));
    assert_eq!(realize(&by_position[4]), realize(&by_name[4]));
}

#[test]
fn test_array_element_failure_reports_index() {
    let image = constant_image();
    let input = bound_input(&image);
    let inputs = named(vec![
        ("typed_buffer_input", (&image).into()),
        ("untyped_buffer_input", (&image).into()),
        ("simple_input", (&input).into()),
        (
            "array_input",
            RawValue::List(vec![(&input).into(), RawValue::Float(1.5)]),
        ),
        ("float_arg", 1.25.into()),
        ("int_arg", RawValue::List(vec![RawValue::Int(33), RawValue::Int(33)])),
    ]);
    let err = stub("complexstub")
        .generate(&target(), inputs, &complex_params())
        .unwrap_err();
    assert!(matches!(err, StubError::TypeCoercionFailure(_)));
    assert!(err.to_string().contains("for input 'array_input' (element 1)"));
}

#[test]
fn test_short_int_arg_fails_generation() {
    let image = constant_image();
    let input = bound_input(&image);
    let inputs = named(vec![
        ("typed_buffer_input", (&image).into()),
        ("untyped_buffer_input", (&image).into()),
        ("simple_input", (&input).into()),
        (
            "array_input",
            RawValue::List(vec![(&input).into(), (&input).into()]),
        ),
        ("float_arg", 1.25.into()),
        ("int_arg", RawValue::List(vec![RawValue::Int(33)])),
    ]);
    let err = stub("complexstub")
        .generate(&target(), inputs, &complex_params())
        .unwrap_err();
    assert!(matches!(err, StubError::GenerationFailed(_)));
}

#[test]
fn test_invalid_type_param_rejected() {
    let image = constant_image();
    let gp = params(vec![("untyped_buffer_output_type", "complex128".into())]);
    let err = stub("complexstub")
        .generate(&target(), complex_inputs(&image), &gp)
        .unwrap_err();
    assert!(matches!(err, StubError::TypeCoercionFailure(_)));
    assert!(err
        .to_string()
        .contains("for GeneratorParam 'untyped_buffer_output_type'"));
}
