//! Property-based tests for argument binding

use genstub::generators::builtin_registry;
use genstub::{
    Buffer, Expr, Func, GeneratorParamMap, RawValue, ScalarType, Stub, StubError, StubInputs,
    Target, Var,
};
use proptest::prelude::*;
use std::collections::HashMap;

const INPUT_NAMES: [&str; 3] = ["typed_buffer_input", "func_input", "float_arg"];

fn simple_stub() -> Stub {
    Stub::from_registry(&builtin_registry().unwrap(), "simplestub").unwrap()
}

fn fixtures() -> (Buffer, Func) {
    let typed = Buffer::new(ScalarType::UInt8, &[4, 4, 3]);
    typed.fill(123.0);
    let (x, y, c) = (Var::new("x"), Var::new("y"), Var::new("c"));
    let func = Func::new("func_input");
    func.define(&[x.clone(), y.clone(), c], Expr::from(&x) + &y)
        .unwrap();
    (typed, func)
}

fn realize(inputs: StubInputs, offset: i64) -> Vec<f64> {
    let mut gp = GeneratorParamMap::new();
    gp.insert("offset".to_string(), RawValue::Int(offset));
    let target = Target::host();
    let f = simple_stub()
        .generate(&target, inputs, &gp)
        .unwrap()
        .func()
        .unwrap();
    f.realize(&[3, 3, 2], &target).unwrap().buffer().to_vec()
}

fn positional(typed: &Buffer, func: &Func, float_arg: f64) -> StubInputs {
    StubInputs::Positional(vec![typed.into(), func.into(), RawValue::Float(float_arg)])
}

fn named(typed: &Buffer, func: &Func, float_arg: f64) -> StubInputs {
    let mut map = HashMap::new();
    map.insert(INPUT_NAMES[0].to_string(), RawValue::from(typed));
    map.insert(INPUT_NAMES[1].to_string(), RawValue::from(func));
    map.insert(INPUT_NAMES[2].to_string(), RawValue::Float(float_arg));
    StubInputs::Named(map)
}

/// Positional and named calls with the same values build identical graphs
#[test]
fn test_calling_modes_equivalent_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(0u32..=400, -50i64..=50), |(quarters, offset)| {
            let float_arg = quarters as f64 / 4.0;
            let (typed, func) = fixtures();

            let by_position = realize(positional(&typed, &func, float_arg), offset);
            let by_name = realize(named(&typed, &func, float_arg), offset);
            prop_assert_eq!(by_position, by_name);

            Ok(())
        })
        .unwrap();
}

/// Raising `offset` by k raises every output value by exactly k
#[test]
fn test_offset_shifts_output_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(0u32..=400, -50i64..=50), |(quarters, k)| {
            let float_arg = quarters as f64 / 4.0;
            let (typed, func) = fixtures();

            let base = realize(named(&typed, &func, float_arg), 0);
            let shifted = realize(named(&typed, &func, float_arg), k);
            for (b, s) in base.iter().zip(&shifted) {
                prop_assert_eq!(s - b, k as f64);
            }

            Ok(())
        })
        .unwrap();
}

/// Any positional count other than three is a count mismatch reporting the supplied count
#[test]
fn test_positional_count_mismatch_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&prop::collection::vec(any::<i32>(), 0..8), |values| {
            prop_assume!(values.len() != 3);
            let got = values.len();
            let inputs = StubInputs::Positional(values.into_iter().map(RawValue::from).collect());

            let err = simple_stub()
                .generate(&Target::host(), inputs, &GeneratorParamMap::new())
                .unwrap_err();
            let is_count_mismatch =
                matches!(err, StubError::ArgumentCountMismatch { expected: 3, got: g } if g == got);
            prop_assert!(is_count_mismatch);

            Ok(())
        })
        .unwrap();
}

/// The first required input absent from a named mapping is the one reported
#[test]
fn test_first_missing_input_reported_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(any::<bool>(), any::<bool>(), any::<bool>()), |present| {
            let (typed, func) = fixtures();
            let mut map = HashMap::new();
            if present.0 {
                map.insert(INPUT_NAMES[0].to_string(), RawValue::from(&typed));
            }
            if present.1 {
                map.insert(INPUT_NAMES[1].to_string(), RawValue::from(&func));
            }
            if present.2 {
                map.insert(INPUT_NAMES[2].to_string(), RawValue::Float(2.0));
            }

            let result = simple_stub().generate(
                &Target::host(),
                StubInputs::Named(map),
                &GeneratorParamMap::new(),
            );
            // float_arg is optional; only the first two inputs are required.
            match (present.0, present.1) {
                (true, true) => prop_assert!(result.is_ok()),
                (false, _) => prop_assert_eq!(
                    result.unwrap_err().to_string(),
                    "The input 'typed_buffer_input' must be specified."
                ),
                (true, false) => prop_assert_eq!(
                    result.unwrap_err().to_string(),
                    "The input 'func_input' must be specified."
                ),
            }

            Ok(())
        })
        .unwrap();
}
