//! Shared fixtures for integration tests

use genstub::generators::builtin_registry;
use genstub::{
    Buffer, Expr, Func, GeneratorParamMap, RawValue, ScalarType, Stub, StubInputs, Target, Var,
};
use std::collections::HashMap;

pub fn target() -> Target {
    Target::host()
}

pub fn stub(id: &str) -> Stub {
    let registry = builtin_registry().unwrap();
    Stub::from_registry(&registry, id).unwrap()
}

/// A 10x10x3 uint8 buffer filled with 123.
pub fn typed_buffer_input() -> Buffer {
    let buffer = Buffer::with_name(ScalarType::UInt8, &[10, 10, 3], "typed_buffer_input");
    buffer.fill(123.0);
    buffer
}

/// `func_input(x, y, c) = x + y`
pub fn func_input() -> Func {
    let (x, y, c) = (Var::new("x"), Var::new("y"), Var::new("c"));
    let f = Func::new("func_input");
    f.define(&[x.clone(), y.clone(), c], &x + &y).unwrap();
    f
}

/// A 32x32x3 uint8 buffer holding `x + y + c`.
pub fn constant_image() -> Buffer {
    let image = Buffer::with_name(ScalarType::UInt8, &[32, 32, 3], "constant_image");
    for x in 0..32i64 {
        for y in 0..32i64 {
            for c in 0..3i64 {
                image.set(&[x, y, c], (x + y + c) as f64).unwrap();
            }
        }
    }
    image
}

pub fn params(entries: Vec<(&str, RawValue)>) -> GeneratorParamMap {
    entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

pub fn named(entries: Vec<(&str, RawValue)>) -> StubInputs {
    StubInputs::Named(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect::<HashMap<_, _>>(),
    )
}

/// Realize `f` into a 2x2x1 float32 buffer and check the simplestub values.
pub fn realize_and_check(f: &Func, offset: f64) {
    let buffer = Buffer::new(ScalarType::Float32, &[2, 2, 1]);
    f.realize_into(&[buffer.clone()], &target()).unwrap();

    assert_eq!(buffer.get(&[0, 0, 0]).unwrap(), 3.5 + offset + 123.0);
    assert_eq!(buffer.get(&[0, 1, 0]).unwrap(), 4.5 + offset + 123.0);
    assert_eq!(buffer.get(&[1, 0, 0]).unwrap(), 4.5 + offset + 123.0);
    assert_eq!(buffer.get(&[1, 1, 0]).unwrap(), 5.5 + offset + 123.0);
}

/// `base(x, y, c) + k` over three pure variables.
pub fn plus(base: &Func, k: i32) -> Func {
    let (x, y, c) = (Var::new("x"), Var::new("y"), Var::new("c"));
    let f = Func::new("computed_output");
    f.define(
        &[x.clone(), y.clone(), c.clone()],
        base.at([&x, &y, &c]) + Expr::from(k),
    )
    .unwrap();
    f
}

/// Serializes tests that read or write process environment variables.
pub static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Captures config-related environment variables and restores them on drop.
pub struct EnvState {
    saved: Vec<(&'static str, Option<String>)>,
}

impl EnvState {
    const VARS: [&'static str; 4] = [
        "GENSTUB_ENV",
        "GENSTUB_UNKNOWN_INPUTS",
        "GENSTUB_TARGET",
        "GENSTUB_BINDING__UNKNOWN_INPUTS",
    ];

    pub fn capture() -> Self {
        let saved = Self::VARS
            .iter()
            .map(|name| (*name, std::env::var(name).ok()))
            .collect();
        for name in Self::VARS {
            std::env::remove_var(name);
        }
        Self { saved }
    }
}

impl Drop for EnvState {
    fn drop(&mut self) {
        for (name, value) in &self.saved {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
    }
}
