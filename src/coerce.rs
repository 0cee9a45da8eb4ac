//! Type Coercion & Validation
//!
//! Converts each resolved raw value into the representation its declaration
//! requires. Every input is coerced before any output is built, so a failed
//! coercion never leaves a half-constructed pipeline behind.

use crate::engine::{Buffer, Expr, Func};
use crate::error::{CoercionFailure, CoercionSubject, StubError};
use crate::schema::{ParamKind, ParameterSchema};
use crate::types::{ScalarType, ScalarValue};
use crate::value::{ArgumentValue, RawValue, ScalarArg};
use tracing::debug;

/// Fully coerced inputs, one per declared input, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    entries: Vec<(String, ArgumentValue)>,
}

impl Binding {
    /// Coerce every raw value against its declaration.
    ///
    /// `raw` must already be in declaration order, one value per input.
    pub fn bind(schema: &[ParameterSchema], raw: Vec<RawValue>) -> Result<Binding, StubError> {
        if raw.len() != schema.len() {
            return Err(StubError::ArgumentCountMismatch {
                expected: schema.len(),
                got: raw.len(),
            });
        }

        let mut entries = Vec::with_capacity(schema.len());
        for (entry, value) in schema.iter().zip(raw) {
            let coerced = coerce(&value, entry)?;
            debug!(
                input = %entry.name,
                from = %value.kind_name(),
                to = coerced.kind_name(),
                "Coerced input"
            );
            entries.push((entry.name.clone(), coerced));
        }
        Ok(Binding { entries })
    }

    pub fn get(&self, name: &str) -> Option<&ArgumentValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgumentValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|(n, _)| n.as_str()).collect()
    }

    fn require(&self, name: &str) -> Result<&ArgumentValue, StubError> {
        self.get(name)
            .ok_or_else(|| StubError::GenerationFailed(format!("no input named '{}'", name)))
    }

    fn wrong_kind(name: &str, wanted: &str, value: &ArgumentValue) -> StubError {
        StubError::GenerationFailed(format!(
            "input '{}' is a {}, not a {}",
            name,
            value.kind_name(),
            wanted
        ))
    }

    /// A graph input.
    pub fn func(&self, name: &str) -> Result<Func, StubError> {
        match self.require(name)? {
            ArgumentValue::Graph(f) => Ok(f.clone()),
            other => Err(Self::wrong_kind(name, "Func", other)),
        }
    }

    /// A typed or untyped buffer input.
    pub fn buffer(&self, name: &str) -> Result<Buffer, StubError> {
        match self.require(name)? {
            ArgumentValue::TypedBuffer(b) | ArgumentValue::UntypedBuffer(b) => Ok(b.clone()),
            other => Err(Self::wrong_kind(name, "buffer", other)),
        }
    }

    pub fn scalar(&self, name: &str) -> Result<ScalarArg, StubError> {
        match self.require(name)? {
            ArgumentValue::Scalar(s) => Ok(s.clone()),
            other => Err(Self::wrong_kind(name, "scalar", other)),
        }
    }

    /// A scalar input as an expression, constant or runtime parameter alike.
    pub fn scalar_expr(&self, name: &str) -> Result<Expr, StubError> {
        Ok(self.scalar(name)?.expr())
    }

    pub fn array(&self, name: &str) -> Result<&[ArgumentValue], StubError> {
        match self.require(name)? {
            ArgumentValue::Array(items) => Ok(items),
            other => Err(Self::wrong_kind(name, "array", other)),
        }
    }

    /// An array of graph inputs.
    pub fn funcs(&self, name: &str) -> Result<Vec<Func>, StubError> {
        self.array(name)?
            .iter()
            .map(|item| match item {
                ArgumentValue::Graph(f) => Ok(f.clone()),
                other => Err(Self::wrong_kind(name, "Func array", other)),
            })
            .collect()
    }

    /// An array of scalar inputs as expressions.
    pub fn scalar_exprs(&self, name: &str) -> Result<Vec<Expr>, StubError> {
        self.array(name)?
            .iter()
            .map(|item| match item {
                ArgumentValue::Scalar(s) => Ok(s.expr()),
                other => Err(Self::wrong_kind(name, "scalar array", other)),
            })
            .collect()
    }
}

/// Coerce one raw value to the representation `entry` declares.
pub fn coerce(raw: &RawValue, entry: &ParameterSchema) -> Result<ArgumentValue, CoercionFailure> {
    let subject = CoercionSubject::Input(entry.name.clone());
    coerce_kind(raw, &entry.kind, &subject, entry.range)
}

fn coerce_kind(
    raw: &RawValue,
    kind: &ParamKind,
    subject: &CoercionSubject,
    range: Option<(f64, f64)>,
) -> Result<ArgumentValue, CoercionFailure> {
    let fail = || CoercionFailure::new(subject.clone(), raw.kind_name(), kind.describe());

    match kind {
        ParamKind::Scalar { ty } => {
            coerce_scalar(raw, *ty, subject, range).map(ArgumentValue::Scalar)
        }

        ParamKind::TypedBuffer { ty, dimensions } => {
            let buffer = buffer_of(raw, subject).ok_or_else(fail)??;
            if buffer.ty() != *ty {
                return Err(fail().with_detail(format!(
                    "element type is {}, expected {}",
                    buffer.ty(),
                    ty
                )));
            }
            check_dimensions(buffer.dimensions(), *dimensions, fail)?;
            Ok(ArgumentValue::TypedBuffer(buffer))
        }

        ParamKind::UntypedBuffer { dimensions } => {
            let buffer = buffer_of(raw, subject).ok_or_else(fail)??;
            check_dimensions(buffer.dimensions(), *dimensions, fail)?;
            Ok(ArgumentValue::UntypedBuffer(buffer))
        }

        ParamKind::GraphInput { ty, dimensions } => {
            let func = match raw {
                RawValue::Graph(f) => {
                    if !f.is_defined() {
                        return Err(fail().with_detail("Func has no definition"));
                    }
                    f.clone()
                }
                RawValue::Buffer(b) => Func::from_buffer(b),
                RawValue::BufferParam(p) => Func::from_buffer_param(p),
                _ => return Err(fail()),
            };
            check_dimensions(func.dimensions().unwrap_or(0), *dimensions, fail)?;
            let types = func.types().unwrap_or_default();
            if types.len() != 1 {
                return Err(fail().with_detail(format!(
                    "Func has {} channels, expected 1",
                    types.len()
                )));
            }
            if let Some(ty) = ty {
                if types[0] != *ty {
                    return Err(fail().with_detail(format!(
                        "element type is {}, expected {}",
                        types[0], ty
                    )));
                }
            }
            Ok(ArgumentValue::Graph(func))
        }

        ParamKind::ArrayOf { element, size } => {
            let items = match raw {
                RawValue::List(items) => items,
                _ => return Err(fail()),
            };
            if let Some(n) = size {
                if items.len() != *n {
                    return Err(fail().with_detail(format!(
                        "expected {} elements but got {}",
                        n,
                        items.len()
                    )));
                }
            }
            let coerced = items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    coerce_kind(item, element, subject, range).map_err(|e| e.at_element(i))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ArgumentValue::Array(coerced))
        }
    }
}

/// The buffer behind a buffer-like raw value: `None` when the value is not
/// buffer-like, `Some(Err)` when it is an unbound buffer parameter.
fn buffer_of(
    raw: &RawValue,
    subject: &CoercionSubject,
) -> Option<Result<Buffer, CoercionFailure>> {
    match raw {
        RawValue::Buffer(b) => Some(Ok(b.clone())),
        RawValue::BufferParam(p) => Some(p.get().ok_or_else(|| {
            CoercionFailure::new(subject.clone(), raw.kind_name(), "a bound buffer")
            .with_detail(format!("buffer parameter '{}' is not bound", p.name()))
        })),
        _ => None,
    }
}

fn check_dimensions(
    actual: usize,
    expected: usize,
    fail: impl Fn() -> CoercionFailure,
) -> Result<(), CoercionFailure> {
    if actual != expected {
        return Err(fail().with_detail(format!(
            "has {} dimensions, expected {}",
            actual, expected
        )));
    }
    Ok(())
}

/// Coerce a raw value to a scalar of type `ty`.
///
/// Bools convert to any numeric type and ints to floats. Ints convert to ints
/// only when exactly representable. Floats never convert to ints or bools, and
/// ints never convert to bools. Runtime parameters must match `ty` exactly.
pub(crate) fn coerce_scalar(
    raw: &RawValue,
    ty: ScalarType,
    subject: &CoercionSubject,
    range: Option<(f64, f64)>,
) -> Result<ScalarArg, CoercionFailure> {
    let fail = || CoercionFailure::new(subject.clone(), raw.kind_name(), ty.to_string());

    let value = match raw {
        RawValue::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        RawValue::Int(_) if ty == ScalarType::Bool => return Err(fail()),
        RawValue::Int(i) => {
            let v = *i as f64;
            if !ty.can_represent(v) {
                return Err(fail().with_detail(format!("{} is out of range for {}", i, ty)));
            }
            v
        }
        RawValue::Float(f) if ty.is_float() => {
            if !ty.can_represent(*f) {
                return Err(fail().with_detail(format!("{} is out of range for {}", f, ty)));
            }
            *f
        }
        RawValue::Param(p) => {
            if p.ty() != ty {
                return Err(fail());
            }
            return Ok(ScalarArg::Param(p.clone()));
        }
        _ => return Err(fail()),
    };

    if let Some((min, max)) = range {
        if value < min || value > max {
            return Err(fail().with_detail(format!(
                "{} is outside [{}, {}]",
                value, min, max
            )));
        }
    }
    Ok(ScalarArg::Const(ScalarValue::new(ty, value)))
}
