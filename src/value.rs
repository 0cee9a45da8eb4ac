//! Caller-supplied and bound argument values.

use crate::engine::{Buffer, BufferParam, Expr, Func, PlacementHandle, ScalarParam};
use crate::types::ScalarValue;

/// A value as supplied by the caller, before it is checked against a schema.
#[derive(Debug, Clone)]
pub enum RawValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Buffer(Buffer),
    BufferParam(BufferParam),
    Param(ScalarParam),
    Graph(Func),
    Placement(PlacementHandle),
    List(Vec<RawValue>),
}

impl RawValue {
    /// Short description of the value's kind, used in coercion errors.
    pub fn kind_name(&self) -> String {
        match self {
            RawValue::Bool(_) => "bool".to_string(),
            RawValue::Int(_) => "int".to_string(),
            RawValue::Float(_) => "float".to_string(),
            RawValue::Str(_) => "str".to_string(),
            RawValue::Buffer(b) => format!("Buffer<{}>", b.ty()),
            RawValue::BufferParam(p) => format!("BufferParam<{}>", p.ty()),
            RawValue::Param(p) => format!("Param<{}>", p.ty()),
            RawValue::Graph(_) => "Func".to_string(),
            RawValue::Placement(_) => "PlacementHandle".to_string(),
            RawValue::List(_) => "list".to_string(),
        }
    }

    /// Whether the value could be an input of some kind at all.
    ///
    /// Strings and placement handles never are; a list is adaptable when every
    /// element is.
    pub fn is_adaptable_input(&self) -> bool {
        match self {
            RawValue::Str(_) | RawValue::Placement(_) => false,
            RawValue::List(items) => items.iter().all(RawValue::is_adaptable_input),
            _ => true,
        }
    }

    /// The first value (depth-first) that is not adaptable as an input.
    pub(crate) fn first_unadaptable(&self) -> Option<&RawValue> {
        match self {
            RawValue::Str(_) | RawValue::Placement(_) => Some(self),
            RawValue::List(items) => items.iter().find_map(RawValue::first_unadaptable),
            _ => None,
        }
    }
}

impl From<bool> for RawValue {
    fn from(v: bool) -> Self {
        RawValue::Bool(v)
    }
}

impl From<i32> for RawValue {
    fn from(v: i32) -> Self {
        RawValue::Int(v as i64)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        RawValue::Int(v)
    }
}

impl From<f32> for RawValue {
    fn from(v: f32) -> Self {
        RawValue::Float(v as f64)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Float(v)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        RawValue::Str(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        RawValue::Str(v)
    }
}

impl From<Buffer> for RawValue {
    fn from(v: Buffer) -> Self {
        RawValue::Buffer(v)
    }
}

impl From<&Buffer> for RawValue {
    fn from(v: &Buffer) -> Self {
        RawValue::Buffer(v.clone())
    }
}

impl From<BufferParam> for RawValue {
    fn from(v: BufferParam) -> Self {
        RawValue::BufferParam(v)
    }
}

impl From<&BufferParam> for RawValue {
    fn from(v: &BufferParam) -> Self {
        RawValue::BufferParam(v.clone())
    }
}

impl From<ScalarParam> for RawValue {
    fn from(v: ScalarParam) -> Self {
        RawValue::Param(v)
    }
}

impl From<&ScalarParam> for RawValue {
    fn from(v: &ScalarParam) -> Self {
        RawValue::Param(v.clone())
    }
}

impl From<Func> for RawValue {
    fn from(v: Func) -> Self {
        RawValue::Graph(v)
    }
}

impl From<&Func> for RawValue {
    fn from(v: &Func) -> Self {
        RawValue::Graph(v.clone())
    }
}

impl From<PlacementHandle> for RawValue {
    fn from(v: PlacementHandle) -> Self {
        RawValue::Placement(v)
    }
}

impl From<&PlacementHandle> for RawValue {
    fn from(v: &PlacementHandle) -> Self {
        RawValue::Placement(v.clone())
    }
}

impl<T: Into<RawValue>> From<Vec<T>> for RawValue {
    fn from(items: Vec<T>) -> Self {
        RawValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// Build a `RawValue::List` from heterogeneous values.
#[macro_export]
macro_rules! raw_list {
    ($($value:expr),* $(,)?) => {
        $crate::value::RawValue::List(vec![$($crate::value::RawValue::from($value)),*])
    };
}

/// A scalar input after coercion: either a constant or a runtime parameter.
#[derive(Debug, Clone)]
pub enum ScalarArg {
    Const(ScalarValue),
    Param(ScalarParam),
}

impl ScalarArg {
    pub fn expr(&self) -> Expr {
        match self {
            ScalarArg::Const(v) => Expr::Const(*v),
            ScalarArg::Param(p) => Expr::Param(p.clone()),
        }
    }

    pub fn constant(&self) -> Option<ScalarValue> {
        match self {
            ScalarArg::Const(v) => Some(*v),
            ScalarArg::Param(_) => None,
        }
    }
}

impl PartialEq for ScalarArg {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ScalarArg::Const(a), ScalarArg::Const(b)) => a == b,
            (ScalarArg::Param(a), ScalarArg::Param(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// A fully typed input value, produced once per input by coercion.
#[derive(Debug, Clone)]
pub enum ArgumentValue {
    Scalar(ScalarArg),
    TypedBuffer(Buffer),
    UntypedBuffer(Buffer),
    Graph(Func),
    Array(Vec<ArgumentValue>),
}

impl ArgumentValue {
    pub fn kind_name(&self) -> &'static str {
        match self {
            ArgumentValue::Scalar(_) => "scalar",
            ArgumentValue::TypedBuffer(_) => "typed buffer",
            ArgumentValue::UntypedBuffer(_) => "untyped buffer",
            ArgumentValue::Graph(_) => "Func",
            ArgumentValue::Array(_) => "array",
        }
    }
}

/// Handles compare by identity. Graphs wrapping the same buffer compare equal,
/// since each coercion of a buffer into a graph input makes a fresh wrapper.
impl PartialEq for ArgumentValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ArgumentValue::Scalar(a), ArgumentValue::Scalar(b)) => a == b,
            (ArgumentValue::TypedBuffer(a), ArgumentValue::TypedBuffer(b))
            | (ArgumentValue::UntypedBuffer(a), ArgumentValue::UntypedBuffer(b)) => a.ptr_eq(b),
            (ArgumentValue::Graph(a), ArgumentValue::Graph(b)) => {
                a.ptr_eq(b)
                    || matches!(
                        (a.source_buffer(), b.source_buffer()),
                        (Some(x), Some(y)) if x.ptr_eq(&y)
                    )
            }
            (ArgumentValue::Array(a), ArgumentValue::Array(b)) => a == b,
            _ => false,
        }
    }
}
