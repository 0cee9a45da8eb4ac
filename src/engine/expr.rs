//! Symbolic scalar expressions over pure variables.

use crate::engine::buffer::{Buffer, BufferParam, ScalarParam};
use crate::engine::func::Func;
use crate::engine::unique_name;
use crate::error::EngineError;
use crate::types::{ScalarType, ScalarValue};
use std::ops::{Add, Div, Mul, Sub};

/// A pure variable naming one dimension of a Func's domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Var {
    name: String,
}

impl Var {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// A variable with a generated, unique name.
    pub fn implicit() -> Self {
        Self::new(unique_name("v"))
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Min,
    Max,
}

#[derive(Debug, Clone)]
pub enum Expr {
    Const(ScalarValue),
    Var(Var),
    Param(ScalarParam),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Cast(ScalarType, Box<Expr>),
    Call {
        func: Func,
        args: Vec<Expr>,
        channel: usize,
    },
    Image {
        buffer: Buffer,
        args: Vec<Expr>,
    },
    ParamImage {
        param: BufferParam,
        args: Vec<Expr>,
    },
}

/// Coordinates bound to a Func's pure variables during evaluation.
pub(crate) struct Env<'a> {
    pub vars: &'a [Var],
    pub coords: &'a [i64],
}

impl Env<'_> {
    fn lookup(&self, var: &Var) -> Option<i64> {
        self.vars
            .iter()
            .position(|v| v == var)
            .map(|i| self.coords[i])
    }
}

impl Expr {
    pub fn cast(ty: ScalarType, value: impl Into<Expr>) -> Expr {
        Expr::Cast(ty, Box::new(value.into()))
    }

    pub fn constant(ty: ScalarType, value: f64) -> Expr {
        Expr::Const(ScalarValue::new(ty, value))
    }

    /// Read `buffer` at the given coordinates.
    pub fn image<I, E>(buffer: &Buffer, args: I) -> Expr
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Expr::Image {
            buffer: buffer.clone(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn min(a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
        Expr::Binary(BinOp::Min, Box::new(a.into()), Box::new(b.into()))
    }

    pub fn max(a: impl Into<Expr>, b: impl Into<Expr>) -> Expr {
        Expr::Binary(BinOp::Max, Box::new(a.into()), Box::new(b.into()))
    }

    /// Type of the value this expression produces.
    pub fn ty(&self) -> Result<ScalarType, EngineError> {
        match self {
            Expr::Const(v) => Ok(v.ty),
            Expr::Var(_) => Ok(ScalarType::Int32),
            Expr::Param(p) => Ok(p.ty()),
            Expr::Binary(_, a, b) => Ok(ScalarType::promote(a.ty()?, b.ty()?)),
            Expr::Cast(ty, _) => Ok(*ty),
            Expr::Call { func, channel, .. } => {
                let types = func
                    .types()
                    .ok_or_else(|| EngineError::UndefinedFunc(func.name().to_string()))?;
                types
                    .get(*channel)
                    .copied()
                    .ok_or_else(|| EngineError::ChannelMismatch {
                        name: func.name().to_string(),
                        expected: types.len(),
                        got: channel + 1,
                    })
            }
            Expr::Image { buffer, .. } => Ok(buffer.ty()),
            Expr::ParamImage { param, .. } => Ok(param.ty()),
        }
    }

    pub(crate) fn eval(&self, env: &Env<'_>) -> Result<f64, EngineError> {
        match self {
            Expr::Const(v) => Ok(v.value),
            Expr::Var(var) => env.lookup(var).map(|c| c as f64).ok_or_else(|| {
                EngineError::UnboundVar {
                    func: "<expr>".to_string(),
                    var: var.name().to_string(),
                }
            }),
            Expr::Param(p) => Ok(p.get()),
            Expr::Binary(op, a, b) => {
                let ty = self.ty()?;
                let (a, b) = (a.eval(env)?, b.eval(env)?);
                let raw = match op {
                    BinOp::Add => a + b,
                    BinOp::Sub => a - b,
                    BinOp::Mul => a * b,
                    BinOp::Div if ty.is_float() => a / b,
                    // Integer division rounds toward negative infinity; x / 0 is 0.
                    BinOp::Div if b == 0.0 => 0.0,
                    BinOp::Div => (a / b).floor(),
                    BinOp::Min => a.min(b),
                    BinOp::Max => a.max(b),
                };
                Ok(ty.convert(raw))
            }
            Expr::Cast(ty, value) => Ok(ty.convert(value.eval(env)?)),
            Expr::Call {
                func,
                args,
                channel,
            } => {
                let coords = eval_coords(args, env)?;
                func.eval_channel(&coords, *channel)
            }
            Expr::Image { buffer, args } => buffer.get(&eval_coords(args, env)?),
            Expr::ParamImage { param, args } => param.buffer()?.get(&eval_coords(args, env)?),
        }
    }

    /// Names of every variable referenced by this expression.
    pub(crate) fn collect_vars(&self, out: &mut Vec<Var>) {
        match self {
            Expr::Var(v) => {
                if !out.contains(v) {
                    out.push(v.clone());
                }
            }
            Expr::Const(_) | Expr::Param(_) => {}
            Expr::Binary(_, a, b) => {
                a.collect_vars(out);
                b.collect_vars(out);
            }
            Expr::Cast(_, value) => value.collect_vars(out),
            Expr::Call { args, .. } | Expr::Image { args, .. } | Expr::ParamImage { args, .. } => {
                args.iter().for_each(|a| a.collect_vars(out))
            }
        }
    }

    /// Funcs called directly by this expression, without duplicates.
    pub(crate) fn collect_calls(&self, out: &mut Vec<Func>) {
        match self {
            Expr::Call { func, args, .. } => {
                if !out.iter().any(|f| f.ptr_eq(func)) {
                    out.push(func.clone());
                }
                args.iter().for_each(|a| a.collect_calls(out));
            }
            Expr::Binary(_, a, b) => {
                a.collect_calls(out);
                b.collect_calls(out);
            }
            Expr::Cast(_, value) => value.collect_calls(out),
            Expr::Image { args, .. } | Expr::ParamImage { args, .. } => {
                args.iter().for_each(|a| a.collect_calls(out))
            }
            Expr::Const(_) | Expr::Var(_) | Expr::Param(_) => {}
        }
    }
}

fn eval_coords(args: &[Expr], env: &Env<'_>) -> Result<Vec<i64>, EngineError> {
    args.iter()
        .map(|a| a.eval(env).map(|v| v.floor() as i64))
        .collect()
}

impl From<ScalarValue> for Expr {
    fn from(v: ScalarValue) -> Self {
        Expr::Const(v)
    }
}

impl From<i32> for Expr {
    fn from(v: i32) -> Self {
        Expr::constant(ScalarType::Int32, v as f64)
    }
}

impl From<f32> for Expr {
    fn from(v: f32) -> Self {
        Expr::constant(ScalarType::Float32, v as f64)
    }
}

impl From<f64> for Expr {
    fn from(v: f64) -> Self {
        Expr::constant(ScalarType::Float64, v)
    }
}

impl From<bool> for Expr {
    fn from(v: bool) -> Self {
        Expr::constant(ScalarType::Bool, if v { 1.0 } else { 0.0 })
    }
}

impl From<Var> for Expr {
    fn from(v: Var) -> Self {
        Expr::Var(v)
    }
}

impl From<&Var> for Expr {
    fn from(v: &Var) -> Self {
        Expr::Var(v.clone())
    }
}

impl From<&ScalarParam> for Expr {
    fn from(p: &ScalarParam) -> Self {
        Expr::Param(p.clone())
    }
}

impl From<&Expr> for Expr {
    fn from(e: &Expr) -> Self {
        e.clone()
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<T: Into<Expr>> $trait<T> for Expr {
            type Output = Expr;
            fn $method(self, rhs: T) -> Expr {
                Expr::Binary($op, Box::new(self), Box::new(rhs.into()))
            }
        }

        impl<T: Into<Expr>> $trait<T> for &Expr {
            type Output = Expr;
            fn $method(self, rhs: T) -> Expr {
                Expr::Binary($op, Box::new(self.clone()), Box::new(rhs.into()))
            }
        }

        impl<T: Into<Expr>> $trait<T> for Var {
            type Output = Expr;
            fn $method(self, rhs: T) -> Expr {
                Expr::Binary($op, Box::new(Expr::Var(self)), Box::new(rhs.into()))
            }
        }

        impl<T: Into<Expr>> $trait<T> for &Var {
            type Output = Expr;
            fn $method(self, rhs: T) -> Expr {
                Expr::Binary($op, Box::new(Expr::Var(self.clone())), Box::new(rhs.into()))
            }
        }
    };
}

impl_binary_op!(Add, add, BinOp::Add);
impl_binary_op!(Sub, sub, BinOp::Sub);
impl_binary_op!(Mul, mul, BinOp::Mul);
impl_binary_op!(Div, div, BinOp::Div);
