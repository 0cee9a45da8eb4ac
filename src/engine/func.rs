//! Graph handles.
//!
//! A `Func` is a shared, symbolic computation over a pure variable domain with
//! one or more typed channels. Ownership is shared between every holder, so a
//! Func embedded in an enclosing pipeline stays alive as long as either side
//! references it.

use crate::engine::buffer::{Buffer, BufferParam};
use crate::engine::expr::{Env, Expr, Var};
use crate::engine::lower::{self, LoweredPipeline, Realization};
use crate::engine::placement::{Placement, PlacementHandle};
use crate::engine::target::Target;
use crate::engine::unique_name;
use crate::error::EngineError;
use crate::types::ScalarType;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct Definition {
    pub args: Vec<Var>,
    pub values: Vec<Expr>,
    pub types: Vec<ScalarType>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Schedule {
    pub compute_at: Option<PlacementHandle>,
    pub vectorize: Option<(String, usize)>,
}

#[derive(Clone)]
pub struct Func {
    inner: Arc<FuncInner>,
}

struct FuncInner {
    name: String,
    definition: RwLock<Option<Definition>>,
    schedule: RwLock<Schedule>,
}

impl Func {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(FuncInner {
                name: name.into(),
                definition: RwLock::new(None),
                schedule: RwLock::new(Schedule::default()),
            }),
        }
    }

    pub fn anonymous() -> Self {
        Self::new(unique_name("f"))
    }

    /// A trivial producer that reads `buffer` over its full extent.
    pub fn from_buffer(buffer: &Buffer) -> Self {
        let func = Self::new(format!("{}_im", buffer.name()));
        let args: Vec<Var> = (0..buffer.dimensions()).map(|_| Var::implicit()).collect();
        let value = Expr::Image {
            buffer: buffer.clone(),
            args: args.iter().map(Expr::from).collect(),
        };
        func.store_definition(args, vec![value], vec![buffer.ty()]);
        func
    }

    /// A producer that reads whatever buffer `param` is bound to at realization.
    pub fn from_buffer_param(param: &BufferParam) -> Self {
        let func = Self::new(format!("{}_im", param.name()));
        let args: Vec<Var> = (0..param.dimensions()).map(|_| Var::implicit()).collect();
        let value = Expr::ParamImage {
            param: param.clone(),
            args: args.iter().map(Expr::from).collect(),
        };
        func.store_definition(args, vec![value], vec![param.ty()]);
        func
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Define a single-channel Func.
    pub fn define(&self, args: &[Var], value: impl Into<Expr>) -> Result<(), EngineError> {
        self.define_tuple(args, vec![value.into()])
    }

    /// Define a Func whose every point yields one value per channel.
    pub fn define_tuple(&self, args: &[Var], values: Vec<Expr>) -> Result<(), EngineError> {
        if self.is_defined() {
            return Err(EngineError::AlreadyDefined(self.name().to_string()));
        }
        if values.is_empty() {
            return Err(EngineError::ChannelMismatch {
                name: self.name().to_string(),
                expected: 1,
                got: 0,
            });
        }

        let mut free = Vec::new();
        let mut calls = Vec::new();
        for value in &values {
            value.collect_vars(&mut free);
            value.collect_calls(&mut calls);
        }
        if let Some(var) = free.iter().find(|v| !args.contains(v)) {
            return Err(EngineError::UnboundVar {
                func: self.name().to_string(),
                var: var.name().to_string(),
            });
        }
        if calls.iter().any(|f| f.ptr_eq(self)) {
            return Err(EngineError::RecursiveDefinition(self.name().to_string()));
        }

        let types = values
            .iter()
            .map(Expr::ty)
            .collect::<Result<Vec<_>, _>>()?;
        self.store_definition(args.to_vec(), values, types);
        Ok(())
    }

    fn store_definition(&self, args: Vec<Var>, values: Vec<Expr>, types: Vec<ScalarType>) {
        *self.inner.definition.write() = Some(Definition {
            args,
            values,
            types,
        });
    }

    pub fn is_defined(&self) -> bool {
        self.inner.definition.read().is_some()
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.inner.definition.read().as_ref().map(|d| d.args.len())
    }

    /// Channel types, or `None` while undefined.
    pub fn types(&self) -> Option<Vec<ScalarType>> {
        self.inner.definition.read().as_ref().map(|d| d.types.clone())
    }

    pub fn channels(&self) -> Option<usize> {
        self.inner.definition.read().as_ref().map(|d| d.values.len())
    }

    pub fn args(&self) -> Option<Vec<Var>> {
        self.inner.definition.read().as_ref().map(|d| d.args.clone())
    }

    /// The buffer this Func reads, if it is a trivial wrapper made by `from_buffer`.
    pub fn source_buffer(&self) -> Option<Buffer> {
        let guard = self.inner.definition.read();
        let def = guard.as_ref()?;
        match def.values.as_slice() {
            [Expr::Image { buffer, args }]
                if args.len() == def.args.len()
                    && args
                        .iter()
                        .zip(&def.args)
                        .all(|(a, v)| matches!(a, Expr::Var(av) if av == v)) =>
            {
                Some(buffer.clone())
            }
            _ => None,
        }
    }

    /// Symbolic reference to channel 0 at the given coordinates.
    pub fn at<I, E>(&self, args: I) -> Expr
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        self.channel_at(args, 0)
    }

    /// Symbolic reference to one channel of a multi-channel Func.
    pub fn channel_at<I, E>(&self, args: I, channel: usize) -> Expr
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        Expr::Call {
            func: self.clone(),
            args: args.into_iter().map(Into::into).collect(),
            channel,
        }
    }

    /// Compute this Func wherever `handle` says at lowering time.
    pub fn compute_at(&self, handle: &PlacementHandle) -> &Self {
        self.inner.schedule.write().compute_at = Some(handle.clone());
        self
    }

    pub fn compute_root(&self) -> &Self {
        self.compute_at(&PlacementHandle::with(Placement::Root))
    }

    pub fn vectorize(&self, var: &Var, factor: usize) -> &Self {
        self.inner.schedule.write().vectorize = Some((var.name().to_string(), factor));
        self
    }

    pub fn placement_handle(&self) -> Option<PlacementHandle> {
        self.inner.schedule.read().compute_at.clone()
    }

    pub(crate) fn schedule(&self) -> Schedule {
        self.inner.schedule.read().clone()
    }

    pub(crate) fn definition(&self) -> Result<Definition, EngineError> {
        self.inner
            .definition
            .read()
            .clone()
            .ok_or_else(|| EngineError::UndefinedFunc(self.name().to_string()))
    }

    pub(crate) fn eval_channel(&self, coords: &[i64], channel: usize) -> Result<f64, EngineError> {
        let guard = self.inner.definition.read();
        let def = guard
            .as_ref()
            .ok_or_else(|| EngineError::UndefinedFunc(self.name().to_string()))?;
        if coords.len() != def.args.len() {
            return Err(EngineError::ArityMismatch {
                name: self.name().to_string(),
                expected: def.args.len(),
                got: coords.len(),
            });
        }
        let value = def.values.get(channel).ok_or_else(|| EngineError::ChannelMismatch {
            name: self.name().to_string(),
            expected: def.values.len(),
            got: channel + 1,
        })?;
        let env = Env {
            vars: &def.args,
            coords,
        };
        Ok(def.types[channel].convert(value.eval(&env)?))
    }

    /// Lower the pipeline rooted at this Func, freezing any placement handles it reads.
    pub fn lower(&self, target: &Target) -> Result<LoweredPipeline, EngineError> {
        lower::lower(self, target)
    }

    /// Realize over `[0, extent)` in each dimension into freshly allocated buffers.
    pub fn realize(&self, extents: &[usize], target: &Target) -> Result<Realization, EngineError> {
        let types = self
            .types()
            .ok_or_else(|| EngineError::UndefinedFunc(self.name().to_string()))?;
        let buffers: Vec<Buffer> = types
            .iter()
            .enumerate()
            .map(|(i, ty)| Buffer::with_name(*ty, extents, format!("{}_{}", self.name(), i)))
            .collect();
        let pipeline = self.realize_into(&buffers, target)?;
        Ok(Realization { buffers, pipeline })
    }

    /// Realize into caller-provided buffers, one per channel.
    pub fn realize_into(
        &self,
        buffers: &[Buffer],
        target: &Target,
    ) -> Result<LoweredPipeline, EngineError> {
        let pipeline = self.lower(target)?;
        lower::evaluate(self, buffers)?;
        Ok(pipeline)
    }

    pub fn ptr_eq(&self, other: &Func) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Func")
            .field("name", &self.inner.name)
            .field("dimensions", &self.dimensions())
            .field("types", &self.types())
            .finish()
    }
}
