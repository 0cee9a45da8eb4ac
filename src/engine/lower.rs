//! Lowering and realization.
//!
//! Lowering walks the pipeline reachable from an output Func, resolves every
//! producer's placement (freezing its handle), and validates that placements
//! name a consumer loop that exists. Realization then evaluates the output
//! pointwise; placement affects the lowered structure, never the values.

use crate::engine::buffer::Buffer;
use crate::engine::func::Func;
use crate::engine::placement::Placement;
use crate::engine::target::Target;
use crate::error::EngineError;
use serde::Serialize;
use std::ops::Index;
use tracing::{debug, trace};

/// One producer or output in a lowered pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoweredStage {
    pub func: String,
    pub placement: Placement,
    pub vectorize: Option<(String, usize)>,
}

/// Stages in producer-before-consumer order; the output is last.
#[derive(Debug, Clone, Serialize)]
pub struct LoweredPipeline {
    pub output: String,
    pub target: Target,
    pub stages: Vec<LoweredStage>,
}

impl LoweredPipeline {
    pub fn stage(&self, func: &str) -> Option<&LoweredStage> {
        self.stages.iter().find(|s| s.func == func)
    }
}

/// Buffers produced by a realization, one per channel.
#[derive(Debug, Clone)]
pub struct Realization {
    pub buffers: Vec<Buffer>,
    pub pipeline: LoweredPipeline,
}

impl Realization {
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    pub fn channel(&self, index: usize) -> Option<&Buffer> {
        self.buffers.get(index)
    }

    /// The first channel; the only one for single-channel Funcs.
    pub fn buffer(&self) -> &Buffer {
        &self.buffers[0]
    }
}

impl Index<usize> for Realization {
    type Output = Buffer;

    fn index(&self, index: usize) -> &Buffer {
        &self.buffers[index]
    }
}

pub(crate) fn lower(output: &Func, target: &Target) -> Result<LoweredPipeline, EngineError> {
    let mut order = Vec::new();
    visit(output, &mut order, &mut Vec::new())?;

    let mut stages = Vec::with_capacity(order.len());
    for func in &order {
        let schedule = func.schedule();
        let placement = if func.ptr_eq(output) {
            Placement::Root
        } else {
            schedule
                .compute_at
                .as_ref()
                .map(|h| h.freeze())
                .unwrap_or(Placement::Inline)
        };
        trace!(func = func.name(), placement = %placement, "Resolved placement");
        stages.push(LoweredStage {
            func: func.name().to_string(),
            placement,
            vectorize: schedule.vectorize,
        });
    }

    for (func, stage) in order.iter().zip(&stages) {
        if let Placement::At { func: consumer, var } = &stage.placement {
            validate_at(func, consumer, var, &order)?;
        }
    }

    debug!(
        output = output.name(),
        stage_count = stages.len(),
        target = %target,
        "Lowered pipeline"
    );
    Ok(LoweredPipeline {
        output: output.name().to_string(),
        target: target.clone(),
        stages,
    })
}

/// Post-order walk so producers precede their consumers.
fn visit(func: &Func, order: &mut Vec<Func>, path: &mut Vec<Func>) -> Result<(), EngineError> {
    if order.iter().any(|f| f.ptr_eq(func)) {
        return Ok(());
    }
    if path.iter().any(|f| f.ptr_eq(func)) {
        return Err(EngineError::RecursiveDefinition(func.name().to_string()));
    }
    let def = func.definition()?;
    path.push(func.clone());
    let mut calls = Vec::new();
    def.values.iter().for_each(|v| v.collect_calls(&mut calls));
    for callee in &calls {
        visit(callee, order, path)?;
    }
    path.pop();
    order.push(func.clone());
    Ok(())
}

fn validate_at(producer: &Func, consumer: &str, var: &str, order: &[Func]) -> Result<(), EngineError> {
    let invalid = |reason: String| EngineError::InvalidPlacement {
        func: producer.name().to_string(),
        reason,
    };
    let consumer_func = order
        .iter()
        .find(|f| f.name() == consumer)
        .ok_or_else(|| invalid(format!("'{}' is not part of this pipeline", consumer)))?;
    if consumer_func.ptr_eq(producer) {
        return Err(invalid("a Func cannot be computed inside its own loops".to_string()));
    }
    let args = consumer_func.args().unwrap_or_default();
    if !args.iter().any(|a| a.name() == var) {
        return Err(invalid(format!("'{}' has no loop over '{}'", consumer, var)));
    }
    Ok(())
}

pub(crate) fn evaluate(output: &Func, buffers: &[Buffer]) -> Result<(), EngineError> {
    let def = output.definition()?;
    if buffers.len() != def.values.len() {
        return Err(EngineError::ChannelMismatch {
            name: output.name().to_string(),
            expected: def.values.len(),
            got: buffers.len(),
        });
    }
    let extents = buffers[0].extents().to_vec();
    for (buffer, ty) in buffers.iter().zip(&def.types) {
        if buffer.ty() != *ty {
            return Err(EngineError::TypeMismatch {
                name: buffer.name().to_string(),
                expected: ty.to_string(),
                actual: buffer.ty().to_string(),
            });
        }
        if buffer.extents() != extents.as_slice() || buffer.dimensions() != def.args.len() {
            return Err(EngineError::ArityMismatch {
                name: output.name().to_string(),
                expected: def.args.len(),
                got: buffer.dimensions(),
            });
        }
    }

    if extents.iter().any(|&e| e == 0) {
        return Ok(());
    }
    let mut coords = vec![0i64; extents.len()];
    loop {
        for (channel, buffer) in buffers.iter().enumerate() {
            let value = output.eval_channel(&coords, channel)?;
            buffer.set(&coords, value)?;
        }
        if !advance(&mut coords, &extents) {
            break;
        }
    }
    Ok(())
}

/// Step to the next coordinate with the first dimension innermost.
fn advance(coords: &mut [i64], extents: &[usize]) -> bool {
    for (c, &extent) in coords.iter_mut().zip(extents) {
        *c += 1;
        if (*c as usize) < extent {
            return true;
        }
        *c = 0;
    }
    false
}
