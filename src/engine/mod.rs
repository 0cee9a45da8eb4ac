//! Reference Engine
//!
//! A small interpreter for the collaborator interfaces the stub layer binds
//! against: typed buffers, symbolic graph handles, deferred placement handles,
//! lowering, and realization. It evaluates pointwise; it does not generate code.

pub mod buffer;
pub mod expr;
pub mod func;
pub mod lower;
pub mod placement;
pub mod target;

pub use buffer::{Buffer, BufferParam, ScalarParam};
pub use expr::{Expr, Var};
pub use func::Func;
pub use lower::{LoweredPipeline, LoweredStage, Realization};
pub use placement::{Placement, PlacementHandle};
pub use target::Target;

use std::sync::atomic::{AtomicUsize, Ordering};

static UNIQUE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Generate a process-unique name with the given prefix.
pub(crate) fn unique_name(prefix: &str) -> String {
    let n = UNIQUE_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}${}", prefix, n)
}
