//! Deferred placement handles.
//!
//! A `PlacementHandle` lets a caller decide where a producer is computed after
//! the producer has been built. The handle starts unset, may be set any number
//! of times, and is frozen the first time lowering reads it; writes after that
//! point have no effect on the frozen placement.
//!
//! A declared default travels with each handle value rather than in the shared
//! cell, so binding a caller's handle never writes to it.

use crate::engine::expr::Var;
use crate::engine::func::Func;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Where a producer is computed relative to its consumers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Placement {
    /// Recomputed at every use site.
    Inline,
    /// Computed once, outside every loop.
    Root,
    /// Computed inside the loop over `var` of the consumer `func`.
    At { func: String, var: String },
}

impl Placement {
    pub fn at(func: &Func, var: &Var) -> Self {
        Placement::At {
            func: func.name().to_string(),
            var: var.name().to_string(),
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placement::Inline => f.write_str("inline"),
            Placement::Root => f.write_str("root"),
            Placement::At { func, var } => write!(f, "{}.{}", func, var),
        }
    }
}

impl FromStr for Placement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "inline" => Ok(Placement::Inline),
            "root" => Ok(Placement::Root),
            other => match other.rsplit_once('.') {
                Some((func, var)) if !func.is_empty() && !var.is_empty() => Ok(Placement::At {
                    func: func.to_string(),
                    var: var.to_string(),
                }),
                _ => Err(format!(
                    "'{}' is not a placement (expected inline, root, or <func>.<var>)",
                    other
                )),
            },
        }
    }
}

#[derive(Debug, Default)]
struct PlacementCell {
    requested: Option<Placement>,
    frozen: Option<Placement>,
}

/// Shared, settable-once-before-use placement cell.
#[derive(Clone, Default)]
pub struct PlacementHandle {
    cell: Arc<Mutex<PlacementCell>>,
    fallback: Option<Placement>,
}

impl PlacementHandle {
    /// An unset handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// A handle already set to `placement`.
    pub fn with(placement: Placement) -> Self {
        let handle = Self::new();
        handle.set(placement);
        handle
    }

    /// Request a placement. Returns `false` if lowering has already frozen
    /// this handle, in which case the request is ignored.
    pub fn set(&self, placement: Placement) -> bool {
        let mut cell = self.cell.lock();
        if let Some(frozen) = &cell.frozen {
            warn!(
                frozen = %frozen,
                requested = %placement,
                "Placement already read by lowering; ignoring late update"
            );
            return false;
        }
        debug!(placement = %placement, "Placement requested");
        cell.requested = Some(placement);
        true
    }

    /// The explicitly requested placement, if any.
    pub fn get(&self) -> Option<Placement> {
        self.cell.lock().requested.clone()
    }

    pub fn is_set(&self) -> bool {
        self.cell.lock().requested.is_some()
    }

    pub fn is_frozen(&self) -> bool {
        self.cell.lock().frozen.is_some()
    }

    pub fn frozen(&self) -> Option<Placement> {
        self.cell.lock().frozen.clone()
    }

    /// The frozen placement, or the one lowering would use right now.
    pub fn effective(&self) -> Placement {
        let cell = self.cell.lock();
        cell.frozen.clone().unwrap_or_else(|| self.resolve(&cell))
    }

    pub fn ptr_eq(&self, other: &PlacementHandle) -> bool {
        Arc::ptr_eq(&self.cell, &other.cell)
    }

    /// The same shared cell, resolving to `placement` when nothing is requested.
    pub(crate) fn with_fallback(&self, placement: Placement) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
            fallback: Some(placement),
        }
    }

    /// Read the handle for lowering, freezing it on first read.
    pub(crate) fn freeze(&self) -> Placement {
        let mut cell = self.cell.lock();
        if let Some(frozen) = &cell.frozen {
            return frozen.clone();
        }
        let resolved = self.resolve(&cell);
        cell.frozen = Some(resolved.clone());
        resolved
    }

    fn resolve(&self, cell: &PlacementCell) -> Placement {
        cell.requested
            .clone()
            .or_else(|| self.fallback.clone())
            .unwrap_or(Placement::Inline)
    }
}

impl fmt::Debug for PlacementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cell = self.cell.lock();
        f.debug_struct("PlacementHandle")
            .field("requested", &cell.requested)
            .field("fallback", &self.fallback)
            .field("frozen", &cell.frozen)
            .finish()
    }
}
