//! Built-in generators.

pub mod complex;
pub mod simple;

pub use complex::ComplexStub;
pub use simple::SimpleStub;

use crate::error::RegistryError;
use crate::registry::SchemaRegistry;
use std::sync::Arc;

/// A registry holding every built-in generator.
pub fn builtin_registry() -> Result<SchemaRegistry, RegistryError> {
    let mut registry = SchemaRegistry::new();
    registry.register(Arc::new(SimpleStub::new()))?;
    registry.register(Arc::new(ComplexStub::new()))?;
    Ok(registry)
}
