//! Generator registry: the single source of truth for generator schemas.

use crate::error::{RegistryError, StubError};
use crate::generator::Generator;
use crate::schema::GeneratorSchema;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Registry of generators keyed by id.
///
/// Schemas are validated once, at registration, and are read-only afterwards.
#[derive(Default)]
pub struct SchemaRegistry {
    generators: BTreeMap<String, Arc<dyn Generator>>,
}

impl SchemaRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a generator under its schema id
    pub fn register(&mut self, generator: Arc<dyn Generator>) -> Result<(), RegistryError> {
        let schema = generator.schema();
        schema.validate()?;
        if self.generators.contains_key(&schema.id) {
            return Err(RegistryError::DuplicateGenerator(schema.id.clone()));
        }
        debug!(
            generator = %schema.id,
            inputs = schema.inputs.len(),
            outputs = schema.outputs.len(),
            "Registered generator"
        );
        self.generators.insert(schema.id.clone(), generator);
        Ok(())
    }

    /// Look up a generator's schema
    pub fn lookup(&self, generator_id: &str) -> Result<&GeneratorSchema, StubError> {
        self.generators
            .get(generator_id)
            .map(|g| g.schema())
            .ok_or_else(|| StubError::UnknownGenerator(generator_id.to_string()))
    }

    /// Get a registered generator
    pub fn generator(&self, generator_id: &str) -> Result<Arc<dyn Generator>, StubError> {
        self.generators
            .get(generator_id)
            .cloned()
            .ok_or_else(|| StubError::UnknownGenerator(generator_id.to_string()))
    }

    pub fn contains(&self, generator_id: &str) -> bool {
        self.generators.contains_key(generator_id)
    }

    /// Registered ids in sorted order
    pub fn list(&self) -> Vec<&str> {
        self.generators.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }
}
