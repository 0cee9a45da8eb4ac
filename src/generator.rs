//! The generator seam: a schema plus a build step that defines its outputs.

use crate::assemble::OutputValue;
use crate::coerce::Binding;
use crate::engine::Target;
use crate::error::StubError;
use crate::params::GeneratorParamValues;
use crate::schema::{GeneratorSchema, OutputSpec};

/// A pipeline-building unit with a fixed schema.
///
/// `generate` reads its bound inputs and params from the context and defines
/// every declared output exactly once. Implementations must not keep state
/// between calls; each call builds a fresh set of graphs.
pub trait Generator: Send + Sync {
    fn schema(&self) -> &GeneratorSchema;

    fn generate(&self, ctx: &mut GeneratorContext<'_>) -> Result<(), StubError>;
}

/// Everything a generator's build step may read, plus the outputs it defines.
pub struct GeneratorContext<'a> {
    binding: &'a Binding,
    params: &'a GeneratorParamValues,
    target: &'a Target,
    specs: &'a [OutputSpec],
    outputs: Vec<(String, OutputValue)>,
}

impl<'a> GeneratorContext<'a> {
    pub(crate) fn new(
        binding: &'a Binding,
        params: &'a GeneratorParamValues,
        target: &'a Target,
        specs: &'a [OutputSpec],
    ) -> Self {
        Self {
            binding,
            params,
            target,
            specs,
            outputs: Vec::new(),
        }
    }

    pub fn binding(&self) -> &'a Binding {
        self.binding
    }

    pub fn params(&self) -> &'a GeneratorParamValues {
        self.params
    }

    pub fn target(&self) -> &'a Target {
        self.target
    }

    /// Record the value of a declared output.
    pub fn define_output(
        &mut self,
        name: &str,
        value: impl Into<OutputValue>,
    ) -> Result<(), StubError> {
        if !self.specs.iter().any(|s| s.name == name) {
            return Err(StubError::GenerationFailed(format!(
                "output '{}' is not declared",
                name
            )));
        }
        if self.outputs.iter().any(|(n, _)| n == name) {
            return Err(StubError::GenerationFailed(format!(
                "output '{}' is defined more than once",
                name
            )));
        }
        self.outputs.push((name.to_string(), value.into()));
        Ok(())
    }

    pub(crate) fn take_outputs(&mut self) -> Vec<(String, OutputValue)> {
        std::mem::take(&mut self.outputs)
    }
}
