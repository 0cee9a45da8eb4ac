//! Stub Invocation
//!
//! `generate` is the single entry point: resolve inputs, coerce them, apply
//! GeneratorParams, run the generator, and assemble its outputs. Each stage
//! completes before the next starts, so any failure leaves nothing behind.

use crate::assemble::{self, StubOutputs};
use crate::coerce::Binding;
use crate::config::{BindingConfig, StubConfig};
use crate::engine::Target;
use crate::error::StubError;
use crate::generator::Generator;
use crate::params::{self, GeneratorParamMap};
use crate::registry::SchemaRegistry;
use crate::resolver::{self, StubInputs, UnknownInputPolicy};
use crate::schema::GeneratorSchema;
use std::sync::Arc;
use tracing::{debug, instrument};

/// A callable front for one generator.
#[derive(Clone)]
pub struct Stub {
    generator: Arc<dyn Generator>,
    policy: UnknownInputPolicy,
}

impl Stub {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            policy: UnknownInputPolicy::default(),
        }
    }

    pub fn from_registry(registry: &SchemaRegistry, generator_id: &str) -> Result<Self, StubError> {
        Ok(Self::new(registry.generator(generator_id)?))
    }

    pub fn with_policy(mut self, policy: UnknownInputPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_config(self, config: &BindingConfig) -> Self {
        self.with_policy(config.unknown_inputs)
    }

    /// Look up `generator_id` and apply the loaded binding settings.
    pub fn from_config(
        registry: &SchemaRegistry,
        generator_id: &str,
        config: &StubConfig,
    ) -> Result<Self, StubError> {
        Ok(Self::from_registry(registry, generator_id)?.with_config(&config.binding))
    }

    pub fn schema(&self) -> &GeneratorSchema {
        self.generator.schema()
    }

    pub fn policy(&self) -> UnknownInputPolicy {
        self.policy
    }

    /// Bind inputs and GeneratorParams and build the generator's outputs.
    ///
    /// Returns the sole output directly for single-output generators,
    /// otherwise every output in declared order.
    #[instrument(skip_all, fields(generator = %self.schema().id, target = %target))]
    pub fn generate(
        &self,
        target: &Target,
        inputs: impl Into<StubInputs>,
        generator_params: &GeneratorParamMap,
    ) -> Result<StubOutputs, StubError> {
        let schema = self.schema();
        let inputs = inputs.into();
        debug!(supplied = inputs.len(), "Generating");

        let raw = resolver::resolve(&schema.id, &schema.inputs, inputs, self.policy)?;
        let binding = Binding::bind(&schema.inputs, raw)?;
        let values = params::apply(
            &schema.id,
            &schema.generator_params,
            &params::stringify(generator_params),
        )?;
        assemble::assemble(self.generator.as_ref(), &binding, &values, target)
    }
}

/// Look up `generator_id` and generate with the default unknown-input policy.
pub fn generate(
    registry: &SchemaRegistry,
    generator_id: &str,
    target: &Target,
    inputs: impl Into<StubInputs>,
    generator_params: &GeneratorParamMap,
) -> Result<StubOutputs, StubError> {
    Stub::from_registry(registry, generator_id)?.generate(target, inputs, generator_params)
}
