//! CLI route: single route table and run context.

use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{
    format_binding_settings, format_describe_json, format_describe_text, format_list_json,
    format_list_text,
};
use crate::config::{ConfigLoader, StubConfig};
use crate::engine::Target;
use crate::error::{CliError, ConfigError};
use crate::generators::builtin_registry;
use crate::registry::SchemaRegistry;
use crate::stub::Stub;
use std::path::PathBuf;
use tracing::debug;

/// Runtime context for CLI execution: loaded config and the generator registry.
pub struct RunContext {
    config: StubConfig,
    registry: SchemaRegistry,
}

impl RunContext {
    /// Create run context from workspace root and optional config path.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, CliError> {
        let config = match config_path {
            Some(path) => ConfigLoader::load_from_file(&path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        let registry = builtin_registry()?;
        debug!(generators = registry.len(), "CLI context ready");
        Ok(Self { config, registry })
    }

    pub fn config(&self) -> &StubConfig {
        &self.config
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// A stub for `generator_id` using the configured binding settings.
    pub fn stub(&self, generator_id: &str) -> Result<Stub, CliError> {
        Ok(Stub::from_config(&self.registry, generator_id, &self.config)?)
    }

    /// The configured target, `GENSTUB_TARGET`, or the host.
    pub fn target(&self) -> Result<Target, CliError> {
        self.config
            .target()
            .map_err(|e| ConfigError::Invalid(format!("target: {}", e)).into())
    }

    pub fn execute(&self, command: &Commands) -> Result<String, CliError> {
        match command {
            Commands::List { format } => {
                let schemas = self
                    .registry
                    .list()
                    .into_iter()
                    .map(|id| self.registry.lookup(id))
                    .collect::<Result<Vec<_>, _>>()?;
                match format {
                    OutputFormat::Text => Ok(format_list_text(&schemas)),
                    OutputFormat::Json => format_list_json(&schemas),
                }
            }
            Commands::Describe { generator, format } => {
                let stub = self.stub(generator)?;
                match format {
                    OutputFormat::Text => Ok(format!(
                        "{}\n\n{}",
                        format_describe_text(stub.schema()),
                        format_binding_settings(stub.policy(), &self.target()?)
                    )),
                    OutputFormat::Json => format_describe_json(stub.schema()),
                }
            }
        }
    }
}
