//! Configuration System
//!
//! Layered configuration for the stub layer: built-in defaults, the global
//! config file, workspace config files, then `GENSTUB_` environment variables.

use crate::engine::Target;
use crate::logging::LoggingConfig;
use crate::resolver::UnknownInputPolicy;
use serde::{Deserialize, Serialize};

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StubConfig {
    /// Argument binding behavior
    #[serde(default)]
    pub binding: BindingConfig,

    /// Default compilation target, e.g. `host` or `x86-64-linux-avx2`
    #[serde(default)]
    pub target: Option<String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Argument binding settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindingConfig {
    /// What to do with named inputs no declared input matches
    #[serde(default)]
    pub unknown_inputs: UnknownInputPolicy,
}

impl StubConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), String> {
        if let Some(target) = &self.target {
            target
                .parse::<Target>()
                .map_err(|e| format!("target: {}", e))?;
        }
        self.logging
            .validate()
            .map_err(|e| format!("logging: {}", e))
    }

    /// The configured target, else `GENSTUB_TARGET`, else the host.
    pub fn target(&self) -> Result<Target, String> {
        match &self.target {
            Some(target) => target.parse::<Target>().map_err(|e| e.to_string()),
            None => Target::from_env().map_err(|e| e.to_string()),
        }
    }
}
