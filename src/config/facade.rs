//! Loader facade: assembles every config source in precedence order.

use super::merge::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::StubConfig;
use crate::error::ConfigError;
use config::File;
use std::path::Path;
use tracing::debug;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from defaults, the global file, workspace files, and the environment.
    pub fn load(workspace_root: &Path) -> Result<StubConfig, ConfigError> {
        let global = global_file::global_config_path();
        Self::load_with_global(workspace_root, global.as_deref())
    }

    /// Like [`ConfigLoader::load`] with an explicit global config file.
    pub fn load_with_global(
        workspace_root: &Path,
        global: Option<&Path>,
    ) -> Result<StubConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder, global)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = environment::add_to_builder(builder)?;
        let config: StubConfig = builder.build()?.try_deserialize()?;
        config.validate().map_err(ConfigError::Invalid)?;
        debug!(
            workspace_root = %workspace_root.display(),
            unknown_inputs = %config.binding.unknown_inputs,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Load a single file over the defaults, ignoring every other source.
    pub fn load_from_file(path: &Path) -> Result<StubConfig, ConfigError> {
        let config: StubConfig = merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()))
            .build()?
            .try_deserialize()?;
        config.validate().map_err(ConfigError::Invalid)?;
        Ok(config)
    }
}
