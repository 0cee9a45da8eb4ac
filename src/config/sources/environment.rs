//! Environment source: GENSTUB_* variables, highest precedence.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Shorthand for `binding.unknown_inputs`.
pub const UNKNOWN_INPUTS_VAR: &str = "GENSTUB_UNKNOWN_INPUTS";

/// Add `GENSTUB_<SECTION>__<KEY>` variables, e.g. `GENSTUB_BINDING__UNKNOWN_INPUTS`,
/// plus the `GENSTUB_UNKNOWN_INPUTS` and `GENSTUB_TARGET` shorthands.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let mut builder = builder.add_source(
        Environment::with_prefix("GENSTUB")
            .prefix_separator("_")
            .separator("__"),
    );
    if let Ok(policy) = std::env::var(UNKNOWN_INPUTS_VAR) {
        builder = builder.set_override("binding.unknown_inputs", policy.to_ascii_lowercase())?;
    }
    Ok(builder)
}
