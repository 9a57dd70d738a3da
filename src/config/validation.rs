//! Configuration validation helpers beyond structural defaults.

use super::Config;

/// Validate a loaded configuration, returning a descriptive error on the first
/// problem found. Called by `--validate-config` and once more at normal startup
/// so a misconfigured `config.json` fails loudly instead of silently degrading.
pub fn validate_config_security(config: &Config) -> anyhow::Result<()> {
    config.validate()
}
