// bitcap-cli/src/config.rs
//
// Resolves the effective CoreConfig: defaults, then the JSON file, then
// BITCAP_* variables (both handled by bitcap-core), then command-line flags.

use crate::error::{CliErrorContext, CliResult};
use bitcap_core::{CoreConfig, CoreConfigBuilder};
use std::path::Path;

/// Loads the layered configuration and lets `overrides` apply the flags.
pub fn resolve_config<F>(config_file: Option<&Path>, overrides: F) -> CliResult<CoreConfig>
where
    F: FnOnce(CoreConfigBuilder) -> CoreConfigBuilder,
{
    let loaded = CoreConfig::load(config_file).cli_with_context(|| match config_file {
        Some(path) => format!("Loading config file '{}'", path.display()),
        None => "Loading configuration".to_string(),
    })?;
    if let Some(path) = config_file {
        log::debug!("Loaded configuration from {}", path.display());
    }
    Ok(overrides(CoreConfigBuilder::from_config(loaded)).build())
}
