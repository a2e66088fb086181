//! Configuration loading utilities for CLI commands

use anyhow::{Context, Result};
use overlapcheck_core::config::{CliConfigOverrides, LayeredConfig};
use overlapcheck_core::models::CheckParams;
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "overlapcheck.toml";

/// Load layered configuration: defaults, then the config file, then the environment
pub fn load_config(config_path: Option<&Path>) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    if let Some(path) = resolve_config_path(config_path) {
        config = config
            .load_from_file(&path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
    }

    Ok(config.load_from_env())
}

/// Load layered configuration with CLI overrides and resolve check parameters
pub fn load_params(config_path: Option<&Path>, overrides: CliConfigOverrides) -> Result<CheckParams> {
    let mut config = load_config(config_path)?;
    config.update_from_cli(overrides);
    config.to_params().context("Invalid check parameters")
}

/// An explicit path is always used; the default file only when it exists
fn resolve_config_path(config_path: Option<&Path>) -> Option<PathBuf> {
    match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        }
    }
}
