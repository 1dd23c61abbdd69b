//! CLI command implementations for Warden.

pub mod keys;
pub mod token;

use anyhow::Context;
use std::path::Path;
use warden_core::WardenConfig;

/// Load `warden.yaml` when given, otherwise built-in defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<WardenConfig> {
    match path {
        Some(path) => {
            tracing::info!(config = %path.display(), "Loading configuration");
            WardenConfig::load_with_context(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))
        }
        None => Ok(WardenConfig::default()),
    }
}
