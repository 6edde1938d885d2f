//! CLI command implementations.

use anyhow::{Context, Result};
use std::path::Path;
use warden_core::WardenConfig;

pub mod check;
pub mod environments;
pub mod ping;
pub mod route;

/// Load and validate the configuration at `path`.
pub fn load_config(path: &Path) -> Result<WardenConfig> {
    WardenConfig::from_file(path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))
}
