//! Subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod extract;
pub mod templates;
pub mod tools;

use std::path::{Path, PathBuf};

use docex_core::DocexConfig;
use tracing::debug;

/// Per-user configuration file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docex")
        .join("config.json")
}

/// Load `--config`, else the per-user file when present, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<DocexConfig> {
    if let Some(path) = config_path {
        return Ok(DocexConfig::from_file(Path::new(path))?);
    }

    let path = default_config_path();
    if path.exists() {
        debug!("Using configuration from {}", path.display());
        Ok(DocexConfig::from_file(&path)?)
    } else {
        Ok(DocexConfig::default())
    }
}
