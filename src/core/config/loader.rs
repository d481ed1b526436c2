#![allow(clippy::result_large_err)]

use super::OrchdocConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use std::env;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "orchdoc.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config from a directory (dir/orchdoc.toml).
    /// Environment variables override config file values; a missing file yields defaults.
    pub fn load_from_dir(dir: &Path) -> Result<OrchdocConfig, AppError> {
        let config_file = Self::load_from_file(&dir.join(CONFIG_FILE_NAME))?;
        let mut config = config_file.unwrap_or_default();
        Self::apply_env_overrides(&mut config);
        Ok(config)
    }

    /// Load config from an explicit path; unlike `load_from_dir` the file must exist.
    pub fn load_explicit(path: &Path) -> Result<OrchdocConfig, AppError> {
        let mut config = Self::load_from_file(path)?.ok_or_else(|| {
            AppError::new(
                ErrorCategory::ConfigError,
                format!("config file {} does not exist", path.display()),
            )
        })?;
        Self::apply_env_overrides(&mut config);
        Ok(config)
    }

    /// Load config from specific file path
    /// Returns Ok(None) if file doesn't exist
    pub fn load_from_file(path: &Path) -> Result<Option<OrchdocConfig>, AppError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("Failed to read config file {}: {}", path.display(), e),
            )
        })?;

        let config: OrchdocConfig = toml::from_str(&content).map_err(|e| {
            AppError::new(
                ErrorCategory::ConfigError,
                format!("Failed to parse config file {}: {}", path.display(), e),
            )
        })?;

        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(Some(config))
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(config: &mut OrchdocConfig) {
        if let Ok(url) = env::var("ORCHDOC_REMOTE_URL") {
            if !url.trim().is_empty() {
                config.remote.base_url = Some(url);
            }
        }

        if let Ok(username) = env::var("ORCHDOC_REMOTE_USERNAME") {
            if !username.trim().is_empty() {
                config.remote.username = Some(username);
            }
        }

        if let Ok(insecure) = env::var("ORCHDOC_REMOTE_INSECURE") {
            if let Ok(insecure) = insecure.parse::<bool>() {
                config.remote.insecure = insecure;
            }
        }
    }
}
