//! Configuration file handling for ~/.heatcache/config.ini.
//!
//! Loads and saves user configuration with sensible defaults.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;
use tracing::debug;

use super::settings::ConfigFile;
use crate::fetch::FetchConfig;
use crate::provider::{AuthContext, StravaConfig};

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults. The file must be valid
    /// on its own; use [`ConfigFile::load_resolved`] when the environment
    /// may complete it.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        let config = Self::read_from(path)?;
        super::env::validate(&config)?;
        Ok(config)
    }

    /// Load configuration the way the command line tool does.
    ///
    /// Reads `path` (or `~/.heatcache/config.ini`), then loads `.env` from
    /// the working directory if present and applies environment overrides.
    /// Cross-key checks run on the merged result, so credentials may be
    /// split between the file and the environment.
    pub fn load_resolved(path: Option<&Path>) -> Result<Self, ConfigFileError> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);

        if let Ok(env_file) = dotenvy::dotenv() {
            debug!(path = %env_file.display(), "Loaded environment file");
        }
        Self::resolve_with(&path, |name| std::env::var(name).ok())
    }

    /// Reads `path`, overlays the variables `lookup` returns, then validates.
    fn resolve_with<F>(path: &Path, lookup: F) -> Result<Self, ConfigFileError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::read_from(path)?;
        super::env::apply_env_overrides(&mut config, lookup)?;
        super::env::validate(&config)?;
        Ok(config)
    }

    fn read_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Credentials for the authenticated tier, if configured.
    pub fn auth_context(&self) -> Option<Arc<AuthContext>> {
        match (
            &self.auth.key_pair_id,
            &self.auth.signature,
            &self.auth.policy,
        ) {
            (Some(key_pair_id), Some(signature), Some(policy)) => Some(Arc::new(
                AuthContext::new(key_pair_id, signature, policy),
            )),
            _ => None,
        }
    }

    pub fn strava_config(&self) -> StravaConfig {
        StravaConfig {
            activity: self.provider.activity.clone(),
            color: self.provider.color.clone(),
            free_max_zoom: self.provider.free_max_zoom,
            tile_size: self.provider.tile_size,
            version: self.provider.version.clone(),
        }
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            concurrency: self.download.concurrency.max(1),
            max_retries: self.download.max_retries,
            retry_base_delay: Duration::from_millis(self.download.retry_base_delay_ms),
        }
    }
}

/// Get the path to the config directory (~/.heatcache).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".heatcache")
}

/// Get the path to the config file (~/.heatcache/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
