//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and construction of
//! the cache and fetcher so command handlers stay small.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use heatcache::cache::TileCache;
use heatcache::config::ConfigFile;
use heatcache::fetch::TileFetcher;
use heatcache::logging::{init_logging, LoggingGuard};
use heatcache::provider::{ReqwestClient, StravaProvider};

use crate::error::CliError;

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Config file given with `--config`
    pub config: Option<PathBuf>,
    pub debug: bool,
}

impl GlobalOptions {
    /// Loads the config file without starting logging.
    pub fn load_config(&self) -> Result<ConfigFile, CliError> {
        Ok(ConfigFile::load_resolved(self.config.as_deref())?)
    }
}

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    _logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Loads the configuration and initializes logging.
    ///
    /// Must run before the async runtime starts so the log timestamps can
    /// use the local UTC offset.
    pub fn new(options: &GlobalOptions) -> Result<Self, CliError> {
        let config = options.load_config()?;

        let logging_guard = init_logging(&config.logging.file, options.debug)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            _logging_guard: logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Mutable access for command line overrides.
    pub fn config_mut(&mut self) -> &mut ConfigFile {
        &mut self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("heatcache v{}", heatcache::VERSION);
        info!(
            cache = %self.config.cache.directory.display(),
            credentials = self.config.auth_context().is_some(),
            "heatcache CLI: {} command",
            command
        );
    }

    pub fn cache(&self) -> Arc<TileCache> {
        Arc::new(TileCache::new(&self.config.cache.directory))
    }

    /// Builds a fetcher from the `[provider]`, `[auth]` and `[download]`
    /// sections.
    pub fn create_fetcher(
        &self,
        cache: Arc<TileCache>,
    ) -> Result<TileFetcher<ReqwestClient>, CliError> {
        let client = ReqwestClient::with_timeout(self.config.download.timeout)?;
        let provider = StravaProvider::new(self.config.strava_config(), self.config.auth_context());

        Ok(TileFetcher::new(
            client,
            provider,
            cache,
            self.config.fetch_config(),
        ))
    }

    /// Starts the multi-threaded runtime for async commands.
    pub fn runtime(&self) -> Result<tokio::runtime::Runtime, CliError> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(CliError::Runtime)
    }
}

/// Returns `path`, or the default config file location.
pub fn resolve_config_path(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(heatcache::config::config_file_path)
}
