//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use heatcache::cache::CacheError;
use heatcache::config::{ConfigFileError, ENV_KEY_PAIR_ID, ENV_POLICY, ENV_SIGNATURE};
use heatcache::provider::TransportError;
use heatcache::server::ServerError;
use heatcache::warmer::WarmupError;

/// Exit code for a rejected or missing credential.
pub const EXIT_AUTH: i32 = 2;

/// Exit code for every other failure.
pub const EXIT_FAILURE: i32 = 1;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration could not be loaded or saved
    Config(ConfigFileError),
    /// Command line value out of range
    InvalidArgument(String),
    /// `init` would overwrite an existing file
    ConfigExists(PathBuf),
    /// HTTP client could not be created
    HttpClient(TransportError),
    /// Async runtime could not be started
    Runtime(std::io::Error),
    /// Warm-up run failed
    Warmup(WarmupError),
    /// Tile server failed
    Serve(ServerError),
    /// Cache directory could not be inspected
    Cache(CacheError),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Warmup(e) if e.is_auth_failure() => EXIT_AUTH,
            _ => EXIT_FAILURE,
        }
    }

    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Warmup(e) if e.is_auth_rejected() => {
                eprintln!();
                eprintln!("The heatmap refused the request. Common causes:");
                eprintln!("  1. The CloudFront cookies expired: copy fresh values from a");
                eprintln!("     logged-in browser session");
                eprintln!("  2. Too many requests: lower [download] concurrency and retry later");
                eprintln!();
                eprintln!("Tiles fetched before the rejection are kept in the cache.");
            }
            CliError::Warmup(e) if e.is_auth_failure() => {
                eprintln!();
                eprintln!("Zooms above the free tier need credentials. Set them in the [auth]");
                eprintln!("section of the config file or in the environment:");
                eprintln!("  {}, {}, {}", ENV_KEY_PAIR_ID, ENV_SIGNATURE, ENV_POLICY);
            }
            CliError::ConfigExists(_) => {
                eprintln!();
                eprintln!("Use --force to replace it with the defaults.");
            }
            CliError::Serve(ServerError::Bind { .. }) => {
                eprintln!();
                eprintln!("Another process may be using the port; choose one with --bind.");
            }
            _ => {}
        }

        process::exit(self.exit_code())
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::ConfigExists(path) => {
                write!(f, "Config file already exists: {}", path.display())
            }
            CliError::HttpClient(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::Warmup(e) => write!(f, "Warm-up failed: {}", e),
            CliError::Serve(e) => write!(f, "Tile server error: {}", e),
            CliError::Cache(e) => write!(f, "Cache error: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(e) => Some(e),
            CliError::HttpClient(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Warmup(e) => Some(e),
            CliError::Serve(e) => Some(e),
            CliError::Cache(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e)
    }
}

impl From<TransportError> for CliError {
    fn from(e: TransportError) -> Self {
        CliError::HttpClient(e)
    }
}

impl From<WarmupError> for CliError {
    fn from(e: WarmupError) -> Self {
        CliError::Warmup(e)
    }
}

impl From<ServerError> for CliError {
    fn from(e: ServerError) -> Self {
        CliError::Serve(e)
    }
}

impl From<CacheError> for CliError {
    fn from(e: CacheError) -> Self {
        CliError::Cache(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heatcache::coord::Tile;
    use heatcache::fetch::FetchError;
    use heatcache::provider::ProviderError;

    #[test]
    fn test_auth_failures_exit_with_two() {
        let tile = Tile::new(1, 1, 14);
        let rejected = CliError::from(WarmupError::Fetch(FetchError::AuthRejected {
            tile,
            status: 403,
        }));
        assert_eq!(rejected.exit_code(), EXIT_AUTH);

        let missing = CliError::from(WarmupError::Fetch(FetchError::Provider(
            ProviderError::MissingCredentials(tile),
        )));
        assert_eq!(missing.exit_code(), EXIT_AUTH);
    }

    #[test]
    fn test_other_failures_exit_with_one() {
        let tile = Tile::new(1, 1, 9);
        let cache = CliError::from(WarmupError::Fetch(FetchError::Cache {
            tile,
            source: CacheError::NotFound(tile),
        }));
        assert_eq!(cache.exit_code(), EXIT_FAILURE);
        assert_eq!(
            CliError::InvalidArgument("zoom".to_string()).exit_code(),
            EXIT_FAILURE
        );
    }

    #[test]
    fn test_display() {
        let err = CliError::ConfigExists(PathBuf::from("/tmp/config.ini"));
        assert_eq!(err.to_string(), "Config file already exists: /tmp/config.ini");
    }
}
