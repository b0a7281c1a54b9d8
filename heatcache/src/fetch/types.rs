//! Fetch types

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::cache::CacheError;
use crate::coord::Tile;
use crate::provider::ProviderError;

/// Default number of requests in flight.
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Default number of retries after a transport failure.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default delay before the first retry; doubles for each further retry.
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;

/// Upper bound for a single retry delay.
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Download tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Maximum number of requests in flight (at least 1)
    pub concurrency: usize,
    /// Retries after a transport failure before a tile is given up
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: Duration::from_millis(DEFAULT_RETRY_BASE_DELAY_MS),
        }
    }
}

impl FetchConfig {
    /// Delay before retry number `attempt` (zero-based).
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.retry_base_delay
            .saturating_mul(factor)
            .min(MAX_RETRY_DELAY)
    }
}

/// How a single tile was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Provider returned the tile; its bytes were cached
    Written,
    /// Provider has no data; the empty placeholder was cached
    WrittenEmpty,
    /// Nothing cached; the tile will be retried by a later run
    Unresolved,
}

impl FetchOutcome {
    pub fn is_cached(&self) -> bool {
        matches!(self, FetchOutcome::Written | FetchOutcome::WrittenEmpty)
    }
}

/// Per-outcome counts for a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub written: usize,
    pub written_empty: usize,
    pub unresolved: usize,
}

impl FetchSummary {
    pub fn record(&mut self, outcome: FetchOutcome) {
        match outcome {
            FetchOutcome::Written => self.written += 1,
            FetchOutcome::WrittenEmpty => self.written_empty += 1,
            FetchOutcome::Unresolved => self.unresolved += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.written + self.written_empty + self.unresolved
    }
}

impl fmt::Display for FetchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} written, {} empty, {} unresolved",
            self.written, self.written_empty, self.unresolved
        )
    }
}

/// Errors that abort a fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Provider refused the request (expired credentials or rate limiting)
    #[error("provider rejected {tile} with HTTP {status}; credentials may be expired or requests rate limited")]
    AuthRejected { tile: Tile, status: u16 },

    /// Request could not be built
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Fetched bytes could not be stored
    #[error("failed to cache {tile}: {source}")]
    Cache {
        tile: Tile,
        #[source]
        source: CacheError,
    },
}

impl FetchError {
    /// Whether the failure needs new credentials rather than a retry.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            FetchError::AuthRejected { .. }
                | FetchError::Provider(ProviderError::MissingCredentials(_))
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_doubles() {
        let config = FetchConfig::default();
        assert_eq!(config.retry_delay(0), Duration::from_millis(500));
        assert_eq!(config.retry_delay(1), Duration::from_millis(1000));
        assert_eq!(config.retry_delay(2), Duration::from_millis(2000));
    }

    #[test]
    fn test_retry_delay_capped() {
        let config = FetchConfig::default();
        assert_eq!(config.retry_delay(20), MAX_RETRY_DELAY);
        assert_eq!(config.retry_delay(u32::MAX), MAX_RETRY_DELAY);
    }

    #[test]
    fn test_summary_record() {
        let mut summary = FetchSummary::default();
        summary.record(FetchOutcome::Written);
        summary.record(FetchOutcome::Written);
        summary.record(FetchOutcome::WrittenEmpty);
        summary.record(FetchOutcome::Unresolved);

        assert_eq!(summary.written, 2);
        assert_eq!(summary.written_empty, 1);
        assert_eq!(summary.unresolved, 1);
        assert_eq!(summary.total(), 4);
        assert_eq!(summary.to_string(), "2 written, 1 empty, 1 unresolved");
    }

    #[test]
    fn test_auth_failure_classification() {
        let tile = Tile::new(1, 1, 12);
        assert!(FetchError::AuthRejected { tile, status: 403 }.is_auth_failure());
        assert!(FetchError::Provider(ProviderError::MissingCredentials(tile)).is_auth_failure());
        assert!(!FetchError::Cache {
            tile,
            source: CacheError::NotFound(tile)
        }
        .is_auth_failure());
    }
}
