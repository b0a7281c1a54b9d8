//! Cache types

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::coord::Tile;

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// No entry for the tile
    #[error("{0} is not in the cache")]
    NotFound(Tile),

    /// I/O error on a cache file or directory
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Aggregate size of the cache directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of tile files
    pub files: u64,
    /// Total size of tile files in bytes
    pub bytes: u64,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} tiles, {:.2} MB",
            self.files,
            self.bytes as f64 / (1024.0 * 1024.0)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_display() {
        let stats = CacheStats {
            files: 3,
            bytes: 3 * 1024 * 1024 / 2,
        };
        assert_eq!(stats.to_string(), "3 tiles, 1.50 MB");
        assert_eq!(CacheStats::default().to_string(), "0 tiles, 0.00 MB");
    }
}
