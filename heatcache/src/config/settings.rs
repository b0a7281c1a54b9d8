//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::coord::GeoPoint;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub provider: ProviderSettings,
    pub auth: AuthSettings,
    pub area: AreaSettings,
    pub cache: CacheSettings,
    pub download: DownloadSettings,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
}

/// Heatmap layer and tier settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub activity: String,
    pub color: String,
    /// Highest zoom fetched without credentials
    pub free_max_zoom: u8,
    pub tile_size: u32,
    pub version: String,
}

/// CloudFront signed-cookie values.
///
/// All three must be set for zooms above `free_max_zoom`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthSettings {
    pub key_pair_id: Option<String>,
    pub signature: Option<String>,
    pub policy: Option<String>,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("AuthSettings")
            .field("key_pair_id", &self.key_pair_id)
            .field("signature", &redact(&self.signature))
            .field("policy", &redact(&self.policy))
            .finish()
    }
}

/// Area to warm.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaSettings {
    pub apex: GeoPoint,
    pub vertex: GeoPoint,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Cap on tiles fetched per run; `None` for no cap
    pub max_tiles: Option<usize>,
}

/// Cache location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub directory: PathBuf,
}

/// HTTP download settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSettings {
    /// Maximum requests in flight
    pub concurrency: usize,
    /// Per-request timeout in seconds
    pub timeout: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
}

/// Tile server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub bind: SocketAddr,
    /// Lowest zoom served; requests outside the range get 404
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Fetch tiles missing from the cache instead of answering 404
    pub fetch_on_miss: bool,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
