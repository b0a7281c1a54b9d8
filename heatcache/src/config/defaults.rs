//! Default values for all configuration settings.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;
use crate::coord::GeoPoint;
use crate::fetch::{DEFAULT_CONCURRENCY, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BASE_DELAY_MS};
use crate::provider::{DEFAULT_FREE_MAX_ZOOM, DEFAULT_TIMEOUT_SECS};

/// North-west corner of the default area.
pub const DEFAULT_APEX: GeoPoint = GeoPoint::new(46.90946, 30.19284);

/// South-east corner of the default area.
pub const DEFAULT_VERTEX: GeoPoint = GeoPoint::new(46.10655, 31.39070);

pub const DEFAULT_MIN_ZOOM: u8 = 7;
pub const DEFAULT_MAX_ZOOM: u8 = 16;

/// Default cap on tiles fetched per warm-up run.
pub const DEFAULT_MAX_TILES: usize = 8000;

/// Highest zoom accepted anywhere in the config.
pub const MAX_SUPPORTED_ZOOM: u8 = 22;

pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Default cache directory (`~/.cache/heatcache` on Linux).
pub fn default_cache_directory() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| config_directory().join("cache"))
        .join("heatcache")
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            provider: ProviderSettings {
                activity: "ride".to_string(),
                color: "bluered".to_string(),
                free_max_zoom: DEFAULT_FREE_MAX_ZOOM,
                tile_size: 256,
                version: "19".to_string(),
            },
            auth: AuthSettings::default(),
            area: AreaSettings {
                apex: DEFAULT_APEX,
                vertex: DEFAULT_VERTEX,
                min_zoom: DEFAULT_MIN_ZOOM,
                max_zoom: DEFAULT_MAX_ZOOM,
                max_tiles: Some(DEFAULT_MAX_TILES),
            },
            cache: CacheSettings {
                directory: default_cache_directory(),
            },
            download: DownloadSettings {
                concurrency: DEFAULT_CONCURRENCY,
                timeout: DEFAULT_TIMEOUT_SECS,
                max_retries: DEFAULT_MAX_RETRIES,
                retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            },
            server: ServerSettings {
                bind: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_SERVER_PORT)),
                min_zoom: DEFAULT_MIN_ZOOM,
                max_zoom: DEFAULT_MAX_ZOOM,
                fetch_on_miss: false,
            },
            logging: LoggingSettings {
                file: config_directory().join("heatcache.log"),
            },
        }
    }
}
