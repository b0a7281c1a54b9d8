//! heatcache - Local tile cache for the Strava global heatmap
//!
//! Pre-fetches heatmap tiles for an area into a directory tree so that a
//! thin tile server can answer map clients without contacting Strava for
//! every request.
//!
//! # Pipeline
//!
//! ```text
//! corners + zooms ─► coord::enumerate_area ─► warmer (skip cached)
//!                                               │
//!                                               ▼
//!                     cache ◄── fetch::TileFetcher ◄── provider::StravaProvider
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use heatcache::{cache::TileCache, coord::GeoPoint, fetch::*, provider::*, warmer::CacheWarmer};
//!
//! let cache = Arc::new(TileCache::new("/var/cache/heatmap"));
//! let provider = StravaProvider::new(StravaConfig::default(), None);
//! let fetcher = TileFetcher::new(ReqwestClient::new()?, provider, cache.clone(), FetchConfig::default());
//! let warmer = CacheWarmer::new(cache, fetcher);
//!
//! let report = warmer
//!     .warm_up(GeoPoint::new(46.9, 30.2), GeoPoint::new(46.1, 31.4), 7..=11, Some(8000))
//!     .await?;
//! ```

pub mod cache;
pub mod config;
pub mod coord;
pub mod fetch;
pub mod logging;
pub mod placeholder;
pub mod provider;
#[cfg(feature = "server")]
pub mod server;
pub mod warmer;

/// Crate version, reported by the CLI.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
