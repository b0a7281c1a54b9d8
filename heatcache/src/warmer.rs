//! Cache warm-up
//!
//! Walks every tile of an area, skips the ones already cached and hands the
//! rest to a [`BatchFetcher`] in one batch.

use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use crate::cache::TileCache;
use crate::coord::{enumerate_area, GeoPoint, Tile};
use crate::fetch::{BatchFetcher, FetchError, FetchSummary};

/// Partial files older than this are leftovers of aborted writes.
const STALE_PARTIAL_AGE: Duration = Duration::from_secs(10 * 60);

/// Result of a warm-up run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarmupReport {
    /// Tiles checked against the cache
    pub considered: usize,
    pub already_cached: usize,
    /// Tiles handed to the fetcher
    pub scheduled: usize,
    /// `None` when nothing needed fetching
    pub fetched: Option<FetchSummary>,
    pub elapsed: Duration,
}

/// Errors that end a warm-up run.
#[derive(Debug, Error)]
pub enum WarmupError {
    #[error("tile fetch failed: {0}")]
    Fetch(#[from] FetchError),
}

impl WarmupError {
    /// Whether the provider refused the request with 403.
    pub fn is_auth_rejected(&self) -> bool {
        matches!(self, WarmupError::Fetch(FetchError::AuthRejected { .. }))
    }

    /// Whether the run needs new or missing credentials.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            WarmupError::Fetch(e) => e.is_auth_failure(),
        }
    }
}

/// Fills the cache for an area.
pub struct CacheWarmer<F: BatchFetcher> {
    cache: Arc<TileCache>,
    fetcher: F,
}

impl<F: BatchFetcher> CacheWarmer<F> {
    pub fn new(cache: Arc<TileCache>, fetcher: F) -> Self {
        Self { cache, fetcher }
    }

    /// Fetches every uncached tile in the box spanned by two corners.
    ///
    /// # Arguments
    ///
    /// * `corner_a`, `corner_b` - Opposite corners, in any order
    /// * `zooms` - Zoom levels to cover, inclusive
    /// * `max_tiles` - Cap on the number of tiles fetched in this run;
    ///   enumeration stops once that many uncached tiles are found
    ///
    /// Tiles are scheduled zoom by zoom, row by row, so a capped run fills
    /// low zooms first and the next run continues where this one stopped.
    /// Partial files older than ten minutes, left when an earlier run
    /// aborted mid-write, are deleted first.
    pub async fn warm_up(
        &self,
        corner_a: GeoPoint,
        corner_b: GeoPoint,
        zooms: RangeInclusive<u8>,
        max_tiles: Option<usize>,
    ) -> Result<WarmupReport, WarmupError> {
        let start = Instant::now();
        let area = enumerate_area(corner_a, corner_b, zooms.clone());
        info!(
            apex = %corner_a,
            vertex = %corner_b,
            min_zoom = zooms.start(),
            max_zoom = zooms.end(),
            area_tiles = area.total_tiles(),
            "Start building cache"
        );

        match self.cache.remove_stale_partials(STALE_PARTIAL_AGE).await {
            Ok(0) => {}
            Ok(removed) => info!(removed, "Removed partial files of aborted writes"),
            Err(e) => warn!(error = %e, "Failed to clean partial files"),
        }

        let mut considered = 0;
        let mut already_cached = 0;
        let mut pending: Vec<Tile> = Vec::new();

        for tile in area {
            if max_tiles.is_some_and(|max| pending.len() >= max) {
                break;
            }
            considered += 1;
            if self.cache.exists(&tile) {
                already_cached += 1;
            } else {
                pending.push(tile);
            }
        }

        let scheduled = pending.len();
        let fetched = if pending.is_empty() {
            info!(considered, "There are no tiles to load");
            None
        } else {
            info!(considered, already_cached, scheduled, "Scheduling tiles");
            Some(self.fetcher.fetch_all(pending).await?)
        };

        let elapsed = start.elapsed();
        info!("Spent {:.2} seconds", elapsed.as_secs_f64());

        Ok(WarmupReport {
            considered,
            already_cached,
            scheduled,
            fetched,
            elapsed,
        })
    }
}
