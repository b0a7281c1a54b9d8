//! Tile fetching
//!
//! Downloads tiles from the provider under a concurrency cap and stores
//! them in the [`TileCache`](crate::cache::TileCache).

mod fetcher;
mod types;

pub use fetcher::{BatchFetcher, ProgressCallback, TileFetcher};
pub use types::{
    FetchConfig, FetchError, FetchOutcome, FetchSummary, DEFAULT_CONCURRENCY,
    DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BASE_DELAY_MS,
};
