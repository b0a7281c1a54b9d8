//! Tile cache
//!
//! A filesystem-backed store keyed by tile coordinates. The warmer fills it,
//! the server reads from it.

mod tile_cache;
mod types;

pub use tile_cache::TileCache;
pub use types::{CacheError, CacheStats};
