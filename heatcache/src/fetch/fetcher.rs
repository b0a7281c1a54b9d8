//! Bounded-concurrency tile downloader.

use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

use super::types::{FetchConfig, FetchError, FetchOutcome, FetchSummary};
use crate::cache::TileCache;
use crate::coord::Tile;
use crate::placeholder::EMPTY_TILE_PNG;
use crate::provider::{AsyncHttpClient, HttpResponse, StravaProvider};

/// Longest response body excerpt included in warnings.
const BODY_EXCERPT_LEN: usize = 200;

/// Called once for every tile resolved in a batch.
pub type ProgressCallback = Arc<dyn Fn(&Tile, FetchOutcome) + Send + Sync>;

/// Something that downloads a batch of tiles into the cache.
///
/// The warmer depends on this seam rather than on [`TileFetcher`] directly.
pub trait BatchFetcher: Send + Sync {
    /// Resolves every tile, or fails on the first fatal error.
    fn fetch_all(
        &self,
        tiles: Vec<Tile>,
    ) -> impl Future<Output = Result<FetchSummary, FetchError>> + Send;
}

/// Downloads tiles from the heatmap and stores them in a [`TileCache`].
///
/// # Outcomes
///
/// | Response          | Result                                   |
/// |-------------------|------------------------------------------|
/// | 200               | body cached, [`FetchOutcome::Written`]   |
/// | 404               | placeholder cached, `WrittenEmpty`       |
/// | 403               | [`FetchError::AuthRejected`], batch ends |
/// | other status      | warning, `Unresolved`                    |
/// | transport failure | retried, then `Unresolved`               |
pub struct TileFetcher<C: AsyncHttpClient> {
    client: C,
    provider: StravaProvider,
    cache: Arc<TileCache>,
    config: FetchConfig,
    progress: Option<ProgressCallback>,
}

impl<C: AsyncHttpClient> TileFetcher<C> {
    pub fn new(
        client: C,
        provider: StravaProvider,
        cache: Arc<TileCache>,
        config: FetchConfig,
    ) -> Self {
        Self {
            client,
            provider,
            cache,
            config,
            progress: None,
        }
    }

    /// Sets a callback invoked once per resolved tile during [`fetch_all`].
    ///
    /// [`fetch_all`]: TileFetcher::fetch_all
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn cache(&self) -> &Arc<TileCache> {
        &self.cache
    }

    /// Downloads a batch of tiles with at most `concurrency` requests in
    /// flight.
    ///
    /// Tiles are dispatched in input order and may complete in any order.
    /// On a fatal error the remaining requests are dropped; tiles already
    /// cached stay cached.
    pub async fn fetch_all(&self, tiles: Vec<Tile>) -> Result<FetchSummary, FetchError> {
        let concurrency = self.config.concurrency.max(1);
        let layer = self.provider.config();
        info!(
            tiles = tiles.len(),
            concurrency,
            activity = %layer.activity,
            color = %layer.color,
            credentials = self.provider.has_credentials(),
            "Fetching tiles"
        );

        let mut results = stream::iter(tiles)
            .map(|tile| async move { self.fetch_one(tile).await.map(|outcome| (tile, outcome)) })
            .buffer_unordered(concurrency);

        let mut summary = FetchSummary::default();
        while let Some(result) = results.next().await {
            let (tile, outcome) = match result {
                Ok(resolved) => resolved,
                Err(e) => {
                    error!(error = %e, resolved = summary.total(), "Aborting tile batch");
                    return Err(e);
                }
            };

            summary.record(outcome);
            if let Some(progress) = &self.progress {
                progress(&tile, outcome);
            }
        }

        info!(
            written = summary.written,
            empty = summary.written_empty,
            unresolved = summary.unresolved,
            "Tile batch complete"
        );
        Ok(summary)
    }

    /// Downloads and caches a single tile.
    pub async fn fetch_one(&self, tile: Tile) -> Result<FetchOutcome, FetchError> {
        let Some(response) = self.send(&tile).await? else {
            return Ok(FetchOutcome::Unresolved);
        };

        match response.status {
            200 => {
                self.store(&tile, &response.body).await?;
                debug!(tile = %tile, bytes = response.body.len(), "Tile fetched");
                Ok(FetchOutcome::Written)
            }
            404 => {
                self.store(&tile, EMPTY_TILE_PNG).await?;
                debug!(tile = %tile, "No data for tile, cached placeholder");
                Ok(FetchOutcome::WrittenEmpty)
            }
            403 => Err(FetchError::AuthRejected {
                tile,
                status: response.status,
            }),
            status => {
                warn!(
                    tile = %tile,
                    status,
                    body = %response.body_excerpt(BODY_EXCERPT_LEN),
                    "Unexpected status from provider"
                );
                Ok(FetchOutcome::Unresolved)
            }
        }
    }

    /// Sends the request for a tile, retrying transport failures.
    ///
    /// Returns `None` once retries are exhausted. Each attempt builds a new
    /// request, so it may land on a different CDN host.
    async fn send(&self, tile: &Tile) -> Result<Option<HttpResponse>, FetchError> {
        let mut attempt = 0;
        loop {
            let request = self.provider.request_for(tile)?;
            match self.client.get(&request).await {
                Ok(response) => return Ok(Some(response)),
                Err(e) if attempt < self.config.max_retries => {
                    let delay = self.config.retry_delay(attempt);
                    debug!(
                        tile = %tile,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transport failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(
                        tile = %tile,
                        attempts = attempt + 1,
                        error = %e,
                        "Giving up on tile after transport failures"
                    );
                    return Ok(None);
                }
            }
        }
    }

    async fn store(&self, tile: &Tile, bytes: &[u8]) -> Result<(), FetchError> {
        self.cache
            .write(tile, bytes)
            .await
            .map_err(|source| FetchError::Cache {
                tile: *tile,
                source,
            })
    }
}

impl<C: AsyncHttpClient> BatchFetcher for TileFetcher<C> {
    fn fetch_all(
        &self,
        tiles: Vec<Tile>,
    ) -> impl Future<Output = Result<FetchSummary, FetchError>> + Send {
        TileFetcher::fetch_all(self, tiles)
    }
}
