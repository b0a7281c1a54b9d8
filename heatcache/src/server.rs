//! Tile server
//!
//! Serves cached tiles over HTTP as `GET /{z}/{x}/{y}.png`. Tiles missing
//! from the cache answer 404, or are fetched on the spot when a fetcher is
//! attached.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheError, TileCache};
use crate::coord::Tile;
use crate::fetch::{FetchError, FetchOutcome, TileFetcher};
use crate::provider::AsyncHttpClient;

/// Thirty days; cached tiles never change.
const CACHE_CONTROL: &str = "max-age=2592000";

/// Tile server settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerConfig {
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            min_zoom: 7,
            max_zoom: 16,
        }
    }
}

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Shared handler state.
pub struct ServerState<C: AsyncHttpClient> {
    cache: Arc<TileCache>,
    fetcher: Option<Arc<TileFetcher<C>>>,
    config: ServerConfig,
}

impl<C: AsyncHttpClient> ServerState<C> {
    /// State that serves only what is already cached.
    pub fn new(cache: Arc<TileCache>, config: ServerConfig) -> Self {
        Self {
            cache,
            fetcher: None,
            config,
        }
    }

    /// Fetches tiles missing from the cache through `fetcher`.
    pub fn with_fetcher(mut self, fetcher: Arc<TileFetcher<C>>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    fn accepts_zoom(&self, zoom: u8) -> bool {
        (self.config.min_zoom..=self.config.max_zoom).contains(&zoom)
    }
}

/// Builds the router.
pub fn router<C: AsyncHttpClient + 'static>(state: Arc<ServerState<C>>) -> Router {
    Router::new()
        .route("/:z/:x/:file", get(get_tile::<C>))
        .with_state(state)
}

/// Binds `addr` and serves until Ctrl-C.
pub async fn serve<C: AsyncHttpClient + 'static>(
    addr: SocketAddr,
    state: Arc<ServerState<C>>,
) -> Result<(), ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    info!(
        addr = %addr,
        min_zoom = state.config.min_zoom,
        max_zoom = state.config.max_zoom,
        fetch_on_miss = state.fetcher.is_some(),
        "Tile server listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutting down tile server");
}

/// Parses the path segments of `/{z}/{x}/{y}.png`.
fn parse_tile(z: &str, x: &str, file: &str) -> Option<Tile> {
    let y = file.strip_suffix(".png")?;
    let tile = Tile::new(x.parse().ok()?, y.parse().ok()?, z.parse().ok()?);
    tile.is_valid().then_some(tile)
}

async fn get_tile<C: AsyncHttpClient>(
    State(state): State<Arc<ServerState<C>>>,
    Path((z, x, file)): Path<(String, String, String)>,
) -> Response {
    let Some(tile) = parse_tile(&z, &x, &file) else {
        return (StatusCode::NOT_FOUND, "Invalid tile").into_response();
    };

    if !state.accepts_zoom(tile.z) {
        return (StatusCode::NOT_FOUND, "Zoom is out of range").into_response();
    }

    if !state.cache.exists(&tile) {
        let Some(fetcher) = &state.fetcher else {
            return (StatusCode::NOT_FOUND, "Not in cache").into_response();
        };

        match fetcher.fetch_one(tile).await {
            Ok(FetchOutcome::Unresolved) => {
                return (StatusCode::BAD_GATEWAY, "Tile could not be fetched").into_response();
            }
            Ok(outcome) => {
                debug!(tile = %tile, ?outcome, "Fetched missing tile");
            }
            Err(e @ FetchError::AuthRejected { .. }) | Err(e @ FetchError::Provider(_)) => {
                warn!(tile = %tile, error = %e, "Provider refused tile");
                return (StatusCode::SERVICE_UNAVAILABLE, "Provider refused the request")
                    .into_response();
            }
            Err(e) => {
                error!(tile = %tile, error = %e, "Failed to fetch tile");
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }
    }

    match state.cache.read(&tile).await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "image/png".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("inline; filename=\"{}.png\"", tile.y),
                ),
                (header::CACHE_CONTROL, CACHE_CONTROL.to_string()),
            ],
            bytes,
        )
            .into_response(),
        Err(CacheError::NotFound(_)) => (StatusCode::NOT_FOUND, "Not in cache").into_response(),
        Err(e) => {
            error!(tile = %tile, error = %e, "Failed to read cached tile");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchConfig;
    use crate::placeholder::EMPTY_TILE_PNG;
    use crate::provider::{AuthContext, MockHttpClient, MockReply, StravaConfig, StravaProvider};
    use tempfile::TempDir;

    fn state(fetch_on_miss: Option<&MockHttpClient>) -> (TempDir, Arc<ServerState<MockHttpClient>>) {
        let dir = TempDir::new().unwrap();
        let cache = Arc::new(TileCache::new(dir.path()));
        let mut state = ServerState::new(cache.clone(), ServerConfig::default());
        if let Some(mock) = fetch_on_miss {
            let auth = Arc::new(AuthContext::new("APKA", "sig", "pol"));
            let fetcher = TileFetcher::new(
                mock.clone(),
                StravaProvider::new(StravaConfig::default(), Some(auth)),
                cache,
                FetchConfig::default(),
            );
            state = state.with_fetcher(Arc::new(fetcher));
        }
        (dir, Arc::new(state))
    }

    async fn request(
        state: &Arc<ServerState<MockHttpClient>>,
        z: &str,
        x: &str,
        file: &str,
    ) -> Response {
        get_tile(
            State(state.clone()),
            Path((z.to_string(), x.to_string(), file.to_string())),
        )
        .await
    }

    async fn body(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[test]
    fn test_parse_tile() {
        assert_eq!(parse_tile("9", "298", "180.png"), Some(Tile::new(298, 180, 9)));
        assert_eq!(parse_tile("9", "298", "180.jpg"), None);
        assert_eq!(parse_tile("9", "298", "180"), None);
        assert_eq!(parse_tile("9", "-1", "180.png"), None);
        assert_eq!(parse_tile("9", "512", "0.png"), None);
        assert_eq!(parse_tile("x", "1", "1.png"), None);
    }

    #[tokio::test]
    async fn test_serves_cached_tile() {
        let (_dir, state) = state(None);
        let tile = Tile::new(298, 180, 9);
        state.cache.write(&tile, b"cached").await.unwrap();

        let response = request(&state, "9", "298", "180.png").await;
        assert_eq!(response.status(), StatusCode::OK);

        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "image/png");
        assert_eq!(headers[header::CONTENT_DISPOSITION], "inline; filename=\"180.png\"");
        assert_eq!(headers[header::CACHE_CONTROL], "max-age=2592000");
        assert_eq!(body(response).await, b"cached");
    }

    #[tokio::test]
    async fn test_missing_tile_is_not_found() {
        let (_dir, state) = state(None);
        let response = request(&state, "9", "298", "180.png").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_zoom_out_of_range() {
        let (_dir, state) = state(None);
        for (z, tile) in [("6", Tile::new(1, 1, 6)), ("17", Tile::new(1, 1, 17))] {
            state.cache.write(&tile, b"x").await.unwrap();
            let response = request(&state, z, "1", "1.png").await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn test_invalid_coordinates() {
        let (_dir, state) = state(None);
        let response = request(&state, "9", "1000", "1.png").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = request(&state, "9", "1", "abc.png").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_fetch_on_miss() {
        let mock = MockHttpClient::new();
        mock.script("/tiles/ride/bluered/9/298/180.png", MockReply::ok(b"fresh"));
        let (_dir, state) = state(Some(&mock));

        let response = request(&state, "9", "298", "180.png").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, b"fresh");

        // Second request is served from the cache
        let response = request(&state, "9", "298", "180.png").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_on_miss_placeholder() {
        let mock = MockHttpClient::new();
        mock.script("/tiles/ride/bluered/9/1/1.png", MockReply::status(404));
        let (_dir, state) = state(Some(&mock));

        let response = request(&state, "9", "1", "1.png").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response).await, EMPTY_TILE_PNG);
    }

    #[tokio::test]
    async fn test_fetch_on_miss_unresolved() {
        let mock = MockHttpClient::new();
        mock.script("/tiles/ride/bluered/9/1/1.png", MockReply::status(500));
        let (_dir, state) = state(Some(&mock));

        let response = request(&state, "9", "1", "1.png").await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_fetch_on_miss_rejected() {
        let mock = MockHttpClient::new();
        mock.script("/tiles-auth/ride/bluered/14/1/1.png", MockReply::status(403));
        let (_dir, state) = state(Some(&mock));

        let response = request(&state, "14", "1", "1.png").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!state.cache.exists(&Tile::new(1, 1, 14)));
    }
}
