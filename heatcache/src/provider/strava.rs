//! Strava global heatmap provider.
//!
//! # URL Pattern
//!
//! Free tier (zoom up to [`DEFAULT_FREE_MAX_ZOOM`]):
//! `https://heatmap-external-{s}.strava.com/tiles/{activity}/{color}/{z}/{x}/{y}.png?px=256&v=19`
//!
//! Authenticated tier (higher zooms):
//! `https://heatmap-external-{s}.strava.com/tiles-auth/{activity}/{color}/{z}/{x}/{y}.png`
//! with `px`, `v`, `Key-Pair-Id`, `Signature` and `Policy` query parameters
//! taken from a CloudFront signed cookie.
//!
//! `{s}` is one of `a`, `b` or `c`, picked at random per request to spread
//! load across the CDN hosts.

use std::sync::Arc;

use rand::seq::IndexedRandom;

use super::types::{AuthContext, ProviderError, TileRequest};
use crate::coord::Tile;

/// Highest zoom served without credentials.
pub const DEFAULT_FREE_MAX_ZOOM: u8 = 11;

const SERVERS: [&str; 3] = ["a", "b", "c"];

/// Which URL template and parameter set a tile uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessTier {
    Free,
    Authenticated,
}

/// Static request parameters for the heatmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StravaConfig {
    /// Activity layer: `ride`, `run`, `water`, `winter` or `all`
    pub activity: String,
    /// Colour scheme: `bluered`, `hot`, `blue`, `purple` or `gray`
    pub color: String,
    pub free_max_zoom: u8,
    /// Requested tile edge in pixels (`px`)
    pub tile_size: u32,
    /// Tile style version (`v`)
    pub version: String,
}

impl Default for StravaConfig {
    fn default() -> Self {
        Self {
            activity: "ride".to_string(),
            color: "bluered".to_string(),
            free_max_zoom: DEFAULT_FREE_MAX_ZOOM,
            tile_size: 256,
            version: "19".to_string(),
        }
    }
}

/// Builds heatmap tile requests.
#[derive(Debug, Clone)]
pub struct StravaProvider {
    config: StravaConfig,
    auth: Option<Arc<AuthContext>>,
}

impl StravaProvider {
    /// Creates a provider.
    ///
    /// # Arguments
    ///
    /// * `config` - Activity, colour and tier settings
    /// * `auth` - Credentials for the authenticated tier; without them only
    ///   tiles up to `config.free_max_zoom` can be requested
    pub fn new(config: StravaConfig, auth: Option<Arc<AuthContext>>) -> Self {
        Self { config, auth }
    }

    pub fn config(&self) -> &StravaConfig {
        &self.config
    }

    pub fn has_credentials(&self) -> bool {
        self.auth.is_some()
    }

    pub fn tier(&self, tile: &Tile) -> AccessTier {
        if tile.z <= self.config.free_max_zoom {
            AccessTier::Free
        } else {
            AccessTier::Authenticated
        }
    }

    /// Builds the request for a tile on a randomly chosen CDN host.
    pub fn request_for(&self, tile: &Tile) -> Result<TileRequest, ProviderError> {
        let server = SERVERS.choose(&mut rand::rng()).copied().unwrap_or("a");
        self.request_on(tile, server)
    }

    fn request_on(&self, tile: &Tile, server: &str) -> Result<TileRequest, ProviderError> {
        let mut query = vec![
            ("px".to_string(), self.config.tile_size.to_string()),
            ("v".to_string(), self.config.version.clone()),
        ];

        let path = match self.tier(tile) {
            AccessTier::Free => "tiles",
            AccessTier::Authenticated => {
                let auth = self
                    .auth
                    .as_ref()
                    .ok_or(ProviderError::MissingCredentials(*tile))?;
                query.push(("Key-Pair-Id".to_string(), auth.key_pair_id.clone()));
                query.push(("Signature".to_string(), auth.signature.clone()));
                query.push(("Policy".to_string(), auth.policy.clone()));
                "tiles-auth"
            }
        };

        let url = format!(
            "https://heatmap-external-{}.strava.com/{}/{}/{}/{}/{}/{}.png",
            server, path, self.config.activity, self.config.color, tile.z, tile.x, tile.y
        );

        Ok(TileRequest { url, query })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> Arc<AuthContext> {
        Arc::new(AuthContext::new("APKA123", "sig", "pol"))
    }

    #[test]
    fn test_free_tier_url() {
        let provider = StravaProvider::new(StravaConfig::default(), None);
        let request = provider.request_on(&Tile::new(298, 180, 9), "b").unwrap();

        assert_eq!(
            request.url,
            "https://heatmap-external-b.strava.com/tiles/ride/bluered/9/298/180.png"
        );
        assert_eq!(request.param("px"), Some("256"));
        assert_eq!(request.param("v"), Some("19"));
        assert!(!request.has_credentials());
    }

    #[test]
    fn test_free_tier_never_sends_credentials() {
        let provider = StravaProvider::new(StravaConfig::default(), Some(auth()));
        let request = provider.request_for(&Tile::new(1203, 723, 11)).unwrap();
        assert!(request.url.contains("/tiles/"));
        assert!(!request.has_credentials());
    }

    #[test]
    fn test_auth_tier_url_and_params() {
        let provider = StravaProvider::new(StravaConfig::default(), Some(auth()));
        let request = provider.request_on(&Tile::new(2406, 1447, 12), "c").unwrap();

        assert_eq!(
            request.url,
            "https://heatmap-external-c.strava.com/tiles-auth/ride/bluered/12/2406/1447.png"
        );
        assert_eq!(request.param("Key-Pair-Id"), Some("APKA123"));
        assert_eq!(request.param("Signature"), Some("sig"));
        assert_eq!(request.param("Policy"), Some("pol"));
        assert_eq!(request.param("px"), Some("256"));
    }

    #[test]
    fn test_auth_tier_without_credentials() {
        let provider = StravaProvider::new(StravaConfig::default(), None);
        let tile = Tile::new(2406, 1447, 12);
        assert_eq!(
            provider.request_for(&tile),
            Err(ProviderError::MissingCredentials(tile))
        );
    }

    #[test]
    fn test_provider_reports_credentials() {
        let free = StravaProvider::new(StravaConfig::default(), None);
        assert!(!free.has_credentials());
        assert_eq!(free.config(), &StravaConfig::default());

        let authed = StravaProvider::new(StravaConfig::default(), Some(auth()));
        assert!(authed.has_credentials());
    }

    #[test]
    fn test_custom_layer() {
        let config = StravaConfig {
            activity: "run".to_string(),
            color: "hot".to_string(),
            free_max_zoom: 8,
            ..StravaConfig::default()
        };
        let provider = StravaProvider::new(config, None);
        assert_eq!(provider.tier(&Tile::new(0, 0, 8)), AccessTier::Free);
        assert_eq!(provider.tier(&Tile::new(0, 0, 9)), AccessTier::Authenticated);

        let request = provider.request_on(&Tile::new(1, 2, 3), "a").unwrap();
        assert!(request.url.ends_with("/tiles/run/hot/3/1/2.png"));
    }

    #[test]
    fn test_random_server_is_valid() {
        let provider = StravaProvider::new(StravaConfig::default(), None);
        for _ in 0..50 {
            let request = provider.request_for(&Tile::new(0, 0, 1)).unwrap();
            assert!(
                request.url.starts_with("https://heatmap-external-a.")
                    || request.url.starts_with("https://heatmap-external-b.")
                    || request.url.starts_with("https://heatmap-external-c.")
            );
        }
    }
}
