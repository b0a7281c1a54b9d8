//! Tile provider abstraction
//!
//! Builds requests for the Strava heatmap and sends them through an
//! [`AsyncHttpClient`], which tests replace with a scripted mock.

mod http;
mod strava;
mod types;

pub use http::{AsyncHttpClient, HttpResponse, ReqwestClient, DEFAULT_TIMEOUT_SECS};
pub use strava::{AccessTier, StravaConfig, StravaProvider, DEFAULT_FREE_MAX_ZOOM};
pub use types::{AuthContext, ProviderError, TileRequest, TransportError};

#[cfg(test)]
pub use http::tests::{url_path, MockHttpClient, MockReply};
