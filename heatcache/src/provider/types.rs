//! Provider types

use std::fmt;

use thiserror::Error;

use crate::coord::Tile;

/// Query keys that carry CloudFront credentials.
pub(crate) const CREDENTIAL_KEYS: [&str; 3] = ["Key-Pair-Id", "Signature", "Policy"];

/// A fully built tile request: URL plus query parameters.
///
/// `Debug` prints only the query keys; values may be signed credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct TileRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
}

impl TileRequest {
    /// Returns the value of a query parameter.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether any credential parameter is attached.
    pub fn has_credentials(&self) -> bool {
        self.query
            .iter()
            .any(|(k, _)| CREDENTIAL_KEYS.contains(&k.as_str()))
    }
}

impl fmt::Debug for TileRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.query.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("TileRequest")
            .field("url", &self.url)
            .field("query_keys", &keys)
            .finish()
    }
}

/// CloudFront signed-cookie triple required above the free zoom threshold.
///
/// Loaded once from configuration and shared read-only.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub key_pair_id: String,
    pub signature: String,
    pub policy: String,
}

impl AuthContext {
    pub fn new(
        key_pair_id: impl Into<String>,
        signature: impl Into<String>,
        policy: impl Into<String>,
    ) -> Self {
        Self {
            key_pair_id: key_pair_id.into(),
            signature: signature.into(),
            policy: policy.into(),
        }
    }
}

impl fmt::Debug for AuthContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthContext")
            .field("key_pair_id", &self.key_pair_id)
            .field("signature", &"<redacted>")
            .field("policy", &"<redacted>")
            .finish()
    }
}

/// Failure to obtain any HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Could not connect, or the connection was dropped
    #[error("connection failed: {0}")]
    Connect(String),

    /// No response within the request timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The HTTP client itself could not be constructed
    #[error("{0}")]
    Client(String),

    #[error("request failed: {0}")]
    Other(String),
}

/// Errors raised while building a request for a tile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// Tile is in the authenticated tier but no credentials were configured
    #[error("{0} requires CloudFront credentials, none configured")]
    MissingCredentials(Tile),
}
