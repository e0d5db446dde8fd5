//! Key-set source interface used by the token verifier.
use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use thiserror::Error;

/// Result type for key-set lookups.
pub type KeySetResult<T> = Result<T, KeySetError>;

/// Failures while obtaining the issuer's public keys.
///
/// Kept apart from `AuthError` so the verifier decides how a missing key set
/// surfaces to clients.
#[derive(Debug, Error)]
pub enum KeySetError {
    #[error("key set request failed: {0}")]
    Http(#[from] reqwest::Error),

    // One failed fetch, handed to every request that waited on it.
    #[error(transparent)]
    Shared(Arc<KeySetError>),
}

/// Where signing keys come from.
///
/// Implementations must be shareable across concurrent requests.
#[async_trait]
pub trait KeySetSource: Send + Sync + 'static {
    // Source name (for logging).
    fn source_name(&self) -> &'static str;

    // Current key set. May be served from a cache.
    async fn key_set(&self) -> KeySetResult<Arc<JwkSet>>;

    // Called after a `kid` miss against `stale`.
    //
    // Returns:
    // - `Ok(Some(_))` a newer key set worth searching again
    // - `Ok(None)`    nothing newer is available (sources without a cache)
    async fn refresh_stale(&self, _stale: &Arc<JwkSet>) -> KeySetResult<Option<Arc<JwkSet>>> {
        Ok(None)
    }
}

/// A fixed key set supplied up front (local keys, tests).
#[derive(Debug, Clone)]
pub struct StaticKeySet {
    keys: Arc<JwkSet>,
}

impl StaticKeySet {
    pub fn new(keys: JwkSet) -> Self {
        Self {
            keys: Arc::new(keys),
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json).map(Self::new)
    }
}

#[async_trait]
impl KeySetSource for StaticKeySet {
    fn source_name(&self) -> &'static str {
        "static"
    }

    async fn key_set(&self) -> KeySetResult<Arc<JwkSet>> {
        Ok(self.keys.clone())
    }
}
