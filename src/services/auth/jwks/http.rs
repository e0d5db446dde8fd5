//! Issuer JWKS endpoint client.
//!
//! One GET per call, bounded by the configured timeout. No retries: a failed
//! fetch fails the request that needed it.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use reqwest::header::ACCEPT;
use url::Url;

use crate::services::auth::jwks::source::{KeySetResult, KeySetSource};

#[derive(Debug, Clone)]
pub struct HttpKeySet {
    client: reqwest::Client,
    url: Url,
}

impl HttpKeySet {
    pub fn new(url: Url, timeout: Duration) -> KeySetResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl KeySetSource for HttpKeySet {
    fn source_name(&self) -> &'static str {
        "http"
    }

    async fn key_set(&self) -> KeySetResult<Arc<JwkSet>> {
        let keys: JwkSet = self
            .client
            .get(self.url.clone())
            .header(ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        tracing::debug!(url = %self.url, keys = keys.keys.len(), "fetched issuer key set");

        Ok(Arc::new(keys))
    }
}
