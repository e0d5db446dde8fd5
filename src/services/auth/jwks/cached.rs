//! TTL cache in front of another key-set source.
//!
//! - Reads share an `RwLock`; fetches are single-flight behind a `Mutex`. Every
//!   request that waited on an in-flight fetch takes its outcome, failure
//!   included, so a burst on an expired entry results in one upstream fetch.
//! - A `kid` miss always forces one re-fetch (key rotation). A further miss
//!   against a set that was itself fetched for a miss is answered from the
//!   cache until it is `min_refresh_interval` old. Unknown `kid`s cannot drive
//!   unbounded traffic to the issuer.
//! - Failed fetches are not cached for later requests.
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use tokio::sync::{Mutex, RwLock};

use crate::services::auth::jwks::source::{KeySetError, KeySetResult, KeySetSource};

type FetchOutcome = Result<Arc<JwkSet>, Arc<KeySetError>>;

struct CachedEntry {
    keys: Arc<JwkSet>,
    fetched_at: Instant,
    // Fetched because a token named a `kid` the previous set lacked.
    after_miss: bool,
}

pub struct CachedKeySet<S: KeySetSource> {
    inner: S,
    ttl: Duration,
    min_refresh_interval: Duration,
    entry: RwLock<Option<CachedEntry>>,
    // Held for the duration of an upstream fetch; keeps the latest outcome.
    refresh: Mutex<Option<FetchOutcome>>,
    // Bumped (under `refresh`) after every upstream fetch.
    completed_fetches: AtomicU64,
}

impl<S: KeySetSource> std::fmt::Debug for CachedKeySet<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedKeySet")
            .field("inner", &self.inner.source_name())
            .field("ttl", &self.ttl)
            .field("min_refresh_interval", &self.min_refresh_interval)
            .finish()
    }
}

impl<S: KeySetSource> CachedKeySet<S> {
    pub fn new(inner: S, ttl: Duration, min_refresh_interval: Duration) -> Self {
        Self {
            inner,
            ttl,
            min_refresh_interval,
            entry: RwLock::new(None),
            refresh: Mutex::new(None),
            completed_fetches: AtomicU64::new(0),
        }
    }

    async fn fresh(&self) -> Option<Arc<JwkSet>> {
        let entry = self.entry.read().await;
        entry
            .as_ref()
            .filter(|e| e.fetched_at.elapsed() < self.ttl)
            .map(|e| e.keys.clone())
    }

    // `last` is the guard of `self.refresh`.
    async fn fetch_and_store(
        &self,
        last: &mut Option<FetchOutcome>,
        after_miss: bool,
    ) -> KeySetResult<Arc<JwkSet>> {
        let outcome = match self.inner.key_set().await {
            Ok(keys) => {
                *self.entry.write().await = Some(CachedEntry {
                    keys: keys.clone(),
                    fetched_at: Instant::now(),
                    after_miss,
                });
                Ok(keys)
            }
            Err(err) => Err(Arc::new(err)),
        };

        *last = Some(outcome.clone());
        self.completed_fetches.fetch_add(1, Ordering::Release);

        outcome.map_err(KeySetError::Shared)
    }
}

#[async_trait]
impl<S: KeySetSource> KeySetSource for CachedKeySet<S> {
    fn source_name(&self) -> &'static str {
        "cached"
    }

    async fn key_set(&self) -> KeySetResult<Arc<JwkSet>> {
        if let Some(keys) = self.fresh().await {
            return Ok(keys);
        }

        let seen = self.completed_fetches.load(Ordering::Acquire);
        let mut last = self.refresh.lock().await;

        // A fetch finished while we waited for the lock: take its outcome.
        if self.completed_fetches.load(Ordering::Acquire) != seen {
            if let Some(outcome) = last.as_ref() {
                return outcome.clone().map_err(KeySetError::Shared);
            }
        }

        if let Some(keys) = self.fresh().await {
            return Ok(keys);
        }

        tracing::debug!(source = self.inner.source_name(), "key set cache miss");
        self.fetch_and_store(&mut last, false).await
    }

    async fn refresh_stale(&self, stale: &Arc<JwkSet>) -> KeySetResult<Option<Arc<JwkSet>>> {
        let seen = self.completed_fetches.load(Ordering::Acquire);
        let mut last = self.refresh.lock().await;

        {
            let entry = self.entry.read().await;
            if let Some(current) = entry.as_ref() {
                if !Arc::ptr_eq(&current.keys, stale) {
                    return Ok(Some(current.keys.clone()));
                }
                if current.after_miss && current.fetched_at.elapsed() < self.min_refresh_interval
                {
                    return Ok(None);
                }
            }
        }

        if self.completed_fetches.load(Ordering::Acquire) != seen {
            if let Some(Err(err)) = last.as_ref() {
                return Err(KeySetError::Shared(err.clone()));
            }
        }

        tracing::info!(
            source = self.inner.source_name(),
            "unknown key id, refreshing key set"
        );
        self.fetch_and_store(&mut last, true).await.map(Some)
    }
}
