/// Factory: build `AuthGate` from application `AuthConfig`.
use std::sync::Arc;

use crate::config::AuthConfig;
use crate::services::auth::access_jwt::TokenVerifier;
use crate::services::auth::gate::AuthGate;
use crate::services::auth::jwks::{CachedKeySet, HttpKeySet, KeySetResult, KeySetSource};

pub fn build_auth_gate(config: &AuthConfig) -> KeySetResult<Arc<AuthGate>> {
    let http = HttpKeySet::new(config.jwks_url.clone(), config.jwks_fetch_timeout)?;

    // TTL 0: fetch the key set on every verification.
    let keys: Arc<dyn KeySetSource> = if config.jwks_cache_ttl.is_zero() {
        Arc::new(http)
    } else {
        Arc::new(CachedKeySet::new(
            http,
            config.jwks_cache_ttl,
            config.jwks_min_refresh,
        ))
    };

    tracing::info!(
        issuer = %config.issuer,
        audience = %config.audience,
        jwks_url = %config.jwks_url,
        key_source = keys.source_name(),
        "auth gate configured"
    );

    let verifier = TokenVerifier::new(&config.settings(), keys);

    Ok(Arc::new(AuthGate::new(verifier)))
}
