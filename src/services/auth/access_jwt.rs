use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, Header, Validation};
use serde_json::{Map, Value};

use crate::services::auth::claims::Claims;
use crate::services::auth::error::AuthError;
use crate::services::auth::jwks::KeySetSource;

/// What a token must satisfy besides a valid signature.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    // Expected `iss`, e.g. `https://tenant.eu.auth0.com/`
    pub issuer: String,
    // Expected `aud`
    pub audience: String,
    // Accepted signing algorithms (asymmetric only)
    pub algorithms: Vec<Algorithm>,
    // Allowed clock skew for `exp` / `nbf`, seconds
    pub leeway_seconds: u64,
}

/// Access-token verifier backed by the issuer's JWKS.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct TokenVerifier {
    keys: Arc<dyn KeySetSource>,
    algorithms: Vec<Algorithm>,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("keys", &self.keys.source_name())
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(settings: &AuthSettings, keys: Arc<dyn KeySetSource>) -> Self {
        let primary = settings
            .algorithms
            .first()
            .copied()
            .unwrap_or(Algorithm::RS256);

        let mut validation = Validation::new(primary);
        validation.set_issuer(&[settings.issuer.as_str()]);
        validation.set_audience(&[settings.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.validate_nbf = true;
        validation.leeway = settings.leeway_seconds;

        Self {
            keys,
            algorithms: settings.algorithms.clone(),
            validation,
        }
    }

    pub fn key_source(&self) -> &'static str {
        self.keys.source_name()
    }

    /// Find the public key named by the token header's `kid`.
    ///
    /// On a miss the source gets one chance to produce a newer key set
    /// (rotation) before the token is rejected.
    pub async fn resolve_key(&self, header: &Header) -> Result<DecodingKey, AuthError> {
        let kid = header.kid.as_deref().ok_or(AuthError::MissingKeyId)?;

        let keys = self
            .keys
            .key_set()
            .await
            .map_err(AuthError::KeySetUnavailable)?;

        if let Some(jwk) = keys.find(kid) {
            return DecodingKey::from_jwk(jwk).map_err(AuthError::InvalidToken);
        }

        let refreshed = self
            .keys
            .refresh_stale(&keys)
            .await
            .map_err(AuthError::KeySetUnavailable)?
            .ok_or(AuthError::KeyNotFound)?;

        let jwk = refreshed.find(kid).ok_or(AuthError::KeyNotFound)?;
        DecodingKey::from_jwk(jwk).map_err(AuthError::InvalidToken)
    }

    /// Verify signature, `iss`, `aud`, `exp` (and `nbf` when present), then
    /// return the full payload.
    ///
    /// `jsonwebtoken::Validation` checks:
    /// - signature against the resolved key
    /// - `exp` / `nbf` with the configured leeway
    /// - `iss` and `aud` (because we set them)
    pub async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let header = jsonwebtoken::decode_header(token).map_err(AuthError::InvalidToken)?;

        if !self.algorithms.contains(&header.alg) {
            return Err(AuthError::UnsupportedAlgorithm(header.alg));
        }

        let key = self.resolve_key(&header).await?;

        // jsonwebtoken requires every listed algorithm to match the key family,
        // so pin validation to the one this token uses.
        let mut validation = self.validation.clone();
        validation.algorithms = vec![header.alg];

        let data = jsonwebtoken::decode::<Map<String, Value>>(token, &key, &validation)?;

        Ok(Claims::new(data.claims))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use jsonwebtoken::jwk::JwkSet;
    use serde_json::json;

    use super::*;
    use crate::services::auth::error::AuthErrorCode;
    use crate::services::auth::jwks::{CachedKeySet, KeySetResult, StaticKeySet};
    use crate::services::auth::test_support::{
        AUDIENCE, FOREIGN_KEY_PEM, ISSUER, JWKS, KID, PublishingSource, SIGNING_KEY_PEM, mint,
        mint_hs256, mint_with, now, settings, valid_claims, verifier,
    };

    #[tokio::test]
    async fn round_trip_returns_the_minted_claims() {
        let claims = valid_claims(&["get:drinks-detail"]);
        let token = mint(&claims);

        let verified = verifier().verify(&token).await.expect("valid token");

        assert_eq!(Value::Object(verified.into_inner()), claims);
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let mut claims = valid_claims(&[]);
        claims["exp"] = json!(now() - 3600);

        let err = verifier().verify(&mint(&claims)).await.unwrap_err();

        assert!(matches!(err, AuthError::TokenExpired));
        assert_eq!(err.code(), AuthErrorCode::TokenExpired);
    }

    #[tokio::test]
    async fn wrong_audience_or_issuer_is_invalid_claims() {
        let mut wrong_aud = valid_claims(&[]);
        wrong_aud["aud"] = json!("another-api");
        let err = verifier().verify(&mint(&wrong_aud)).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidClaims(_)), "{err:?}");

        let mut wrong_iss = valid_claims(&[]);
        wrong_iss["iss"] = json!("https://evil.example.com/");
        let err = verifier().verify(&mint(&wrong_iss)).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidClaims(_)), "{err:?}");
    }

    #[tokio::test]
    async fn missing_audience_is_invalid_claims() {
        let mut claims = valid_claims(&[]);
        claims.as_object_mut().expect("object").remove("aud");

        let err = verifier().verify(&mint(&claims)).await.unwrap_err();

        assert_eq!(err.code(), AuthErrorCode::InvalidClaims);
    }

    #[tokio::test]
    async fn signature_from_another_key_is_invalid_header() {
        // Same kid, different private key.
        let token = mint_with(FOREIGN_KEY_PEM, Some(KID), &valid_claims(&[]));

        let err = verifier().verify(&token).await.unwrap_err();

        assert!(matches!(err, AuthError::InvalidToken(_)), "{err:?}");
        assert_eq!(err.code(), AuthErrorCode::InvalidHeader);
    }

    #[tokio::test]
    async fn unknown_kid_is_invalid_header() {
        let token = mint_with(SIGNING_KEY_PEM, Some("rotated-away"), &valid_claims(&[]));

        let err = verifier().verify(&token).await.unwrap_err();

        assert!(matches!(err, AuthError::KeyNotFound));
        assert_eq!(err.code(), AuthErrorCode::InvalidHeader);
    }

    #[tokio::test]
    async fn missing_kid_is_invalid_header() {
        let token = mint_with(SIGNING_KEY_PEM, None, &valid_claims(&[]));

        let err = verifier().verify(&token).await.unwrap_err();

        assert!(matches!(err, AuthError::MissingKeyId));
        assert_eq!(err.code(), AuthErrorCode::InvalidHeader);
    }

    #[tokio::test]
    async fn symmetric_algorithm_is_not_accepted() {
        let token = mint_hs256(&valid_claims(&[]));

        let err = verifier().verify(&token).await.unwrap_err();

        assert!(matches!(err, AuthError::UnsupportedAlgorithm(Algorithm::HS256)));
    }

    #[tokio::test]
    async fn garbage_is_invalid_header() {
        for token in ["not-a-jwt", "a.b.c", ""] {
            let err = verifier().verify(token).await.unwrap_err();
            assert!(matches!(err, AuthError::InvalidToken(_)), "{token}: {err:?}");
        }
    }

    #[tokio::test]
    async fn future_nbf_is_invalid_claims() {
        let mut claims = valid_claims(&[]);
        claims["nbf"] = json!(now() + 3600);

        let err = verifier().verify(&mint(&claims)).await.unwrap_err();

        assert_eq!(err.code(), AuthErrorCode::InvalidClaims);
    }

    /// First serves an empty set, then the real one after a refresh, like an
    /// issuer that rotated keys after our last fetch.
    struct RotatingSource {
        refreshes: AtomicUsize,
        before: Arc<JwkSet>,
        after: Arc<JwkSet>,
    }

    #[async_trait]
    impl KeySetSource for RotatingSource {
        fn source_name(&self) -> &'static str {
            "rotating"
        }

        async fn key_set(&self) -> KeySetResult<Arc<JwkSet>> {
            Ok(self.before.clone())
        }

        async fn refresh_stale(&self, _stale: &Arc<JwkSet>) -> KeySetResult<Option<Arc<JwkSet>>> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            Ok(Some(self.after.clone()))
        }
    }

    #[tokio::test]
    async fn kid_miss_retries_against_a_refreshed_set() {
        let source = Arc::new(RotatingSource {
            refreshes: AtomicUsize::new(0),
            before: Arc::new(JwkSet { keys: Vec::new() }),
            after: Arc::new(serde_json::from_str(JWKS).expect("fixture")),
        });
        let verifier = TokenVerifier::new(&settings(), source.clone());

        let claims = verifier
            .verify(&mint(&valid_claims(&["post:drinks"])))
            .await
            .expect("accepted after refresh");

        assert_eq!(claims.get("aud"), Some(&json!(AUDIENCE)));
        assert_eq!(source.refreshes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn key_published_after_the_cached_fetch_is_accepted() {
        // Default cache settings: 300 s TTL, 5 s between miss-driven fetches.
        let (source, fetches) = PublishingSource::new();
        let cache = CachedKeySet::new(source, Duration::from_secs(300), Duration::from_secs(5));
        let verifier = TokenVerifier::new(&settings(), Arc::new(cache));

        let claims = verifier
            .verify(&mint(&valid_claims(&["get:drinks-detail"])))
            .await
            .expect("accepted after the rotation");

        assert_eq!(claims.get("iss"), Some(&json!(ISSUER)));
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn debug_output_hides_key_material() {
        let keys = Arc::new(StaticKeySet::from_json(JWKS).expect("jwks"));
        let verifier = TokenVerifier::new(&settings(), keys);
        let printed = format!("{verifier:?}");

        assert!(printed.contains("static"));
        assert!(printed.contains(ISSUER));
        assert!(!printed.contains("AQAB"));
    }
}
