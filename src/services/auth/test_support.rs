//! Shared fixtures for the auth unit tests.
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};

use crate::services::auth::access_jwt::{AuthSettings, TokenVerifier};
use crate::services::auth::gate::AuthGate;
use crate::services::auth::jwks::{KeySetResult, KeySetSource, StaticKeySet};

pub const SIGNING_KEY_PEM: &str = include_str!("../../../tests/fixtures/signing_key.pem");
pub const FOREIGN_KEY_PEM: &str = include_str!("../../../tests/fixtures/foreign_key.pem");
pub const JWKS: &str = include_str!("../../../tests/fixtures/jwks.json");

pub const KID: &str = "coffee-key-1";
pub const ISSUER: &str = "https://coffee-shop.test.auth0.com/";
pub const AUDIENCE: &str = "drinks";

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn settings() -> AuthSettings {
    AuthSettings {
        issuer: ISSUER.to_string(),
        audience: AUDIENCE.to_string(),
        algorithms: vec![Algorithm::RS256],
        leeway_seconds: 0,
    }
}

pub fn verifier() -> TokenVerifier {
    let keys = StaticKeySet::from_json(JWKS).expect("jwks fixture");
    TokenVerifier::new(&settings(), Arc::new(keys))
}

pub fn gate() -> AuthGate {
    AuthGate::new(verifier())
}

pub fn valid_claims(permissions: &[&str]) -> Value {
    let now = now();
    json!({
        "iss": ISSUER,
        "aud": AUDIENCE,
        "sub": "auth0|barista",
        "iat": now,
        "exp": now + 3600,
        "permissions": permissions,
    })
}

pub fn mint_with(pem: &str, kid: Option<&str>, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(pem.as_bytes()).expect("rsa pem");
    jsonwebtoken::encode(&header, claims, &key).expect("encode")
}

pub fn mint(claims: &Value) -> String {
    mint_with(SIGNING_KEY_PEM, Some(KID), claims)
}

pub fn mint_hs256(claims: &Value) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(KID.to_string());
    let key = EncodingKey::from_secret(b"shared-secret");
    jsonwebtoken::encode(&header, claims, &key).expect("encode")
}

/// Issuer that rotates in the fixture key right after the first fetch: the
/// first response is an empty set, every later one carries `KID`.
pub struct PublishingSource {
    pub fetches: Arc<AtomicUsize>,
}

impl PublishingSource {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let fetches = Arc::new(AtomicUsize::new(0));
        (
            Self {
                fetches: fetches.clone(),
            },
            fetches,
        )
    }
}

#[async_trait]
impl KeySetSource for PublishingSource {
    fn source_name(&self) -> &'static str {
        "publishing"
    }

    async fn key_set(&self) -> KeySetResult<Arc<JwkSet>> {
        let keys = if self.fetches.fetch_add(1, Ordering::SeqCst) == 0 {
            JwkSet { keys: Vec::new() }
        } else {
            serde_json::from_str(JWKS).expect("jwks fixture")
        };
        Ok(Arc::new(keys))
    }
}
