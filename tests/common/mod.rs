#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use coffee_shop_api::{
    app::build_router,
    repos::InMemoryDrinkRepo,
    services::auth::{AuthGate, AuthSettings, TokenVerifier, jwks::StaticKeySet},
    state::AppState,
};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};
use tokio::{net::TcpListener, task::JoinHandle};
use tower::ServiceExt;

pub const SIGNING_KEY_PEM: &str = include_str!("../fixtures/signing_key.pem");
pub const FOREIGN_KEY_PEM: &str = include_str!("../fixtures/foreign_key.pem");
pub const JWKS: &str = include_str!("../fixtures/jwks.json");

pub const KID: &str = "coffee-key-1";
pub const ISSUER: &str = "https://coffee-shop.test.auth0.com/";
pub const AUDIENCE: &str = "drinks";

pub fn settings() -> AuthSettings {
    AuthSettings {
        issuer: ISSUER.to_string(),
        audience: AUDIENCE.to_string(),
        algorithms: vec![Algorithm::RS256],
        leeway_seconds: 0,
    }
}

/// Router over an in-memory store, verifying tokens against the fixture key set.
pub fn test_app() -> Router {
    let keys = StaticKeySet::from_json(JWKS).expect("jwks fixture");
    let gate = AuthGate::new(TokenVerifier::new(&settings(), Arc::new(keys)));
    app_with_gate(Arc::new(gate))
}

pub fn app_with_gate(gate: Arc<AuthGate>) -> Router {
    let state = AppState::new(Arc::new(InMemoryDrinkRepo::new()), gate);
    build_router(state)
}

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn claims(permissions: &[&str]) -> Value {
    let now = now();
    json!({
        "iss": ISSUER,
        "aud": AUDIENCE,
        "sub": "auth0|manager",
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

pub fn token_with(permissions: &[&str]) -> String {
    mint(&claims(permissions))
}

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.expect("response");
    let status = res.status();
    (status, read_json(res).await)
}

pub async fn spawn(app: Router) -> (SocketAddr, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, handle)
}
