//! Bearer access token check → verified `Claims` in request extensions.
//!
//! Attached per route with the permission that route needs:
//! ```ignore
//! .route("/drinks-detail", requires_auth(&state, GET_DRINKS_DETAIL, get(list_drinks_detail)))
//! ```
//! Handlers receive the claims through the `AuthClaims` extractor.
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};

use crate::error::AppError;
use crate::services::auth::{AuthError, AuthGate};
use crate::state::AppState;

/// Middleware state: the shared gate plus the permission this route requires.
#[derive(Clone)]
struct RequiredPermission {
    gate: Arc<AuthGate>,
    permission: &'static str,
}

/// Wrap `route` so it only runs for callers holding `permission`.
pub fn requires_auth<S>(
    state: &AppState,
    permission: &'static str,
    route: MethodRouter<S>,
) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    let required = RequiredPermission {
        gate: state.auth.clone(),
        permission,
    };

    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    route.route_layer(middleware::from_fn_with_state(required, access_middleware))
}

async fn access_middleware(
    State(required): State<RequiredPermission>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let authorization = match req.headers().get(header::AUTHORIZATION) {
        None => None,
        Some(value) => match value.to_str() {
            Ok(s) => Some(s.to_owned()),
            Err(_) => return Err(reject(AuthError::MalformedHeader, required.permission)),
        },
    };

    let claims = required
        .gate
        .authorize(authorization.as_deref(), required.permission)
        .await
        .map_err(|err| reject(err, required.permission))?;

    tracing::debug!(
        subject = claims.subject().unwrap_or("-"),
        permission = required.permission,
        "request authorized"
    );

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

fn reject(err: AuthError, permission: &str) -> AppError {
    if matches!(err, AuthError::KeySetUnavailable(_)) {
        tracing::error!(error = ?err, permission, "signing keys unavailable");
    } else {
        tracing::warn!(
            code = %err.code(),
            status = err.status().as_u16(),
            permission,
            error = %err,
            "authorization failed"
        );
    }

    AppError::Auth(err)
}
