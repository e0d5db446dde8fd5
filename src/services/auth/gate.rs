/*
 * Responsibility
 * - Authorization gate: header -> token -> verified claims -> permission
 * - guard(): run an operation only for an authorized caller
 *
 * Notes
 * - Holds no per-request state; one instance is shared by every route
 * - HTTP wiring lives in middleware::auth::access
 */
use std::future::Future;

use crate::services::auth::access_jwt::TokenVerifier;
use crate::services::auth::bearer::extract_bearer_token;
use crate::services::auth::claims::Claims;
use crate::services::auth::error::AuthError;

#[derive(Debug, Clone)]
pub struct AuthGate {
    verifier: TokenVerifier,
}

impl AuthGate {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Authenticate the `Authorization` header value and require `permission`.
    pub async fn authorize(
        &self,
        authorization: Option<&str>,
        permission: &str,
    ) -> Result<Claims, AuthError> {
        let token = extract_bearer_token(authorization)?;
        let claims = self.verifier.verify(token).await?;
        claims.check_permission(permission)?;

        Ok(claims)
    }

    /// Authorize, then hand the verified claims to `op`.
    ///
    /// `op` runs exactly once on success and never on failure.
    pub async fn guard<F, Fut, T>(
        &self,
        authorization: Option<&str>,
        permission: &str,
        op: F,
    ) -> Result<T, AuthError>
    where
        F: FnOnce(Claims) -> Fut,
        Fut: Future<Output = T>,
    {
        let claims = self.authorize(authorization, permission).await?;
        Ok(op(claims).await)
    }
}
