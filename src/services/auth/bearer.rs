//! `Authorization: Bearer <token>` header parsing.

use crate::services::auth::error::AuthError;

/// Pull the raw token out of an `Authorization` header value.
///
/// The scheme is matched case-insensitively; the token is returned exactly as
/// sent. Anything other than `<scheme> <token>` is rejected.
pub fn extract_bearer_token(authorization: Option<&str>) -> Result<&str, AuthError> {
    let header = authorization
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(AuthError::MissingHeader)?;

    let mut parts = header.split_whitespace();
    let scheme = parts.next().ok_or(AuthError::MissingHeader)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthMethod);
    }

    let token = parts.next().ok_or(AuthError::MalformedHeader)?;

    if parts.next().is_some() {
        return Err(AuthError::MalformedHeader);
    }

    Ok(token)
}
