/*
 * Responsibility
 * - Authorization failure modes of the bearer gate (AuthError)
 * - Machine-readable code + HTTP status per failure
 * - jsonwebtoken::errors::Error -> AuthError classification
 */
use std::fmt;

use axum::http::StatusCode;
use jsonwebtoken::{Algorithm, errors::ErrorKind};
use thiserror::Error;

use crate::services::auth::jwks::KeySetError;

/// Codes exposed to clients and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorCode {
    Unauthorized,
    InvalidAuthMethod,
    InvalidHeader,
    TokenExpired,
    InvalidClaims,
    Forbidden,
}

impl AuthErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InvalidAuthMethod => "INVALID_AUTH_METHOD",
            Self::InvalidHeader => "INVALID_HEADER",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::InvalidClaims => "INVALID_CLAIMS",
            Self::Forbidden => "FORBIDDEN",
        }
    }
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every way the gate can refuse a request.
///
/// The `Display` text is the client-facing description; the code and
/// status come from [`AuthError::code`] and [`AuthError::status`].
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No Authorization header supplied.")]
    MissingHeader,

    #[error("Authorization method must be Bearer.")]
    InvalidAuthMethod,

    #[error("Authorization header must be in the form 'Bearer <token>'.")]
    MalformedHeader,

    #[error("Authorization malformed.")]
    MissingKeyId,

    #[error("Unable to find the appropriate key.")]
    KeyNotFound,

    #[error("Unable to fetch signing keys.")]
    KeySetUnavailable(#[source] KeySetError),

    #[error("Token algorithm {0:?} is not accepted.")]
    UnsupportedAlgorithm(Algorithm),

    #[error("Token expired.")]
    TokenExpired,

    #[error("Incorrect claims. Please, check the audience and issuer.")]
    InvalidClaims(#[source] jsonwebtoken::errors::Error),

    #[error("Unable to parse authentication token.")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),

    #[error("Permissions are not included in the JWT token.")]
    PermissionsMissing,

    #[error("User does not have enough permissions to complete the operation. Required: {0}")]
    Forbidden(String),
}

impl AuthError {
    pub fn code(&self) -> AuthErrorCode {
        match self {
            Self::MissingHeader | Self::KeySetUnavailable(_) => AuthErrorCode::Unauthorized,
            Self::InvalidAuthMethod => AuthErrorCode::InvalidAuthMethod,
            Self::MalformedHeader
            | Self::MissingKeyId
            | Self::KeyNotFound
            | Self::UnsupportedAlgorithm(_)
            | Self::InvalidToken(_) => AuthErrorCode::InvalidHeader,
            Self::TokenExpired => AuthErrorCode::TokenExpired,
            Self::InvalidClaims(_) | Self::PermissionsMissing => AuthErrorCode::InvalidClaims,
            Self::Forbidden(_) => AuthErrorCode::Forbidden,
        }
    }

    /// Status depends on the stage that failed, not only on the code:
    /// header-level problems are 401, token/key problems the caller can fix are 400.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingHeader
            | Self::InvalidAuthMethod
            | Self::MalformedHeader
            | Self::MissingKeyId
            | Self::KeySetUnavailable(_)
            | Self::TokenExpired
            | Self::InvalidClaims(_) => StatusCode::UNAUTHORIZED,
            Self::KeyNotFound
            | Self::UnsupportedAlgorithm(_)
            | Self::InvalidToken(_)
            | Self::PermissionsMissing => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        if matches!(e.kind(), ErrorKind::ExpiredSignature) {
            return Self::TokenExpired;
        }

        let claims_rejected = matches!(
            e.kind(),
            ErrorKind::InvalidAudience
                | ErrorKind::InvalidIssuer
                | ErrorKind::InvalidSubject
                | ErrorKind::ImmatureSignature
                | ErrorKind::MissingRequiredClaim(_)
        );

        if claims_rejected {
            Self::InvalidClaims(e)
        } else {
            Self::InvalidToken(e)
        }
    }
}
