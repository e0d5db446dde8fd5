/*
 * Responsibility
 * - Verified claims payload handed to protected handlers
 * - Permission check against the `permissions` claim
 *
 * Notes
 * - A Claims value only comes out of TokenVerifier::verify; it is never cached
 */
use serde_json::{Map, Value};

use crate::services::auth::error::AuthError;

const PERMISSIONS_CLAIM: &str = "permissions";

/// Decoded payload of a token that passed signature and claims verification.
#[derive(Debug, Clone, PartialEq)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn subject(&self) -> Option<&str> {
        self.0.get("sub").and_then(Value::as_str)
    }

    /// String entries of the `permissions` claim, or `None` when the claim is
    /// absent or not an array.
    pub fn permissions(&self) -> Option<Vec<&str>> {
        self.0
            .get(PERMISSIONS_CLAIM)
            .and_then(Value::as_array)
            .map(|granted| granted.iter().filter_map(Value::as_str).collect())
    }

    /// Require `permission` to be listed verbatim in the `permissions` claim.
    ///
    /// An absent claim and an empty one fail differently: the former means the
    /// issuer is not configured for RBAC (`INVALID_CLAIMS`), the latter that
    /// the caller simply lacks the grant (`FORBIDDEN`).
    pub fn check_permission(&self, permission: &str) -> Result<(), AuthError> {
        let granted = self.permissions().ok_or(AuthError::PermissionsMissing)?;

        if granted.contains(&permission) {
            Ok(())
        } else {
            Err(AuthError::Forbidden(permission.to_string()))
        }
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}
