pub mod access_jwt;
pub mod bearer;
pub mod claims;
pub mod error;
pub mod factory;
pub mod gate;
pub mod jwks;

#[cfg(test)]
pub(crate) mod test_support;

pub use access_jwt::{AuthSettings, TokenVerifier};
pub use claims::Claims;
pub use error::{AuthError, AuthErrorCode};
pub use factory::build_auth_gate;
pub use gate::AuthGate;
