use crate::error::AppError;

/// Any path without a route.
pub async fn not_found() -> AppError {
    AppError::NotFound
}
