//! Status codes for repository failures.
//!
//! Kept as a plain `u16` so the core crate stays free of HTTP types.

use crate::lote::LoteError;

use super::RepositoryError;

/// The HTTP status a handler should answer with for `error`.
///
/// - `NotFound` -> 404 (Not Found)
/// - `AlreadyExists` -> 409 (Conflict)
/// - `ConnectionFailed` -> 503 (Service Unavailable)
/// - `QueryFailed` -> 500 (Internal Server Error)
/// - `InvalidData` -> 400 (Bad Request)
/// - `Conflict` -> 409, or 400 for an invalid batch number
/// - `Animal` -> 400 (Bad Request)
///
/// # Examples
///
/// ```
/// use lotes_core::storage::{RepositoryError, repository_error_to_status_code};
///
/// let error = RepositoryError::NotFound {
///     entity_type: "Lote",
///     id: "7".to_string(),
/// };
/// assert_eq!(repository_error_to_status_code(&error), 404);
/// ```
pub fn repository_error_to_status_code(error: &RepositoryError) -> u16 {
    match error {
        RepositoryError::NotFound { .. } => 404,
        RepositoryError::AlreadyExists { .. } => 409,
        RepositoryError::ConnectionFailed(_) => 503,
        RepositoryError::QueryFailed(_) => 500,
        RepositoryError::InvalidData(_) => 400,
        RepositoryError::Conflict(LoteError::InvalidNumber(_)) => 400,
        RepositoryError::Conflict(_) => 409,
        RepositoryError::Animal(_) => 400,
    }
}
