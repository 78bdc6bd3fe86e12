use thiserror::Error;

use crate::animal::AnimalError;
use crate::lote::LoteError;

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    /// A batch rule refused the operation.
    #[error(transparent)]
    Conflict(#[from] LoteError),
    /// An edit was refused.
    #[error(transparent)]
    Animal(#[from] AnimalError),
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
