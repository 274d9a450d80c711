//! Persistence error types

use thiserror::Error;

/// Failure reported by a registry or store
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// Backend cannot be reached or refused the operation
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// Write would violate a uniqueness or reference constraint
    #[error("constraint violated: {0}")]
    Constraint(String),
}

/// Result type for persistence operations
pub type StoreResult<T> = Result<T, StoreError>;
