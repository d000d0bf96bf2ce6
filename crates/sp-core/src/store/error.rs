//! Association store error types.

use thiserror::Error;

/// Errors surfaced by an association store backend.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// The backend rejected or failed the operation.
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
