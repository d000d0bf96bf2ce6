//! Association index error types.

use crate::store::StoreError;
use thiserror::Error;

/// Errors surfaced by the association index.
#[derive(Error, Debug, Clone)]
pub enum AssocError {
    /// A stored document failed to parse. A missing key degrades to the
    /// empty default; a present-but-unparseable one fails loudly so data
    /// loss is never masked by a silent reset.
    #[error("Corrupt association document at {key}: {detail}")]
    Corrupt { key: String, detail: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for association index operations.
pub type AssocResult<T> = Result<T, AssocError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_names_the_key() {
        let err = AssocError::Corrupt {
            key: "assoc:contact:c-1".to_string(),
            detail: "expected value".to_string(),
        };
        assert!(err.to_string().contains("assoc:contact:c-1"));
    }
}
