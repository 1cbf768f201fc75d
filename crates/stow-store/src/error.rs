use stow_types::{ObjectId, TypeError};

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// The caller's stow token no longer matches what the backend holds.
    #[error("write conflict for {id}: expected {expected}, found {actual}")]
    Conflict {
        id: ObjectId,
        expected: String,
        actual: String,
    },

    /// The id cannot be stored by this backend.
    #[error("invalid id {id}: {reason}")]
    InvalidId { id: ObjectId, reason: String },

    /// The id pattern could not be compiled.
    #[error("invalid id pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Stored data could not be decoded into a record.
    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: ObjectId, reason: String },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure (poisoned lock, failed task, remote error).
    #[error("backend error: {0}")]
    Backend(String),
}

impl From<TypeError> for StoreError {
    fn from(err: TypeError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
