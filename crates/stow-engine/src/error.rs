//! Error types for the graph engine.

use stow_store::StoreError;
use stow_types::{ObjectId, TypeError};

/// Errors from registry operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A class is already registered under this type tag.
    #[error("type {0:?} is already registered")]
    DuplicateRegistration(String),
}

/// Convenience alias for registry results.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that abort a `save()` or `load()`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The backend has no record for this id.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// A record names a type with no registry entry.
    #[error("no class registered for type {type_tag:?} (record {id})")]
    UnregisteredType { type_tag: String, id: ObjectId },

    /// A type rejected a record's shape or schema.
    #[error("malformed record {id}: {reason}")]
    MalformedRecord { id: ObjectId, reason: String },

    /// A record field could not be read or written.
    #[error("record error: {0}")]
    Record(#[from] TypeError),

    /// An object or record carries a different id than the one asked for.
    #[error("id mismatch: expected {expected}, found {found}")]
    IdMismatch { expected: ObjectId, found: ObjectId },

    /// A reference resolved to an object of the wrong type.
    #[error("object {id} is not a {expected}")]
    TypeMismatch { id: ObjectId, expected: &'static str },

    /// A completion asked for an id that was never loaded.
    #[error("reference to {0} was not declared as needed")]
    MissingReference(ObjectId),

    /// Registry failure.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Any other backend failure, propagated unchanged.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl EngineError {
    /// Shorthand for a type rejecting a record.
    pub fn malformed(id: &ObjectId, reason: impl Into<String>) -> Self {
        EngineError::MalformedRecord {
            id: id.clone(),
            reason: reason.into(),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => EngineError::NotFound(id),
            other => EngineError::Store(other),
        }
    }
}

/// Convenience alias for engine results.
pub type EngineResult<T> = Result<T, EngineError>;
