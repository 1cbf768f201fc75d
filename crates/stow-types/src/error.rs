use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("object id must not be empty")]
    EmptyId,

    #[error("invalid id prefix {0:?}: must be non-empty and contain no '_'")]
    InvalidPrefix(String),

    #[error("record {id} is missing field {field:?}")]
    MissingField { id: String, field: String },

    #[error("record {id} has invalid field {field:?}: {reason}")]
    InvalidField {
        id: String,
        field: String,
        reason: String,
    },

    #[error("field name {0:?} is reserved for the record envelope")]
    ReservedField(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
