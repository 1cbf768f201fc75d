//! Foundation types for Stow.
//!
//! This crate provides the identity and wire-format types shared by every
//! other Stow crate. It has no notion of storage backends or object graphs.
//!
//! # Key Types
//!
//! - [`ObjectId`] — Stable, globally-unique identifier of a persisted object
//! - [`SerializedRecord`] — The JSON-compatible wire form `{type, id, schema, ...fields}`

pub mod error;
pub mod object;
pub mod record;

pub use error::TypeError;
pub use object::ObjectId;
pub use record::SerializedRecord;
