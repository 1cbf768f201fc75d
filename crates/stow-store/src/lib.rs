//! Storage backends for Stow.
//!
//! This crate defines the [`Store`] contract the graph engine persists
//! through, and ships two implementations of it. A store is a flat key/value
//! map from [`ObjectId`](stow_types::ObjectId) to
//! [`SerializedRecord`](stow_types::SerializedRecord); it never looks at the
//! references between records.
//!
//! # Storage Backends
//!
//! - [`InMemoryStore`] -- `HashMap`-based store for tests and embedding,
//!   stow is a [`Revision`] counter
//! - [`FileStore`] -- one JSON file per record, stow is a [`ContentHash`]
//!
//! # Design Rules
//!
//! 1. `put` is an idempotent overwrite and always returns a stow.
//! 2. A stow presented to `put` that no longer matches the backend's state
//!    is a [`StoreError::Conflict`]; an absent stow overwrites.
//! 3. `get_ids` patterns use the same glob dialect on every backend.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod file;
pub mod memory;
pub mod pattern;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use file::{ContentHash, FileStore, FileStoreConfig};
pub use memory::{InMemoryStore, Revision};
pub use pattern::IdPattern;
pub use traits::{Store, Stowed};
