//! Object-graph persistence for Stow.
//!
//! This crate saves and loads graphs of domain objects that reference one
//! another, over any [`Store`](stow_store::Store) backend. The backend
//! stores flat records; this crate owns the graph walk.
//!
//! # Contracts
//!
//! - [`Serializable`] -- per-instance identity and `serialize`
//! - [`SerializableType`] -- per-type tag and `deserialize`
//! - [`Registry`] -- explicit type-tag to [`TypeClass`] table used by `load`
//! - [`StowSlot`] -- optional holder for backend stow on a live object
//!
//! # Engine
//!
//! [`GraphStore`] provides `save` (breadth-first, dedup by id) and `load`
//! (two-pass, cycle safe). See the [`graph`] module docs for the algorithms.
//!
//! # Invariants
//!
//! - An object reachable from a `save` root is written at most once per call.
//! - An object is deserialized at most once per `load` call, and every path
//!   to it resolves to the same `Arc`.
//! - Completions run only after the full transitive closure is in memory.
//! - Any failure aborts the whole call; `save` does not roll back.

pub mod error;
pub mod graph;
pub mod map;
pub mod object;
pub mod registry;

#[cfg(test)]
mod testing;

pub use error::{EngineError, EngineResult, RegistryError, RegistryResult};
pub use graph::{GraphStore, Loaded, Saved};
pub use map::{downcast, ObjectMap};
pub use object::{
    AsAny, Completion, Deserialized, ObjectRef, Serializable, SerializableType, Serialized,
    StowSlot,
};
pub use registry::{DeserializeFn, Registration, Registry, TypeClass};

// Re-export the layers below so domain crates need only one dependency.
pub use stow_store::{IdPattern, Store, StoreError, Stowed};
pub use stow_types::{ObjectId, SerializedRecord, TypeError};
