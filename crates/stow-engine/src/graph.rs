//! Graph save/load over any [`Store`].
//!
//! [`GraphStore`] turns a key/value [`Store`] into an object-graph store.
//! The backend only ever sees flat records; the engine follows references
//! through [`Serializable::serialize`] on the way out and through
//! `needed_ids` plus completions on the way in.
//!
//! # Algorithms
//!
//! - `save` is a breadth-first walk from the root with a dedup set keyed
//!   by id, so diamonds and cycles write each object once. Puts are issued
//!   one at a time in discovery order. There is no rollback: a failing put
//!   leaves earlier puts in place.
//! - `load` runs in two passes. Pass one reads and deserializes depth-first,
//!   inserting each object into the id map *before* descending into the ids
//!   it needs, so a cycle back to an object under construction finds it in
//!   the map instead of fetching it again. Pass two runs every completion
//!   against the finished map to wire references.

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use stow_store::{IdPattern, Store, Stowed};
use stow_types::ObjectId;
use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::map::{downcast, ObjectMap};
use crate::object::{Completion, Deserialized, ObjectRef, Serializable, Serialized};
use crate::registry::Registry;

/// Result of a successful [`GraphStore::save`].
#[derive(Clone, Debug)]
pub struct Saved<T> {
    /// Id of the root object.
    pub root: ObjectId,
    /// Stow returned for every written object, in write order.
    pub stows: Vec<(ObjectId, T)>,
}

impl<T> Saved<T> {
    /// Number of objects written.
    pub fn written(&self) -> usize {
        self.stows.len()
    }

    /// Stow returned for `id`, if it was written.
    pub fn stow_of(&self, id: &ObjectId) -> Option<&T> {
        self.stows
            .iter()
            .find(|(written, _)| written == id)
            .map(|(_, stow)| stow)
    }
}

/// Result of a successful [`GraphStore::load`].
#[derive(Clone)]
pub struct Loaded<T> {
    /// The object that was asked for.
    pub root: ObjectRef,
    /// Every object reachable from the root, one instance per id.
    pub objects: ObjectMap,
    /// Stow read for every object.
    pub stows: HashMap<ObjectId, T>,
}

impl<T> Loaded<T> {
    /// The root downcast to its concrete type.
    pub fn root_as<U: Serializable>(&self) -> EngineResult<Arc<U>> {
        downcast(&self.root)
    }

    /// Any loaded object downcast to its concrete type.
    pub fn get<U: Serializable>(&self, id: &ObjectId) -> EngineResult<Arc<U>> {
        self.objects.get_as(id)
    }

    /// Number of distinct objects loaded.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl<T: fmt::Debug> fmt::Debug for Loaded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loaded")
            .field("root", self.root.id())
            .field("objects", &self.objects)
            .field("stows", &self.stows)
            .finish()
    }
}

/// Object-graph store layered over a record [`Store`].
#[derive(Debug)]
pub struct GraphStore<S: Store> {
    store: S,
    registry: Registry,
}

impl<S: Store> GraphStore<S> {
    pub fn new(store: S, registry: Registry) -> Self {
        Self { store, registry }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Persist `root` and everything reachable from it.
    pub async fn save(&self, root: ObjectRef) -> EngineResult<Saved<S::Stow>> {
        let root_id = root.id().clone();
        let mut done: HashSet<ObjectId> = HashSet::new();
        let mut queue: VecDeque<ObjectRef> = VecDeque::from([root]);
        let mut stows = Vec::new();

        while let Some(current) = queue.pop_front() {
            if done.contains(current.id()) {
                continue;
            }
            let Serialized { record, others } = current.serialize()?;
            if record.id != *current.id() {
                return Err(EngineError::IdMismatch {
                    expected: current.id().clone(),
                    found: record.id,
                });
            }

            let slot = current.stow_slot();
            let stow = slot.and_then(|s| s.get::<S::Stow>());
            let stow = self.store.put(&record, stow).await?;
            if let Some(slot) = slot {
                slot.set(stow.clone());
            }
            debug!(id = %record.id, type_tag = %record.type_tag, ?stow, "object saved");

            queue.extend(others);
            done.insert(record.id.clone());
            stows.push((record.id, stow));
        }

        debug!(root = %root_id, written = stows.len(), "graph saved");
        Ok(Saved {
            root: root_id,
            stows,
        })
    }

    /// Load the object `id` and everything reachable from it.
    pub async fn load(&self, id: &ObjectId) -> EngineResult<Loaded<S::Stow>> {
        let mut objects = ObjectMap::new();
        let mut stows = HashMap::new();
        let mut completions: Vec<Completion> = Vec::new();
        let mut pending = vec![id.clone()];

        while let Some(next) = pending.pop() {
            if objects.contains(&next) {
                continue;
            }
            let Stowed { record, stow } = self.store.get(&next).await?;
            if record.id != next {
                return Err(EngineError::IdMismatch {
                    expected: next,
                    found: record.id,
                });
            }
            let class = self.registry.get_class(&record.type_tag).ok_or_else(|| {
                EngineError::UnregisteredType {
                    type_tag: record.type_tag.clone(),
                    id: record.id.clone(),
                }
            })?;

            let Deserialized {
                object,
                needed_ids,
                completions: object_completions,
            } = class.deserialize(&record)?;
            if *object.id() != record.id {
                return Err(EngineError::IdMismatch {
                    expected: record.id,
                    found: object.id().clone(),
                });
            }

            // Registered before descending so cycles resolve to this instance.
            objects.insert(Arc::clone(&object));
            if let Some(slot) = object.stow_slot() {
                slot.set(stow.clone());
            }
            stows.insert(record.id, stow);
            completions.extend(object_completions);

            // Reversed so the first needed id is visited first.
            pending.extend(
                needed_ids
                    .into_iter()
                    .rev()
                    .filter(|needed| !objects.contains(needed)),
            );
        }

        let completed = completions.len();
        for complete in completions {
            complete(&objects)?;
        }

        let root = objects
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(id.clone()))?;
        debug!(root = %id, objects = objects.len(), completed, "graph loaded");
        Ok(Loaded {
            root,
            objects,
            stows,
        })
    }

    /// List ids known to the backend.
    pub async fn get_ids(&self, pattern: Option<&IdPattern>) -> EngineResult<Vec<ObjectId>> {
        Ok(self.store.get_ids(pattern).await?)
    }

    /// Ids minted with [`ObjectId::generate`] under `prefix`.
    pub async fn find_roots(&self, prefix: &str) -> EngineResult<Vec<ObjectId>> {
        let pattern = IdPattern::with_prefix(prefix)?;
        self.get_ids(Some(&pattern)).await
    }

    /// Load every id matching `pattern`, one graph at a time.
    ///
    /// Each graph is loaded independently, so an object reachable from two
    /// matching roots appears as two instances across the results.
    pub async fn load_matching(&self, pattern: &IdPattern) -> EngineResult<Vec<Loaded<S::Stow>>> {
        let ids = self.get_ids(Some(pattern)).await?;
        let mut loaded = Vec::with_capacity(ids.len());
        for id in &ids {
            loaded.push(self.load(id).await?);
        }
        Ok(loaded)
    }
}
