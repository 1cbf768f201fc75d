//! The contracts every persistable domain type implements.
//!
//! A domain type implements [`Serializable`] on its instances and
//! [`SerializableType`] on the type itself. Instances are shared as
//! `Arc<T>`; reference fields that are filled in after construction use
//! interior mutability (`RwLock`, `OnceLock`) so that a completion can wire
//! them once every object of a load exists.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use stow_types::{ObjectId, SerializedRecord};

use crate::error::EngineResult;
use crate::map::ObjectMap;

/// Shared handle to any persistable object.
pub type ObjectRef = Arc<dyn Serializable>;

/// Deferred reference wiring, run once the whole graph has been read.
pub type Completion = Box<dyn FnOnce(&ObjectMap) -> EngineResult<()> + Send>;

/// Upcast to `Any` so trait objects can be downcast back to their type.
///
/// Implemented for every `'static + Send + Sync` type; domain code never
/// implements it by hand.
pub trait AsAny: Any + Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Instance side of a persistable type.
pub trait Serializable: AsAny {
    /// Stable, globally-unique identity.
    fn id(&self) -> &ObjectId;

    /// Produce this object's record plus the objects it references directly.
    ///
    /// `others` need not be transitively complete; `save()` follows the
    /// chain itself.
    fn serialize(&self) -> EngineResult<Serialized>;

    /// Slot for backend stow, if this type keeps one.
    fn stow_slot(&self) -> Option<&StowSlot> {
        None
    }
}

/// Type side of a persistable type.
pub trait SerializableType: Serializable + Sized {
    /// Tag written into the `type` field of every record of this type.
    const TYPE: &'static str;

    /// Rebuild an instance from its record.
    ///
    /// Must set all owned and scalar state but must not look at other
    /// objects. Each reference is declared in the result's `needed_ids` and
    /// wired by one of its completions.
    fn deserialize(record: &SerializedRecord) -> EngineResult<Deserialized>;
}

/// Output of [`Serializable::serialize`].
pub struct Serialized {
    pub record: SerializedRecord,
    pub others: Vec<ObjectRef>,
}

impl Serialized {
    pub fn new(record: SerializedRecord) -> Self {
        Self {
            record,
            others: Vec::new(),
        }
    }

    /// Add a directly referenced object.
    pub fn with_other(mut self, other: ObjectRef) -> Self {
        self.others.push(other);
        self
    }

    /// Add several directly referenced objects.
    pub fn with_others(mut self, others: impl IntoIterator<Item = ObjectRef>) -> Self {
        self.others.extend(others);
        self
    }
}

impl fmt::Debug for Serialized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let others: Vec<&ObjectId> = self.others.iter().map(|o| o.id()).collect();
        f.debug_struct("Serialized")
            .field("record", &self.record)
            .field("others", &others)
            .finish()
    }
}

/// Output of [`SerializableType::deserialize`].
pub struct Deserialized {
    pub object: ObjectRef,
    pub needed_ids: Vec<ObjectId>,
    pub completions: Vec<Completion>,
}

impl Deserialized {
    pub fn new(object: ObjectRef) -> Self {
        Self {
            object,
            needed_ids: Vec::new(),
            completions: Vec::new(),
        }
    }

    /// Declare that `id` must be loaded before completions run.
    pub fn need(mut self, id: ObjectId) -> Self {
        self.needed_ids.push(id);
        self
    }

    /// Add a completion without declaring a new id.
    pub fn complete<F>(mut self, completion: F) -> Self
    where
        F: FnOnce(&ObjectMap) -> EngineResult<()> + Send + 'static,
    {
        self.completions.push(Box::new(completion));
        self
    }

    /// Declare `id` and the completion that wires it.
    pub fn link<F>(self, id: ObjectId, completion: F) -> Self
    where
        F: FnOnce(&ObjectMap) -> EngineResult<()> + Send + 'static,
    {
        self.need(id).complete(completion)
    }
}

impl fmt::Debug for Deserialized {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deserialized")
            .field("object", self.object.id())
            .field("needed_ids", &self.needed_ids)
            .field("completions", &self.completions.len())
            .finish()
    }
}

/// In-memory holder for the stow a backend attached to an object.
///
/// The engine reads the slot before each `put` and overwrites it with
/// whatever the backend hands back, and fills it on `load`. The stored value
/// is type-erased; [`get`](Self::get) only returns it when the requested
/// type matches, so an object moved between backends simply reads `None`.
#[derive(Default)]
pub struct StowSlot {
    value: RwLock<Option<Box<dyn Any + Send + Sync>>>,
}

impl StowSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current stow, if one of type `T` is held.
    pub fn get<T: Clone + 'static>(&self) -> Option<T> {
        let guard = self.value.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref()?.downcast_ref::<T>().cloned()
    }

    /// Replace the held stow.
    pub fn set<T: Send + Sync + 'static>(&self, stow: T) {
        let mut guard = self.value.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(Box::new(stow));
    }

    /// Forget the held stow.
    pub fn clear(&self) {
        let mut guard = self.value.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }

    pub fn is_set(&self) -> bool {
        self.value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl fmt::Debug for StowSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StowSlot")
            .field("set", &self.is_set())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_starts_empty() {
        let slot = StowSlot::new();
        assert!(!slot.is_set());
        assert_eq!(slot.get::<u64>(), None);
    }

    #[test]
    fn slot_returns_matching_type_only() {
        let slot = StowSlot::new();
        slot.set(7u64);
        assert_eq!(slot.get::<u64>(), Some(7));
        assert_eq!(slot.get::<String>(), None);
    }

    #[test]
    fn slot_overwrites_and_clears() {
        let slot = StowSlot::new();
        slot.set(String::from("rev-1"));
        slot.set(String::from("rev-2"));
        assert_eq!(slot.get::<String>().as_deref(), Some("rev-2"));
        slot.clear();
        assert!(!slot.is_set());
    }
}
