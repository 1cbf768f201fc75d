use std::any::type_name;
use std::collections::hash_map::{Entry, HashMap};
use std::fmt;
use std::sync::Arc;

use stow_types::ObjectId;

use crate::error::{EngineError, EngineResult};
use crate::object::{AsAny, ObjectRef, Serializable};

/// Id-indexed set of the objects produced by one `load()`.
///
/// Holds exactly one instance per id; completions look their references up
/// here during the second pass.
#[derive(Clone, Default)]
pub struct ObjectMap {
    objects: HashMap<ObjectId, ObjectRef>,
}

impl ObjectMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    pub fn get(&self, id: &ObjectId) -> Option<&ObjectRef> {
        self.objects.get(id)
    }

    /// Look up `id` and downcast it to `T`.
    ///
    /// Fails with [`EngineError::MissingReference`] if the id was never
    /// loaded and [`EngineError::TypeMismatch`] if it is some other type.
    pub fn get_as<T: Serializable>(&self, id: &ObjectId) -> EngineResult<Arc<T>> {
        let object = self
            .objects
            .get(id)
            .ok_or_else(|| EngineError::MissingReference(id.clone()))?;
        downcast(object)
    }

    /// Insert `object` unless its id is already present. Returns `false`
    /// when an instance already existed.
    pub(crate) fn insert(&mut self, object: ObjectRef) -> bool {
        match self.objects.entry(object.id().clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(object);
                true
            }
        }
    }

    /// Ids in sorted order.
    pub fn ids(&self) -> Vec<&ObjectId> {
        let mut ids: Vec<&ObjectId> = self.objects.keys().collect();
        ids.sort();
        ids
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ObjectId, &ObjectRef)> {
        self.objects.iter()
    }

    pub fn into_inner(self) -> HashMap<ObjectId, ObjectRef> {
        self.objects
    }
}

impl fmt::Debug for ObjectMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.ids()).finish()
    }
}

/// Downcast a shared object to its concrete type.
pub fn downcast<T: Serializable>(object: &ObjectRef) -> EngineResult<Arc<T>> {
    <dyn Serializable as AsAny>::into_any(Arc::clone(object))
        .downcast::<T>()
        .map_err(|_| EngineError::TypeMismatch {
            id: object.id().clone(),
            expected: type_name::<T>(),
        })
}
