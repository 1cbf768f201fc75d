//! Type-tag dispatch for deserialization.
//!
//! A [`Registry`] is an explicit, application-owned value: build one at
//! startup, register every persistable type, and hand it to each
//! [`GraphStore`](crate::GraphStore) that needs to load. Clones share the
//! same table.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use stow_types::SerializedRecord;
use tracing::debug;

use crate::error::{EngineResult, RegistryError, RegistryResult};
use crate::object::{Deserialized, SerializableType};

/// Class-level deserializer for one type tag.
pub type DeserializeFn = fn(&SerializedRecord) -> EngineResult<Deserialized>;

/// A registry entry: a type tag and the function that rebuilds its records.
#[derive(Clone, Copy)]
pub struct TypeClass {
    type_tag: &'static str,
    deserialize: DeserializeFn,
}

impl TypeClass {
    pub fn new(type_tag: &'static str, deserialize: DeserializeFn) -> Self {
        Self {
            type_tag,
            deserialize,
        }
    }

    /// Entry for a type implementing [`SerializableType`].
    pub fn of<T: SerializableType>() -> Self {
        Self::new(T::TYPE, T::deserialize)
    }

    pub fn type_tag(&self) -> &'static str {
        self.type_tag
    }

    pub fn deserialize(&self, record: &SerializedRecord) -> EngineResult<Deserialized> {
        (self.deserialize)(record)
    }
}

impl fmt::Debug for TypeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeClass({:?})", self.type_tag)
    }
}

type Table = RwLock<HashMap<String, (TypeClass, u64)>>;

/// Maps wire type tags to the classes that deserialize them.
#[derive(Clone, Default)]
pub struct Registry {
    table: Arc<Table>,
    next_token: Arc<AtomicU64>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class under its type tag.
    ///
    /// Fails with [`RegistryError::DuplicateRegistration`] if the tag is
    /// taken. The returned [`Registration`] removes the entry again when
    /// [`unregister`](Registration::unregister) is called; dropping it
    /// leaves the entry in place.
    pub fn register(&self, class: TypeClass) -> RegistryResult<Registration> {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        if table.contains_key(class.type_tag) {
            return Err(RegistryError::DuplicateRegistration(
                class.type_tag.to_string(),
            ));
        }
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        table.insert(class.type_tag.to_string(), (class, token));
        debug!(type_tag = class.type_tag, "type registered");
        Ok(Registration {
            table: Arc::downgrade(&self.table),
            type_tag: class.type_tag,
            token,
        })
    }

    /// Register a type implementing [`SerializableType`].
    pub fn register_type<T: SerializableType>(&self) -> RegistryResult<Registration> {
        self.register(TypeClass::of::<T>())
    }

    /// The class registered for `type_tag`, if any.
    pub fn get_class(&self, type_tag: &str) -> Option<TypeClass> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.get(type_tag).map(|(class, _)| *class)
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered type tags in sorted order.
    pub fn type_tags(&self) -> Vec<String> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        let mut tags: Vec<String> = table.keys().cloned().collect();
        tags.sort();
        tags
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("types", &self.type_tags())
            .finish()
    }
}

/// Handle returned by [`Registry::register`].
#[derive(Debug)]
pub struct Registration {
    table: Weak<Table>,
    type_tag: &'static str,
    token: u64,
}

impl Registration {
    pub fn type_tag(&self) -> &'static str {
        self.type_tag
    }

    /// Remove the entry this handle created.
    ///
    /// Returns `false` if the registry is gone or the tag has since been
    /// re-registered by someone else.
    pub fn unregister(self) -> bool {
        let Some(table) = self.table.upgrade() else {
            return false;
        };
        let mut table = table.write().unwrap_or_else(PoisonError::into_inner);
        match table.get(self.type_tag) {
            Some((_, token)) if *token == self.token => {
                table.remove(self.type_tag);
                debug!(type_tag = self.type_tag, "type unregistered");
                true
            }
            _ => false,
        }
    }
}
