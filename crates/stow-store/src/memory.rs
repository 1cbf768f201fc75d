use std::collections::HashMap;
use std::fmt;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stow_types::{ObjectId, SerializedRecord};

use crate::error::{StoreError, StoreResult};
use crate::pattern::{keep, IdPattern};
use crate::traits::{Store, Stowed};

/// Monotonic per-record revision handed out by [`InMemoryStore`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Revision(pub u64);

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// In-memory, HashMap-based record store.
///
/// Intended for tests and embedding. Records are held behind a `RwLock` and
/// cloned on read/write. Every `put` bumps the record's [`Revision`]; a put
/// that presents an outdated revision is rejected with
/// [`StoreError::Conflict`], while a put without one overwrites.
pub struct InMemoryStore {
    records: RwLock<HashMap<ObjectId, (SerializedRecord, Revision)>>,
}

impl InMemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    /// Number of records currently stored.
    pub fn len(&self) -> usize {
        self.read().map(|map| map.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove all records from the store.
    pub fn clear(&self) -> StoreResult<()> {
        self.write()?.clear();
        Ok(())
    }

    /// Peek at a stored record without going through the async contract.
    pub fn record(&self, id: &ObjectId) -> Option<SerializedRecord> {
        self.read()
            .ok()
            .and_then(|map| map.get(id).map(|(record, _)| record.clone()))
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<ObjectId, (SerializedRecord, Revision)>>> {
        self.records
            .read()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))
    }

    fn write(
        &self,
    ) -> StoreResult<RwLockWriteGuard<'_, HashMap<ObjectId, (SerializedRecord, Revision)>>> {
        self.records
            .write()
            .map_err(|e| StoreError::Backend(format!("lock poisoned: {e}")))
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    type Stow = Revision;

    async fn get(&self, id: &ObjectId) -> StoreResult<Stowed<Revision>> {
        let map = self.read()?;
        let (record, revision) = map
            .get(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Ok(Stowed {
            record: record.clone(),
            stow: *revision,
        })
    }

    async fn put(
        &self,
        record: &SerializedRecord,
        stow: Option<Revision>,
    ) -> StoreResult<Revision> {
        let mut map = self.write()?;
        let current = map.get(&record.id).map(|(_, revision)| *revision);
        if let (Some(expected), Some(actual)) = (stow, current) {
            if expected != actual {
                return Err(StoreError::Conflict {
                    id: record.id.clone(),
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                });
            }
        }
        let next = Revision(current.map_or(1, |r| r.0 + 1));
        map.insert(record.id.clone(), (record.clone(), next));
        Ok(next)
    }

    async fn get_ids(&self, pattern: Option<&IdPattern>) -> StoreResult<Vec<ObjectId>> {
        let map = self.read()?;
        let mut ids: Vec<ObjectId> = map.keys().filter(|id| keep(pattern, id)).cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn contains(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.read()?.contains_key(id))
    }
}

impl fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("record_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn record(id: &str, label: &str) -> SerializedRecord {
        SerializedRecord::new("node", ObjectId::new(id).unwrap(), "v1")
            .with_field("label", label)
            .unwrap()
    }

    fn id(s: &str) -> ObjectId {
        ObjectId::new(s).unwrap()
    }

    #[tokio::test]
    async fn put_then_get() {
        let store = InMemoryStore::new();
        let stow = store.put(&record("a", "hello"), None).await.unwrap();
        assert_eq!(stow, Revision(1));

        let stowed = store.get(&id("a")).await.unwrap();
        assert_eq!(stowed.record, record("a", "hello"));
        assert_eq!(stowed.stow, Revision(1));
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = InMemoryStore::new();
        let err = store.get(&id("ghost")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref missing) if missing.as_str() == "ghost"));
    }

    #[tokio::test]
    async fn revisions_advance_on_every_put() {
        let store = InMemoryStore::new();
        let r1 = store.put(&record("a", "x"), None).await.unwrap();
        let r2 = store.put(&record("a", "x"), Some(r1)).await.unwrap();
        let r3 = store.put(&record("a", "y"), Some(r2)).await.unwrap();
        assert_eq!((r1, r2, r3), (Revision(1), Revision(2), Revision(3)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn stale_revision_conflicts() {
        let store = InMemoryStore::new();
        let r1 = store.put(&record("a", "x"), None).await.unwrap();
        store.put(&record("a", "y"), Some(r1)).await.unwrap();

        let err = store.put(&record("a", "z"), Some(r1)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert_eq!(store.record(&id("a")).unwrap(), record("a", "y"));
    }

    #[tokio::test]
    async fn put_without_stow_overwrites() {
        let store = InMemoryStore::new();
        store.put(&record("a", "x"), None).await.unwrap();
        let r = store.put(&record("a", "y"), None).await.unwrap();
        assert_eq!(r, Revision(2));
        assert_eq!(store.record(&id("a")).unwrap(), record("a", "y"));
    }

    #[tokio::test]
    async fn get_ids_filters_and_sorts() {
        let store = InMemoryStore::new();
        for name in ["model_2_b", "person_1_a", "model_1_a"] {
            store.put(&record(name, name), None).await.unwrap();
        }

        let all = store.get_ids(None).await.unwrap();
        assert_eq!(all, vec![id("model_1_a"), id("model_2_b"), id("person_1_a")]);

        let pattern = IdPattern::new("model*").unwrap();
        let models = store.get_ids(Some(&pattern)).await.unwrap();
        assert_eq!(models, vec![id("model_1_a"), id("model_2_b")]);
    }

    #[tokio::test]
    async fn contains_and_clear() {
        let store = InMemoryStore::new();
        store.put(&record("a", "x"), None).await.unwrap();
        assert!(store.contains(&id("a")).await.unwrap());
        assert!(!store.contains(&id("b")).await.unwrap());

        store.clear().unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn shared_through_arc() {
        let store = Arc::new(InMemoryStore::new());
        let handle = Arc::clone(&store);
        handle.put(&record("a", "x"), None).await.unwrap();
        assert_eq!(Store::get(&store, &id("a")).await.unwrap().stow, Revision(1));
    }

    #[test]
    fn debug_format() {
        let store = InMemoryStore::new();
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryStore"));
        assert!(debug.contains("record_count"));
    }
}
