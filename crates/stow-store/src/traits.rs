use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use stow_types::{ObjectId, SerializedRecord};

use crate::error::{StoreError, StoreResult};
use crate::pattern::IdPattern;

/// A record as read from a backend, together with the backend's stow.
#[derive(Clone, Debug, PartialEq)]
pub struct Stowed<T> {
    pub record: SerializedRecord,
    pub stow: T,
}

/// Key/value backend for serialized records.
///
/// All implementations must satisfy these invariants:
/// - Records are keyed by `record.id`; the store never interprets fields.
/// - `put` overwrites idempotently and always hands back a stow, including
///   on the first write of an id.
/// - `get` on an unknown id fails with [`StoreError::NotFound`].
/// - Backend errors are propagated, never silently ignored.
///
/// `Stow` is whatever per-record token the backend needs to keep alongside
/// a live object (a revision, a content hash). Callers treat it as opaque
/// and pass back the latest value they were given.
#[async_trait]
pub trait Store: Send + Sync {
    type Stow: Clone + fmt::Debug + Send + Sync + 'static;

    /// Read a record and its current stow.
    async fn get(&self, id: &ObjectId) -> StoreResult<Stowed<Self::Stow>>;

    /// Write a record, returning the stow that now describes it.
    ///
    /// `stow` is the token from the caller's last read or write of this id,
    /// or `None` if it has never seen one.
    async fn put(
        &self,
        record: &SerializedRecord,
        stow: Option<Self::Stow>,
    ) -> StoreResult<Self::Stow>;

    /// List known ids, optionally restricted to those matching `pattern`.
    async fn get_ids(&self, pattern: Option<&IdPattern>) -> StoreResult<Vec<ObjectId>>;

    /// Check whether an id exists.
    ///
    /// Default implementation performs a full `get`. Backends may override
    /// with something cheaper.
    async fn contains(&self, id: &ObjectId) -> StoreResult<bool> {
        match self.get(id).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    type Stow = S::Stow;

    async fn get(&self, id: &ObjectId) -> StoreResult<Stowed<Self::Stow>> {
        (**self).get(id).await
    }

    async fn put(
        &self,
        record: &SerializedRecord,
        stow: Option<Self::Stow>,
    ) -> StoreResult<Self::Stow> {
        (**self).put(record, stow).await
    }

    async fn get_ids(&self, pattern: Option<&IdPattern>) -> StoreResult<Vec<ObjectId>> {
        (**self).get_ids(pattern).await
    }

    async fn contains(&self, id: &ObjectId) -> StoreResult<bool> {
        (**self).contains(id).await
    }
}
