//! In-memory expirable store.

use dashmap::DashMap;
use std::sync::Arc;

use crate::expiration::ExpirableId;
use crate::store::{Expirable, ExpirableStore};

/// A thread-safe map of expirable objects.
///
/// Cloning shares the underlying map.
#[derive(Clone)]
pub struct MemoryStore<T> {
    inner: Arc<DashMap<ExpirableId, T>>,
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
        }
    }
}

impl<T: Expirable + Clone> MemoryStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object under its identity.
    pub fn insert(&self, object: T) {
        self.inner.insert(object.expiration_id(), object);
    }

    pub fn get(&self, id: &ExpirableId) -> Option<T> {
        self.inner.get(id).map(|r| r.value().clone())
    }

    pub fn contains(&self, id: &ExpirableId) -> bool {
        self.inner.contains_key(id)
    }

    pub fn remove(&self, id: &ExpirableId) -> Option<T> {
        self.inner.remove(id).map(|(_, object)| object)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<T> ExpirableStore for MemoryStore<T>
where
    T: Expirable + Clone + Send + Sync + 'static,
{
    type Object = T;

    fn lookup(&self, id: &ExpirableId) -> Option<T> {
        self.get(id)
    }

    fn destroy(&self, object: T) {
        let id = object.expiration_id();
        if self.inner.remove(&id).is_some() {
            tracing::debug!(id = %id, "Removed object from memory store");
        }
    }
}
