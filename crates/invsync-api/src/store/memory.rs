// ── In-memory resource store ──
//
// Lock-free concurrent storage keyed by (kind, name). Objects are held as
// JSON values so one map serves every `StoreObject` type. Write counters
// make the store auditable: an idempotent pass leaves them untouched.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;

use super::{LabelSelector, ResourceStore, StoreObject};
use crate::error::Error;

/// Snapshot of how many writes a [`MemoryStore`] has accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub creates: u64,
    pub updates: u64,
    pub deletes: u64,
}

impl WriteStats {
    pub fn total(&self) -> u64 {
        self.creates + self.updates + self.deletes
    }
}

/// A [`ResourceStore`] living entirely in process memory.
pub struct MemoryStore {
    namespace: String,
    objects: DashMap<(&'static str, String), Value>,
    /// Store-wide resource version, bumped on every write.
    version: AtomicU64,
    creates: AtomicU64,
    updates: AtomicU64,
    deletes: AtomicU64,
}

impl MemoryStore {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            objects: DashMap::new(),
            version: AtomicU64::new(0),
            creates: AtomicU64::new(0),
            updates: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Current write counters.
    pub fn writes(&self) -> WriteStats {
        WriteStats {
            creates: self.creates.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
        }
    }

    /// Total number of stored objects across all kinds.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn next_version(&self) -> u64 {
        self.version.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("default")
    }
}

impl ResourceStore for MemoryStore {
    async fn get<T: StoreObject>(&self, name: &str) -> Result<Option<T>, Error> {
        let Some(value) = self
            .objects
            .get(&(T::KIND, name.to_owned()))
            .map(|r| r.value().clone())
        else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_value(value)?))
    }

    async fn create<T: StoreObject>(&self, object: &T) -> Result<(), Error> {
        let mut stored = object.clone();
        let key = (T::KIND, stored.name().to_owned());
        match self.objects.entry(key) {
            Entry::Occupied(_) => Err(Error::already_exists(T::KIND, object.name())),
            Entry::Vacant(slot) => {
                let meta = stored.metadata_mut();
                meta.namespace.clone_from(&self.namespace);
                meta.resource_version = self.next_version();
                meta.created_at = Some(Utc::now());
                slot.insert(serde_json::to_value(&stored)?);
                self.creates.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
        }
    }

    async fn update<T: StoreObject>(&self, object: &T) -> Result<(), Error> {
        let key = (T::KIND, object.name().to_owned());
        let Some(mut slot) = self.objects.get_mut(&key) else {
            return Err(Error::not_found(T::KIND, object.name()));
        };

        let current: T = serde_json::from_value(slot.value().clone())?;
        let found = current.metadata().resource_version;
        let expected = object.metadata().resource_version;
        if expected != found {
            return Err(Error::Conflict {
                kind: T::KIND.into(),
                name: object.name().into(),
                expected,
                found,
            });
        }

        let mut stored = object.clone();
        let meta = stored.metadata_mut();
        meta.namespace.clone_from(&self.namespace);
        meta.resource_version = self.next_version();
        meta.created_at = current.metadata().created_at;
        *slot.value_mut() = serde_json::to_value(&stored)?;
        self.updates.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn delete<T: StoreObject>(&self, name: &str) -> Result<(), Error> {
        match self.objects.remove(&(T::KIND, name.to_owned())) {
            Some(_) => {
                self.deletes.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            None => Err(Error::not_found(T::KIND, name)),
        }
    }

    async fn list<T: StoreObject>(&self, selector: &LabelSelector) -> Result<Vec<T>, Error> {
        let values: Vec<Value> = self
            .objects
            .iter()
            .filter(|r| r.key().0 == T::KIND)
            .map(|r| r.value().clone())
            .collect();

        let mut out = Vec::new();
        for value in values {
            let object: T = serde_json::from_value(value)?;
            if selector.matches(&object.metadata().labels) {
                out.push(object);
            }
        }
        out.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(out)
    }
}
