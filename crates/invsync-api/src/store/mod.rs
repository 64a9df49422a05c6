// ── Resource-store collaborator ──
//
// Persisted object shapes and the CRUD + list-by-label contract the
// engine writes through. Objects are addressed by name within a
// namespace; each store instance is bound to one namespace.

pub mod file;
pub mod memory;

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Label carrying the owning credential scope. Sole GC criterion.
pub const LABEL_CREDENTIALS: &str = "invsync.io/credentials";

/// Label on host objects carrying the owning cluster's identifier.
pub const LABEL_CLUSTER: &str = "invsync.io/cluster";

/// Annotation carrying the source datacenter name.
pub const ANNOTATION_DATACENTER: &str = "invsync.io/datacenter";

// ── Metadata ────────────────────────────────────────────────────────

/// Identity and bookkeeping shared by every stored object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    /// Bumped by the store on every write. Zero means "never stored".
    #[serde(default)]
    pub resource_version: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ObjectMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A persisted object the store can hold.
pub trait StoreObject: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Kind name, used for keying and error messages.
    const KIND: &'static str;

    fn metadata(&self) -> &ObjectMeta;
    fn metadata_mut(&mut self) -> &mut ObjectMeta;

    fn name(&self) -> &str {
        &self.metadata().name
    }
}

// ── Cluster objects ─────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSpec {
    /// External cluster name as reported by the platform.
    pub name: String,
    /// Identifiers of member host objects.
    #[serde(default)]
    pub hosts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterObject {
    pub metadata: ObjectMeta,
    pub spec: ClusterSpec,
}

impl StoreObject for ClusterObject {
    const KIND: &'static str = "cluster";

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

// ── Host objects ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostSpec {
    /// External host name.
    pub name: String,
    /// Platform-assigned hardware identifier, stable across renames.
    pub hardware_uuid: String,
    /// External name of the owning cluster.
    pub cluster_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostObject {
    pub metadata: ObjectMeta,
    pub spec: HostSpec,
}

impl StoreObject for HostObject {
    const KIND: &'static str = "host";

    fn metadata(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn metadata_mut(&mut self) -> &mut ObjectMeta {
        &mut self.metadata
    }
}

// ── Label selection ─────────────────────────────────────────────────

/// Equality-based label selector. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector(BTreeMap<String, String>);

impl LabelSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `key=value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.0.iter().all(|(k, v)| labels.get(k) == Some(v))
    }
}

impl std::fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|(k, v)| format!("{k}={v}")).collect();
        write!(f, "{}", parts.join(","))
    }
}

// ── Store contract ──────────────────────────────────────────────────

/// Declarative object store the engine reconciles into.
///
/// Implementations must offer read-after-write visibility to the caller
/// that just wrote. Each single-object write is atomic.
pub trait ResourceStore: Send + Sync {
    /// Fetch an object by name. `Ok(None)` when absent.
    fn get<T: StoreObject>(&self, name: &str)
    -> impl Future<Output = Result<Option<T>, Error>> + Send;

    /// Create a new object. Fails with `AlreadyExists` if the name is taken.
    fn create<T: StoreObject>(&self, object: &T) -> impl Future<Output = Result<(), Error>> + Send;

    /// Replace an existing object. Fails with `NotFound` if absent, or
    /// `Conflict` if `resource_version` is stale.
    fn update<T: StoreObject>(&self, object: &T) -> impl Future<Output = Result<(), Error>> + Send;

    /// Delete an object by name. Fails with `NotFound` if absent.
    fn delete<T: StoreObject>(&self, name: &str) -> impl Future<Output = Result<(), Error>> + Send;

    /// List objects whose labels satisfy `selector`, ordered by name.
    fn list<T: StoreObject>(
        &self,
        selector: &LabelSelector,
    ) -> impl Future<Output = Result<Vec<T>, Error>> + Send;
}

/// Shared stores: several synchronizers may write through one backend.
impl<S: ResourceStore> ResourceStore for Arc<S> {
    fn get<T: StoreObject>(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<T>, Error>> + Send {
        (**self).get(name)
    }

    fn create<T: StoreObject>(&self, object: &T) -> impl Future<Output = Result<(), Error>> + Send {
        (**self).create(object)
    }

    fn update<T: StoreObject>(&self, object: &T) -> impl Future<Output = Result<(), Error>> + Send {
        (**self).update(object)
    }

    fn delete<T: StoreObject>(&self, name: &str) -> impl Future<Output = Result<(), Error>> + Send {
        (**self).delete::<T>(name)
    }

    fn list<T: StoreObject>(
        &self,
        selector: &LabelSelector,
    ) -> impl Future<Output = Result<Vec<T>, Error>> + Send {
        (**self).list(selector)
    }
}
