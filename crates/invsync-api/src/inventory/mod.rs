// ── Inventory collaborator ──
//
// Flat, owned records for the virtualization platform's object graph.
// Parents are referenced by name only; a backend must resolve its native
// back-references before handing records across this boundary.

pub mod file;
pub mod snapshot;

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A datacenter visible to the current credential.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Datacenter {
    pub name: String,
}

/// A real compute cluster inside a datacenter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cluster {
    pub name: String,
    pub datacenter: String,
}

/// A hypervisor host.
///
/// `cluster` is `None` for standalone hosts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Host {
    pub name: String,
    pub datacenter: String,
    pub cluster: Option<String>,
}

/// Which datacenters a listing should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatacenterFilter {
    /// Every datacenter the credential can see.
    All,
    /// Exactly one datacenter, by name.
    Named(String),
}

impl DatacenterFilter {
    /// Build a filter from an optional pinned datacenter name.
    pub fn from_pinned(pinned: Option<&str>) -> Self {
        match pinned {
            Some(name) if !name.is_empty() => Self::Named(name.to_owned()),
            _ => Self::All,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::All => true,
            Self::Named(wanted) => wanted == name,
        }
    }
}

/// Container whose hosts should be listed.
#[derive(Debug, Clone, Copy)]
pub enum HostScope<'a> {
    /// Members of one real cluster.
    Cluster(&'a Cluster),
    /// Every host in a datacenter, clustered or not.
    Datacenter(&'a Datacenter),
}

/// Read-only view of the virtualization platform's inventory.
///
/// Every method reports legitimate absence as an error for which
/// [`Error::is_not_found`] returns `true`, so callers can tell an empty
/// container from a failed lookup.
pub trait Inventory: Send + Sync {
    /// List datacenters matching `filter`.
    fn list_datacenters(
        &self,
        filter: &DatacenterFilter,
    ) -> impl Future<Output = Result<Vec<Datacenter>, Error>> + Send;

    /// List the real clusters of a datacenter.
    fn list_clusters(
        &self,
        datacenter: &Datacenter,
    ) -> impl Future<Output = Result<Vec<Cluster>, Error>> + Send;

    /// List hosts in a cluster or in a whole datacenter.
    fn list_hosts(
        &self,
        scope: HostScope<'_>,
    ) -> impl Future<Output = Result<Vec<Host>, Error>> + Send;

    /// Resolve the platform-assigned hardware identifier of a host.
    fn host_hardware_id(&self, host: &Host) -> impl Future<Output = Result<String, Error>> + Send;
}

impl<I: Inventory> Inventory for Arc<I> {
    fn list_datacenters(
        &self,
        filter: &DatacenterFilter,
    ) -> impl Future<Output = Result<Vec<Datacenter>, Error>> + Send {
        (**self).list_datacenters(filter)
    }

    fn list_clusters(
        &self,
        datacenter: &Datacenter,
    ) -> impl Future<Output = Result<Vec<Cluster>, Error>> + Send {
        (**self).list_clusters(datacenter)
    }

    fn list_hosts(
        &self,
        scope: HostScope<'_>,
    ) -> impl Future<Output = Result<Vec<Host>, Error>> + Send {
        (**self).list_hosts(scope)
    }

    fn host_hardware_id(&self, host: &Host) -> impl Future<Output = Result<String, Error>> + Send {
        (**self).host_hardware_id(host)
    }
}
