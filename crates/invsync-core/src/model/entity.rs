// ── Topology entities ──

use serde::Serialize;
use strum::{Display, EnumString};

use crate::error::CoreError;
use crate::ident::{self, ResourceId, UNCLUSTERED_NAME};

/// Whether a cluster exists on the platform or was synthesized to hold
/// a datacenter's unclustered hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ClusterKind {
    Real,
    Unclustered,
}

/// A hypervisor host as seen in one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostEntity {
    /// External name, unique within a datacenter.
    pub name: String,
    /// Platform-assigned hardware identifier.
    pub hardware_id: String,
    /// External name of the owning cluster (the sentinel for unclustered hosts).
    pub cluster: String,
    pub datacenter: String,
}

impl HostEntity {
    pub fn id(&self, scope: &str) -> Result<ResourceId, CoreError> {
        ident::host_id(&self.name, scope)
    }
}

/// A cluster and its member hosts as seen in one snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterEntity {
    pub name: String,
    pub datacenter: String,
    pub kind: ClusterKind,
    pub hosts: Vec<HostEntity>,
}

impl ClusterEntity {
    pub fn real(name: impl Into<String>, datacenter: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            datacenter: datacenter.into(),
            kind: ClusterKind::Real,
            hosts: Vec::new(),
        }
    }

    /// The synthetic group for a datacenter's unclustered hosts.
    pub fn unclustered(datacenter: impl Into<String>) -> Self {
        Self {
            name: UNCLUSTERED_NAME.into(),
            datacenter: datacenter.into(),
            kind: ClusterKind::Unclustered,
            hosts: Vec::new(),
        }
    }

    pub fn id(&self, scope: &str) -> Result<ResourceId, CoreError> {
        ident::cluster_id(&self.name, &self.datacenter, scope)
    }

    /// Identifiers of member hosts, in enumeration order.
    pub fn member_ids(&self, scope: &str) -> Result<Vec<ResourceId>, CoreError> {
        self.hosts.iter().map(|h| h.id(scope)).collect()
    }
}

/// Everything one discovery pass found, across all target datacenters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Topology {
    pub clusters: Vec<ClusterEntity>,
}

impl Topology {
    pub fn hosts(&self) -> impl Iterator<Item = &HostEntity> {
        self.clusters.iter().flat_map(|c| c.hosts.iter())
    }

    pub fn host_count(&self) -> usize {
        self.clusters.iter().map(|c| c.hosts.len()).sum()
    }
}
