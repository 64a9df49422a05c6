// Snapshot-backed inventory
//
// Serves an exported inventory document (YAML or JSON) through the
// `Inventory` trait. Useful for offline runs, fixtures, and for replaying
// a platform export without a live session.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Cluster, Datacenter, DatacenterFilter, Host, HostScope, Inventory};
use crate::error::Error;

/// Root of an exported inventory document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryDocument {
    #[serde(default)]
    pub datacenters: Vec<DatacenterRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatacenterRecord {
    pub name: String,
    #[serde(default)]
    pub clusters: Vec<ClusterRecord>,
    /// Hosts attached directly to the datacenter (standalone).
    #[serde(default)]
    pub hosts: Vec<HostRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRecord {
    pub name: String,
    #[serde(default)]
    pub hosts: Vec<HostRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub name: String,
    /// Missing when the platform could not report hardware details.
    #[serde(default)]
    pub hardware_uuid: Option<String>,
}

/// An [`Inventory`] answering from an in-memory [`InventoryDocument`].
#[derive(Debug, Clone, Default)]
pub struct SnapshotInventory {
    doc: InventoryDocument,
}

impl SnapshotInventory {
    pub fn new(doc: InventoryDocument) -> Self {
        Self { doc }
    }

    /// Parse a YAML document (JSON is valid YAML, so both work).
    pub fn from_yaml_str(raw: &str) -> Result<Self, Error> {
        Ok(Self::new(serde_yaml::from_str(raw)?))
    }

    /// Load a document from disk. `.json` files are parsed as JSON,
    /// everything else as YAML.
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let raw = tokio::fs::read_to_string(path).await?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let doc: InventoryDocument = if is_json {
            serde_json::from_str(&raw)?
        } else {
            serde_yaml::from_str(&raw)?
        };
        debug!(
            path = %path.display(),
            datacenters = doc.datacenters.len(),
            "loaded inventory snapshot"
        );
        Ok(Self::new(doc))
    }

    pub fn document(&self) -> &InventoryDocument {
        &self.doc
    }

    fn datacenter(&self, name: &str) -> Result<&DatacenterRecord, Error> {
        self.doc
            .datacenters
            .iter()
            .find(|dc| dc.name == name)
            .ok_or_else(|| Error::not_found("datacenter", name))
    }

    fn cluster(&self, cluster: &Cluster) -> Result<&ClusterRecord, Error> {
        self.datacenter(&cluster.datacenter)?
            .clusters
            .iter()
            .find(|c| c.name == cluster.name)
            .ok_or_else(|| Error::not_found("cluster", &cluster.name))
    }

    fn host_record(&self, host: &Host) -> Result<&HostRecord, Error> {
        let dc = self.datacenter(&host.datacenter)?;
        let candidates: Box<dyn Iterator<Item = &HostRecord> + '_> = match host.cluster {
            Some(ref cluster) => Box::new(
                dc.clusters
                    .iter()
                    .filter(move |c| &c.name == cluster)
                    .flat_map(|c| c.hosts.iter()),
            ),
            None => Box::new(dc.hosts.iter()),
        };
        candidates
            .into_iter()
            .find(|h| h.name == host.name)
            .ok_or_else(|| Error::not_found("host", &host.name))
    }
}

fn to_host(record: &HostRecord, datacenter: &str, cluster: Option<&str>) -> Host {
    Host {
        name: record.name.clone(),
        datacenter: datacenter.to_owned(),
        cluster: cluster.map(str::to_owned),
    }
}

impl Inventory for SnapshotInventory {
    async fn list_datacenters(&self, filter: &DatacenterFilter) -> Result<Vec<Datacenter>, Error> {
        let found: Vec<Datacenter> = self
            .doc
            .datacenters
            .iter()
            .filter(|dc| filter.matches(&dc.name))
            .map(|dc| Datacenter {
                name: dc.name.clone(),
            })
            .collect();

        if let DatacenterFilter::Named(ref name) = *filter {
            if found.is_empty() {
                return Err(Error::not_found("datacenter", name));
            }
        }
        Ok(found)
    }

    async fn list_clusters(&self, datacenter: &Datacenter) -> Result<Vec<Cluster>, Error> {
        let dc = self.datacenter(&datacenter.name)?;
        Ok(dc
            .clusters
            .iter()
            .map(|c| Cluster {
                name: c.name.clone(),
                datacenter: dc.name.clone(),
            })
            .collect())
    }

    async fn list_hosts(&self, scope: HostScope<'_>) -> Result<Vec<Host>, Error> {
        match scope {
            HostScope::Cluster(cluster) => {
                let record = self.cluster(cluster)?;
                Ok(record
                    .hosts
                    .iter()
                    .map(|h| to_host(h, &cluster.datacenter, Some(&cluster.name)))
                    .collect())
            }
            HostScope::Datacenter(datacenter) => {
                let dc = self.datacenter(&datacenter.name)?;
                let clustered = dc.clusters.iter().flat_map(|c| {
                    c.hosts
                        .iter()
                        .map(|h| to_host(h, &dc.name, Some(&c.name)))
                });
                let standalone = dc.hosts.iter().map(|h| to_host(h, &dc.name, None));
                Ok(clustered.chain(standalone).collect())
            }
        }
    }

    async fn host_hardware_id(&self, host: &Host) -> Result<String, Error> {
        self.host_record(host)?
            .hardware_uuid
            .clone()
            .ok_or_else(|| Error::not_found("hardware uuid for host", &host.name))
    }
}
