// File-backed snapshot inventory
//
// Re-reads its document whenever datacenters are listed, which is the
// first call of every pass. Later calls in the same pass answer from the
// document loaded at that point. A failed reload is never reported as
// absence: a vanished file must not read as an empty inventory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::debug;

use super::snapshot::SnapshotInventory;
use super::{Cluster, Datacenter, DatacenterFilter, Host, HostScope, Inventory};
use crate::error::Error;

/// An [`Inventory`] over a snapshot file that may change between passes.
pub struct SnapshotFile {
    path: PathBuf,
    current: ArcSwap<SnapshotInventory>,
}

impl SnapshotFile {
    /// Load `path` once to validate it; later passes reload it.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let snapshot = SnapshotInventory::load(&path).await?;
        Ok(Self {
            path,
            current: ArcSwap::from_pointee(snapshot),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The document currently being served.
    pub fn snapshot(&self) -> Arc<SnapshotInventory> {
        self.current.load_full()
    }

    async fn reload(&self) -> Result<Arc<SnapshotInventory>, Error> {
        let fresh = SnapshotInventory::load(&self.path)
            .await
            .map_err(|e| Error::Backend {
                message: format!("reloading {}: {e}", self.path.display()),
            })?;
        let fresh = Arc::new(fresh);
        self.current.store(Arc::clone(&fresh));
        debug!(path = %self.path.display(), "inventory snapshot reloaded");
        Ok(fresh)
    }
}

impl Inventory for SnapshotFile {
    async fn list_datacenters(&self, filter: &DatacenterFilter) -> Result<Vec<Datacenter>, Error> {
        self.reload().await?.list_datacenters(filter).await
    }

    async fn list_clusters(&self, datacenter: &Datacenter) -> Result<Vec<Cluster>, Error> {
        self.snapshot().list_clusters(datacenter).await
    }

    async fn list_hosts(&self, scope: HostScope<'_>) -> Result<Vec<Host>, Error> {
        self.snapshot().list_hosts(scope).await
    }

    async fn host_hardware_id(&self, host: &Host) -> Result<String, Error> {
        self.snapshot().host_hardware_id(host).await
    }
}
