// ── Sync driver ──
//
// One pass: assemble the topology, upsert every cluster (hosts first),
// then delete what the topology no longer produces. A failed assembly
// writes nothing; a failed write leaves earlier writes committed and the
// next pass converges.

use std::time::Duration;

use invsync_api::{
    ClusterObject, HostObject, Inventory, LABEL_CLUSTER, LABEL_CREDENTIALS, LabelSelector,
    ResourceStore, StoreObject,
};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cancel::guarded;
use crate::config::SyncConfig;
use crate::error::CoreError;
use crate::reconcile::{Reconciler, SyncReport, reconcile_deletions};
use crate::topology::TopologyAssembler;

/// Drives sync passes for one credential scope.
pub struct Synchronizer<I, S> {
    inventory: I,
    store: S,
    config: SyncConfig,
}

impl<I: Inventory, S: ResourceStore> Synchronizer<I, S> {
    pub fn new(inventory: I, store: S, config: SyncConfig) -> Self {
        Self {
            inventory,
            store,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn inventory(&self) -> &I {
        &self.inventory
    }

    /// Run one full pass: discover, upsert, then garbage-collect.
    pub async fn run_pass(&self, cancel: &CancellationToken) -> Result<SyncReport, CoreError> {
        let scope = &self.config.scope;
        scope.validate()?;

        let topology = TopologyAssembler::new(&self.inventory, scope)
            .assemble(cancel)
            .await?;

        let mut report = SyncReport::default();
        let reconciler = Reconciler::new(&self.store, scope);
        for cluster in &topology.clusters {
            let result = reconciler.upsert_cluster(cluster, cancel).await?;
            report.clusters.record(result.outcome);
            for outcome in result.hosts {
                report.hosts.record(outcome);
            }
        }

        let deleted = reconcile_deletions(&self.store, &topology, scope, cancel).await?;
        report.clusters.deleted = deleted.clusters_deleted;
        report.hosts.deleted = deleted.hosts_deleted;

        info!(
            scope = %scope.name,
            clusters_created = report.clusters.created,
            clusters_updated = report.clusters.updated,
            clusters_deleted = report.clusters.deleted,
            hosts_created = report.hosts.created,
            hosts_updated = report.hosts.updated,
            hosts_deleted = report.hosts.deleted,
            "sync pass complete"
        );
        Ok(report)
    }

    /// Run a pass now, then once per `interval` until `cancel` fires.
    ///
    /// Failed passes are logged and retried on the next tick.
    pub async fn run_periodic(&self, interval: Duration, cancel: &CancellationToken) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    match self.run_pass(cancel).await {
                        Ok(report) => debug!(writes = report.writes(), "periodic pass finished"),
                        Err(e) if e.is_cancelled() => break,
                        Err(e) => warn!(error = %e, "periodic sync pass failed"),
                    }
                }
            }
        }
        debug!(scope = %self.config.scope.name, "periodic sync stopped");
    }

    /// Cluster objects owned by this scope.
    pub async fn clusters(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ClusterObject>, CoreError> {
        let selector = self.scope_selector();
        guarded(cancel, self.store.list(&selector))
            .await?
            .map_err(|e| CoreError::store("list", ClusterObject::KIND, selector.to_string(), e))
    }

    /// Host objects owned by this scope.
    pub async fn hosts(&self, cancel: &CancellationToken) -> Result<Vec<HostObject>, CoreError> {
        let selector = self.scope_selector();
        guarded(cancel, self.store.list(&selector))
            .await?
            .map_err(|e| CoreError::store("list", HostObject::KIND, selector.to_string(), e))
    }

    /// Host objects owned by this scope that belong to `cluster_id`.
    pub async fn hosts_for_cluster(
        &self,
        cluster_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<HostObject>, CoreError> {
        let selector = self.scope_selector().with(LABEL_CLUSTER, cluster_id);
        guarded(cancel, self.store.list(&selector))
            .await?
            .map_err(|e| CoreError::store("list", HostObject::KIND, selector.to_string(), e))
    }

    /// One cluster object, if it exists and this scope owns it.
    pub async fn cluster(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<ClusterObject>, CoreError> {
        self.owned(id, cancel).await
    }

    /// One host object, if it exists and this scope owns it.
    pub async fn host(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<HostObject>, CoreError> {
        self.owned(id, cancel).await
    }

    async fn owned<T: StoreObject>(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<T>, CoreError> {
        let found: Option<T> = guarded(cancel, self.store.get(id))
            .await?
            .map_err(|e| CoreError::store("get", T::KIND, id, e))?;
        let selector = self.scope_selector();
        Ok(found.filter(|o| selector.matches(&o.metadata().labels)))
    }

    fn scope_selector(&self) -> LabelSelector {
        LabelSelector::new().with(LABEL_CREDENTIALS, self.config.scope.owner_label())
    }
}
