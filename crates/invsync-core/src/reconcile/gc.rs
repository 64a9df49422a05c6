// ── Orphan deletion ──
//
// Everything labelled with the pass's credential scope that the current
// topology does not produce is deleted. Objects owned by other scopes are
// never listed, so never touched.

use std::collections::HashSet;

use invsync_api::{
    ClusterObject, HostObject, LABEL_CREDENTIALS, LabelSelector, ResourceStore, StoreObject,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cancel::guarded;
use crate::config::CredentialScope;
use crate::error::CoreError;
use crate::ident::ResourceId;
use crate::model::Topology;

/// What a deletion pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    pub clusters_deleted: usize,
    pub hosts_deleted: usize,
}

/// Identifiers the topology produces, split by kind.
struct DesiredIds {
    clusters: HashSet<String>,
    hosts: HashSet<String>,
}

impl DesiredIds {
    fn from_topology(topology: &Topology, scope: &str) -> Result<Self, CoreError> {
        let clusters = topology
            .clusters
            .iter()
            .map(|c| c.id(scope).map(ResourceId::into_string))
            .collect::<Result<_, _>>()?;
        let hosts = topology
            .hosts()
            .map(|h| h.id(scope).map(ResourceId::into_string))
            .collect::<Result<_, _>>()?;
        Ok(Self { clusters, hosts })
    }
}

/// Delete every scope-owned cluster and host object absent from `topology`.
///
/// A delete that finds the object already gone counts as done. Any other
/// failure stops the pass; objects deleted before it stay deleted.
pub async fn reconcile_deletions<S: ResourceStore>(
    store: &S,
    topology: &Topology,
    scope: &CredentialScope,
    cancel: &CancellationToken,
) -> Result<DeletionReport, CoreError> {
    let desired = DesiredIds::from_topology(topology, &scope.name)?;
    let selector = LabelSelector::new().with(LABEL_CREDENTIALS, scope.owner_label());

    let clusters_deleted =
        delete_orphans::<ClusterObject, S>(store, &selector, &desired.clusters, cancel).await?;
    let hosts_deleted =
        delete_orphans::<HostObject, S>(store, &selector, &desired.hosts, cancel).await?;

    let report = DeletionReport {
        clusters_deleted,
        hosts_deleted,
    };
    if clusters_deleted + hosts_deleted > 0 {
        info!(
            scope = %scope.name,
            clusters = clusters_deleted,
            hosts = hosts_deleted,
            "deleted orphaned objects"
        );
    }
    Ok(report)
}

async fn delete_orphans<T: StoreObject, S: ResourceStore>(
    store: &S,
    selector: &LabelSelector,
    desired: &HashSet<String>,
    cancel: &CancellationToken,
) -> Result<usize, CoreError> {
    let existing: Vec<T> = guarded(cancel, store.list(selector))
        .await?
        .map_err(|e| CoreError::store("list", T::KIND, selector.to_string(), e))?;

    let mut deleted = 0;
    for object in existing.iter().filter(|o| !desired.contains(o.name())) {
        let name = object.name();
        match guarded(cancel, store.delete::<T>(name)).await? {
            Ok(()) => {
                debug!(kind = T::KIND, name, "deleted orphan");
                deleted += 1;
            }
            Err(e) if e.is_not_found() => {
                debug!(kind = T::KIND, name, "orphan already gone");
            }
            Err(e) => return Err(CoreError::store("delete", T::KIND, name, e)),
        }
    }
    Ok(deleted)
}
