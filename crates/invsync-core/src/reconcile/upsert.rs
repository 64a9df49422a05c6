// ── Create-or-update ──
//
// For every entity: build the desired object, fetch what the store holds
// under the same identifier, then create, update, or leave it alone.
// Change detection is an explicit field-by-field comparison; cluster
// membership is compared as a set.

use std::collections::BTreeMap;

use invsync_api::{
    ANNOTATION_DATACENTER, ClusterObject, ClusterSpec, HostObject, HostSpec, LABEL_CLUSTER,
    LABEL_CREDENTIALS, ObjectMeta, ResourceStore, StoreObject,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::Outcome;
use crate::cancel::guarded;
use crate::config::CredentialScope;
use crate::error::CoreError;
use crate::ident::ResourceId;
use crate::model::{ClusterEntity, HostEntity};

/// Result of upserting one cluster and, before it, its member hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterUpsert {
    pub id: ResourceId,
    pub outcome: Outcome,
    pub hosts: Vec<Outcome>,
}

// ── Desired state ───────────────────────────────────────────────────

fn datacenter_annotations(datacenter: &str) -> BTreeMap<String, String> {
    let mut annotations = BTreeMap::new();
    if !datacenter.is_empty() {
        annotations.insert(ANNOTATION_DATACENTER.to_owned(), datacenter.to_owned());
    }
    annotations
}

/// The host object the store should hold for `host` under `owner`.
pub fn desired_host(
    host: &HostEntity,
    owner: &ClusterEntity,
    scope: &CredentialScope,
) -> Result<HostObject, CoreError> {
    let id = host.id(&scope.name)?;
    let cluster_id = owner.id(&scope.name)?;

    let mut metadata = ObjectMeta::new(id);
    metadata.namespace.clone_from(&scope.namespace);
    metadata
        .labels
        .insert(LABEL_CLUSTER.to_owned(), cluster_id.into_string());
    metadata
        .labels
        .insert(LABEL_CREDENTIALS.to_owned(), scope.owner_label());
    metadata.annotations = datacenter_annotations(&owner.datacenter);

    Ok(HostObject {
        metadata,
        spec: HostSpec {
            name: host.name.clone(),
            hardware_uuid: host.hardware_id.clone(),
            cluster_name: owner.name.clone(),
        },
    })
}

/// The cluster object the store should hold for `cluster`.
///
/// Member identifiers are sorted so the persisted list is canonical.
pub fn desired_cluster(
    cluster: &ClusterEntity,
    scope: &CredentialScope,
) -> Result<ClusterObject, CoreError> {
    let id = cluster.id(&scope.name)?;
    let mut hosts: Vec<String> = cluster
        .member_ids(&scope.name)?
        .into_iter()
        .map(ResourceId::into_string)
        .collect();
    hosts.sort();
    hosts.dedup();

    let mut metadata = ObjectMeta::new(id);
    metadata.namespace.clone_from(&scope.namespace);
    metadata
        .labels
        .insert(LABEL_CREDENTIALS.to_owned(), scope.owner_label());
    metadata.annotations = datacenter_annotations(&cluster.datacenter);

    Ok(ClusterObject {
        metadata,
        spec: ClusterSpec {
            name: cluster.name.clone(),
            hosts,
        },
    })
}

// ── Change detection ────────────────────────────────────────────────

fn host_differs(current: &HostObject, desired: &HostObject) -> bool {
    current.spec.name != desired.spec.name
        || current.spec.hardware_uuid != desired.spec.hardware_uuid
        || current.spec.cluster_name != desired.spec.cluster_name
        || current.metadata.labels != desired.metadata.labels
        || current.metadata.annotations != desired.metadata.annotations
}

/// Order-insensitive comparison of member lists.
fn same_members(a: &[String], b: &[String]) -> bool {
    let mut a: Vec<&str> = a.iter().map(String::as_str).collect();
    let mut b: Vec<&str> = b.iter().map(String::as_str).collect();
    a.sort_unstable();
    a.dedup();
    b.sort_unstable();
    b.dedup();
    a == b
}

fn cluster_differs(current: &ClusterObject, desired: &ClusterObject) -> bool {
    current.spec.name != desired.spec.name
        || current.metadata.labels != desired.metadata.labels
        || current.metadata.annotations != desired.metadata.annotations
        || !same_members(&current.spec.hosts, &desired.spec.hosts)
}

// ── Reconciler ──────────────────────────────────────────────────────

/// Writes desired objects into a [`ResourceStore`] on behalf of one scope.
pub struct Reconciler<'a, S> {
    store: &'a S,
    scope: &'a CredentialScope,
}

impl<'a, S: ResourceStore> Reconciler<'a, S> {
    pub fn new(store: &'a S, scope: &'a CredentialScope) -> Self {
        Self { store, scope }
    }

    /// Create or update the store object for one host.
    pub async fn upsert_host(
        &self,
        host: &HostEntity,
        owner: &ClusterEntity,
        cancel: &CancellationToken,
    ) -> Result<(ResourceId, Outcome), CoreError> {
        let desired = desired_host(host, owner, self.scope)?;
        let id = host.id(&self.scope.name)?;
        let outcome = self.apply(desired, host_differs, cancel).await?;
        debug!(host = %host.name, id = %id, %outcome, "host reconciled");
        Ok((id, outcome))
    }

    /// Upsert every member host, then the cluster object referencing them.
    pub async fn upsert_cluster(
        &self,
        cluster: &ClusterEntity,
        cancel: &CancellationToken,
    ) -> Result<ClusterUpsert, CoreError> {
        let mut hosts = Vec::with_capacity(cluster.hosts.len());
        for host in &cluster.hosts {
            let (_, outcome) = self.upsert_host(host, cluster, cancel).await?;
            hosts.push(outcome);
        }

        let desired = desired_cluster(cluster, self.scope)?;
        let id = cluster.id(&self.scope.name)?;
        let outcome = self.apply(desired, cluster_differs, cancel).await?;
        debug!(
            cluster = %cluster.name,
            datacenter = %cluster.datacenter,
            kind = %cluster.kind,
            id = %id,
            %outcome,
            "cluster reconciled"
        );
        Ok(ClusterUpsert { id, outcome, hosts })
    }

    async fn apply<T: StoreObject>(
        &self,
        desired: T,
        differs: fn(&T, &T) -> bool,
        cancel: &CancellationToken,
    ) -> Result<Outcome, CoreError> {
        let id = desired.name().to_owned();

        let existing = guarded(cancel, self.store.get::<T>(&id))
            .await?
            .map_err(|e| CoreError::store("get", T::KIND, &id, e))?;

        let Some(current) = existing else {
            return match guarded(cancel, self.store.create(&desired)).await? {
                Ok(()) => Ok(Outcome::Created),
                Err(e) if e.is_already_exists() => {
                    debug!(kind = T::KIND, %id, "created concurrently by another writer");
                    Ok(Outcome::Unchanged)
                }
                Err(e) => Err(CoreError::store("create", T::KIND, id, e)),
            };
        };

        if !differs(&current, &desired) {
            return Ok(Outcome::Unchanged);
        }

        let mut next = desired;
        let meta = next.metadata_mut();
        meta.resource_version = current.metadata().resource_version;
        meta.created_at = current.metadata().created_at;
        guarded(cancel, self.store.update(&next))
            .await?
            .map_err(|e| CoreError::store("update", T::KIND, id, e))?;
        Ok(Outcome::Updated)
    }
}
