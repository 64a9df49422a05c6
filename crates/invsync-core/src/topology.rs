// ── Topology assembly ──
//
// Walks the inventory collaborator into a `Topology`: every real cluster
// of every target datacenter, plus one unclustered group per datacenter.
// Legitimate absence at datacenter-level listings yields empty results,
// except a pinned datacenter that does not exist, which fails the pass.
// Any failure resolving a host aborts the whole pass before anything is
// written. A host is placed once per pass: the first cluster, in
// datacenter then listing order, that claims it keeps it.

use std::collections::HashSet;

use invsync_api::{Datacenter, DatacenterFilter, Host, HostScope, Inventory};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cancel::guarded;
use crate::config::CredentialScope;
use crate::error::CoreError;
use crate::ident::{ResourceId, UNCLUSTERED_NAME, host_id};
use crate::model::{ClusterEntity, HostEntity, Topology};

/// Builds a [`Topology`] snapshot from an [`Inventory`].
pub struct TopologyAssembler<'a, I> {
    inventory: &'a I,
    scope: &'a CredentialScope,
}

impl<'a, I: Inventory> TopologyAssembler<'a, I> {
    pub fn new(inventory: &'a I, scope: &'a CredentialScope) -> Self {
        Self { inventory, scope }
    }

    /// Discover the full topology visible to the scope.
    pub async fn assemble(&self, cancel: &CancellationToken) -> Result<Topology, CoreError> {
        let datacenters = self.target_datacenters(cancel).await?;

        let mut topology = Topology::default();
        let mut placed = HashSet::new();
        for dc in &datacenters {
            let real = self.real_clusters(dc, &mut placed, cancel).await?;
            let unclustered = self.unclustered_group(dc, &mut placed, cancel).await?;
            debug!(
                datacenter = %dc.name,
                clusters = real.len(),
                unclustered_hosts = unclustered.hosts.len(),
                "assembled datacenter"
            );
            topology.clusters.extend(real);
            topology.clusters.push(unclustered);
        }

        info!(
            scope = %self.scope.name,
            datacenters = datacenters.len(),
            clusters = topology.clusters.len(),
            hosts = topology.host_count(),
            "topology assembled"
        );
        Ok(topology)
    }

    async fn target_datacenters(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Datacenter>, CoreError> {
        let filter = DatacenterFilter::from_pinned(self.scope.pinned_datacenter());
        match guarded(cancel, self.inventory.list_datacenters(&filter)).await? {
            Ok(dcs) => Ok(dcs),
            Err(e) if e.is_not_found() && filter == DatacenterFilter::All => {
                warn!("inventory has no datacenters");
                Ok(Vec::new())
            }
            Err(e) => match filter {
                DatacenterFilter::Named(ref name) => Err(CoreError::discovery(
                    format!("finding pinned datacenter '{name}'"),
                    e,
                )),
                DatacenterFilter::All => Err(CoreError::discovery("listing datacenters", e)),
            },
        }
    }

    /// Real clusters of a datacenter. Every host they claim is added to
    /// `placed`.
    async fn real_clusters(
        &self,
        dc: &Datacenter,
        placed: &mut HashSet<String>,
        cancel: &CancellationToken,
    ) -> Result<Vec<ClusterEntity>, CoreError> {
        let clusters = match guarded(cancel, self.inventory.list_clusters(dc)).await? {
            Ok(clusters) => clusters,
            Err(e) if e.is_not_found() => {
                debug!(datacenter = %dc.name, "datacenter has no clusters");
                Vec::new()
            }
            Err(e) => {
                return Err(CoreError::discovery(
                    format!("listing clusters of datacenter '{}'", dc.name),
                    e,
                ));
            }
        };

        let mut entities = Vec::with_capacity(clusters.len());
        for cluster in &clusters {
            let members = guarded(cancel, self.inventory.list_hosts(HostScope::Cluster(cluster)))
                .await?
                .map_err(|e| {
                    CoreError::discovery(
                        format!(
                            "listing hosts of cluster '{}' in datacenter '{}'",
                            cluster.name, dc.name
                        ),
                        e,
                    )
                })?;

            let mut entity = ClusterEntity::real(&cluster.name, &dc.name);
            for host in &members {
                if !placed.insert(self.placement_key(host)?) {
                    warn!(
                        host = %host.name,
                        cluster = %cluster.name,
                        datacenter = %dc.name,
                        "host already claimed by another cluster, skipping"
                    );
                    continue;
                }
                entity
                    .hosts
                    .push(self.resolve_host(host, &cluster.name, dc, cancel).await?);
            }
            entities.push(entity);
        }
        Ok(entities)
    }

    /// The datacenter's synthetic group: every host not yet placed.
    /// Assembled even when empty so its membership reconciles to nothing.
    async fn unclustered_group(
        &self,
        dc: &Datacenter,
        placed: &mut HashSet<String>,
        cancel: &CancellationToken,
    ) -> Result<ClusterEntity, CoreError> {
        let listing = guarded(cancel, self.inventory.list_hosts(HostScope::Datacenter(dc))).await?;
        let all = match listing {
            Ok(hosts) => hosts,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => {
                return Err(CoreError::discovery(
                    format!("listing hosts of datacenter '{}'", dc.name),
                    e,
                ));
            }
        };

        let mut group = ClusterEntity::unclustered(&dc.name);
        for host in &all {
            if !placed.insert(self.placement_key(host)?) {
                continue;
            }
            group
                .hosts
                .push(self.resolve_host(host, UNCLUSTERED_NAME, dc, cancel).await?);
        }
        Ok(group)
    }

    /// Hosts mapping to the same store identifier are the same host.
    fn placement_key(&self, host: &Host) -> Result<String, CoreError> {
        host_id(&host.name, &self.scope.name).map(ResourceId::into_string)
    }

    async fn resolve_host(
        &self,
        host: &Host,
        cluster: &str,
        dc: &Datacenter,
        cancel: &CancellationToken,
    ) -> Result<HostEntity, CoreError> {
        let hardware_id = guarded(cancel, self.inventory.host_hardware_id(host))
            .await?
            .map_err(|e| {
                CoreError::discovery(
                    format!(
                        "resolving hardware id of host '{}' in datacenter '{}'",
                        host.name, dc.name
                    ),
                    e,
                )
            })?;
        Ok(HostEntity {
            name: host.name.clone(),
            hardware_id,
            cluster: cluster.to_owned(),
            datacenter: dc.name.clone(),
        })
    }
}
