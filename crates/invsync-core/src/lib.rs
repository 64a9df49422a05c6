//! Inventory synchronization engine between `invsync-api` collaborators.
//!
//! Each pass mirrors a virtualization platform's datacenter/cluster/host
//! tree into a declarative resource store on behalf of one credential scope:
//!
//! - **[`TopologyAssembler`]**: Walks the [`Inventory`](invsync_api::Inventory)
//!   into a [`Topology`]. Hosts no real cluster claims land in a per-datacenter
//!   synthetic group named [`UNCLUSTERED_NAME`].
//!
//! - **Identifiers** ([`ident`]): Deterministic, scope-namespaced,
//!   DNS-1123-safe [`ResourceId`]s. The same name, datacenter, and scope
//!   always produce the same identifier.
//!
//! - **[`Reconciler`]**: Create-or-update of cluster and host objects with
//!   field-level change detection, so an unchanged inventory costs no writes.
//!
//! - **[`reconcile_deletions`]**: Removes scope-owned objects the topology
//!   no longer produces. Other scopes' objects are never touched.
//!
//! - **[`Synchronizer`]**: Runs passes once or periodically, and lists what
//!   the scope currently owns.

mod cancel;
pub mod config;
pub mod error;
pub mod ident;
pub mod model;
pub mod reconcile;
pub mod sync;
pub mod topology;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{CredentialScope, DEFAULT_NAMESPACE, SyncConfig};
pub use error::CoreError;
pub use ident::{ResourceId, UNCLUSTERED_NAME, cluster_id, cluster_key, host_id, normalize};
pub use model::{ClusterEntity, ClusterKind, HostEntity, Topology};
pub use reconcile::{
    ClusterUpsert, DeletionReport, KindCounts, Outcome, Reconciler, SyncReport, desired_cluster,
    desired_host, reconcile_deletions,
};
pub use sync::Synchronizer;
pub use topology::TopologyAssembler;
