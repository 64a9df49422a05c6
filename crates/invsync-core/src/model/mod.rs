// ── Domain model ──
//
// Plain tree entities rebuilt from the live inventory on every pass.
// Nothing here is persisted directly; the reconciler projects these into
// store objects.

mod entity;

pub use entity::{ClusterEntity, ClusterKind, HostEntity, Topology};
