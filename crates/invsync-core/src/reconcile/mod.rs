// ── Store reconciliation ──
//
// Projects topology entities into store objects. `upsert` writes only
// what changed; `gc` deletes scope-owned objects the snapshot no longer
// mentions.

pub mod gc;
pub mod upsert;

use serde::Serialize;
use strum::Display;

pub use gc::{DeletionReport, reconcile_deletions};
pub use upsert::{ClusterUpsert, Reconciler, desired_cluster, desired_host};

/// What a single upsert did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Outcome {
    Created,
    Updated,
    Unchanged,
}

/// Per-kind write tallies for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub deleted: usize,
}

impl KindCounts {
    pub(crate) fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::Updated => self.updated += 1,
            Outcome::Unchanged => self.unchanged += 1,
        }
    }

    /// Number of store writes this tally represents.
    pub fn writes(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}

/// Summary of one completed sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub clusters: KindCounts,
    pub hosts: KindCounts,
}

impl SyncReport {
    pub fn writes(&self) -> usize {
        self.clusters.writes() + self.hosts.writes()
    }

    pub fn is_noop(&self) -> bool {
        self.writes() == 0
    }
}
