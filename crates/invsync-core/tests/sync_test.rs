#![allow(clippy::unwrap_used)]

// End-to-end sync passes against an in-memory store and a scripted inventory.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use invsync_api::{
    ANNOTATION_DATACENTER, Cluster, ClusterObject, Datacenter, DatacenterFilter, Error, Host,
    HostObject, HostScope, Inventory, LABEL_CLUSTER, LABEL_CREDENTIALS, MemoryStore,
    ResourceStore, SnapshotInventory, StoreObject,
};
use invsync_core::{
    CoreError, CredentialScope, SyncConfig, Synchronizer, UNCLUSTERED_NAME, cluster_id, host_id,
};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

// ── Fixtures ────────────────────────────────────────────────────────

const BASE: &str = r"
datacenters:
  - name: DC1
    clusters:
      - name: C1
        hosts:
          - { name: h1, hardware_uuid: u1 }
          - { name: h2, hardware_uuid: u2 }
    hosts:
      - { name: h3, hardware_uuid: u3 }
";

const WITHOUT_H2: &str = r"
datacenters:
  - name: DC1
    clusters:
      - name: C1
        hosts:
          - { name: h1, hardware_uuid: u1 }
    hosts:
      - { name: h3, hardware_uuid: u3 }
";

const H2_MISSING_UUID: &str = r"
datacenters:
  - name: DC1
    clusters:
      - name: C1
        hosts:
          - { name: h1, hardware_uuid: u1 }
          - { name: h2 }
    hosts:
      - { name: h3, hardware_uuid: u3 }
";

const TWO_DATACENTERS: &str = r"
datacenters:
  - name: DC1
    clusters:
      - name: C1
        hosts:
          - { name: h1, hardware_uuid: u1 }
  - name: DC2
    clusters:
      - name: C1
        hosts:
          - { name: h9, hardware_uuid: u9 }
";

#[derive(Debug, Default, Clone, Copy)]
struct Faults {
    datacenters_fail: bool,
    clusters_not_found: bool,
    clusters_fail: bool,
}

/// Snapshot inventory whose document can be swapped and whose calls can fail on demand.
struct ScriptedInventory {
    snapshot: Mutex<SnapshotInventory>,
    faults: Mutex<Faults>,
    datacenter_calls: AtomicUsize,
}

impl ScriptedInventory {
    fn new(yaml: &str) -> Self {
        Self {
            snapshot: Mutex::new(SnapshotInventory::from_yaml_str(yaml).unwrap()),
            faults: Mutex::new(Faults::default()),
            datacenter_calls: AtomicUsize::new(0),
        }
    }

    fn replace(&self, yaml: &str) {
        *self.snapshot.lock().unwrap() = SnapshotInventory::from_yaml_str(yaml).unwrap();
    }

    fn set_faults(&self, faults: Faults) {
        *self.faults.lock().unwrap() = faults;
    }

    fn snapshot(&self) -> SnapshotInventory {
        self.snapshot.lock().unwrap().clone()
    }

    fn faults(&self) -> Faults {
        *self.faults.lock().unwrap()
    }
}

fn backend(message: &str) -> Error {
    Error::Backend {
        message: message.into(),
    }
}

impl Inventory for ScriptedInventory {
    async fn list_datacenters(&self, filter: &DatacenterFilter) -> Result<Vec<Datacenter>, Error> {
        self.datacenter_calls.fetch_add(1, Ordering::SeqCst);
        if self.faults().datacenters_fail {
            return Err(backend("session expired"));
        }
        self.snapshot().list_datacenters(filter).await
    }

    async fn list_clusters(&self, datacenter: &Datacenter) -> Result<Vec<Cluster>, Error> {
        let faults = self.faults();
        if faults.clusters_not_found {
            return Err(Error::NotFound {
                kind: "cluster folder".into(),
                name: datacenter.name.clone(),
            });
        }
        if faults.clusters_fail {
            return Err(backend("permission denied"));
        }
        self.snapshot().list_clusters(datacenter).await
    }

    async fn list_hosts(&self, scope: HostScope<'_>) -> Result<Vec<Host>, Error> {
        self.snapshot().list_hosts(scope).await
    }

    async fn host_hardware_id(&self, host: &Host) -> Result<String, Error> {
        self.snapshot().host_hardware_id(host).await
    }
}

fn synchronizer(
    yaml: &str,
    scope: CredentialScope,
    store: &Arc<MemoryStore>,
) -> Synchronizer<ScriptedInventory, Arc<MemoryStore>> {
    Synchronizer::new(
        ScriptedInventory::new(yaml),
        Arc::clone(store),
        SyncConfig::new(scope),
    )
}

fn store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new("migration-system"))
}

fn sorted_ids(names: &[&str], scope: &str) -> Vec<String> {
    let mut ids: Vec<String> = names
        .iter()
        .map(|n| host_id(n, scope).unwrap().into_string())
        .collect();
    ids.sort();
    ids
}

// ── Initial pass ────────────────────────────────────────────────────

#[tokio::test]
async fn first_pass_creates_clusters_and_hosts() {
    let store = store();
    let sync = synchronizer(BASE, CredentialScope::new("creds-a"), &store);
    let cancel = CancellationToken::new();

    let report = sync.run_pass(&cancel).await.unwrap();
    assert_eq!(report.clusters.created, 2);
    assert_eq!(report.hosts.created, 3);
    assert_eq!(report.clusters.deleted + report.hosts.deleted, 0);

    let c1_id = cluster_id("C1", "DC1", "creds-a").unwrap();
    let c1: ClusterObject = store.get(c1_id.as_str()).await.unwrap().unwrap();
    assert_eq!(c1.spec.name, "C1");
    assert_eq!(c1.spec.hosts, sorted_ids(&["h1", "h2"], "creds-a"));
    assert_eq!(c1.metadata.labels[LABEL_CREDENTIALS], "creds-a");
    assert_eq!(c1.metadata.annotations[ANNOTATION_DATACENTER], "DC1");
    assert_eq!(c1.metadata.namespace, "migration-system");

    let none_id = cluster_id(UNCLUSTERED_NAME, "DC1", "creds-a").unwrap();
    let none: ClusterObject = store.get(none_id.as_str()).await.unwrap().unwrap();
    assert_eq!(none.spec.name, UNCLUSTERED_NAME);
    assert_eq!(none.spec.hosts, sorted_ids(&["h3"], "creds-a"));

    let h3_id = host_id("h3", "creds-a").unwrap();
    let h3: HostObject = store.get(h3_id.as_str()).await.unwrap().unwrap();
    assert_eq!(h3.spec.hardware_uuid, "u3");
    assert_eq!(h3.spec.cluster_name, UNCLUSTERED_NAME);
    assert_eq!(h3.metadata.labels[LABEL_CLUSTER], none_id.as_str());

    assert_eq!(sync.clusters(&cancel).await.unwrap().len(), 2);
    assert_eq!(sync.hosts(&cancel).await.unwrap().len(), 3);
    let members = sync.hosts_for_cluster(c1_id.as_str(), &cancel).await.unwrap();
    let mut names: Vec<_> = members.iter().map(|h| h.spec.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, ["h1", "h2"]);
}

#[tokio::test]
async fn second_pass_over_same_inventory_writes_nothing() {
    let store = store();
    let sync = synchronizer(BASE, CredentialScope::new("creds-a"), &store);
    let cancel = CancellationToken::new();

    sync.run_pass(&cancel).await.unwrap();
    let before = store.writes();

    let report = sync.run_pass(&cancel).await.unwrap();
    assert!(report.is_noop());
    assert_eq!(report.clusters.unchanged, 2);
    assert_eq!(report.hosts.unchanged, 3);
    assert_eq!(store.writes(), before);
}

// ── Convergence ─────────────────────────────────────────────────────

#[tokio::test]
async fn removed_host_is_deleted_and_membership_updated() {
    let store = store();
    let sync = synchronizer(BASE, CredentialScope::new("creds-a"), &store);
    let cancel = CancellationToken::new();
    sync.run_pass(&cancel).await.unwrap();

    sync.inventory().replace(WITHOUT_H2);
    let report = sync.run_pass(&cancel).await.unwrap();
    assert_eq!(report.hosts.deleted, 1);
    assert_eq!(report.clusters.updated, 1);
    assert_eq!(report.clusters.deleted, 0);

    let h2_id = host_id("h2", "creds-a").unwrap();
    assert!(store.get::<HostObject>(h2_id.as_str()).await.unwrap().is_none());

    let c1_id = cluster_id("C1", "DC1", "creds-a").unwrap();
    let c1: ClusterObject = store.get(c1_id.as_str()).await.unwrap().unwrap();
    assert_eq!(c1.spec.hosts, sorted_ids(&["h1"], "creds-a"));
}

#[tokio::test]
async fn host_joining_a_cluster_moves_between_groups() {
    let store = store();
    let sync = synchronizer(BASE, CredentialScope::new("creds-a"), &store);
    let cancel = CancellationToken::new();
    sync.run_pass(&cancel).await.unwrap();

    sync.inventory().replace(
        r"
datacenters:
  - name: DC1
    clusters:
      - name: C1
        hosts:
          - { name: h1, hardware_uuid: u1 }
          - { name: h2, hardware_uuid: u2 }
          - { name: h3, hardware_uuid: u3 }
",
    );
    let report = sync.run_pass(&cancel).await.unwrap();
    assert_eq!(report.hosts.updated, 1);
    assert_eq!(report.clusters.updated, 2);

    let none_id = cluster_id(UNCLUSTERED_NAME, "DC1", "creds-a").unwrap();
    let none: ClusterObject = store.get(none_id.as_str()).await.unwrap().unwrap();
    assert!(none.spec.hosts.is_empty());

    let h3: HostObject = store
        .get(host_id("h3", "creds-a").unwrap().as_str())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(h3.spec.cluster_name, "C1");
}

#[tokio::test]
async fn empty_unclustered_group_is_still_persisted() {
    let store = store();
    let sync = synchronizer(
        r"
datacenters:
  - name: DC1
    clusters:
      - name: C1
        hosts:
          - { name: h1, hardware_uuid: u1 }
",
        CredentialScope::new("creds-a"),
        &store,
    );
    sync.run_pass(&CancellationToken::new()).await.unwrap();

    let none_id = cluster_id(UNCLUSTERED_NAME, "DC1", "creds-a").unwrap();
    let none: ClusterObject = store.get(none_id.as_str()).await.unwrap().unwrap();
    assert!(none.spec.hosts.is_empty());
}

#[tokio::test]
async fn host_claimed_by_two_clusters_belongs_to_the_first() {
    let store = store();
    let sync = synchronizer(
        r"
datacenters:
  - name: DC1
    clusters:
      - name: C1
        hosts:
          - { name: h1, hardware_uuid: u1 }
      - name: C2
        hosts:
          - { name: h1, hardware_uuid: u1 }
",
        CredentialScope::new("creds-a"),
        &store,
    );
    let report = sync.run_pass(&CancellationToken::new()).await.unwrap();
    assert_eq!(report.hosts.created, 1);

    let c2: ClusterObject = store
        .get(cluster_id("C2", "DC1", "creds-a").unwrap().as_str())
        .await
        .unwrap()
        .unwrap();
    assert!(c2.spec.hosts.is_empty());
}

// ── Scope isolation ─────────────────────────────────────────────────

#[tokio::test]
async fn scopes_sharing_a_store_never_touch_each_other() {
    let store = store();
    let cancel = CancellationToken::new();
    let a = synchronizer(BASE, CredentialScope::new("creds-a"), &store);
    let b = synchronizer(BASE, CredentialScope::new("creds-b"), &store);

    a.run_pass(&cancel).await.unwrap();
    b.run_pass(&cancel).await.unwrap();
    assert_eq!(store.len(), 10);

    // Scope b loses sight of everything; only its own objects go.
    b.inventory().replace("datacenters: []");
    let report = b.run_pass(&cancel).await.unwrap();
    assert_eq!(report.clusters.deleted, 2);
    assert_eq!(report.hosts.deleted, 3);

    assert_eq!(a.clusters(&cancel).await.unwrap().len(), 2);
    assert_eq!(a.hosts(&cancel).await.unwrap().len(), 3);
    assert!(b.hosts(&cancel).await.unwrap().is_empty());
    assert_eq!(store.len(), 5);
}

#[tokio::test]
async fn scope_names_differing_in_case_share_ownership() {
    let store = store();
    let cancel = CancellationToken::new();
    let lower = synchronizer(BASE, CredentialScope::new("prod"), &store);
    let upper = synchronizer(BASE, CredentialScope::new("Prod"), &store);

    lower.run_pass(&cancel).await.unwrap();
    let before = store.writes();

    for _ in 0..2 {
        assert!(upper.run_pass(&cancel).await.unwrap().is_noop());
        assert!(lower.run_pass(&cancel).await.unwrap().is_noop());
    }
    assert_eq!(store.writes(), before);
    assert_eq!(store.len(), 5);

    let hosts = upper.hosts(&cancel).await.unwrap();
    assert_eq!(hosts.len(), 3);
    for host in &hosts {
        assert_eq!(host.metadata.labels[LABEL_CREDENTIALS], "prod");
    }
}

// ── Datacenter pinning ──────────────────────────────────────────────

#[tokio::test]
async fn pinned_datacenter_limits_discovery() {
    let store = store();
    let scope = CredentialScope::new("creds-a").with_datacenter("DC2");
    let sync = synchronizer(TWO_DATACENTERS, scope, &store);
    let cancel = CancellationToken::new();

    sync.run_pass(&cancel).await.unwrap();
    let hosts = sync.hosts(&cancel).await.unwrap();
    let names: Vec<_> = hosts.iter().map(|h| h.spec.name.as_str()).collect();
    assert_eq!(names, ["h9"]);

    // Same cluster name in another datacenter is a distinct object.
    assert!(
        store
            .get::<ClusterObject>(cluster_id("C1", "DC1", "creds-a").unwrap().as_str())
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        store
            .get::<ClusterObject>(cluster_id("C1", "DC2", "creds-a").unwrap().as_str())
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn unknown_pinned_datacenter_fails_without_sweeping() {
    let store = store();
    let cancel = CancellationToken::new();
    let open = synchronizer(TWO_DATACENTERS, CredentialScope::new("creds-a"), &store);
    open.run_pass(&cancel).await.unwrap();
    let before = store.writes();

    let pinned = synchronizer(
        TWO_DATACENTERS,
        CredentialScope::new("creds-a").with_datacenter("DC-GONE"),
        &store,
    );
    let err = pinned.run_pass(&cancel).await.unwrap_err();
    assert!(matches!(err, CoreError::Discovery { .. }), "got {err:?}");
    assert!(err.to_string().contains("DC-GONE"));
    assert_eq!(store.writes(), before);
    assert_eq!(store.len(), 6);
}

#[tokio::test]
async fn inventory_without_datacenters_sweeps_scope() {
    let store = store();
    let cancel = CancellationToken::new();
    let sync = synchronizer(BASE, CredentialScope::new("creds-a"), &store);
    sync.run_pass(&cancel).await.unwrap();

    sync.inventory().replace("datacenters: []");
    let report = sync.run_pass(&cancel).await.unwrap();
    assert_eq!(report.clusters.deleted, 2);
    assert_eq!(report.hosts.deleted, 3);
    assert!(store.is_empty());
}

// ── Cross-datacenter placement ──────────────────────────────────────

/// The cluster object a host's cluster label points at.
async fn owning_cluster(store: &MemoryStore, host: &str, scope: &str) -> ClusterObject {
    let h: HostObject = store
        .get(host_id(host, scope).unwrap().as_str())
        .await
        .unwrap()
        .unwrap();
    store
        .get(&h.metadata.labels[LABEL_CLUSTER])
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("{host} references a missing cluster"))
}

#[tokio::test]
async fn host_moving_between_datacenters_follows_its_cluster() {
    let store = store();
    let cancel = CancellationToken::new();
    let sync = synchronizer(TWO_DATACENTERS, CredentialScope::new("creds-a"), &store);
    sync.run_pass(&cancel).await.unwrap();

    sync.inventory().replace(
        r"
datacenters:
  - name: DC1
    clusters:
      - name: C1
        hosts: []
  - name: DC2
    clusters:
      - name: C1
        hosts:
          - { name: h9, hardware_uuid: u9 }
          - { name: h1, hardware_uuid: u1 }
",
    );
    sync.run_pass(&cancel).await.unwrap();

    let h1_id = host_id("h1", "creds-a").unwrap().into_string();
    let owner = owning_cluster(&store, "h1", "creds-a").await;
    assert_eq!(owner.name(), cluster_id("C1", "DC2", "creds-a").unwrap().as_str());
    assert!(owner.spec.hosts.contains(&h1_id));

    let old: ClusterObject = store
        .get(cluster_id("C1", "DC1", "creds-a").unwrap().as_str())
        .await
        .unwrap()
        .unwrap();
    assert!(old.spec.hosts.is_empty());
    assert!(sync.run_pass(&cancel).await.unwrap().is_noop());
}

#[tokio::test]
async fn host_named_in_two_datacenters_belongs_to_the_first() {
    let store = store();
    let cancel = CancellationToken::new();
    let sync = synchronizer(
        r"
datacenters:
  - name: DC1
    clusters:
      - name: C1
        hosts:
          - { name: h1, hardware_uuid: u1 }
  - name: DC2
    clusters:
      - name: C1
        hosts:
          - { name: h1, hardware_uuid: u1 }
    hosts:
      - { name: H1, hardware_uuid: u1 }
",
        CredentialScope::new("creds-a"),
        &store,
    );

    let report = sync.run_pass(&cancel).await.unwrap();
    assert_eq!(report.hosts.created, 1);

    let h1_id = host_id("h1", "creds-a").unwrap().into_string();
    let owner = owning_cluster(&store, "h1", "creds-a").await;
    assert_eq!(owner.name(), cluster_id("C1", "DC1", "creds-a").unwrap().as_str());
    assert_eq!(owner.spec.hosts, [h1_id]);

    for dc2_cluster in ["C1", UNCLUSTERED_NAME] {
        let c: ClusterObject = store
            .get(cluster_id(dc2_cluster, "DC2", "creds-a").unwrap().as_str())
            .await
            .unwrap()
            .unwrap();
        assert!(c.spec.hosts.is_empty(), "{dc2_cluster} in DC2 kept h1");
    }

    let before = store.writes();
    assert!(sync.run_pass(&cancel).await.unwrap().is_noop());
    assert_eq!(store.writes(), before);
}

// ── Failure handling ────────────────────────────────────────────────

#[tokio::test]
async fn missing_hardware_id_aborts_before_any_write() {
    let store = store();
    let sync = synchronizer(H2_MISSING_UUID, CredentialScope::new("creds-a"), &store);

    let err = sync.run_pass(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, CoreError::Discovery { .. }), "got {err:?}");
    assert_eq!(store.writes().total(), 0);
    assert!(store.is_empty());
}

#[tokio::test]
async fn failed_discovery_after_success_leaves_store_untouched() {
    let store = store();
    let sync = synchronizer(BASE, CredentialScope::new("creds-a"), &store);
    let cancel = CancellationToken::new();
    sync.run_pass(&cancel).await.unwrap();
    let before = store.writes();

    sync.inventory().replace(H2_MISSING_UUID);
    assert!(sync.run_pass(&cancel).await.is_err());
    assert_eq!(store.writes(), before);
    assert_eq!(store.len(), 5);
}

#[tokio::test]
async fn cluster_listing_not_found_means_no_real_clusters() {
    let store = store();
    let sync = synchronizer(BASE, CredentialScope::new("creds-a"), &store);
    sync.inventory().set_faults(Faults {
        clusters_not_found: true,
        ..Faults::default()
    });

    let report = sync.run_pass(&CancellationToken::new()).await.unwrap();
    // Only the unclustered group, holding every host of the datacenter.
    assert_eq!(report.clusters.created, 1);
    assert_eq!(report.hosts.created, 3);
    let none: ClusterObject = store
        .get(cluster_id(UNCLUSTERED_NAME, "DC1", "creds-a").unwrap().as_str())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(none.spec.hosts, sorted_ids(&["h1", "h2", "h3"], "creds-a"));
}

#[tokio::test]
async fn cluster_listing_failure_is_a_discovery_error() {
    let store = store();
    let sync = synchronizer(BASE, CredentialScope::new("creds-a"), &store);
    sync.inventory().set_faults(Faults {
        clusters_fail: true,
        ..Faults::default()
    });

    let err = sync.run_pass(&CancellationToken::new()).await.unwrap_err();
    assert!(err.to_string().contains("DC1"), "got {err}");
    assert!(store.is_empty());
}

#[tokio::test]
async fn cancelled_pass_writes_nothing() {
    let store = store();
    let sync = synchronizer(BASE, CredentialScope::new("creds-a"), &store);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = sync.run_pass(&cancel).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(store.is_empty());
}

#[tokio::test]
async fn blank_scope_is_rejected() {
    let store = store();
    let sync = synchronizer(BASE, CredentialScope::new(""), &store);
    let err = sync.run_pass(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, CoreError::Config { .. }));
    assert_eq!(sync.inventory().datacenter_calls.load(Ordering::SeqCst), 0);
}

// ── Periodic mode ───────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn periodic_mode_keeps_running_after_failures() {
    let store = store();
    let sync = synchronizer(BASE, CredentialScope::new("creds-a"), &store);
    sync.inventory().set_faults(Faults {
        datacenters_fail: true,
        ..Faults::default()
    });
    let cancel = CancellationToken::new();

    let stopper = async {
        tokio::time::sleep(Duration::from_secs(150)).await;
        cancel.cancel();
    };
    tokio::join!(sync.run_periodic(Duration::from_secs(60), &cancel), stopper);

    // Passes at t=0, 60 and 120; all failed, none stopped the loop.
    assert_eq!(sync.inventory().datacenter_calls.load(Ordering::SeqCst), 3);
    assert!(store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn periodic_mode_converges_once_inventory_recovers() {
    let store = store();
    let sync = synchronizer(BASE, CredentialScope::new("creds-a"), &store);
    sync.inventory().set_faults(Faults {
        datacenters_fail: true,
        ..Faults::default()
    });
    let cancel = CancellationToken::new();

    let script = async {
        tokio::time::sleep(Duration::from_secs(30)).await;
        sync.inventory().set_faults(Faults::default());
        tokio::time::sleep(Duration::from_secs(60)).await;
        cancel.cancel();
    };
    tokio::join!(sync.run_periodic(Duration::from_secs(60), &cancel), script);

    assert_eq!(store.len(), 5);
}

// ── Lookups ─────────────────────────────────────────────────────────

#[tokio::test]
async fn single_object_lookup_respects_ownership() {
    let store = store();
    let cancel = CancellationToken::new();
    let a = synchronizer(BASE, CredentialScope::new("creds-a"), &store);
    let b = synchronizer(BASE, CredentialScope::new("creds-b"), &store);
    a.run_pass(&cancel).await.unwrap();

    let c1_id = cluster_id("C1", "DC1", "creds-a").unwrap();
    assert!(a.cluster(c1_id.as_str(), &cancel).await.unwrap().is_some());
    assert!(b.cluster(c1_id.as_str(), &cancel).await.unwrap().is_none());

    let h1_id = host_id("h1", "creds-a").unwrap();
    let h1 = a.host(h1_id.as_str(), &cancel).await.unwrap().unwrap();
    assert_eq!(h1.spec.hardware_uuid, "u1");
    assert!(a.host("no-such-host", &cancel).await.unwrap().is_none());
}
