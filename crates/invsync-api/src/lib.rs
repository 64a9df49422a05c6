// invsync-api: collaborator boundary for the inventory synchronization engine

pub mod error;
pub mod inventory;
pub mod store;

pub use error::Error;
pub use inventory::file::SnapshotFile;
pub use inventory::snapshot::{InventoryDocument, SnapshotInventory};
pub use inventory::{Cluster, Datacenter, DatacenterFilter, Host, HostScope, Inventory};
pub use store::file::FileStore;
pub use store::memory::{MemoryStore, WriteStats};
pub use store::{
    ANNOTATION_DATACENTER, ClusterObject, ClusterSpec, HostObject, HostSpec, LABEL_CLUSTER,
    LABEL_CREDENTIALS, LabelSelector, ObjectMeta, ResourceStore, StoreObject,
};
