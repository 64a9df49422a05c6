// Directory-backed resource store
//
// One JSON document per object at `{root}/{namespace}/{kind}/{name}.json`.
// Writes go to a temp file first; creates publish it with a hard link
// (fails if the name is taken), updates with a rename. A process-local
// write lock serializes the read-check-write cycle of updates.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use super::{LabelSelector, ResourceStore, StoreObject};
use crate::error::Error;

/// A [`ResourceStore`] persisting objects as JSON files.
pub struct FileStore {
    root: PathBuf,
    namespace: String,
    write_lock: Mutex<()>,
    tmp_seq: AtomicU64,
}

impl FileStore {
    /// Bind a store to `root`, scoped to `namespace`. Directories are
    /// created lazily on first write.
    pub fn new(root: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            namespace: namespace.into(),
            write_lock: Mutex::new(()),
            tmp_seq: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn kind_dir(&self, kind: &str) -> PathBuf {
        self.root.join(&self.namespace).join(kind)
    }

    fn object_path(&self, kind: &str, name: &str) -> Result<PathBuf, Error> {
        validate_name(name)?;
        Ok(self.kind_dir(kind).join(format!("{name}.json")))
    }

    fn temp_path(&self, kind: &str, name: &str) -> PathBuf {
        let seq = self.tmp_seq.fetch_add(1, Ordering::Relaxed);
        self.kind_dir(kind)
            .join(format!(".{name}.{}.{seq}.tmp", std::process::id()))
    }

    async fn read_object<T: StoreObject>(path: &Path) -> Result<Option<T>, Error> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Serialize `object` into a fresh temp file next to its final path.
    async fn write_temp<T: StoreObject>(&self, object: &T) -> Result<PathBuf, Error> {
        let dir = self.kind_dir(T::KIND);
        tokio::fs::create_dir_all(&dir).await?;
        let tmp = self.temp_path(T::KIND, object.name());
        let body = serde_json::to_vec_pretty(object)?;
        tokio::fs::write(&tmp, body).await?;
        Ok(tmp)
    }
}

/// Reject names that would escape the kind directory.
fn validate_name(name: &str) -> Result<(), Error> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.contains("..");
    if bad {
        return Err(Error::Backend {
            message: format!("invalid object name '{name}'"),
        });
    }
    Ok(())
}

/// Resource versions are per-object here: the next one is derived from
/// what is on disk.
fn bump_version(previous: u64) -> u64 {
    previous + 1
}

impl ResourceStore for FileStore {
    async fn get<T: StoreObject>(&self, name: &str) -> Result<Option<T>, Error> {
        let path = self.object_path(T::KIND, name)?;
        Self::read_object(&path).await
    }

    async fn create<T: StoreObject>(&self, object: &T) -> Result<(), Error> {
        let path = self.object_path(T::KIND, object.name())?;
        let _guard = self.write_lock.lock().await;

        let mut stored = object.clone();
        let meta = stored.metadata_mut();
        meta.namespace.clone_from(&self.namespace);
        meta.resource_version = bump_version(0);
        meta.created_at = Some(Utc::now());

        let tmp = self.write_temp(&stored).await?;
        let linked = tokio::fs::hard_link(&tmp, &path).await;
        let _ = tokio::fs::remove_file(&tmp).await;
        match linked {
            Ok(()) => {
                debug!(kind = T::KIND, name = object.name(), "created object file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(Error::already_exists(T::KIND, object.name()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn update<T: StoreObject>(&self, object: &T) -> Result<(), Error> {
        let path = self.object_path(T::KIND, object.name())?;
        let _guard = self.write_lock.lock().await;

        let Some(current) = Self::read_object::<T>(&path).await? else {
            return Err(Error::not_found(T::KIND, object.name()));
        };
        let found = current.metadata().resource_version;
        let expected = object.metadata().resource_version;
        if expected != found {
            return Err(Error::Conflict {
                kind: T::KIND.into(),
                name: object.name().into(),
                expected,
                found,
            });
        }

        let mut stored = object.clone();
        let meta = stored.metadata_mut();
        meta.namespace.clone_from(&self.namespace);
        meta.resource_version = bump_version(found);
        meta.created_at = current.metadata().created_at;

        let tmp = self.write_temp(&stored).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        debug!(kind = T::KIND, name = object.name(), "updated object file");
        Ok(())
    }

    async fn delete<T: StoreObject>(&self, name: &str) -> Result<(), Error> {
        let path = self.object_path(T::KIND, name)?;
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(kind = T::KIND, name, "deleted object file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::not_found(T::KIND, name))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list<T: StoreObject>(&self, selector: &LabelSelector) -> Result<Vec<T>, Error> {
        let dir = self.kind_dir(T::KIND);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut out = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            if file_name.starts_with('.') || !file_name.ends_with(".json") {
                continue;
            }
            // Removed between read_dir and read: skip it.
            let Some(object) = Self::read_object::<T>(&entry.path()).await? else {
                continue;
            };
            if selector.matches(&object.metadata().labels) {
                out.push(object);
            }
        }
        out.sort_by(|a, b| a.name().cmp(b.name()));
        trace!(kind = T::KIND, %selector, count = out.len(), "listed object files");
        Ok(out)
    }
}
