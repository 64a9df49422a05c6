use thiserror::Error;

/// Top-level error type for the `invsync-api` crate.
///
/// Covers every failure mode across both collaborator surfaces:
/// inventory discovery and resource-store persistence.
/// `invsync-core` maps these into pass-level diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Lookup ──────────────────────────────────────────────────────
    /// The requested object does not exist (inventory record or stored object).
    #[error("{kind} '{name}' not found")]
    NotFound { kind: String, name: String },

    /// A create raced with another writer and lost.
    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: String, name: String },

    /// An update carried a stale resource version.
    #[error("{kind} '{name}' was modified concurrently (expected version {expected}, found {found})")]
    Conflict {
        kind: String,
        name: String,
        expected: u64,
        found: u64,
    },

    // ── Transport ───────────────────────────────────────────────────
    /// Filesystem failure in a file-backed collaborator.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML deserialization failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // ── Backend ─────────────────────────────────────────────────────
    /// Opaque failure reported by a backend.
    #[error("backend error: {message}")]
    Backend { message: String },
}

impl Error {
    pub(crate) fn not_found(kind: &str, name: &str) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub(crate) fn already_exists(kind: &str, name: &str) -> Self {
        Self::AlreadyExists {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Returns `true` if this is a "not found" error.
    ///
    /// I/O errors of kind `NotFound` count as well, so file-backed
    /// collaborators need not translate every path lookup.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Returns `true` if a create lost a race against another writer.
    pub fn is_already_exists(&self) -> bool {
        match self {
            Self::AlreadyExists { .. } => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::AlreadyExists,
            _ => false,
        }
    }

    /// Returns `true` if an update was rejected for a stale resource version.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
