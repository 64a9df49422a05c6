// ── Runtime sync configuration ──
//
// These types describe *who* a pass runs as and *how often*. They never
// touch disk: the CLI builds a `SyncConfig` from profiles and flags and
// hands it in.

use std::time::Duration;

use crate::error::CoreError;

/// Namespace objects are written into when none is configured.
pub const DEFAULT_NAMESPACE: &str = "migration-system";

/// The identity a sync pass runs under.
///
/// `name` namespaces every identifier and labels every object the pass
/// owns; `datacenter` optionally pins discovery to one datacenter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialScope {
    pub name: String,
    pub namespace: String,
    pub datacenter: Option<String>,
}

impl CredentialScope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: DEFAULT_NAMESPACE.into(),
            datacenter: None,
        }
    }

    pub fn with_datacenter(mut self, datacenter: impl Into<String>) -> Self {
        self.datacenter = Some(datacenter.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// The pinned datacenter, if any. Empty strings count as unpinned.
    pub fn pinned_datacenter(&self) -> Option<&str> {
        self.datacenter.as_deref().filter(|dc| !dc.is_empty())
    }

    /// Value of the ownership label on every object this scope writes.
    pub fn owner_label(&self) -> String {
        crate::ident::owner_label(&self.name)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.name.trim().is_empty() {
            return Err(CoreError::Config {
                message: "credential scope name must not be empty".into(),
            });
        }
        if self.namespace.trim().is_empty() {
            return Err(CoreError::Config {
                message: "namespace must not be empty".into(),
            });
        }
        Ok(())
    }
}

/// Configuration for a [`Synchronizer`](crate::Synchronizer).
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub scope: CredentialScope,
    /// Delay between passes in periodic mode.
    pub interval: Duration,
}

impl SyncConfig {
    pub fn new(scope: CredentialScope) -> Self {
        Self {
            scope,
            interval: Duration::from_secs(300),
        }
    }
}
