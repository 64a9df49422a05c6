// ── Core error types ──
//
// Pass-level errors from invsync-core. Every variant aborts the current
// pass and carries enough context (phase, entity) for the caller to
// report which step failed. Nothing here is retried internally.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Discovery ────────────────────────────────────────────────────
    /// The inventory collaborator failed for a reason other than benign absence.
    #[error("Discovery failed while {context}: {source}")]
    Discovery {
        context: String,
        #[source]
        source: invsync_api::Error,
    },

    // ── Naming ───────────────────────────────────────────────────────
    /// A name could not be turned into a store identifier.
    #[error("Cannot derive an identifier from '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    // ── Store ────────────────────────────────────────────────────────
    /// A resource-store call failed outside the idempotent no-op cases.
    #[error("Store {operation} failed for {kind} '{identifier}': {source}")]
    Store {
        operation: &'static str,
        kind: &'static str,
        identifier: String,
        #[source]
        source: invsync_api::Error,
    },

    // ── Lifecycle ────────────────────────────────────────────────────
    /// The caller cancelled the pass.
    #[error("Sync pass cancelled")]
    Cancelled,

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub(crate) fn discovery(context: impl Into<String>, source: invsync_api::Error) -> Self {
        Self::Discovery {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn store(
        operation: &'static str,
        kind: &'static str,
        identifier: impl Into<String>,
        source: invsync_api::Error,
    ) -> Self {
        Self::Store {
            operation,
            kind,
            identifier: identifier.into(),
            source,
        }
    }

    /// Returns `true` if the pass stopped because the caller cancelled it.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
