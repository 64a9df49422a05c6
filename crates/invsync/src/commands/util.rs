//! Shared helpers for command handlers.

use invsync_api::{FileStore, SnapshotInventory};
use invsync_core::Synchronizer;
use tokio_util::sync::CancellationToken;

use crate::config::Resolved;
use crate::error::CliError;

/// Read-only view of the store for the resolved scope.
///
/// Listing never consults the inventory, so an empty snapshot stands in.
pub fn store_view(resolved: &Resolved) -> Synchronizer<SnapshotInventory, FileStore> {
    let store = FileStore::new(&resolved.store, &resolved.sync.scope.namespace);
    Synchronizer::new(SnapshotInventory::default(), store, resolved.sync.clone())
}

/// A token cancelled on the first Ctrl-C.
pub fn interrupt_token() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping");
            child.cancel();
        }
    });
    token
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)
}
