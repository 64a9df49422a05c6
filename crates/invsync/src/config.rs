//! CLI configuration: a thin layer over the `invsync_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--scope, --store, etc.).

use std::path::PathBuf;

use invsync_core::SyncConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use invsync_config::{Config, Defaults, Profile, load_config_from, save_config_to};

// ── CLI-specific helpers ────────────────────────────────────────────

/// The config file this invocation reads and writes.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(invsync_config::config_path)
}

/// Load config, returning a default if the file is missing or unreadable.
pub fn load_config_or_default(global: &GlobalOpts) -> Config {
    load_config_from(&config_path(global)).unwrap_or_default()
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// Everything a store-touching command needs, after flag overrides.
#[derive(Debug)]
pub struct Resolved {
    pub sync: SyncConfig,
    pub inventory: Option<PathBuf>,
    pub store: PathBuf,
}

/// The active profile with flag overrides applied, plus global defaults.
///
/// A profile is optional: `--scope` alone yields an ad-hoc one.
pub fn resolve_profile(global: &GlobalOpts) -> Result<(String, Profile, Defaults), CliError> {
    // Missing files load as defaults; malformed ones are errors.
    let cfg = load_config_from(&config_path(global))?;
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            let names = cfg.profile_names();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if names.is_empty() {
                    "(none)".into()
                } else {
                    names.join(", ")
                },
            });
        }
        None => {
            let scope = global.scope.clone().ok_or_else(|| CliError::MissingSetting {
                setting: "scope".into(),
                flag: "--scope".into(),
            })?;
            Profile::new(scope)
        }
    };

    // Flag > env > profile
    if let Some(ref scope) = global.scope {
        profile.scope.clone_from(scope);
    }
    if let Some(ref namespace) = global.namespace {
        profile.namespace.clone_from(namespace);
    }
    if global.datacenter.is_some() {
        profile.datacenter.clone_from(&global.datacenter);
    }
    if global.inventory.is_some() {
        profile.inventory.clone_from(&global.inventory);
    }
    if global.store.is_some() {
        profile.store.clone_from(&global.store);
    }

    Ok((profile_name, profile, cfg.defaults))
}

/// Resolve everything a store-touching command needs.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let (profile_name, profile, defaults) = resolve_profile(global)?;
    let sync = invsync_config::profile_to_sync_config(&profile, &defaults)?;
    let store = profile.store.ok_or_else(|| CliError::MissingSetting {
        setting: "store".into(),
        flag: "--store".into(),
    })?;

    tracing::debug!(
        profile = %profile_name,
        scope = %sync.scope.name,
        namespace = %sync.scope.namespace,
        store = %store.display(),
        "resolved configuration"
    );

    Ok(Resolved {
        sync,
        inventory: profile.inventory,
        store,
    })
}
