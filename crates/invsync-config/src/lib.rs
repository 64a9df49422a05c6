//! Shared configuration for the invsync CLI.
//!
//! TOML profiles, file + environment loading, and translation to
//! `invsync_core::SyncConfig`. The CLI layers its flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use invsync_core::{CredentialScope, DEFAULT_NAMESPACE, SyncConfig};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named sync profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by name.
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }

    /// The profile a command should use: explicit choice, then
    /// `default_profile`, then `"default"`.
    pub fn active_profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    /// Profile names, sorted.
    pub fn profile_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Seconds between passes in watch mode.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_interval_secs() -> u64 {
    300
}

/// A named sync profile: one credential scope against one inventory and store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Credential scope name; namespaces identifiers and labels owned objects.
    pub scope: String,

    /// Store namespace objects are written into.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Restrict discovery to one datacenter.
    pub datacenter: Option<String>,

    /// Inventory snapshot (YAML or JSON).
    pub inventory: Option<PathBuf>,

    /// Root directory of the file-backed store.
    pub store: Option<PathBuf>,

    /// Override `defaults.interval_secs`.
    pub interval_secs: Option<u64>,
}

impl Profile {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            namespace: default_namespace(),
            datacenter: None,
            inventory: None,
            store: None,
            interval_secs: None,
        }
    }
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "invsync", "invsync").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("invsync");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path` + environment.
///
/// Environment keys use `__` as the nesting separator, e.g.
/// `INVSYNC_DEFAULTS__INTERVAL_SECS=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("INVSYNC_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation to core config ──────────────────────────────────────

/// Build a `SyncConfig` from a profile and the global defaults.
pub fn profile_to_sync_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<SyncConfig, ConfigError> {
    if profile.scope.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "scope".into(),
            reason: "must not be empty".into(),
        });
    }
    if profile.namespace.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "namespace".into(),
            reason: "must not be empty".into(),
        });
    }

    let secs = profile.interval_secs.unwrap_or(defaults.interval_secs);
    if secs == 0 {
        return Err(ConfigError::Validation {
            field: "interval_secs".into(),
            reason: "must be at least 1".into(),
        });
    }

    let mut scope =
        CredentialScope::new(profile.scope.clone()).with_namespace(profile.namespace.clone());
    scope.datacenter = profile.datacenter.clone().filter(|dc| !dc.is_empty());

    let mut config = SyncConfig::new(scope);
    config.interval = Duration::from_secs(secs);
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn profile_defaults_fill_namespace() {
        let profile: Profile = toml::from_str(r#"scope = "vc-admin""#).unwrap();
        assert_eq!(profile.namespace, DEFAULT_NAMESPACE);
        assert_eq!(profile.datacenter, None);
    }

    #[test]
    fn sync_config_uses_profile_interval_over_default() {
        let mut profile = Profile::new("a");
        let defaults = Defaults::default();
        let cfg = profile_to_sync_config(&profile, &defaults).unwrap();
        assert_eq!(cfg.interval, Duration::from_secs(300));

        profile.interval_secs = Some(60);
        let cfg = profile_to_sync_config(&profile, &defaults).unwrap();
        assert_eq!(cfg.interval, Duration::from_secs(60));
    }

    #[test]
    fn empty_datacenter_is_unpinned() {
        let mut profile = Profile::new("a");
        profile.datacenter = Some(String::new());
        let cfg = profile_to_sync_config(&profile, &Defaults::default()).unwrap();
        assert_eq!(cfg.scope.datacenter, None);
    }

    #[test]
    fn rejects_blank_scope_and_zero_interval() {
        let defaults = Defaults::default();
        assert!(matches!(
            profile_to_sync_config(&Profile::new(" "), &defaults),
            Err(ConfigError::Validation { ref field, .. }) if field == "scope"
        ));

        let mut profile = Profile::new("a");
        profile.interval_secs = Some(0);
        assert!(profile_to_sync_config(&profile, &defaults).is_err());
    }

    #[test]
    fn active_profile_resolution() {
        let mut cfg = Config::default();
        assert_eq!(cfg.active_profile_name(None), "default");
        assert_eq!(cfg.active_profile_name(Some("lab")), "lab");
        cfg.default_profile = Some("prod".into());
        assert_eq!(cfg.active_profile_name(None), "prod");
    }
}
