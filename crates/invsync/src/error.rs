//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use invsync_config::ConfigError;
use invsync_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const DISCOVERY: i32 = 7;
    pub const CANCELLED: i32 = 130;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Discovery ────────────────────────────────────────────────────
    #[error("Discovery failed while {context}")]
    #[diagnostic(
        code(invsync::discovery),
        help(
            "Nothing was written this pass.\n\
             Cause: {reason}\n\
             Check the inventory snapshot, then rerun: invsync sync"
        )
    )]
    Discovery { context: String, reason: String },

    #[error("Could not load inventory from {path}")]
    #[diagnostic(
        code(invsync::inventory),
        help("Provide a readable YAML or JSON snapshot with --inventory or the profile's `inventory` key.")
    )]
    Inventory {
        path: String,
        #[source]
        source: invsync_api::Error,
    },

    // ── Store ────────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(invsync::not_found),
        help("Run: invsync {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{resource_type} '{identifier}' was modified concurrently")]
    #[diagnostic(
        code(invsync::conflict),
        help("Another writer updated the object during this pass. Rerun: invsync sync")
    )]
    Conflict {
        resource_type: String,
        identifier: String,
    },

    #[error("Store {operation} failed for {resource_type} '{identifier}': {reason}")]
    #[diagnostic(code(invsync::store))]
    Store {
        operation: String,
        resource_type: String,
        identifier: String,
        reason: String,
    },

    // ── Lifecycle ────────────────────────────────────────────────────
    #[error("Interrupted")]
    #[diagnostic(
        code(invsync::cancelled),
        help("Writes completed before the interruption are kept; the next pass converges.")
    )]
    Cancelled,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(invsync::validation))]
    Validation { field: String, reason: String },

    #[error("No {setting} configured")]
    #[diagnostic(
        code(invsync::missing_setting),
        help("Pass {flag}, or set `{setting}` on the profile: invsync config set {setting} <VALUE>")
    )]
    MissingSetting { setting: String, flag: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(invsync::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: invsync config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(invsync::config))]
    Config(Box<figment::Error>),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not serialize output: {0}")]
    #[diagnostic(code(invsync::json))]
    Json(#[from] serde_json::Error),

    #[error("Could not serialize output: {0}")]
    #[diagnostic(code(invsync::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Discovery { .. } | Self::Inventory { .. } => exit_code::DISCOVERY,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Cancelled => exit_code::CANCELLED,
            Self::Validation { .. } | Self::MissingSetting { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

fn list_command(kind: &str) -> String {
    format!("{kind}s list")
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Discovery { context, source } => CliError::Discovery {
                context,
                reason: source.to_string(),
            },

            CoreError::InvalidName { name, reason } => CliError::Validation {
                field: format!("name '{name}'"),
                reason,
            },

            CoreError::Store {
                operation,
                kind,
                identifier,
                source,
            } => {
                if source.is_conflict() {
                    CliError::Conflict {
                        resource_type: kind.into(),
                        identifier,
                    }
                } else if source.is_not_found() {
                    CliError::NotFound {
                        resource_type: kind.into(),
                        list_command: list_command(kind),
                        identifier,
                    }
                } else {
                    CliError::Store {
                        operation: operation.into(),
                        resource_type: kind.into(),
                        identifier,
                        reason: source.to_string(),
                    }
                }
            }

            CoreError::Cancelled => CliError::Cancelled,

            CoreError::Config { message } => CliError::Validation {
                field: "scope".into(),
                reason: message,
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound {
                name,
                available: "(none)".into(),
            },
            ConfigError::Serialization(e) => CliError::Validation {
                field: "config".into(),
                reason: e.to_string(),
            },
            ConfigError::Figment(e) => CliError::Config(e),
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}
