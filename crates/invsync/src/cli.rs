//! Clap derive structures for the `invsync` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// invsync -- mirror virtualization inventory into a resource store
#[derive(Debug, Parser)]
#[command(
    name = "invsync",
    version,
    about = "Mirror virtualization inventory into a declarative resource store",
    long_about = "Discovers datacenters, clusters, and hosts from an inventory snapshot\n\
        and reconciles them into cluster and host objects owned by one credential scope.\n\n\
        Hosts outside any cluster are grouped per datacenter under 'NO CLUSTER'.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Sync profile to use
    #[arg(long, short = 'p', env = "INVSYNC_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Config file path (overrides the platform default)
    #[arg(long, env = "INVSYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Credential scope name (overrides profile)
    #[arg(long, short = 's', env = "INVSYNC_SCOPE", global = true)]
    pub scope: Option<String>,

    /// Store namespace (overrides profile)
    #[arg(long, short = 'n', env = "INVSYNC_NAMESPACE", global = true)]
    pub namespace: Option<String>,

    /// Restrict discovery to one datacenter (overrides profile)
    #[arg(long, short = 'd', env = "INVSYNC_DATACENTER", global = true)]
    pub datacenter: Option<String>,

    /// Inventory snapshot file, YAML or JSON (overrides profile)
    #[arg(long, short = 'i', env = "INVSYNC_INVENTORY", global = true)]
    pub inventory: Option<PathBuf>,

    /// Store root directory (overrides profile)
    #[arg(long, env = "INVSYNC_STORE", global = true)]
    pub store: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "INVSYNC_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a sync pass, or keep syncing with --watch
    Sync(SyncArgs),

    /// Inspect persisted cluster objects
    #[command(alias = "cl")]
    Clusters(ClustersArgs),

    /// Inspect persisted host objects
    #[command(alias = "h")]
    Hosts(HostsArgs),

    /// Print the store identifier a name maps to
    Ident(IdentArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SYNC
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Keep running, one pass per interval, until Ctrl-C
    #[arg(long, short = 'w')]
    pub watch: bool,

    /// Delay between passes in watch mode (e.g. "90s", "5m")
    #[arg(long, value_parser = humantime::parse_duration)]
    pub interval: Option<Duration>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CLUSTERS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ClustersArgs {
    #[command(subcommand)]
    pub command: ClustersCommand,
}

#[derive(Debug, Subcommand)]
pub enum ClustersCommand {
    /// List cluster objects owned by the scope
    #[command(alias = "ls")]
    List,

    /// Show one cluster object
    Get {
        /// Cluster identifier
        id: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  HOSTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct HostsArgs {
    #[command(subcommand)]
    pub command: HostsCommand,
}

#[derive(Debug, Subcommand)]
pub enum HostsCommand {
    /// List host objects owned by the scope
    #[command(alias = "ls")]
    List {
        /// Only hosts belonging to this cluster identifier
        #[arg(long, short = 'c')]
        cluster: Option<String>,
    },

    /// Show one host object
    Get {
        /// Host identifier
        id: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  IDENT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct IdentArgs {
    /// Host or cluster name as the platform reports it
    pub name: String,

    /// Treat NAME as a cluster of the datacenter given by --datacenter
    #[arg(long)]
    pub cluster: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (scope, namespace, datacenter, inventory, store, interval_secs)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Print the config file path
    Path,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
