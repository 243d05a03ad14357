//! Clap derive structures for the `truemanager` CLI.
//!
//! Defines the command tree, global flags, and shared value enums. Kept
//! free of workspace crates so `build.rs` can include it for man pages.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// truemanager -- manage TrueNAS servers from the command line
#[derive(Debug, Parser)]
#[command(
    name = "truemanager",
    version,
    about = "Manage TrueNAS servers from the command line",
    long_about = "Query and administer TrueNAS servers.\n\n\
        Uses the v2.0 REST API for requests and the websocket (DDP)\n\
        endpoint for live statistics and raw middleware calls.",
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
    /// Server profile to use
    #[arg(long, short = 'p', env = "TRUEMANAGER_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server URL (overrides profile)
    #[arg(long, short = 's', env = "TRUEMANAGER_SERVER", global = true)]
    pub server: Option<String>,

    /// Username for password authentication
    #[arg(long, short = 'u', env = "TRUEMANAGER_USERNAME", global = true)]
    pub username: Option<String>,

    /// API key
    #[arg(long, env = "TRUEMANAGER_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "TRUEMANAGER_OUTPUT",
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

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "TRUEMANAGER_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (default: profile, then 30)
    #[arg(long, env = "TRUEMANAGER_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
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
    /// Verify credentials, optionally minting a session token
    Login(LoginArgs),

    /// Health overview: system, pools, alerts
    #[command(alias = "dash")]
    Dashboard,

    /// System information and power control
    #[command(alias = "sys")]
    System(SystemArgs),

    /// ZFS pools and datasets
    #[command(alias = "pool")]
    Pools(PoolsArgs),

    /// List, dismiss, and restore alerts
    Alerts(AlertsArgs),

    /// Reporting graphs and their data
    Reporting(ReportingArgs),

    /// App catalogs
    Apps(AppsArgs),

    /// Manage API keys
    ApiKeys(ApiKeysArgs),

    /// Middleware jobs
    Jobs(JobsArgs),

    /// Check that the server answers
    Ping(PingArgs),

    /// Call a middleware method over the websocket
    Call(CallArgs),

    /// Stream live CPU, memory, and network statistics
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LOGIN
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Print a session token after logging in
    #[arg(long)]
    pub token: bool,

    /// Token lifetime in seconds
    #[arg(long, requires = "token")]
    pub ttl: Option<u64>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SYSTEM
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SystemArgs {
    #[command(subcommand)]
    pub command: SystemCommand,
}

#[derive(Debug, Subcommand)]
pub enum SystemCommand {
    /// Hardware, version, and uptime
    Info,

    /// Software version string
    Version,

    /// Boot state (BOOTING, READY, SHUTTING_DOWN)
    State,

    /// Reboot the server
    Reboot {
        /// Seconds to wait before rebooting
        #[arg(long)]
        delay: Option<u64>,
    },

    /// Power off the server
    Shutdown {
        /// Seconds to wait before shutting down
        #[arg(long)]
        delay: Option<u64>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  POOLS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PoolsArgs {
    #[command(subcommand)]
    pub command: PoolsCommand,
}

#[derive(Debug, Subcommand)]
pub enum PoolsCommand {
    /// List pools
    #[command(alias = "ls")]
    List,

    /// Pool details
    Get {
        /// Pool ID or name
        pool: String,
    },

    /// Start, stop, or pause a scrub
    Scrub {
        /// Pool ID or name
        pool: String,

        #[arg(long, default_value = "start")]
        action: ScrubArg,
    },

    /// List datasets
    Datasets,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ScrubArg {
    Start,
    Stop,
    Pause,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ALERTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AlertsArgs {
    #[command(subcommand)]
    pub command: AlertsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AlertsCommand {
    /// List alerts
    #[command(alias = "ls")]
    List {
        /// Include dismissed alerts
        #[arg(long, short = 'a')]
        all: bool,

        /// Minimum severity (info, notice, warning, error, critical, alert, emergency)
        #[arg(long)]
        level: Option<String>,
    },

    /// Dismiss an alert
    Dismiss {
        /// Alert UUID
        uuid: String,
    },

    /// Restore a dismissed alert
    Restore {
        /// Alert UUID
        uuid: String,
    },

    /// List alert categories and classes
    Categories,

    /// List alert notification policies
    Policies,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  REPORTING
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ReportingArgs {
    #[command(subcommand)]
    pub command: ReportingCommand,
}

#[derive(Debug, Subcommand)]
pub enum ReportingCommand {
    /// List available graphs
    Graphs,

    /// Fetch data for one graph
    Data {
        /// Graph name (e.g. cpu, memory, interface)
        graph: String,

        /// Graph instance (disk, interface, ...)
        #[arg(long, short = 'i')]
        identifier: Option<String>,

        /// Time window
        #[arg(long, default_value = "hour")]
        unit: UnitArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum UnitArg {
    Hour,
    Day,
    Week,
    Month,
    Year,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  APPS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct AppsArgs {
    #[command(subcommand)]
    pub command: AppsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AppsCommand {
    /// List configured catalogs
    Catalogs,

    /// List apps available in a catalog
    Available {
        /// Catalog label
        #[arg(long, default_value = "TRUENAS")]
        label: String,

        /// Only this train
        #[arg(long, short = 't')]
        train: Option<String>,

        /// Serve from the server-side cache only
        #[arg(long)]
        cached: bool,
    },

    /// Refresh catalogs from their repositories
    Sync,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  API KEYS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ApiKeysArgs {
    #[command(subcommand)]
    pub command: ApiKeysCommand,
}

#[derive(Debug, Subcommand)]
pub enum ApiKeysCommand {
    /// List API keys
    #[command(alias = "ls")]
    List,

    /// Create a full-access API key; the key is shown once
    Create {
        /// Key name
        name: String,
    },

    /// Rename an API key
    Rename {
        /// Key ID
        id: u64,
        /// New name
        name: String,
    },

    /// Regenerate an API key; the new key is shown once
    Reset {
        /// Key ID
        id: u64,
    },

    /// Delete an API key
    #[command(alias = "rm")]
    Delete {
        /// Key ID
        id: u64,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  JOBS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct JobsArgs {
    #[command(subcommand)]
    pub command: JobsCommand,
}

#[derive(Debug, Subcommand)]
pub enum JobsCommand {
    /// List jobs
    #[command(alias = "ls")]
    List {
        /// Only waiting or running jobs
        #[arg(long)]
        active: bool,
    },

    /// Abort a running job
    Abort {
        /// Job ID
        id: u64,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PING / CALL / WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PingArgs {
    /// Measure a websocket round trip instead of a REST request
    #[arg(long)]
    pub websocket: bool,
}

#[derive(Debug, Args)]
pub struct CallArgs {
    /// Method name, e.g. system.info
    pub method: String,

    /// Positional parameters, each parsed as JSON (bare words become strings)
    pub params: Vec<String>,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Stop after this many updates
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
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

    /// Print the config file location
    Path,

    /// Set a profile value
    Set {
        /// Profile key (server, auth, username, api_key_env, ca_cert, insecure, timeout)
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

    /// Store the profile's secret (API key, password, or token) in the system keyring
    SetSecret {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },

    /// Remove the profile's secrets from the system keyring
    ClearSecret {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
