//! Clap derive structures for the `ventwatch` CLI.
//!
//! Defines the command tree, global flags, and shared value enums. This
//! file is also compiled by `build.rs`, so it may only depend on clap.

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// ventwatch -- terminal client for the ESP32 ventilation monitor
#[derive(Debug, Parser)]
#[command(
    name = "ventwatch",
    version,
    about = "Check on your ventilation monitor from the command line",
    long_about = "Reads live sensor data, history, incidents, weather and door\n\
        activity from the ventwatch telemetry API.",
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
    /// Profile to use
    #[arg(long, short = 'p', env = "VENTWATCH_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API base URL (overrides profile)
    #[arg(long, env = "VENTWATCH_API_URL", global = true)]
    pub api_url: Option<String>,

    /// API key, sent as X-API-Secret
    #[arg(
        long,
        env = "VENTWATCH_API_KEY",
        global = true,
        hide_env_values = true,
        conflicts_with = "token"
    )]
    pub api_key: Option<String>,

    /// Bearer token
    #[arg(long, env = "VENTWATCH_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "VENTWATCH_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Temperature units (defaults to the profile setting)
    #[arg(long, short = 'u', env = "VENTWATCH_UNITS", global = true)]
    pub units: Option<Units>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "VENTWATCH_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (defaults to the profile setting)
    #[arg(long, env = "VENTWATCH_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Value Enums ──────────────────────────────────────────────────────

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

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Units {
    /// Celsius
    #[value(alias = "celsius")]
    C,
    /// Fahrenheit
    #[value(alias = "fahrenheit")]
    F,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RangeArg {
    #[value(name = "1h")]
    OneHour,
    #[value(name = "6h")]
    SixHours,
    #[value(name = "24h")]
    Day,
    #[value(name = "7d")]
    Week,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SeverityArg {
    #[value(alias = "0")]
    Info,
    #[value(alias = "1")]
    Warning,
    #[value(alias = "2")]
    Major,
    #[value(alias = "3")]
    Critical,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ZoneArg {
    Indoor,
    Outdoor,
    Garage,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Current sensor readings and controller health
    #[command(alias = "st")]
    Status,

    /// Aggregate view: readings, ventilation verdict, weather, incidents
    #[command(alias = "dash")]
    Dashboard,

    /// Historical readings
    #[command(alias = "hist")]
    History(HistoryArgs),

    /// Recorded incidents
    #[command(alias = "inc")]
    Incidents(IncidentsArgs),

    /// Door open/close analytics
    Doors(DoorsArgs),

    /// Site weather and forecast
    Weather,

    /// Poll and print a status line until interrupted
    Watch(WatchArgs),

    /// Store credentials for a profile
    Login(LoginArgs),

    /// Forget stored credentials for a profile
    Logout,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Command Arguments ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Time window
    #[arg(long, short = 'r', default_value = "24h")]
    pub range: RangeArg,

    /// Only show one zone
    #[arg(long, short = 'z')]
    pub zone: Option<ZoneArg>,
}

#[derive(Debug, Args)]
pub struct IncidentsArgs {
    /// Look-back window in hours
    #[arg(long, default_value = "24")]
    pub hours: u32,

    /// Hide incidents below this severity
    #[arg(long, short = 's', default_value = "info")]
    pub min_severity: SeverityArg,

    /// Only incidents that have not ended
    #[arg(long, short = 'a')]
    pub active: bool,
}

#[derive(Debug, Args)]
pub struct DoorsArgs {
    #[command(subcommand)]
    pub command: DoorsCommand,
}

#[derive(Debug, Subcommand)]
pub enum DoorsCommand {
    /// Individual open/close events, newest first
    Events {
        /// Look-back window in days
        #[arg(long, short = 'd', default_value = "7")]
        days: u32,
    },
    /// Per-door totals
    Summary {
        /// Look-back window in days
        #[arg(long, short = 'd', default_value = "7")]
        days: u32,
    },
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between refreshes (defaults to the profile setting)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,
}

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Dashboard link containing ?apikey= or ?key=
    #[arg(long, short = 'l')]
    pub link: Option<String>,

    /// Save the secret in the config file instead of the system keyring
    #[arg(long)]
    pub plaintext: bool,

    /// Skip the test request
    #[arg(long)]
    pub no_verify: bool,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,
    /// Print the effective configuration
    Show,
    /// Set a profile key
    Set {
        /// Key name (api_url, auth_mode, api_key_env, timeout, ...)
        key: String,
        /// New value
        value: String,
    },
    /// List profiles (* marks the default)
    Profiles,
    /// Make a profile the default
    Use {
        /// Profile name
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
