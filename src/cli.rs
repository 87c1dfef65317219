use clap::{Args, Parser, Subcommand};

use crate::types::*;

#[derive(Parser, Debug)]
#[command(
    name = "thingsync",
    version,
    about = "Mirror collections of things to local disk",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    // Options for the default `sync` command.
    #[command(flatten)]
    pub sync: SyncArgs,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, value_enum, default_value = "info", global = true)]
    pub log_level: LogLevel,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Download every configured collection (default)
    Sync(SyncArgs),
    /// Report which thing directories are complete, without touching the network
    Status(StatusArgs),
}

impl Cli {
    /// The command to run; a bare invocation means `sync`.
    pub fn effective_command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Sync(self.sync.clone()))
    }
}

#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    /// JSON config file with the token and the collections to mirror
    #[arg(short = 'c', long, default_value = "config.json")]
    pub config: String,

    /// API access token (overrides the config file)
    #[arg(long, env = "THINGSYNC_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Local directory for downloads
    #[arg(short = 'd', long, default_value = "scraped")]
    pub directory: String,

    /// API base URL (overrides the config file)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Collection(s) to sync, by name (default: all configured)
    #[arg(long = "collection")]
    pub collections: Vec<String>,

    /// How an already-synced thing is recognised
    #[arg(long, value_enum, default_value = "marker")]
    pub completion: CompletionPolicy,

    /// Attempts per request before giving up
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: u32,

    /// Base delay in seconds between attempts (doubles each retry)
    #[arg(long, default_value_t = 1)]
    pub retry_delay: u64,

    /// Upper bound in seconds for the delay between attempts
    #[arg(long, default_value_t = 30)]
    pub max_retry_delay: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    /// List what would be synced without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Disable the progress spinner
    #[arg(long)]
    pub no_progress_bar: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    /// Local directory holding synced collections
    #[arg(short = 'd', long, default_value = "scraped")]
    pub directory: String,

    /// List each incomplete thing directory
    #[arg(long)]
    pub incomplete: bool,
}
