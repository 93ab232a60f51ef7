use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use uuid::Uuid;

/// Command-line arguments for the navcache binary.
#[derive(Debug, Parser)]
#[command(
    name = "navcache",
    version,
    about = "Replay and inspect the navigation cache layer"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "NAVCACHE_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Replay a JSON array of cache events and print the resulting state.
    Replay(ReplayArgs),
    /// Print the resolved settings and exit.
    #[command(name = "check-config")]
    CheckConfig,
}

#[derive(Debug, Args, Clone)]
pub struct ReplayArgs {
    /// File holding the events to replay.
    #[arg(value_name = "EVENTS", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// Signed-in user the chat events are seen by.
    #[arg(long = "viewer", value_name = "UUID")]
    pub viewer: Option<Uuid>,

    /// Load mirrored chat state from the session store before replaying.
    #[arg(long = "restore-snapshot", action = clap::ArgAction::SetTrue)]
    pub restore_snapshot: bool,
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the page data capacity.
    #[arg(long = "cache-page-data-limit", value_name = "COUNT", global = true)]
    pub page_data_limit: Option<usize>,

    /// Override the feed capacity.
    #[arg(long = "cache-feed-limit", value_name = "COUNT", global = true)]
    pub feed_limit: Option<usize>,

    /// Override the pending event capacity.
    #[arg(long = "cache-event-queue-limit", value_name = "COUNT", global = true)]
    pub event_queue_limit: Option<usize>,

    /// Override the playback handoff validity window.
    #[arg(long = "navigation-handoff-ttl-ms", value_name = "MILLIS", global = true)]
    pub handoff_ttl_ms: Option<u64>,

    /// Override the scroll restore attempt bound.
    #[arg(
        long = "navigation-restore-max-attempts",
        value_name = "COUNT",
        global = true
    )]
    pub restore_max_attempts: Option<u32>,

    /// Persist session storage as JSON files in this directory.
    #[arg(
        long = "session-directory",
        value_name = "PATH",
        value_hint = ValueHint::DirPath,
        global = true
    )]
    pub session_directory: Option<PathBuf>,
}
