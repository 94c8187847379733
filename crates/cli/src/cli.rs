//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Log Syncer - incremental copy of structured logs into per-group tables
#[derive(Parser, Debug)]
#[command(
    name = "log-syncer",
    author,
    version,
    about = "Incremental, idempotent log-to-table synchronization",
    long_about = "Fetches recent structured log lines from a Loki-compatible store and appends \n\
                  them to per-group tables, skipping lines that were already written.\n\n\
                  Each invocation is one bounded batch; schedule it externally."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "LOG_SYNCER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "compact",
        global = true,
        env = "LOG_SYNCER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one sync invocation
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Show per-group state of the destination
    Status(StatusArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "log-syncer.toml",
        env = "LOG_SYNCER_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the log store endpoint from configuration
    #[arg(long, env = "LOG_SYNCER_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Override the re-fetch overlap (seconds)
    #[arg(long, env = "LOG_SYNCER_OVERLAP_SECONDS")]
    pub overlap_seconds: Option<u64>,

    /// Fetch and reconcile, but write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "LOG_SYNCER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "log-syncer.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `status` command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "log-syncer.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show full column lists
    #[arg(long)]
    pub columns: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    Pretty,
    /// Compact single-line format
    #[default]
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_overrides_parse() {
        let cli = Cli::parse_from([
            "log-syncer",
            "run",
            "--config",
            "sync.toml",
            "--endpoint",
            "http://loki:3100",
            "--overlap-seconds",
            "60",
            "--dry-run",
        ]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.config, PathBuf::from("sync.toml"));
                assert_eq!(args.endpoint.as_deref(), Some("http://loki:3100"));
                assert_eq!(args.overlap_seconds, Some(60));
                assert!(args.dry_run);
                assert_eq!(args.metrics_port, 0);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["log-syncer", "-q", "-v", "status"]).is_err());
    }
}
