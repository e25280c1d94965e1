//! Command-line surface for `ddns-sync`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::Level;

/// ddns-sync -- keep a Cloudflare DNS record pointed at this host
#[derive(Debug, Parser)]
#[command(
    name = "ddns-sync",
    version,
    about = "Keep a Cloudflare A/AAAA record in sync with this host's public address",
    long_about = "Run without a subcommand (or with `run`) to reconcile the configured\n\
        record once. Use `setup` to create or edit the configuration and `print`\n\
        to show it with the API token masked.",
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Path of the configuration file
    #[arg(long, env = "DDNS_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the zone and record caches
    #[arg(long, env = "DDNS_CACHE_DIR", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Log verbosity (logs go to stderr)
    #[arg(
        long,
        env = "DDNS_LOG_LEVEL",
        default_value = "info",
        ignore_case = true,
        global = true
    )]
    pub log_level: LogLevel,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create or edit the configuration interactively
    Setup,

    /// Show the configuration with the API token masked
    Print,

    /// Reconcile the record once (default)
    Run(RunArgs),
}

#[derive(Debug, Default, Args)]
pub struct RunArgs {
    /// Update even if the address has not changed
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["ddns-sync"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.global.log_level, LogLevel::Info);
    }

    #[test]
    fn run_force_and_global_flags() {
        let cli = Cli::try_parse_from([
            "ddns-sync",
            "run",
            "--force",
            "--config",
            "/tmp/ddns.toml",
            "--log-level",
            "DEBUG",
        ])
        .unwrap();

        match cli.command {
            Some(Command::Run(args)) => assert!(args.force),
            other => panic!("expected run, got {other:?}"),
        }
        assert_eq!(cli.global.config, Some(PathBuf::from("/tmp/ddns.toml")));
        assert_eq!(cli.global.log_level, LogLevel::Debug);
    }

    #[test]
    fn unknown_log_level_is_usage_error() {
        let err = Cli::try_parse_from(["ddns-sync", "--log-level", "loud"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
