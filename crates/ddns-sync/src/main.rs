// # ddns-sync
//
// Thin integration layer over ddns-core. All reconciliation logic lives in
// the library crates; this binary only:
//
// 1. Parses the command line (environment variables via clap)
// 2. Initializes logging to stderr
// 3. Resolves the config file and cache directory locations
// 4. Wires the Cloudflare provider, HTTP address source and file caches
//    into a `Reconciler` and prints one status line per record type
//
// ## Commands
//
// - `setup`: create or edit the configuration interactively
// - `print`: show the configuration, token masked
// - `run` (default): reconcile once; `--force` updates even when unchanged
//
// ## Environment
//
// - `DDNS_CONFIG`: configuration file (default: platform config dir)
// - `DDNS_CACHE_DIR`: cache directory (default: platform cache dir)
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// ddns-sync setup
// ddns-sync            # from cron or a systemd timer
// ```

mod cli;
mod setup;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, anyhow};
use clap::Parser;
use directories::ProjectDirs;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

use ddns_core::{ConfigStore, FileStateStore, Reconciler};
use ddns_http::{HttpClient, HttpClientConfig};
use ddns_ip_http::HttpIpSource;
use ddns_provider_cloudflare::CloudflareProvider;

use cli::{Cli, Command, GlobalOpts, RunArgs};

/// Exit codes for the possible outcomes of one invocation
///
/// - 0: Every selected record type reached a terminal success state
/// - 1: Configuration missing, unreadable or invalid
/// - 2: Reconciliation failed for at least one record type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// All record types applied or skipped
    Success = 0,
    /// Configuration error
    ConfigError = 1,
    /// Reconciliation failure
    ReconcileFailed = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Where configuration and caches live for this invocation
#[derive(Debug, Clone)]
struct Paths {
    config_file: PathBuf,
    cache_dir: PathBuf,
}

impl Paths {
    fn resolve(global: &GlobalOpts) -> anyhow::Result<Self> {
        let dirs = ProjectDirs::from("", "", "ddns-sync");

        let config_file = match &global.config {
            Some(path) => path.clone(),
            None => dirs
                .as_ref()
                .map(|dirs| dirs.config_dir().join("config.toml"))
                .ok_or_else(|| anyhow!("Cannot determine a config directory; pass --config"))?,
        };

        let cache_dir = match &global.cache_dir {
            Some(path) => path.clone(),
            None => dirs
                .as_ref()
                .map(|dirs| dirs.cache_dir().to_path_buf())
                .ok_or_else(|| anyhow!("Cannot determine a cache directory; pass --cache-dir"))?,
        };

        Ok(Self {
            config_file,
            cache_dir,
        })
    }
}

fn main() -> ExitCode {
    // Usage errors exit through clap with code 2
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(tracing::Level::from(cli.global.log_level))
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::ReconcileFailed.into();
        }
    };

    rt.block_on(dispatch(cli)).into()
}

async fn dispatch(cli: Cli) -> DdnsExitCode {
    let paths = match Paths::resolve(&cli.global) {
        Ok(paths) => paths,
        Err(e) => {
            error!("{:#}", e);
            return DdnsExitCode::ConfigError;
        }
    };

    let store = ConfigStore::new(&paths.config_file);

    match cli.command {
        Some(Command::Setup) => match setup::setup(&store).await {
            Ok(()) => DdnsExitCode::Success,
            Err(e) => {
                error!("Setup failed: {:#}", e);
                DdnsExitCode::ConfigError
            }
        },
        Some(Command::Print) => print_config(&store, &paths).await,
        Some(Command::Run(args)) => run_once(&store, &paths, &args).await,
        None => run_once(&store, &paths, &RunArgs::default()).await,
    }
}

async fn print_config(store: &ConfigStore, paths: &Paths) -> DdnsExitCode {
    match store.load().await {
        Ok(Some(state)) => {
            print!("{}", setup::render(&state, &paths.config_file, &paths.cache_dir));
            DdnsExitCode::Success
        }
        Ok(None) => {
            error!(
                "No configuration at {}; run `ddns-sync setup` first",
                paths.config_file.display()
            );
            DdnsExitCode::ConfigError
        }
        Err(e) => {
            error!("{}", e);
            DdnsExitCode::ConfigError
        }
    }
}

/// Load, wire and reconcile once
async fn run_once(store: &ConfigStore, paths: &Paths, args: &RunArgs) -> DdnsExitCode {
    let desired = match store.load().await {
        Ok(Some(desired)) => desired,
        Ok(None) => {
            error!(
                "No configuration at {}; run `ddns-sync setup` first",
                paths.config_file.display()
            );
            return DdnsExitCode::ConfigError;
        }
        Err(e) => {
            error!("{}", e);
            return DdnsExitCode::ConfigError;
        }
    };

    let desired = if args.force {
        info!("Forcing update for this run");
        desired.with_force(true)
    } else {
        desired
    };

    let reconciler = match build_reconciler(desired, paths).await {
        Ok(reconciler) => reconciler,
        Err(e) => {
            error!("{:#}", e);
            return match e.downcast_ref::<ddns_core::Error>() {
                Some(core) if !core.is_config() => DdnsExitCode::ReconcileFailed,
                _ => DdnsExitCode::ConfigError,
            };
        }
    };

    match reconciler.run().await {
        Ok(report) => {
            for record in &report.records {
                println!("{}", record.status_line());
            }

            if report.is_success() {
                DdnsExitCode::Success
            } else {
                error!("{} record type(s) failed", report.failures());
                DdnsExitCode::ReconcileFailed
            }
        }
        Err(e) => {
            error!("Run aborted: {}", e);
            for line in reconciler.abort_lines(&e) {
                println!("{}", line);
            }
            if e.is_config() {
                DdnsExitCode::ConfigError
            } else {
                DdnsExitCode::ReconcileFailed
            }
        }
    }
}

async fn build_reconciler(
    desired: ddns_core::DesiredState,
    paths: &Paths,
) -> anyhow::Result<Reconciler> {
    let client = HttpClient::new(HttpClientConfig::default())?;

    let provider = CloudflareProvider::new(desired.api_token.clone(), client.clone())?;
    let ip_source = HttpIpSource::from_desired(&desired, client);
    let state_store = FileStateStore::new(&paths.cache_dir)
        .await
        .with_context(|| format!("Cache directory {}", paths.cache_dir.display()))?;

    info!("Using cache directory {}", paths.cache_dir.display());

    let reconciler = Reconciler::new(
        Box::new(provider),
        Box::new(ip_source),
        Box::new(state_store),
        desired,
    )?;

    Ok(reconciler)
}
