//! govwatch CLI
//!
//! Local execution entry point, typically invoked from a scheduler.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use govwatch::{
    error::Result,
    models::Config,
    pipeline::{self, RunOptions},
    services::{EmailCredentials, EmailNotifier, HttpFetcher},
    storage::LocalStateStore,
};

/// govwatch - Government Publication Monitor
#[derive(Parser, Debug)]
#[command(
    name = "govwatch",
    version,
    about = "Watches government publication pages and emails when new documents appear"
)]

struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "govwatch.toml")]
    config: PathBuf,

    /// Override the state file path from the configuration
    #[arg(long, global = true)]
    state: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check all tracked pages, notify on changes, and save state
    Run {
        /// Diff and log only; do not send email or save state
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate the configuration file
    Validate,

    /// Show the saved state
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    if let Some(path) = cli.state {
        config.state.path = path;
    }
    log::debug!("Using state file {}", config.state.path.display());

    let store = LocalStateStore::new(&config.state.path);

    match cli.command {
        Command::Run { dry_run } => {
            config.validate()?;

            let fetcher = HttpFetcher::new(&config)?;
            let notifier = EmailNotifier::new(&config, EmailCredentials::from_env());
            let report = pipeline::run_monitor(
                &config,
                &fetcher,
                &store,
                &notifier,
                RunOptions { dry_run },
            )
            .await?;

            if report.is_first_run() {
                log::info!("Baseline established with {} items", report.item_count);
            }
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK ({} tracked pages)", config.pages.len());

            if EmailCredentials::from_env().is_none() {
                log::warn!(
                    "Email credentials not set ({}, {}, {}); runs will not send email",
                    EmailCredentials::SENDER_VAR,
                    EmailCredentials::PASSWORD_VAR,
                    EmailCredentials::RECIPIENT_VAR
                );
            }
        }

        Command::Info => {
            log::info!("State file: {}", store.path().display());

            match store.try_load().await? {
                Some(state) => {
                    if let Some(checked) = state.check_time {
                        log::info!("Last checked: {}", checked.to_rfc3339());
                    }
                    for (name, snapshot) in &state.snapshots {
                        let label = config
                            .page(name)
                            .map(|p| p.label())
                            .unwrap_or(name.as_str());
                        log::info!(
                            "{}: {} items (last updated: {})",
                            label,
                            snapshot.len(),
                            snapshot.marker()
                        );
                    }
                }
                None => log::info!("No state saved yet."),
            }
        }
    }

    Ok(())
}
