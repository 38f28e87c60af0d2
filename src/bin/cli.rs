//! pagewatch CLI
//!
//! Local execution entry point. For AWS Lambda, use `pagewatch-lambda`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pagewatch::{
    config,
    error::Result,
    models::StateCheck,
    pipeline::{self, RunReport},
    storage::{self, DedupStore},
    utils::http,
};

/// pagewatch - reports new entries on watched pages
#[derive(Parser, Debug)]
#[command(
    name = "pagewatch",
    version,
    about = "Reports new entries on watched listing pages to Telegram"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "data/config.toml")]
    config: PathBuf,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Perform one full run: load, extract, diff, notify, persist
    Run {
        /// Extract and diff only; don't notify or save
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate the configuration file
    Validate,

    /// Show the persisted state without modifying it
    State,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn print_summary(report: &RunReport) {
    log::info!("State: {:?}", report.load);
    for source in &report.sources {
        log::info!(
            "{}: {} found, {} new",
            source.name,
            source.found,
            source.new
        );
    }
    if let Some(delivery) = &report.delivery {
        log::info!("Delivery: {:?}", delivery);
    }
    log::info!(
        "Persisted: {} ({} ms)",
        report.persisted,
        (report.finished_at - report.started_at).num_milliseconds()
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (config, secrets) = config::load_all(&cli.config);
    log::debug!("Secrets: {:?}", secrets);

    match cli.command {
        Command::Run { dry_run } => {
            config.validate()?;
            let report = pipeline::run_once(&config, &secrets, dry_run).await;
            print_summary(&report);
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK ({} sources)", config.sources.len());

            if let Err(e) = secrets.check_store(&config) {
                log::warn!("Store credentials: {}", e);
            }
            if !secrets.has_notifier() {
                log::warn!("Telegram credentials missing; digests will not be sent");
            }
        }

        Command::State => {
            let client = http::create_async_client(&config.crawler)?;
            let backend = storage::build_backend(&config, &secrets, &client).await?;
            let store = DedupStore::new(backend, config.source_names());

            match store.peek().await? {
                StateCheck::Valid(state) => {
                    log::info!("State at {}:", store.location());
                    println!("{}", state.to_document()?);
                }
                StateCheck::Invalid(reason) => {
                    log::warn!(
                        "State at {} is invalid ({}); the next run will reset it",
                        store.location(),
                        reason
                    );
                }
            }
        }
    }

    Ok(())
}
