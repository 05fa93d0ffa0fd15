//! cagestats
//!
//! Incremental ufcstats.com ingestion and fighter career statistics.

mod cli;
mod config;
mod error;
mod pipeline;
mod retry;
mod scraper;
mod stats;
mod storage;
mod types;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for JSON output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cagestats=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration, then apply CLI overrides
    let mut config = AppConfig::load()?;
    cli.apply(&mut config);

    match cli.command {
        Commands::Scrape { no_aggregate } => cli::run_scrape(config, no_aggregate).await,
        Commands::Upcoming => cli::run_upcoming(config).await,
        Commands::Aggregate => cli::run_aggregate(config),
        Commands::Show { fighter_id } => cli::run_show(config, &fighter_id),
        Commands::Status => cli::run_status(config),
    }
}
