//! CLI commands for cagestats.
//!
//! Scraping commands write to the SQLite dataset; `show` and `status` read it
//! back as JSON.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::pipeline::{rebuild_metrics, Pipeline, RunSummary};
use crate::scraper::{Fetcher, HttpFetcher};
use crate::storage::DatasetStore;
use crate::types::EntityKind;

#[derive(Parser)]
#[command(name = "cagestats")]
#[command(version, about = "Incremental ufcstats.com harvester and fighter statistics", long_about = None)]
pub struct Cli {
    /// SQLite dataset path override
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Number of concurrent fetch workers
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// Pause after each page per worker, in milliseconds
    #[arg(long, global = true)]
    pub delay: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch new completed events, fights and fighters
    Scrape {
        /// Skip rebuilding fighter metrics after the scrape
        #[arg(long)]
        no_aggregate: bool,
    },

    /// Fetch announced events and their scheduled fights
    Upcoming,

    /// Rebuild fighter metrics from the stored fights
    Aggregate,

    /// Print one fighter's metrics as JSON
    Show {
        /// Fighter identifier (trailing segment of the profile URL)
        #[arg(value_name = "FIGHTER_ID")]
        fighter_id: String,
    },

    /// Print dataset counts and the latest event date
    Status,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(db) = &self.db {
            config.storage.db_path = db.to_string_lossy().to_string();
        }
        if let Some(workers) = self.workers {
            config.scraper.max_workers = workers;
        }
        if let Some(delay) = self.delay {
            config.scraper.request_delay_ms = delay;
        }
    }
}

fn build_pipeline(config: &AppConfig) -> anyhow::Result<Pipeline> {
    let store = DatasetStore::new(&config.storage.path())?;
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(
        &config.scraper,
        config.retry.to_retry_config(),
    )?);
    Ok(Pipeline::new(store, fetcher, &config.scraper))
}

fn finish(summary: RunSummary) -> anyhow::Result<()> {
    summary.log();
    if summary.failure_count() > 0 {
        eprintln!(
            "Finished with {} failure(s); rerun to retry them",
            summary.failure_count()
        );
    }
    Ok(())
}

/// Run an incremental scrape of completed events.
pub async fn run_scrape(config: AppConfig, no_aggregate: bool) -> anyhow::Result<()> {
    tracing::info!(
        "Scraping with {} workers, {}ms delay, dataset {}",
        config.scraper.max_workers,
        config.scraper.request_delay_ms,
        config.storage.db_path
    );

    let mut pipeline = build_pipeline(&config)?;
    let summary = pipeline.run_completed(!no_aggregate).await?;
    finish(summary)
}

/// Run an incremental scrape of upcoming events.
pub async fn run_upcoming(config: AppConfig) -> anyhow::Result<()> {
    let mut pipeline = build_pipeline(&config)?;
    let summary = pipeline.run_upcoming().await?;
    finish(summary)
}

/// Recompute the metrics snapshot without touching the network.
pub fn run_aggregate(config: AppConfig) -> anyhow::Result<()> {
    let mut store = DatasetStore::open_existing(&config.storage.path())?;
    let count = rebuild_metrics(&mut store)?;
    eprintln!("Metrics rebuilt for {} fighters", count);
    Ok(())
}

/// Print a fighter's metrics snapshot.
pub fn run_show(config: AppConfig, fighter_id: &str) -> anyhow::Result<()> {
    let store = DatasetStore::open_existing(&config.storage.path())?;
    let metrics = store.load_fighter_metrics(fighter_id)?;
    println!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(())
}

/// Print dataset counts.
pub fn run_status(config: AppConfig) -> anyhow::Result<()> {
    let store = DatasetStore::open_existing(&config.storage.path())?;

    let json_output = serde_json::json!({
        "dataset": config.storage.db_path,
        "events": store.count(EntityKind::Event)?,
        "fights": store.count(EntityKind::Fight)?,
        "fighters": store.count(EntityKind::Fighter)?,
        "upcoming_events": store.count(EntityKind::UpcomingEvent)?,
        "upcoming_fights": store.count(EntityKind::UpcomingFight)?,
        "fighters_with_metrics": store.metrics_count()?,
        "latest_event": store.watermark(EntityKind::Event)?.to_string(),
    });
    println!("{}", serde_json::to_string_pretty(&json_output)?);
    Ok(())
}
