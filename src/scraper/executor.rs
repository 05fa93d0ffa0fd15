//! Concurrent fetch executor.
//!
//! A fixed pool of worker tasks drains a shared queue of entity refs. Each
//! worker fetches a page, decodes it, hands the result to the run's
//! accumulator and then sleeps for the pacing delay before taking the next
//! item. The accumulator lock is taken once per completed item and never
//! held across network I/O.

use std::collections::{HashSet, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::{info, warn};

use super::client::Fetcher;
use super::parsers::{Decoded, PageDecoder};
use crate::config::ScraperConfig;
use crate::error::PipelineError;
use crate::types::{EntityKind, EntityRef, Keyed};

/// Worker pool settings
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub max_workers: usize,
    /// Pause each worker takes after every item
    pub request_delay: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self::from(&ScraperConfig::default())
    }
}

impl From<&ScraperConfig> for FetchOptions {
    fn from(config: &ScraperConfig) -> Self {
        Self {
            max_workers: config.max_workers,
            request_delay: config.request_delay(),
        }
    }
}

/// An entity that could not be fetched or decoded
#[derive(Debug)]
pub struct FetchFailure {
    pub entity: EntityRef,
    pub error: PipelineError,
}

/// Everything one `fetch_all` call produced
#[derive(Debug)]
pub struct FetchOutcome<T> {
    /// Kept records, at most one per key. Order is not guaranteed.
    pub records: Vec<T>,
    pub failures: Vec<FetchFailure>,
    /// Follow-up refs named by kept records, first-seen order, no repeats
    pub discovered: Vec<EntityRef>,
}

impl<T> FetchOutcome<T> {
    fn empty() -> Self {
        Self {
            records: Vec::new(),
            failures: Vec::new(),
            discovered: Vec::new(),
        }
    }
}

struct Accumulator<T> {
    seen: HashSet<String>,
    discovered_ids: HashSet<(EntityKind, String)>,
    outcome: FetchOutcome<T>,
}

impl<T: Keyed> Accumulator<T> {
    fn absorb(&mut self, decoded: Decoded<T>) -> usize {
        let mut kept = 0;
        for record in decoded.records {
            if !self.seen.insert(record.key().to_string()) {
                continue;
            }
            for follow_up in record.follow_ups() {
                if self
                    .discovered_ids
                    .insert((follow_up.kind, follow_up.id.clone()))
                {
                    self.outcome.discovered.push(follow_up);
                }
            }
            self.outcome.records.push(record);
            kept += 1;
        }
        kept
    }
}

/// Per-run state shared by the workers
struct FetchContext<T> {
    queue: Mutex<VecDeque<(usize, EntityRef)>>,
    total: usize,
    results: Mutex<Accumulator<T>>,
}

impl<T: Keyed> FetchContext<T> {
    async fn next(&self) -> Option<(usize, EntityRef)> {
        self.queue.lock().await.pop_front()
    }

    async fn complete(
        &self,
        idx: usize,
        entity: EntityRef,
        result: Result<Decoded<T>, PipelineError>,
    ) {
        match result {
            Ok(decoded) => {
                let kept = self.results.lock().await.absorb(decoded);
                info!(
                    "Scraped {} {}/{}: {} ({} new records)",
                    entity.kind,
                    idx + 1,
                    self.total,
                    entity.url,
                    kept
                );
            }
            Err(error) => {
                warn!(
                    "Failed {} {}/{}: {} - {}",
                    entity.kind,
                    idx + 1,
                    self.total,
                    entity.url,
                    error
                );
                self.results
                    .lock()
                    .await
                    .outcome
                    .failures
                    .push(FetchFailure { entity, error });
            }
        }
    }
}

/// Decode one page. A panicking decoder becomes a decode error for this
/// entity so the worker keeps draining the queue.
fn decode_isolated<D: PageDecoder>(
    decoder: &D,
    html: &str,
    entity: &EntityRef,
) -> Result<Decoded<D::Record>, PipelineError> {
    panic::catch_unwind(AssertUnwindSafe(|| decoder.decode(html, entity))).unwrap_or_else(
        |payload| {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(PipelineError::decode(
                &entity.url,
                format!("decoder panicked: {}", reason),
            ))
        },
    )
}

/// Fetch and decode every ref with a bounded worker pool.
///
/// `seed_keys` are record keys that already exist (persisted rows); records
/// decoded with one of those keys are dropped like in-run duplicates. One
/// entity failing never stops the others.
pub async fn fetch_all<D>(
    refs: Vec<EntityRef>,
    seed_keys: impl IntoIterator<Item = String>,
    options: &FetchOptions,
    fetcher: Arc<dyn Fetcher>,
    decoder: Arc<D>,
) -> FetchOutcome<D::Record>
where
    D: PageDecoder + 'static,
{
    let total = refs.len();
    if total == 0 {
        return FetchOutcome::empty();
    }

    let context = Arc::new(FetchContext {
        queue: Mutex::new(refs.into_iter().enumerate().collect()),
        total,
        results: Mutex::new(Accumulator {
            seen: seed_keys.into_iter().collect(),
            discovered_ids: HashSet::new(),
            outcome: FetchOutcome::empty(),
        }),
    });

    let workers = options.max_workers.clamp(1, total);
    let mut pool = JoinSet::new();
    for _ in 0..workers {
        let context = Arc::clone(&context);
        let fetcher = Arc::clone(&fetcher);
        let decoder = Arc::clone(&decoder);
        let delay = options.request_delay;

        pool.spawn(async move {
            while let Some((idx, entity)) = context.next().await {
                let result = match fetcher.get(&entity.url).await {
                    Ok(html) => decode_isolated(decoder.as_ref(), &html, &entity),
                    Err(e) => Err(e),
                };
                context.complete(idx, entity, result).await;

                if !delay.is_zero() {
                    sleep(delay).await;
                }
            }
        });
    }

    while let Some(joined) = pool.join_next().await {
        if let Err(e) = joined {
            warn!("Fetch worker stopped unexpectedly: {}", e);
        }
    }

    let mut results = context.results.lock().await;
    std::mem::replace(&mut results.outcome, FetchOutcome::empty())
}
