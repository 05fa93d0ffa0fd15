//! Run orchestration.
//!
//! A completed run lists events, keeps only the new ones, fetches their
//! cards, then the bouts on those cards, then the fighters involved. The
//! store is read once at the start and written once at the end, after which
//! the metrics snapshot is rebuilt from the whole fight corpus. An upcoming
//! run does the same for announced cards without the aggregation step.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::config::ScraperConfig;
use crate::error::{ErrorKind, PipelineError};
use crate::scraper::parsers::{
    EventDecoder, EventListParser, FightDecoder, FighterDecoder, FighterListParser,
    UpcomingEventDecoder, UpcomingFightDecoder,
};
use crate::scraper::{
    compute_delta, completed_events_url, fetch_all, fighters_list_url, upcoming_events_url,
    DateGate, FetchFailure, FetchOptions, Fetcher,
};
use crate::stats::aggregate;
use crate::storage::{merge, DatasetStore, SaveMode};
use crate::types::{
    floor_date, EntityKind, EntityRef, FightOutcome, FightRecord, FighterProfile, UpcomingEvent,
    UpcomingFight,
};

/// What one run added, and everything that went wrong along the way
#[derive(Debug, Default)]
pub struct RunSummary {
    pub new_events: usize,
    pub new_fights: usize,
    pub fighters_fetched: usize,
    /// Fighters in the rebuilt metrics snapshot, when aggregation ran
    pub fighters_with_metrics: Option<usize>,
    pub failures: BTreeMap<ErrorKind, Vec<String>>,
}

impl RunSummary {
    fn record(&mut self, error: PipelineError) {
        self.failures
            .entry(error.kind())
            .or_default()
            .push(error.to_string());
    }

    fn record_failures(&mut self, failures: Vec<FetchFailure>) {
        for failure in failures {
            self.record(failure.error);
        }
    }

    pub fn failure_count(&self) -> usize {
        self.failures.values().map(Vec::len).sum()
    }

    pub fn log(&self) {
        info!(
            "Run complete: {} new events, {} new fights, {} fighters fetched",
            self.new_events, self.new_fights, self.fighters_fetched
        );
        if let Some(count) = self.fighters_with_metrics {
            info!("Metrics rebuilt for {} fighters", count);
        }
        for (kind, errors) in &self.failures {
            warn!("{} {} failure(s)", errors.len(), kind);
            for error in errors {
                debug!("  {}", error);
            }
        }
    }
}

/// Completed-data collections as read at the start of a run
struct CompletedSnapshot {
    outcomes: Vec<FightOutcome>,
    fights: Vec<FightRecord>,
    fighters: Vec<FighterProfile>,
    known_events: HashSet<String>,
    watermark: NaiveDate,
}

impl CompletedSnapshot {
    fn cold_start() -> Self {
        Self {
            outcomes: Vec::new(),
            fights: Vec::new(),
            fighters: Vec::new(),
            known_events: HashSet::new(),
            watermark: floor_date(),
        }
    }
}

/// Ingestion pipeline bound to one store and one fetcher
pub struct Pipeline {
    store: DatasetStore,
    fetcher: Arc<dyn Fetcher>,
    options: FetchOptions,
    fighter_backfill_threshold: usize,
}

impl Pipeline {
    pub fn new(store: DatasetStore, fetcher: Arc<dyn Fetcher>, config: &ScraperConfig) -> Self {
        Self {
            store,
            fetcher,
            options: FetchOptions::from(config),
            fighter_backfill_threshold: config.fighter_backfill_threshold,
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    /// Ingest newly completed events, their bouts and fighters.
    ///
    /// When the stored dataset cannot be read the run fetches as if from
    /// scratch but only upserts what it fetched, leaving stored rows in place,
    /// and skips aggregation.
    pub async fn run_completed(&mut self, with_aggregate: bool) -> Result<RunSummary, PipelineError> {
        let mut summary = RunSummary::default();

        let (snapshot, mode) = match self.load_completed() {
            Ok(snapshot) => (snapshot, SaveMode::Replace),
            Err(e) => {
                warn!("Could not read stored dataset, treating everything as new: {}", e);
                summary.record(e);
                (CompletedSnapshot::cold_start(), SaveMode::Upsert)
            }
        };
        info!(
            "Stored: {} events, {} fights, {} fighters (latest event {})",
            snapshot.known_events.len(),
            snapshot.fights.len(),
            snapshot.fighters.len(),
            snapshot.watermark
        );

        // Events
        let listed = self
            .list(&completed_events_url(), EntityKind::Event, &mut summary)
            .await
            .unwrap_or_default();
        let delta = compute_delta(&listed, &snapshot.known_events, Some(snapshot.watermark));
        let gate = DateGate::new(
            self.fetcher.as_ref(),
            snapshot.watermark,
            self.options.request_delay,
        );
        let event_refs = gate.filter(delta).await;
        info!("{} of {} listed events are new", event_refs.len(), listed.len());

        let known_outcomes: Vec<String> =
            snapshot.outcomes.iter().map(|o| o.fight_id.clone()).collect();
        let events = fetch_all(
            event_refs,
            known_outcomes,
            &self.options,
            Arc::clone(&self.fetcher),
            Arc::new(EventDecoder),
        )
        .await;
        summary.new_events = events
            .records
            .iter()
            .map(|o| o.event_id.as_str())
            .collect::<HashSet<_>>()
            .len();
        summary.record_failures(events.failures);

        // Fights: bouts on the new cards plus stored outcomes whose bout never landed
        let known_fights: HashSet<String> =
            snapshot.fights.iter().map(|f| f.fight_id.clone()).collect();
        let orphans = snapshot
            .outcomes
            .iter()
            .filter(|o| !known_fights.contains(&o.fight_id))
            .map(|o| EntityRef::from_id(EntityKind::Fight, &o.fight_id));
        let candidates: Vec<EntityRef> = events.discovered.into_iter().chain(orphans).collect();
        let fight_refs = compute_delta(&candidates, &known_fights, None);

        let fights = fetch_all(
            fight_refs,
            known_fights,
            &self.options,
            Arc::clone(&self.fetcher),
            Arc::new(FightDecoder),
        )
        .await;
        summary.new_fights = fights.records.len();
        summary.record_failures(fights.failures);

        // Fighters: everyone in a new bout is refetched so records stay current.
        // A small roster is refreshed in full from the fighter list.
        let mut fighter_candidates = fights.discovered;
        if snapshot.fighters.len() < self.fighter_backfill_threshold {
            info!(
                "Only {} fighters stored (threshold {}), refreshing from the fighter list",
                snapshot.fighters.len(),
                self.fighter_backfill_threshold
            );
            let listed = self
                .list(&fighters_list_url(), EntityKind::Fighter, &mut summary)
                .await
                .unwrap_or_default();
            fighter_candidates.extend(listed);
        }
        let fighter_refs = compute_delta(&fighter_candidates, &HashSet::new(), None);

        let fighters = fetch_all(
            fighter_refs,
            Vec::new(),
            &self.options,
            Arc::clone(&self.fetcher),
            Arc::new(FighterDecoder),
        )
        .await;
        summary.fighters_fetched = fighters.records.len();
        summary.record_failures(fighters.failures);

        let outcomes = merge(snapshot.outcomes, events.records, |o| o.fight_id.clone());
        let all_fights = merge(snapshot.fights, fights.records, |f| f.fight_id.clone());
        let all_fighters = merge(snapshot.fighters, fighters.records, |f| f.id.clone());

        self.store
            .save_completed(&outcomes, &all_fights, &all_fighters, mode)?;
        info!(
            "Saved {} outcomes, {} fights, {} fighters ({:?})",
            outcomes.len(),
            all_fights.len(),
            all_fighters.len(),
            mode
        );

        if with_aggregate {
            if mode == SaveMode::Replace {
                summary.fighters_with_metrics =
                    Some(save_metrics(&mut self.store, &outcomes, &all_fights)?);
            } else {
                warn!("Skipping aggregation, the stored fight corpus could not be read");
            }
        }

        Ok(summary)
    }

    /// Ingest announced cards. Cards that dropped off the upcoming listing
    /// are removed together with their bouts.
    pub async fn run_upcoming(&mut self) -> Result<RunSummary, PipelineError> {
        let mut summary = RunSummary::default();

        let ((stored_events, stored_fights), mode) = match self.load_upcoming() {
            Ok(collections) => (collections, SaveMode::Replace),
            Err(e) => {
                warn!("Could not read stored upcoming cards, treating everything as new: {}", e);
                summary.record(e);
                ((Vec::new(), Vec::new()), SaveMode::Upsert)
            }
        };
        let known_events: HashSet<String> =
            stored_events.iter().map(|e| e.event_id.clone()).collect();
        let known_fights: HashSet<String> =
            stored_fights.iter().map(|f| f.fight_id.clone()).collect();

        let listed = self
            .list(&upcoming_events_url(), EntityKind::UpcomingEvent, &mut summary)
            .await;
        let event_refs = compute_delta(listed.as_deref().unwrap_or_default(), &known_events, None);

        let events = fetch_all(
            event_refs,
            known_events,
            &self.options,
            Arc::clone(&self.fetcher),
            Arc::new(UpcomingEventDecoder),
        )
        .await;
        summary.new_events = events.records.len();
        summary.record_failures(events.failures);

        let fight_refs = compute_delta(&events.discovered, &known_fights, None);
        let fights = fetch_all(
            fight_refs,
            known_fights,
            &self.options,
            Arc::clone(&self.fetcher),
            Arc::new(UpcomingFightDecoder),
        )
        .await;
        summary.new_fights = fights.records.len();
        summary.record_failures(fights.failures);

        let mut all_events = merge(stored_events, events.records, |e| e.event_id.clone());
        let mut all_fights = merge(stored_fights, fights.records, |f| f.fight_id.clone());

        // Pruning needs the stored cards, so it only happens on a full replace
        if let (Some(listed), SaveMode::Replace) = (&listed, mode) {
            let live: HashSet<&str> = listed.iter().map(|r| r.id.as_str()).collect();
            all_events.retain(|e| live.contains(e.event_id.as_str()));
            let kept: HashSet<&str> = all_events.iter().map(|e| e.event_id.as_str()).collect();
            all_fights.retain(|f| kept.contains(f.event_id.as_str()));
        }

        self.store.save_upcoming(&all_events, &all_fights, mode)?;
        info!(
            "Saved {} upcoming events, {} upcoming fights",
            all_events.len(),
            all_fights.len()
        );

        Ok(summary)
    }

    fn load_completed(&self) -> Result<CompletedSnapshot, PipelineError> {
        Ok(CompletedSnapshot {
            known_events: self.store.known_ids(EntityKind::Event)?,
            watermark: self.store.watermark(EntityKind::Event)?,
            outcomes: self.store.load_outcomes()?,
            fights: self.store.load_fights()?,
            fighters: self.store.load_fighters()?,
        })
    }

    fn load_upcoming(&self) -> Result<(Vec<UpcomingEvent>, Vec<UpcomingFight>), PipelineError> {
        Ok((
            self.store.load_upcoming_events()?,
            self.store.load_upcoming_fights()?,
        ))
    }

    /// Fetch and parse a listing page. A failure is recorded and yields `None`.
    async fn list(
        &self,
        url: &str,
        kind: EntityKind,
        summary: &mut RunSummary,
    ) -> Option<Vec<EntityRef>> {
        let html = match self.fetcher.get(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Could not fetch listing {}: {}", url, e);
                summary.record(e);
                return None;
            }
        };

        let parsed = match kind {
            EntityKind::Fighter => FighterListParser::parse(&html),
            _ => EventListParser::parse(&html, kind),
        };

        match parsed {
            Ok(refs) => {
                info!("Listed {} {} refs from {}", refs.len(), kind, url);
                Some(refs)
            }
            Err(e) => {
                let e = PipelineError::decode(url, format!("{:#}", e));
                warn!("{}", e);
                summary.record(e);
                None
            }
        }
    }
}

/// Rebuild the metrics snapshot from what is already stored.
pub fn rebuild_metrics(store: &mut DatasetStore) -> Result<usize, PipelineError> {
    let outcomes = store.load_outcomes()?;
    let fights = store.load_fights()?;
    save_metrics(store, &outcomes, &fights)
}

fn save_metrics(
    store: &mut DatasetStore,
    outcomes: &[FightOutcome],
    fights: &[FightRecord],
) -> Result<usize, PipelineError> {
    let winners: HashMap<String, Option<String>> = outcomes
        .iter()
        .map(|o| (o.fight_id.clone(), o.winner_id.clone()))
        .collect();

    let metrics = aggregate(fights, &winners);
    store.save_metrics(&metrics)?;
    info!(
        "Aggregated {} fights into metrics for {} fighters",
        fights.len(),
        metrics.len()
    );
    Ok(metrics.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::client::mock::MockFetcher;
    use crate::scraper::parsers::event::fixtures as event_fixtures;
    use crate::scraper::parsers::fight::fixtures as fight_fixtures;
    use crate::scraper::parsers::fighter::fixtures as fighter_fixtures;
    use crate::scraper::{event_url, fight_url, fighter_url};
    use crate::types::FinishMethod;

    const EVENT_ID: &str = "6e2b1d631832921d";
    const JONES: &str = "07f72a2a7591b409";

    fn list_html(rows: &[(&str, &str)]) -> String {
        let rows: String = rows
            .iter()
            .map(|(id, date)| {
                format!(
                    r#"<tr class="b-statistics__table-row"><td>
                    <a href="http://ufcstats.com/event-details/{}" class="b-link b-link_style_black">Event</a>
                    <span class="b-statistics__date">{}</span>
                    </td></tr>"#,
                    id, date
                )
            })
            .collect();
        format!("<html><body><table><tbody>{}</tbody></table></body></html>", rows)
    }

    fn config(backfill_threshold: usize) -> ScraperConfig {
        ScraperConfig {
            max_workers: 2,
            request_delay_ms: 0,
            fighter_backfill_threshold: backfill_threshold,
            ..Default::default()
        }
    }

    /// One completed card: a KO, a decision and a bout whose page 404s.
    fn completed_site() -> MockFetcher {
        let decision = fight_fixtures::fight_page(
            EVENT_ID,
            ("aaaabbbbccccdddd", "Fighter One"),
            ("eeeeffff00001111", "Fighter Two"),
            "Decision - Split",
            3,
            "5:00",
            "3 Rnd (5-5-5)",
        );

        MockFetcher::new()
            .with_page(
                &completed_events_url(),
                &list_html(&[(EVENT_ID, "November 16, 2024")]),
            )
            .with_page(&event_url(EVENT_ID), event_fixtures::SAMPLE_HTML)
            .with_page(&fight_url("b3a2bb2ddfe0bd06"), &fight_fixtures::sample_html())
            .with_page(&fight_url("c0d8e7b1a2f3e4d5"), &decision)
            .with_page(&fighter_url(JONES), fighter_fixtures::SAMPLE_HTML)
    }

    fn pipeline(site: &Arc<MockFetcher>, threshold: usize) -> Pipeline {
        let fetcher: Arc<dyn Fetcher> = site.clone();
        Pipeline::new(DatasetStore::in_memory().unwrap(), fetcher, &config(threshold))
    }

    #[tokio::test]
    async fn test_cold_start_completed_run() {
        let site = Arc::new(completed_site());
        let mut pipeline = pipeline(&site, 0);

        let summary = pipeline.run_completed(true).await.unwrap();

        assert_eq!(summary.new_events, 1);
        assert_eq!(summary.new_fights, 2);
        assert_eq!(summary.fighters_fetched, 1);
        // The no-contest bout plus three fighter pages are missing
        assert_eq!(summary.failures[&ErrorKind::FetchFailed].len(), 4);
        assert_eq!(summary.fighters_with_metrics, Some(4));

        let store = pipeline.store();
        assert_eq!(store.load_outcomes().unwrap().len(), 3);
        assert_eq!(store.count(EntityKind::Fight).unwrap(), 2);
        assert_eq!(store.load_fighters().unwrap()[0].name, "Jon Jones");
        assert_eq!(
            store.watermark(EntityKind::Event).unwrap(),
            NaiveDate::from_ymd_opt(2024, 11, 16).unwrap()
        );

        let jones = store.load_fighter_metrics(JONES).unwrap();
        assert_eq!(jones.total_fights, 1);
        assert_eq!(jones.ko_tko_wins, 1);
        assert_eq!(jones.finish_rate, 100.0);

        let miocic = store.load_fighter_metrics("d0f3959b4a9747e6").unwrap();
        assert_eq!(miocic.ko_losses, 1);
    }

    #[tokio::test]
    async fn test_second_run_only_retries_missing_fights() {
        let site = Arc::new(completed_site());
        let mut pipeline = pipeline(&site, 0);

        pipeline.run_completed(false).await.unwrap();
        let summary = pipeline.run_completed(false).await.unwrap();

        assert_eq!(summary.new_events, 0);
        assert_eq!(summary.new_fights, 0);
        assert_eq!(site.call_count(&event_url(EVENT_ID)), 1);
        assert_eq!(site.call_count(&fight_url("b3a2bb2ddfe0bd06")), 1);
        // The bout that failed is queued again from its stored outcome
        assert_eq!(site.call_count(&fight_url("f1e2d3c4b5a69788")), 2);
        assert_eq!(summary.failures[&ErrorKind::FetchFailed].len(), 1);
        assert_eq!(pipeline.store().load_outcomes().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_events_on_or_before_watermark_are_skipped() {
        let site = Arc::new(
            MockFetcher::new().with_page(
                &completed_events_url(),
                &list_html(&[
                    ("1111111111111111", "December 14, 2024"),
                    ("2222222222222222", "November 16, 2024"),
                ]),
            ),
        );
        let fetcher: Arc<dyn Fetcher> = site.clone();

        let mut store = DatasetStore::in_memory().unwrap();
        let stored = FightOutcome {
            fight_id: "b3a2bb2ddfe0bd06".to_string(),
            event_id: EVENT_ID.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 11, 16),
            ..Default::default()
        };
        store.save_completed(&[stored], &[], &[], SaveMode::Replace).unwrap();
        let mut pipeline = Pipeline::new(store, fetcher, &config(0));

        pipeline.run_completed(false).await.unwrap();

        assert_eq!(site.call_count(&event_url("1111111111111111")), 1);
        assert_eq!(site.call_count(&event_url("2222222222222222")), 0);
    }

    #[tokio::test]
    async fn test_fighter_backfill_survives_listing_failure() {
        let fighters_list = format!(
            r#"<html><body><a href="{}" class="b-link b-link_style_black">Jon</a></body></html>"#,
            fighter_url(JONES)
        );
        let site = Arc::new(
            MockFetcher::new()
                .with_failure(&completed_events_url(), 503)
                .with_page(&fighters_list_url(), &fighters_list)
                .with_page(&fighter_url(JONES), fighter_fixtures::SAMPLE_HTML),
        );
        let mut pipeline = pipeline(&site, 2000);

        let summary = pipeline.run_completed(true).await.unwrap();

        assert_eq!(summary.new_events, 0);
        assert_eq!(summary.fighters_fetched, 1);
        assert_eq!(summary.failures[&ErrorKind::FetchFailed].len(), 1);
        assert_eq!(summary.fighters_with_metrics, Some(0));
        assert_eq!(pipeline.store().count(EntityKind::Fighter).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_small_roster_refreshes_known_fighters() {
        let fighters_list = format!(
            r#"<html><body><a href="{}" class="b-link b-link_style_black">Jon</a></body></html>"#,
            fighter_url(JONES)
        );
        let site = Arc::new(
            MockFetcher::new()
                .with_page(&completed_events_url(), &list_html(&[]))
                .with_page(&fighters_list_url(), &fighters_list)
                .with_page(&fighter_url(JONES), fighter_fixtures::SAMPLE_HTML),
        );
        let mut pipeline = pipeline(&site, 2000);
        let stale = FighterProfile {
            id: JONES.to_string(),
            name: "Jon Jones".to_string(),
            wins: 1,
            ..Default::default()
        };
        pipeline
            .store
            .save_completed(&[], &[], &[stale], SaveMode::Replace)
            .unwrap();

        let summary = pipeline.run_completed(false).await.unwrap();

        assert_eq!(site.call_count(&fighter_url(JONES)), 1);
        assert_eq!(summary.fighters_fetched, 1);
        let fighters = pipeline.store().load_fighters().unwrap();
        assert_eq!(fighters.len(), 1);
        assert_eq!(fighters[0].wins, 28);
    }

    #[tokio::test]
    async fn test_unreadable_store_keeps_existing_rows() {
        let site = Arc::new(MockFetcher::new());
        let mut pipeline = pipeline(&site, 0);
        let outcomes: Vec<FightOutcome> = ["f1", "f2", "f3"]
            .iter()
            .map(|id| FightOutcome {
                fight_id: id.to_string(),
                event_id: EVENT_ID.to_string(),
                date: NaiveDate::from_ymd_opt(2024, 11, 16),
                ..Default::default()
            })
            .collect();
        pipeline
            .store
            .save_completed(&outcomes, &[], &[], SaveMode::Replace)
            .unwrap();
        // total_rounds is unsigned on load, so this row fails the snapshot read
        pipeline
            .store
            .connection()
            .execute(
                "INSERT INTO fights (fight_id, total_rounds) VALUES ('corrupt', -1)",
                [],
            )
            .unwrap();

        let summary = pipeline.run_completed(true).await.unwrap();

        assert_eq!(summary.failures[&ErrorKind::Storage].len(), 1);
        assert_eq!(summary.fighters_with_metrics, None);
        assert_eq!(pipeline.store().load_outcomes().unwrap().len(), 3);
        assert_eq!(pipeline.store().count(EntityKind::Fight).unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upcoming_run() {
        let upcoming_list = list_html(&[("9999aaaa8888bbbb", "December 07, 2024")]);
        let scheduled = fight_fixtures::fight_page(
            "9999aaaa8888bbbb",
            ("cccc111122223333", "Alexandre Pantoja"),
            ("dddd444455556666", "Kai Asakura"),
            "",
            0,
            "",
            "",
        );
        let site = Arc::new(
            MockFetcher::new()
                .with_page(&upcoming_events_url(), &upcoming_list)
                .with_page(&event_url("9999aaaa8888bbbb"), event_fixtures::UPCOMING_HTML)
                .with_page(&fight_url("1111aaaa2222bbbb"), &scheduled),
        );
        let mut pipeline = pipeline(&site, 0);

        let summary = pipeline.run_upcoming().await.unwrap();

        assert_eq!(summary.new_events, 1);
        assert_eq!(summary.new_fights, 1);
        assert_eq!(summary.failure_count(), 1);

        let events = pipeline.store().load_upcoming_events().unwrap();
        assert_eq!(events[0].name, "UFC 310: Pantoja vs. Asakura");
        let fights = pipeline.store().load_upcoming_fights().unwrap();
        assert_eq!(fights.len(), 1);
        assert_eq!(fights[0].red_name, "Alexandre Pantoja");
    }

    #[tokio::test]
    async fn test_upcoming_prunes_cards_no_longer_listed() {
        let site = Arc::new(
            MockFetcher::new().with_page(&upcoming_events_url(), &list_html(&[])),
        );
        let fetcher: Arc<dyn Fetcher> = site.clone();

        let mut store = DatasetStore::in_memory().unwrap();
        let held = UpcomingEvent {
            event_id: "held".to_string(),
            name: "UFC 309".to_string(),
            ..Default::default()
        };
        let bout = UpcomingFight {
            fight_id: "bout".to_string(),
            event_id: "held".to_string(),
            ..Default::default()
        };
        store.save_upcoming(&[held], &[bout], SaveMode::Replace).unwrap();
        let mut pipeline = Pipeline::new(store, fetcher, &config(0));

        pipeline.run_upcoming().await.unwrap();

        assert!(pipeline.store().load_upcoming_events().unwrap().is_empty());
        assert!(pipeline.store().load_upcoming_fights().unwrap().is_empty());
    }

    #[test]
    fn test_rebuild_metrics_from_store() {
        let mut store = DatasetStore::in_memory().unwrap();
        let fight = crate::scraper::parsers::FightParser::parse(
            &fight_fixtures::sample_html(),
            "b3a2bb2ddfe0bd06",
        )
        .unwrap();
        assert_eq!(fight.method, FinishMethod::KoTko);
        store.save_completed(&[], &[fight], &[], SaveMode::Replace).unwrap();

        assert_eq!(rebuild_metrics(&mut store).unwrap(), 2);
        // No outcome stored, so nobody is credited with the win
        let jones = store.load_fighter_metrics(JONES).unwrap();
        assert_eq!(jones.ko_tko_wins, 0);
        assert_eq!(jones.kd, 1);
    }
}
