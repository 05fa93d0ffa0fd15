//! Delta detection: which listed entities are new relative to the store.

use std::collections::HashSet;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::client::Fetcher;
use super::parsers::event::parse_event_date;
use crate::types::{floor_date, EntityRef};

/// Select the listed refs that still need fetching.
///
/// A ref is kept when its id is not already known and, for date-gated kinds
/// whose listing showed a date, that date is strictly after the watermark.
/// Listing order is preserved and repeated ids keep their first position.
pub fn compute_delta(
    remote_refs: &[EntityRef],
    known_ids: &HashSet<String>,
    watermark: Option<NaiveDate>,
) -> Vec<EntityRef> {
    let mut seen = HashSet::new();

    remote_refs
        .iter()
        .filter(|r| !known_ids.contains(&r.id))
        .filter(|r| match (watermark, r.date) {
            (Some(mark), Some(date)) if r.kind.is_date_gated() => date > mark,
            _ => true,
        })
        .filter(|r| seen.insert(r.id.clone()))
        .cloned()
        .collect()
}

/// Second delta pass for date-gated refs whose listing carried no date.
///
/// Each undated ref's page is fetched and only its date is read. Probes run
/// one after another with the same pacing the fetch workers use.
pub struct DateGate<'a> {
    fetcher: &'a dyn Fetcher,
    watermark: NaiveDate,
    delay: Duration,
}

impl<'a> DateGate<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, watermark: NaiveDate, delay: Duration) -> Self {
        Self {
            fetcher,
            watermark,
            delay,
        }
    }

    /// Drop undated refs whose page date is not after the watermark.
    ///
    /// With the sentinel watermark every date qualifies, so nothing is probed.
    /// A probe that fails keeps its ref; the full fetch reports the failure.
    pub async fn filter(&self, refs: Vec<EntityRef>) -> Vec<EntityRef> {
        if self.watermark <= floor_date() {
            return refs;
        }

        let mut kept = Vec::with_capacity(refs.len());
        for entity in refs {
            if entity.date.is_some() || !entity.kind.is_date_gated() {
                kept.push(entity);
                continue;
            }

            match self.probe(&entity).await {
                Some(date) if date <= self.watermark => {
                    debug!("Skipping {} {} dated {}", entity.kind, entity.id, date);
                }
                Some(date) => kept.push(entity.with_date(Some(date))),
                None => kept.push(entity),
            }

            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }
        }
        kept
    }

    async fn probe(&self, entity: &EntityRef) -> Option<NaiveDate> {
        match self.fetcher.get(&entity.url).await {
            Ok(html) => {
                let date = parse_event_date(&html);
                if date.is_none() {
                    warn!("No date found on {}", entity.url);
                }
                date
            }
            Err(e) => {
                warn!("Date probe failed for {}: {}", entity.url, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::client::mock::MockFetcher;
    use crate::types::EntityKind;

    fn event(id: &str, date: Option<(i32, u32, u32)>) -> EntityRef {
        EntityRef::from_id(EntityKind::Event, id)
            .with_date(date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)))
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ids(refs: &[EntityRef]) -> Vec<&str> {
        refs.iter().map(|r| r.id.as_str()).collect()
    }

    fn event_page(date: &str) -> String {
        format!(
            r#"<html><body><ul>
            <li class="b-list__box-list-item"><i>Date:</i> {}</li>
            <li class="b-list__box-list-item"><i>Location:</i> Las Vegas, Nevada, USA</li>
            </ul></body></html>"#,
            date
        )
    }

    #[test]
    fn test_known_ids_are_excluded() {
        let refs = vec![event("a", None), event("b", None), event("c", None)];
        let known: HashSet<String> = ["b".to_string()].into_iter().collect();

        let delta = compute_delta(&refs, &known, None);
        assert_eq!(ids(&delta), vec!["a", "c"]);
    }

    #[test]
    fn test_watermark_is_strict() {
        let refs = vec![
            event("new", Some((2024, 11, 17))),
            event("same_day", Some((2024, 11, 16))),
            event("old", Some((2024, 1, 1))),
            event("undated", None),
        ];

        let delta = compute_delta(&refs, &HashSet::new(), Some(ymd(2024, 11, 16)));
        assert_eq!(ids(&delta), vec!["new", "undated"]);
    }

    #[test]
    fn test_fights_ignore_watermark() {
        let fight = EntityRef::from_id(EntityKind::Fight, "f1").with_date(Some(ymd(2000, 1, 1)));
        let delta = compute_delta(&[fight], &HashSet::new(), Some(ymd(2024, 1, 1)));
        assert_eq!(delta.len(), 1);
    }

    #[test]
    fn test_empty_store_is_full_backfill() {
        let refs = vec![event("a", Some((1999, 1, 1))), event("b", None)];
        let delta = compute_delta(&refs, &HashSet::new(), Some(floor_date()));
        assert_eq!(ids(&delta), vec!["a", "b"]);
    }

    #[test]
    fn test_repeated_listing_keeps_first() {
        let refs = vec![event("a", None), event("b", None), event("a", None)];
        let delta = compute_delta(&refs, &HashSet::new(), None);
        assert_eq!(ids(&delta), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_date_gate_drops_old_undated_events() {
        let fetcher = MockFetcher::new()
            .with_page(&crate::scraper::event_url("old"), &event_page("November 16, 2024"))
            .with_page(&crate::scraper::event_url("new"), &event_page("December 07, 2024"));

        let gate = DateGate::new(&fetcher, ymd(2024, 11, 16), Duration::ZERO);
        let kept = gate
            .filter(vec![event("old", None), event("new", None)])
            .await;

        assert_eq!(ids(&kept), vec!["new"]);
        assert_eq!(kept[0].date, Some(ymd(2024, 12, 7)));
    }

    #[tokio::test]
    async fn test_date_gate_keeps_ref_when_probe_fails() {
        let fetcher = MockFetcher::new().with_failure(&crate::scraper::event_url("x"), 503);

        let gate = DateGate::new(&fetcher, ymd(2024, 1, 1), Duration::ZERO);
        let kept = gate.filter(vec![event("x", None)]).await;

        assert_eq!(ids(&kept), vec!["x"]);
    }

    #[tokio::test]
    async fn test_date_gate_skips_probe_on_sentinel() {
        let fetcher = MockFetcher::new();

        let gate = DateGate::new(&fetcher, floor_date(), Duration::ZERO);
        let kept = gate.filter(vec![event("a", None), event("b", None)]).await;

        assert_eq!(kept.len(), 2);
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_date_gate_does_not_probe_dated_refs() {
        let fetcher = MockFetcher::new();

        let gate = DateGate::new(&fetcher, ymd(2024, 1, 1), Duration::ZERO);
        let kept = gate.filter(vec![event("a", Some((2024, 6, 1)))]).await;

        assert_eq!(kept.len(), 1);
        assert!(fetcher.calls().is_empty());
    }
}
