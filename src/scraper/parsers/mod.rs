//! HTML parsers for ufcstats.com pages.
//!
//! Each page kind has a parser struct with a `parse` associated function and a
//! decoder value implementing [`PageDecoder`] so the fetch executor can treat
//! them uniformly.

pub mod event;
pub mod fight;
pub mod fighter;
pub mod listing;

pub use event::{parse_event_date, EventDecoder, EventParser, UpcomingEventDecoder};
pub use fight::{FightDecoder, FightParser, UpcomingFightDecoder};
pub use fighter::{FighterDecoder, FighterParser};
pub use listing::{EventListParser, FighterListParser};

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use scraper::{ElementRef, Selector};

use crate::error::PipelineError;
use crate::types::{Attempts, EntityRef, Keyed};

/// Records decoded from one page
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded<T> {
    pub records: Vec<T>,
}

impl<T> Decoded<T> {
    pub fn one(record: T) -> Self {
        Self {
            records: vec![record],
        }
    }

    pub fn many(records: Vec<T>) -> Self {
        Self { records }
    }
}

/// Turns a fetched page body into records
pub trait PageDecoder: Send + Sync {
    type Record: Keyed + Send + 'static;

    fn decode(
        &self,
        html: &str,
        entity: &EntityRef,
    ) -> Result<Decoded<Self::Record>, PipelineError>;
}

/// Wrap a parser failure with the page it came from.
pub(crate) fn decode_error(entity: &EntityRef, e: anyhow::Error) -> PipelineError {
    PipelineError::decode(&entity.url, format!("{:#}", e))
}

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {}: {}", css, e))
}

/// Element text with whitespace runs collapsed to single spaces
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text after a "Label:" prefix, e.g. "Date: November 16, 2024"
pub(crate) fn strip_label<'a>(text: &'a str, label: &str) -> &'a str {
    let trimmed = text.trim();
    match trimmed.get(..label.len()) {
        Some(head) if head.eq_ignore_ascii_case(label) => trimmed[label.len()..].trim(),
        _ => trimmed,
    }
}

/// Parse a site date such as "November 16, 2024" or "Jul 19, 1987".
pub fn parse_site_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    ["%B %d, %Y", "%b %d, %Y", "%Y-%m-%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Integer counter; "--" and blanks read as zero.
pub(crate) fn parse_count(text: &str) -> u32 {
    text.trim().parse::<f64>().map(|v| v as u32).unwrap_or(0)
}

/// "12 of 30" counter pair
pub(crate) fn parse_attempts(text: &str) -> Attempts {
    let mut parts = text.split(" of ");
    let landed = parts.next().map(parse_count).unwrap_or(0);
    let attempted = parts.next().map(parse_count).unwrap_or(0);
    Attempts::new(landed, attempted)
}

/// "m:ss" clock in seconds; anything else, including a clock too large for
/// `u32`, reads as zero.
pub(crate) fn parse_clock(text: &str) -> u32 {
    let Some((m, s)) = text.trim().split_once(':') else {
        return 0;
    };
    let minutes = m.trim().parse::<u32>().unwrap_or(0);
    let seconds = s.trim().parse::<u32>().unwrap_or(0);
    minutes
        .checked_mul(60)
        .and_then(|secs| secs.checked_add(seconds))
        .unwrap_or(0)
}

/// "45%" as a number; "--" reads as zero.
pub(crate) fn parse_percent(text: &str) -> f64 {
    text.trim().trim_end_matches('%').trim().parse().unwrap_or(0.0)
}

/// Plain decimal; "--" reads as zero.
pub(crate) fn parse_decimal(text: &str) -> f64 {
    text.trim().parse().unwrap_or(0.0)
}
