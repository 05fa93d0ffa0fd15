//! Domain records shared by the scraper, the store and the stats engine.
//!
//! Every numeric field is materialized with an explicit default when a record
//! is built (page decode or row load), so downstream code never sees nulls.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::scraper;

/// Date used when nothing has been ingested yet.
pub fn floor_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// Kinds of remotely fetchable entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Event,
    Fight,
    Fighter,
    UpcomingEvent,
    UpcomingFight,
}

impl EntityKind {
    /// Only event listings are bounded by the dataset watermark.
    pub fn is_date_gated(&self) -> bool {
        matches!(self, EntityKind::Event | EntityKind::UpcomingEvent)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Event => "event",
            EntityKind::Fight => "fight",
            EntityKind::Fighter => "fighter",
            EntityKind::UpcomingEvent => "upcoming_event",
            EntityKind::UpcomingFight => "upcoming_fight",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier plus locator for a record that has not been fetched yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
    pub url: String,
    /// Date shown on the listing page, when the listing exposes one.
    pub date: Option<NaiveDate>,
}

impl EntityRef {
    /// Build a reference from a detail-page link. The identifier is the last
    /// path segment of the link.
    pub fn from_url(kind: EntityKind, url: &str) -> Option<Self> {
        let id = extract_id(url)?;
        Some(Self {
            kind,
            id,
            url: url.trim().to_string(),
            date: None,
        })
    }

    /// Build a reference from a bare identifier using the canonical page URL.
    pub fn from_id(kind: EntityKind, id: &str) -> Self {
        let url = match kind {
            EntityKind::Event | EntityKind::UpcomingEvent => scraper::event_url(id),
            EntityKind::Fight | EntityKind::UpcomingFight => scraper::fight_url(id),
            EntityKind::Fighter => scraper::fighter_url(id),
        };
        Self {
            kind,
            id: id.to_string(),
            url,
            date: None,
        }
    }

    pub fn with_date(mut self, date: Option<NaiveDate>) -> Self {
        self.date = date;
        self
    }
}

/// Extract the trailing identifier segment from a detail-page link.
pub fn extract_id(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let segment = trimmed.rsplit('/').next()?;
    let segment = segment.split(['?', '#']).next()?;
    if segment.is_empty() || segment.contains(':') {
        return None;
    }
    Some(segment.to_string())
}

/// A record with a stable primary key, optionally pointing at further pages.
pub trait Keyed {
    fn key(&self) -> &str;

    /// Pages discovered through this record that should be fetched next.
    fn follow_ups(&self) -> Vec<EntityRef> {
        Vec::new()
    }
}

/// How a fight ended, parsed once from the site's free-text method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FinishMethod {
    KoTko,
    Submission,
    Decision,
    Disqualification,
    NoContest,
    #[default]
    Other,
}

impl FinishMethod {
    /// Classify the method text shown on a fight page
    /// ("KO/TKO", "Submission", "Decision - Unanimous", "DQ", "Overturned", ...).
    pub fn parse(text: &str) -> Self {
        let lower = text.trim().to_lowercase();
        if lower.contains("submission") {
            FinishMethod::Submission
        } else if lower.contains("ko") {
            FinishMethod::KoTko
        } else if lower.contains("decision") {
            FinishMethod::Decision
        } else if lower.contains("dq") || lower.contains("disqualification") {
            FinishMethod::Disqualification
        } else if lower.contains("overturned")
            || lower.contains("no contest")
            || lower.contains("could not continue")
        {
            FinishMethod::NoContest
        } else {
            FinishMethod::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FinishMethod::KoTko => "ko_tko",
            FinishMethod::Submission => "submission",
            FinishMethod::Decision => "decision",
            FinishMethod::Disqualification => "dq",
            FinishMethod::NoContest => "no_contest",
            FinishMethod::Other => "other",
        }
    }
}

impl fmt::Display for FinishMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FinishMethod {
    type Err = std::convert::Infallible;

    /// Accepts both the canonical stored names and raw site text.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "ko_tko" => FinishMethod::KoTko,
            "submission" => FinishMethod::Submission,
            "decision" => FinishMethod::Decision,
            "dq" => FinishMethod::Disqualification,
            "no_contest" => FinishMethod::NoContest,
            "other" => FinishMethod::Other,
            raw => FinishMethod::parse(raw),
        })
    }
}

/// One side of a fight record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    Red,
    Blue,
}

impl Corner {
    pub const BOTH: [Corner; 2] = [Corner::Red, Corner::Blue];

    pub fn opponent(&self) -> Corner {
        match self {
            Corner::Red => Corner::Blue,
            Corner::Blue => Corner::Red,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Corner::Red => "red",
            Corner::Blue => "blue",
        }
    }
}

/// "X of Y" strike or takedown counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Attempts {
    pub landed: u32,
    pub attempted: u32,
}

impl Attempts {
    pub fn new(landed: u32, attempted: u32) -> Self {
        Self { landed, attempted }
    }
}

/// Counting stats for one corner of a fight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CornerStats {
    pub fighter_id: String,
    pub fighter_name: String,
    pub kd: u32,
    pub sig_str: Attempts,
    pub total_str: Attempts,
    pub td: Attempts,
    pub sub_att: u32,
    pub rev: u32,
    pub ctrl_sec: u32,
    // By target
    pub head: Attempts,
    pub body: Attempts,
    pub leg: Attempts,
    // By position
    pub distance: Attempts,
    pub clinch: Attempts,
    pub ground: Attempts,
}

/// A completed bout with both corners' stats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FightRecord {
    pub fight_id: String,
    pub event_id: String,
    pub event_name: String,
    pub division: String,
    pub title_fight: bool,
    pub method: FinishMethod,
    pub method_detail: String,
    pub finish_round: u32,
    /// Scheduled rounds; `None` for "No Time Limit" bouts.
    pub total_rounds: Option<u32>,
    pub match_time_sec: i64,
    pub referee: Option<String>,
    pub red: CornerStats,
    pub blue: CornerStats,
}

impl FightRecord {
    pub fn corner(&self, corner: Corner) -> &CornerStats {
        match corner {
            Corner::Red => &self.red,
            Corner::Blue => &self.blue,
        }
    }
}

impl Keyed for FightRecord {
    fn key(&self) -> &str {
        &self.fight_id
    }

    fn follow_ups(&self) -> Vec<EntityRef> {
        Corner::BOTH
            .into_iter()
            .map(|c| &self.corner(c).fighter_id)
            .filter(|id| !id.is_empty())
            .map(|id| EntityRef::from_id(EntityKind::Fighter, id))
            .collect()
    }
}

/// Result row for one fight on a completed event card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FightOutcome {
    pub fight_id: String,
    pub event_id: String,
    pub event_name: String,
    pub date: Option<NaiveDate>,
    pub location: String,
    /// `None` for draws and no-contests.
    pub winner_id: Option<String>,
    pub winner_name: Option<String>,
}

impl Keyed for FightOutcome {
    fn key(&self) -> &str {
        &self.fight_id
    }

    fn follow_ups(&self) -> Vec<EntityRef> {
        vec![EntityRef::from_id(EntityKind::Fight, &self.fight_id)]
    }
}

/// Fighter profile page data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FighterProfile {
    pub id: String,
    pub name: String,
    pub nickname: Option<String>,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub reach_cm: Option<f64>,
    pub stance: Option<String>,
    pub dob: Option<String>,
    // Career rates published by the site
    pub splm: f64,
    pub str_acc: f64,
    pub sapm: f64,
    pub str_def: f64,
    pub td_avg: f64,
    pub td_acc: f64,
    pub td_def: f64,
    pub sub_avg: f64,
}

impl Keyed for FighterProfile {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Event that has been announced but not yet held
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UpcomingEvent {
    pub event_id: String,
    pub name: String,
    pub date: Option<NaiveDate>,
    pub location: String,
    /// Bout pages linked from the card. Not persisted.
    #[serde(skip)]
    pub fight_refs: Vec<EntityRef>,
}

impl Keyed for UpcomingEvent {
    fn key(&self) -> &str {
        &self.event_id
    }

    fn follow_ups(&self) -> Vec<EntityRef> {
        self.fight_refs.clone()
    }
}

/// Scheduled bout on an upcoming card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UpcomingFight {
    pub fight_id: String,
    pub event_id: String,
    pub event_name: String,
    pub red_id: String,
    pub red_name: String,
    pub blue_id: String,
    pub blue_name: String,
    pub division: String,
    pub title_fight: bool,
}

impl Keyed for UpcomingFight {
    fn key(&self) -> &str {
        &self.fight_id
    }
}
