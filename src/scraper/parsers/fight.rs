//! Fight detail page parser.
//!
//! The totals and significant-strike tables are read as one flat list of
//! `p.b-fight-details__table-text` cells, red corner first in every pair:
//!
//! | cells  | stat                  |
//! |--------|-----------------------|
//! | 0-1    | fighter names         |
//! | 2-3    | knockdowns            |
//! | 4-5    | sig. strikes "x of y" |
//! | 8-9    | total strikes         |
//! | 12-13  | takedowns             |
//! | 16-17  | submission attempts   |
//! | 18-19  | reversals             |
//! | 20-21  | control time "m:ss"   |
//! | 22-23  | head                  |
//! | 26-27  | body                  |
//! | 30-31  | leg                   |
//! | 34-35  | distance              |
//! | 38-39  | clinch                |
//! | 42-43  | ground                |
//!
//! Missing cells read as zero.

use anyhow::{bail, Result};
use scraper::Html;
use tracing::debug;

use super::{decode_error, element_text, parse_attempts, parse_clock, parse_count, selector, strip_label};
use super::{Decoded, PageDecoder};
use crate::error::PipelineError;
use crate::types::{extract_id, CornerStats, EntityRef, FightRecord, FinishMethod, UpcomingFight};

const KD: usize = 2;
const SIG_STR: usize = 4;
const TOTAL_STR: usize = 8;
const TD: usize = 12;
const SUB_ATT: usize = 16;
const REV: usize = 18;
const CTRL: usize = 20;
const HEAD: usize = 22;
const BODY: usize = 26;
const LEG: usize = 30;
const DISTANCE: usize = 34;
const CLINCH: usize = 38;
const GROUND: usize = 42;

/// Round length assumed when the time format does not list durations
const DEFAULT_ROUND_SECS: i64 = 300;

/// Fields shared by completed and scheduled fight pages
#[derive(Debug, Default)]
struct FightHeader {
    event_id: String,
    event_name: String,
    red: (String, String),
    blue: (String, String),
    division: String,
    title_fight: bool,
}

/// Parser for fight detail pages
pub struct FightParser;

impl FightParser {
    /// Parse a completed fight with both corners' stats.
    pub fn parse(html: &str, fight_id: &str) -> Result<FightRecord> {
        let document = Html::parse_document(html);
        let header = Self::parse_header(&document)?;

        let method_selector = selector("i[style='font-style: normal']")?;
        let method_detail = document
            .select(&method_selector)
            .next()
            .map(element_text)
            .unwrap_or_default();

        let mut finish_round = 0;
        let mut clock = 0;
        let mut total_rounds = None;
        let mut round_format = String::new();
        let mut referee = None;

        let item_selector = selector("p.b-fight-details__text i.b-fight-details__text-item")?;
        for item in document.select(&item_selector) {
            let text = element_text(item);
            if text.starts_with("Round:") {
                finish_round = parse_count(strip_label(&text, "Round:"));
            } else if text.starts_with("Time format:") {
                round_format = strip_label(&text, "Time format:").to_string();
                total_rounds = parse_total_rounds(&round_format);
            } else if text.starts_with("Time:") {
                clock = parse_clock(strip_label(&text, "Time:"));
            } else if text.starts_with("Referee:") {
                let name = strip_label(&text, "Referee:");
                referee = (!name.is_empty()).then(|| name.to_string());
            }
        }

        let cell_selector = selector("p.b-fight-details__table-text")?;
        let cells: Vec<String> = document.select(&cell_selector).map(element_text).collect();
        if cells.len() < GROUND + 2 {
            debug!("Fight {} has {} stat cells, missing ones read as zero", fight_id, cells.len());
        }

        let corner = |offset: usize, (id, name): (String, String)| {
            let cell = |index: usize| cells.get(index + offset).map(String::as_str).unwrap_or("");
            CornerStats {
                fighter_id: id,
                fighter_name: name,
                kd: parse_count(cell(KD)),
                sig_str: parse_attempts(cell(SIG_STR)),
                total_str: parse_attempts(cell(TOTAL_STR)),
                td: parse_attempts(cell(TD)),
                sub_att: parse_count(cell(SUB_ATT)),
                rev: parse_count(cell(REV)),
                ctrl_sec: parse_clock(cell(CTRL)),
                head: parse_attempts(cell(HEAD)),
                body: parse_attempts(cell(BODY)),
                leg: parse_attempts(cell(LEG)),
                distance: parse_attempts(cell(DISTANCE)),
                clinch: parse_attempts(cell(CLINCH)),
                ground: parse_attempts(cell(GROUND)),
            }
        };

        Ok(FightRecord {
            fight_id: fight_id.to_string(),
            event_id: header.event_id,
            event_name: header.event_name,
            division: header.division,
            title_fight: header.title_fight,
            method: FinishMethod::parse(&method_detail),
            method_detail,
            finish_round,
            total_rounds,
            match_time_sec: elapsed_seconds(finish_round, clock, &round_format),
            referee,
            red: corner(0, header.red),
            blue: corner(1, header.blue),
        })
    }

    /// Parse a scheduled fight (no stats yet).
    pub fn parse_upcoming(html: &str, fight_id: &str) -> Result<UpcomingFight> {
        let document = Html::parse_document(html);
        let header = Self::parse_header(&document)?;

        Ok(UpcomingFight {
            fight_id: fight_id.to_string(),
            event_id: header.event_id,
            event_name: header.event_name,
            red_id: header.red.0,
            red_name: header.red.1,
            blue_id: header.blue.0,
            blue_name: header.blue.1,
            division: header.division,
            title_fight: header.title_fight,
        })
    }

    fn parse_header(document: &Html) -> Result<FightHeader> {
        let event_selector = selector("a.b-link")?;
        let person_selector = selector("a.b-fight-details__person-link")?;
        let title_selector = selector("i.b-fight-details__fight-title")?;

        let mut header = FightHeader::default();

        if let Some(event) = document.select(&event_selector).next() {
            header.event_name = element_text(event);
            header.event_id = event
                .value()
                .attr("href")
                .and_then(extract_id)
                .unwrap_or_default();
        }

        let people: Vec<(String, String)> = document
            .select(&person_selector)
            .take(2)
            .map(|a| {
                let id = a.value().attr("href").and_then(extract_id).unwrap_or_default();
                (id, element_text(a))
            })
            .collect();
        let [red, blue]: [(String, String); 2] = match people.try_into() {
            Ok(pair) => pair,
            Err(found) => bail!("expected two fighters, found {}", found.len()),
        };
        if red.0.is_empty() || blue.0.is_empty() {
            bail!("fighter link without id");
        }
        header.red = red;
        header.blue = blue;

        if let Some(title) = document.select(&title_selector).next() {
            let (division, title_fight) = parse_division(&element_text(title));
            header.division = division;
            header.title_fight = title_fight;
        }

        Ok(header)
    }
}

/// "UFC Heavyweight Title Bout" → ("heavyweight", true)
fn parse_division(text: &str) -> (String, bool) {
    let lower = text.to_lowercase();
    let title_fight = lower.contains("title");
    let division = lower
        .replace("ufc", "")
        .replace("title", "")
        .replace("bout", "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    (division, title_fight)
}

/// "3 Rnd (5-5-5)" → Some(3); "No Time Limit" → None
fn parse_total_rounds(format: &str) -> Option<u32> {
    if format.eq_ignore_ascii_case("no time limit") {
        return None;
    }
    format
        .chars()
        .next()
        .and_then(|c| c.to_digit(10))
}

/// Total bout time: every completed round before the finishing one plus the
/// clock in the finishing round. Round lengths come from the parenthesised
/// minutes in the time format when present.
fn elapsed_seconds(finish_round: u32, clock: u32, format: &str) -> i64 {
    let durations: Vec<i64> = format
        .split_once('(')
        .and_then(|(_, rest)| rest.split_once(')'))
        .map(|(inner, _)| {
            inner
                .split('-')
                .filter_map(|m| m.trim().parse::<i64>().ok()?.checked_mul(60))
                .collect()
        })
        .unwrap_or_default();

    let completed_rounds = finish_round.saturating_sub(1) as usize;
    let listed: i64 = durations
        .iter()
        .take(completed_rounds)
        .fold(0i64, |acc, secs| acc.saturating_add(*secs));
    let unlisted = completed_rounds.saturating_sub(durations.len()) as i64;

    listed
        .saturating_add(unlisted.saturating_mul(DEFAULT_ROUND_SECS))
        .saturating_add(clock as i64)
}

/// Completed fight page → one fight record
pub struct FightDecoder;

impl PageDecoder for FightDecoder {
    type Record = FightRecord;

    fn decode(&self, html: &str, entity: &EntityRef) -> Result<Decoded<FightRecord>, PipelineError> {
        FightParser::parse(html, &entity.id)
            .map(Decoded::one)
            .map_err(|e| decode_error(entity, e))
    }
}

/// Scheduled fight page → one upcoming fight
pub struct UpcomingFightDecoder;

impl PageDecoder for UpcomingFightDecoder {
    type Record = UpcomingFight;

    fn decode(
        &self,
        html: &str,
        entity: &EntityRef,
    ) -> Result<Decoded<UpcomingFight>, PipelineError> {
        FightParser::parse_upcoming(html, &entity.id)
            .map(Decoded::one)
            .map_err(|e| decode_error(entity, e))
    }
}
