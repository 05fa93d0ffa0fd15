//! Fighter profile page parser.

use anyhow::{bail, Result};
use regex::Regex;
use scraper::Html;
use std::collections::HashMap;

use super::{decode_error, element_text, parse_decimal, parse_percent, parse_site_date, selector};
use super::{Decoded, PageDecoder};
use crate::error::PipelineError;
use crate::types::{EntityRef, FighterProfile};

const CM_PER_INCH: f64 = 2.54;
const KG_PER_LB: f64 = 0.453_592_37;

/// Parser for fighter profile pages
pub struct FighterParser;

impl FighterParser {
    /// Parse fighter profile from HTML
    pub fn parse(html: &str, fighter_id: &str) -> Result<FighterProfile> {
        let document = Html::parse_document(html);

        let name_selector = selector("span.b-content__title-highlight")?;
        let name = document
            .select(&name_selector)
            .next()
            .map(element_text)
            .unwrap_or_default();
        if name.is_empty() {
            bail!("no fighter name");
        }

        let mut profile = FighterProfile {
            id: fighter_id.to_string(),
            name,
            ..Default::default()
        };

        let nickname_selector = selector("p.b-content__Nickname")?;
        profile.nickname = document
            .select(&nickname_selector)
            .next()
            .map(element_text)
            .filter(|n| !n.is_empty());

        let record_selector = selector("span.b-content__title-record")?;
        if let Some(record) = document.select(&record_selector).next() {
            let (wins, losses, draws) = Self::parse_record(&element_text(record));
            profile.wins = wins;
            profile.losses = losses;
            profile.draws = draws;
        }

        let fields = Self::parse_fields(&document)?;
        let field = |label: &str| fields.get(label).map(String::as_str).unwrap_or("");

        profile.height_cm = Self::parse_height(field("height"));
        profile.weight_kg = Self::parse_weight(field("weight"));
        profile.reach_cm = Self::parse_reach(field("reach"));
        profile.stance = Some(field("stance"))
            .filter(|s| !s.is_empty() && *s != "--")
            .map(str::to_string);
        profile.dob = match field("dob") {
            "" | "--" => None,
            raw => Some(
                parse_site_date(raw)
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| raw.to_string()),
            ),
        };

        profile.splm = parse_decimal(field("slpm"));
        profile.str_acc = parse_percent(field("str. acc."));
        profile.sapm = parse_decimal(field("sapm"));
        profile.str_def = parse_percent(field("str. def"));
        profile.td_avg = parse_decimal(field("td avg."));
        profile.td_acc = parse_percent(field("td acc."));
        profile.td_def = parse_percent(field("td def."));
        profile.sub_avg = parse_decimal(field("sub. avg."));

        Ok(profile)
    }

    /// Label → value for every "Label: value" list item on the page
    fn parse_fields(document: &Html) -> Result<HashMap<String, String>> {
        let item_selector = selector("li.b-list__box-list-item_type_block")?;

        Ok(document
            .select(&item_selector)
            .filter_map(|item| {
                let text = element_text(item);
                let (label, value) = text.split_once(':')?;
                Some((label.trim().to_lowercase(), value.trim().to_string()))
            })
            .collect())
    }

    /// "Record: 28-1-0 (1 NC)" → (28, 1, 0)
    fn parse_record(text: &str) -> (u32, u32, u32) {
        let re = Regex::new(r"(\d+)-(\d+)-(\d+)").ok();
        let Some(caps) = re.as_ref().and_then(|re| re.captures(text)) else {
            return (0, 0, 0);
        };
        let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse().ok()).unwrap_or(0);
        (num(1), num(2), num(3))
    }

    /// `6' 4"` → 193.04
    fn parse_height(text: &str) -> Option<f64> {
        let re = Regex::new(r#"(\d+)'\s*(\d+)"#).ok()?;
        let caps = re.captures(text)?;
        let feet: f64 = caps.get(1)?.as_str().parse().ok()?;
        let inches: f64 = caps.get(2)?.as_str().parse().ok()?;
        Some(round2((feet * 12.0 + inches) * CM_PER_INCH))
    }

    /// "248 lbs." → 112.49
    fn parse_weight(text: &str) -> Option<f64> {
        let lbs: f64 = text.split_whitespace().next()?.parse().ok()?;
        Some(round2(lbs * KG_PER_LB))
    }

    /// `84"` → 213.36
    fn parse_reach(text: &str) -> Option<f64> {
        let inches: f64 = text.trim().trim_end_matches('"').trim().parse().ok()?;
        Some(round2(inches * CM_PER_INCH))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Fighter profile page → one profile
pub struct FighterDecoder;

impl PageDecoder for FighterDecoder {
    type Record = FighterProfile;

    fn decode(
        &self,
        html: &str,
        entity: &EntityRef,
    ) -> Result<Decoded<FighterProfile>, PipelineError> {
        FighterParser::parse(html, &entity.id)
            .map(Decoded::one)
            .map_err(|e| decode_error(entity, e))
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::SAMPLE_HTML;
    use super::*;
    use crate::types::EntityKind;

    #[test]
    fn test_parse_fighter_profile() {
        let profile = FighterParser::parse(SAMPLE_HTML, "07f72a2a7591b409").unwrap();

        assert_eq!(profile.id, "07f72a2a7591b409");
        assert_eq!(profile.name, "Jon Jones");
        assert_eq!(profile.nickname.as_deref(), Some("Bones"));
        assert_eq!((profile.wins, profile.losses, profile.draws), (28, 1, 0));
        assert_eq!(profile.stance.as_deref(), Some("Orthodox"));
        assert_eq!(profile.dob.as_deref(), Some("1987-07-19"));
    }

    #[test]
    fn test_metric_conversions() {
        let profile = FighterParser::parse(SAMPLE_HTML, "07f72a2a7591b409").unwrap();

        assert_eq!(profile.height_cm, Some(193.04));
        assert_eq!(profile.weight_kg, Some(112.49));
        assert_eq!(profile.reach_cm, Some(213.36));
    }

    #[test]
    fn test_career_rates() {
        let profile = FighterParser::parse(SAMPLE_HTML, "07f72a2a7591b409").unwrap();

        assert_eq!(profile.splm, 4.29);
        assert_eq!(profile.str_acc, 58.0);
        assert_eq!(profile.sapm, 2.22);
        assert_eq!(profile.str_def, 64.0);
        assert_eq!(profile.td_avg, 1.93);
        assert_eq!(profile.td_acc, 45.0);
        assert_eq!(profile.td_def, 95.0);
        assert_eq!(profile.sub_avg, 0.5);
    }

    #[test]
    fn test_missing_physicals() {
        let html = SAMPLE_HTML
            .replace("6' 4\"", "--")
            .replace("84\"", "--")
            .replace("Jul 19, 1987", "--");
        let profile = FighterParser::parse(&html, "07f72a2a7591b409").unwrap();

        assert_eq!(profile.height_cm, None);
        assert_eq!(profile.reach_cm, None);
        assert_eq!(profile.dob, None);
    }

    #[test]
    fn test_decode_page_without_name() {
        let entity = EntityRef::from_id(EntityKind::Fighter, "07f72a2a7591b409");
        assert!(FighterDecoder.decode("<html></html>", &entity).is_err());
    }
}
