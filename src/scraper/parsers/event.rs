//! Event detail page parser (completed and upcoming cards).

use anyhow::{bail, Result};
use chrono::NaiveDate;
use scraper::{ElementRef, Html};

use super::{decode_error, element_text, parse_site_date, selector, strip_label};
use super::{Decoded, PageDecoder};
use crate::error::PipelineError;
use crate::types::{extract_id, EntityKind, EntityRef, FightOutcome, UpcomingEvent};

/// Name, date and location block at the top of an event page
#[derive(Debug, Clone, Default, PartialEq)]
struct EventHeader {
    name: String,
    date: Option<NaiveDate>,
    location: String,
}

/// One bout row on an event card
struct CardRow<'a> {
    row: ElementRef<'a>,
    fight_url: String,
}

/// Parser for event detail pages
pub struct EventParser;

impl EventParser {
    /// Parse a completed event into one outcome per bout.
    pub fn parse(html: &str, event_id: &str) -> Result<Vec<FightOutcome>> {
        let document = Html::parse_document(html);
        let header = Self::parse_header(&document)?;
        let rows = Self::card_rows(&document)?;

        if header.name.is_empty() && rows.is_empty() {
            bail!("no event header or fight rows");
        }

        let flag_selector = selector("i.b-flag__text")?;
        let fighter_col_selector = selector("td.l-page_align_left")?;
        let link_selector = selector("a.b-link.b-link_style_black")?;

        let mut outcomes = Vec::with_capacity(rows.len());
        for CardRow { row, fight_url } in rows {
            let Some(fight_id) = extract_id(&fight_url) else {
                continue;
            };

            let flag = row
                .select(&flag_selector)
                .next()
                .map(|f| element_text(f).to_lowercase())
                .unwrap_or_default();

            // The winner is always listed first; draws and no-contests have none
            let (winner_id, winner_name) = if flag == "win" {
                row.select(&fighter_col_selector)
                    .next()
                    .and_then(|col| col.select(&link_selector).next())
                    .map(|a| {
                        (
                            a.value().attr("href").and_then(extract_id),
                            Some(element_text(a)),
                        )
                    })
                    .unwrap_or((None, None))
            } else {
                (None, None)
            };

            outcomes.push(FightOutcome {
                fight_id,
                event_id: event_id.to_string(),
                event_name: header.name.clone(),
                date: header.date,
                location: header.location.clone(),
                winner_id,
                winner_name,
            });
        }

        Ok(outcomes)
    }

    /// Parse an upcoming event and the bout pages on its card.
    pub fn parse_upcoming(html: &str, event_id: &str) -> Result<UpcomingEvent> {
        let document = Html::parse_document(html);
        let header = Self::parse_header(&document)?;
        if header.name.is_empty() {
            bail!("no event header");
        }

        let fight_refs = Self::card_rows(&document)?
            .into_iter()
            .filter_map(|r| EntityRef::from_url(EntityKind::UpcomingFight, &r.fight_url))
            .collect();

        Ok(UpcomingEvent {
            event_id: event_id.to_string(),
            name: header.name,
            date: header.date,
            location: header.location,
            fight_refs,
        })
    }

    fn parse_header(document: &Html) -> Result<EventHeader> {
        let name_selector = selector("span.b-content__title-highlight")?;
        let item_selector = selector("li.b-list__box-list-item")?;

        let mut header = EventHeader {
            name: document
                .select(&name_selector)
                .next()
                .map(element_text)
                .unwrap_or_default(),
            ..Default::default()
        };

        for item in document.select(&item_selector) {
            let text = element_text(item);
            if text.starts_with("Date:") {
                header.date = parse_site_date(strip_label(&text, "Date:"));
            } else if text.starts_with("Location:") {
                header.location = strip_label(&text, "Location:").to_string();
            }
        }

        Ok(header)
    }

    fn card_rows(document: &Html) -> Result<Vec<CardRow<'_>>> {
        let row_selector = selector("tr.b-fight-details__table-row__hover")?;

        Ok(document
            .select(&row_selector)
            .filter_map(|row| {
                let fight_url = row.value().attr("data-link")?.trim().to_string();
                Some(CardRow { row, fight_url })
            })
            .collect())
    }
}

/// Read only the date from an event page.
pub fn parse_event_date(html: &str) -> Option<NaiveDate> {
    let document = Html::parse_document(html);
    EventParser::parse_header(&document).ok()?.date
}

/// Completed event page → one outcome per bout
pub struct EventDecoder;

impl PageDecoder for EventDecoder {
    type Record = FightOutcome;

    fn decode(&self, html: &str, entity: &EntityRef) -> Result<Decoded<FightOutcome>, PipelineError> {
        EventParser::parse(html, &entity.id)
            .map(Decoded::many)
            .map_err(|e| decode_error(entity, e))
    }
}

/// Upcoming event page → event header plus bout refs
pub struct UpcomingEventDecoder;

impl PageDecoder for UpcomingEventDecoder {
    type Record = UpcomingEvent;

    fn decode(
        &self,
        html: &str,
        entity: &EntityRef,
    ) -> Result<Decoded<UpcomingEvent>, PipelineError> {
        EventParser::parse_upcoming(html, &entity.id)
            .map(Decoded::one)
            .map_err(|e| decode_error(entity, e))
    }
}
