//! Listing page parsers: completed/upcoming event lists and the fighter list.

use anyhow::Result;
use scraper::Html;
use std::collections::HashSet;

use super::{element_text, parse_site_date, selector};
use crate::types::{EntityKind, EntityRef};

/// Parser for the event list pages
pub struct EventListParser;

impl EventListParser {
    /// Extract event refs in listing order, with the listed date when shown.
    pub fn parse(html: &str, kind: EntityKind) -> Result<Vec<EntityRef>> {
        let document = Html::parse_document(html);
        let row_selector = selector("tr.b-statistics__table-row")?;
        let link_selector = selector("a.b-link.b-link_style_black")?;
        let date_selector = selector("span.b-statistics__date")?;

        let mut refs = Vec::new();
        for row in document.select(&row_selector) {
            let Some(link) = row.select(&link_selector).next() else {
                continue;
            };
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let Some(entity) = EntityRef::from_url(kind, href) else {
                continue;
            };

            let date = row
                .select(&date_selector)
                .next()
                .and_then(|span| parse_site_date(&element_text(span)));
            refs.push(entity.with_date(date));
        }

        // Older markup without table rows: plain links, no dates
        if refs.is_empty() {
            refs = document
                .select(&link_selector)
                .filter_map(|a| a.value().attr("href"))
                .filter(|href| href.contains("/event-details/"))
                .filter_map(|href| EntityRef::from_url(kind, href))
                .collect();
        }

        Ok(refs)
    }
}

/// Parser for the all-fighters list page
pub struct FighterListParser;

impl FighterListParser {
    /// Each fighter row links the profile several times (first name, last
    /// name, nickname); refs are returned once each in page order.
    pub fn parse(html: &str) -> Result<Vec<EntityRef>> {
        let document = Html::parse_document(html);
        let link_selector = selector("a.b-link.b-link_style_black")?;

        let mut seen = HashSet::new();
        let refs = document
            .select(&link_selector)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| href.contains("/fighter-details/"))
            .filter_map(|href| EntityRef::from_url(EntityKind::Fighter, href))
            .filter(|r| seen.insert(r.id.clone()))
            .collect();

        Ok(refs)
    }
}
