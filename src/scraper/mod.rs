//! Web scraper module for ufcstats.com
//!
//! Provides the HTTP fetcher, page decoders, delta detection and the
//! concurrent fetch executor.

pub mod client;
pub mod delta;
pub mod executor;
pub mod parsers;

pub use client::{Fetcher, HttpFetcher};
pub use delta::{compute_delta, DateGate};
pub use executor::{fetch_all, FetchFailure, FetchOptions, FetchOutcome};

/// Base URL for ufcstats.com
pub const BASE_URL: &str = "http://ufcstats.com";

/// Build completed events list URL (all pages)
pub fn completed_events_url() -> String {
    format!("{}/statistics/events/completed?page=all", BASE_URL)
}

/// Build upcoming events list URL
pub fn upcoming_events_url() -> String {
    format!("{}/statistics/events/upcoming", BASE_URL)
}

/// Build fighter list URL (all fighters)
pub fn fighters_list_url() -> String {
    format!("{}/statistics/fighters?sort=rank-desc&page=all", BASE_URL)
}

/// Build event detail URL
pub fn event_url(event_id: &str) -> String {
    format!("{}/event-details/{}", BASE_URL, event_id)
}

/// Build fight detail URL
pub fn fight_url(fight_id: &str) -> String {
    format!("{}/fight-details/{}", BASE_URL, fight_id)
}

/// Build fighter profile URL
pub fn fighter_url(fighter_id: &str) -> String {
    format!("{}/fighter-details/{}", BASE_URL, fighter_id)
}
