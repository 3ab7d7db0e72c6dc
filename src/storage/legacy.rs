//! Reader for the flat state layout written before snapshots were named.
//!
//! That layout hard-coded one publication page and one listing:
//!
//! ```text
//! {
//!   "specific_page_documents": [...],
//!   "specific_page_title": "...",
//!   "specific_page_last_updated": "...",
//!   "desnz_publications": [...],
//!   "check_time": "2025-07-10T09:00:00.123456"
//! }
//! ```

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::Result;
use crate::models::{Item, PageSnapshot, State};

/// Snapshot name the legacy page documents migrate to.
pub const PAGE_SNAPSHOT: &str = "specific_page";

/// Snapshot name the legacy listing migrates to.
pub const LISTING_SNAPSHOT: &str = "desnz_publications";

const LEGACY_KEYS: [&str; 3] = [
    "specific_page_documents",
    "specific_page_last_updated",
    "desnz_publications",
];

#[derive(Debug, Deserialize)]
struct LegacyState {
    #[serde(default)]
    specific_page_documents: Vec<Item>,
    #[serde(default)]
    specific_page_title: Option<String>,
    #[serde(default)]
    specific_page_last_updated: Option<String>,
    #[serde(default)]
    desnz_publications: Vec<Item>,
    #[serde(default)]
    check_time: Option<String>,
}

impl From<LegacyState> for State {
    fn from(legacy: LegacyState) -> Self {
        let check_time = legacy.check_time.as_deref().and_then(parse_check_time);

        let mut page = PageSnapshot::new(legacy.specific_page_documents);
        page.title = legacy.specific_page_title;
        page.last_updated = legacy.specific_page_last_updated;
        page.check_time = check_time;

        let mut listing = PageSnapshot::new(legacy.desnz_publications);
        listing.check_time = check_time;

        State {
            check_time,
            ..State::default()
        }
        .with_snapshot(PAGE_SNAPSHOT, page)
        .with_snapshot(LISTING_SNAPSHOT, listing)
    }
}

/// Parse a state document in either the current or the legacy layout.
pub fn parse_state(bytes: &[u8]) -> Result<State> {
    let value: Value = serde_json::from_slice(bytes)?;

    if is_legacy(&value) {
        log::info!("Migrating state file from the legacy flat layout");
        let legacy: LegacyState = serde_json::from_value(value)?;
        return Ok(legacy.into());
    }

    Ok(serde_json::from_value(value)?)
}

fn is_legacy(value: &Value) -> bool {
    value.get("snapshots").is_none() && LEGACY_KEYS.iter().any(|key| value.get(key).is_some())
}

/// Accepts RFC 3339 or a naive ISO timestamp (taken as UTC).
fn parse_check_time(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .or_else(|_| s.parse::<NaiveDateTime>().map(|t| t.and_utc()))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_legacy_layout() {
        let json = br#"{
            "specific_page_documents": [
                {"title": "Auction parameters letter", "url": "https://assets.publishing.service.gov.uk/a.pdf", "type": "attachment"},
                {"title": "Auction parameters letter", "url": "https://assets.publishing.service.gov.uk/a.pdf", "type": "document"}
            ],
            "specific_page_title": "Capacity Market auction parameters",
            "specific_page_last_updated": "10 July 2025",
            "desnz_publications": [
                {"title": "Energy Trends", "url": "https://www.gov.uk/government/publications/energy-trends",
                 "description": "Quarterly statistics", "date": "26 June 2025", "found_on": "desnz_search"}
            ],
            "check_time": "2025-07-10T09:15:00.123456"
        }"#;

        let state = parse_state(json).unwrap();
        let page = state.snapshot(PAGE_SNAPSHOT).unwrap();
        let listing = state.snapshot(LISTING_SNAPSHOT).unwrap();

        assert_eq!(page.len(), 1);
        assert_eq!(page.items[0].kind, "attachment");
        assert_eq!(page.marker(), "10 July 2025");
        assert_eq!(page.display_title(), "Capacity Market auction parameters");
        assert_eq!(listing.items[0].kind, "desnz_search");
        assert_eq!(listing.items[0].summary(), Some("Quarterly statistics"));
        assert_eq!(
            state.check_time.unwrap().to_rfc3339(),
            "2025-07-10T09:15:00.123456+00:00"
        );
    }

    #[test]
    fn test_parse_current_layout() {
        let state = State::default().with_snapshot(
            "listing",
            PageSnapshot::new(vec![Item::new("https://x/1", "One", "listing")]),
        );
        let bytes = serde_json::to_vec(&state).unwrap();

        assert_eq!(parse_state(&bytes).unwrap(), state);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_state(b"{not json").is_err());
        assert!(parse_state(br#"{"snapshots": 42}"#).is_err());
    }

    #[test]
    fn test_unparseable_check_time_is_dropped() {
        let json = br#"{"desnz_publications": [], "check_time": "yesterday"}"#;
        let state = parse_state(json).unwrap();
        assert!(state.check_time.is_none());
        assert!(state.snapshot(LISTING_SNAPSHOT).unwrap().is_empty());
    }
}
