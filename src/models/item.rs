// src/models/item.rs

//! Item, PageSnapshot, and State data structures.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder for page metadata that could not be extracted.
pub const UNKNOWN: &str = "Unknown";

/// One tracked entity: a document attachment or a publication listing entry.
///
/// Identity is the `url`. Two items with the same URL but different titles
/// are the same item with a changed title.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    /// Absolute URL of the document or publication
    pub url: String,

    /// Link text as shown on the page
    #[serde(default)]
    pub title: String,

    /// Publication date as displayed (free text)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,

    /// Short summary shown under the listing entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Where the item came from (e.g. "attachment", "document", "desnz_search")
    #[serde(rename = "type", alias = "found_on", default)]
    pub kind: String,
}

impl Item {
    /// Create an item with only the identity fields set.
    pub fn new(url: impl Into<String>, title: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            date: None,
            description: None,
            kind: kind.into(),
        }
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Date for display, `"Unknown"` when absent.
    pub fn display_date(&self) -> &str {
        match self.date.as_deref() {
            Some(date) if !date.trim().is_empty() => date,
            _ => UNKNOWN,
        }
    }

    /// Description if present and non-empty.
    pub fn summary(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.trim().is_empty())
    }
}

/// Collapse duplicate URLs, keeping the first occurrence.
pub fn dedupe_items(items: impl IntoIterator<Item = Item>) -> Vec<Item> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.url.clone()))
        .collect()
}

/// Items and metadata extracted from one page at one point in time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PageSnapshot {
    /// Page the snapshot was taken from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Page heading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// "Last updated" marker shown on the page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,

    /// When the page was fetched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_time: Option<DateTime<Utc>>,

    /// Extracted items, unique by URL
    #[serde(default)]
    pub items: Vec<Item>,
}

impl PageSnapshot {
    /// Build a snapshot from extracted items, collapsing duplicate URLs.
    pub fn new(items: impl IntoIterator<Item = Item>) -> Self {
        Self {
            items: dedupe_items(items),
            ..Self::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_last_updated(mut self, marker: impl Into<String>) -> Self {
        self.last_updated = Some(marker.into());
        self
    }

    pub fn with_check_time(mut self, time: DateTime<Utc>) -> Self {
        self.check_time = Some(time);
        self
    }

    /// The last-updated marker, `"Unknown"` when absent.
    pub fn marker(&self) -> &str {
        self.last_updated.as_deref().unwrap_or(UNKNOWN)
    }

    /// The page heading, `"Unknown"` when absent.
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(UNKNOWN)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The persisted record of every tracked snapshot from one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct State {
    /// When the run that produced this state started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_time: Option<DateTime<Utc>>,

    /// Snapshots keyed by tracked-page name
    #[serde(default)]
    pub snapshots: BTreeMap<String, PageSnapshot>,
}

impl State {
    /// Create an empty state stamped with the given check time.
    pub fn new(check_time: DateTime<Utc>) -> Self {
        Self {
            check_time: Some(check_time),
            snapshots: BTreeMap::new(),
        }
    }

    /// Insert or replace a named snapshot.
    pub fn insert(&mut self, name: impl Into<String>, snapshot: PageSnapshot) {
        self.snapshots.insert(name.into(), snapshot);
    }

    pub fn with_snapshot(mut self, name: impl Into<String>, snapshot: PageSnapshot) -> Self {
        self.insert(name, snapshot);
        self
    }

    pub fn snapshot(&self, name: &str) -> Option<&PageSnapshot> {
        self.snapshots.get(name)
    }

    /// Items of a named snapshot; empty when the snapshot is not present.
    pub fn items(&self, name: &str) -> &[Item] {
        self.snapshots
            .get(name)
            .map(|s| s.items.as_slice())
            .unwrap_or(&[])
    }

    /// Total number of items across all snapshots.
    pub fn item_count(&self) -> usize {
        self.snapshots.values().map(PageSnapshot::len).sum()
    }
}
