//! Diff calculation between the previous and current run.
//!
//! Only additions, title changes, and last-updated marker changes are
//! classified. Items that disappear from a page are never reported: the
//! monitor watches for new publications, not withdrawals.

use std::collections::HashMap;

use crate::models::{
    ChangeSet, Config, Item, ItemChange, PageSnapshot, SnapshotChanges, State, TrackedPage,
    dedupe_items,
};

/// Which comparisons apply to one tracked snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotSpec {
    /// Snapshot name (key in the state file)
    pub name: String,
    /// Report title changes for URLs present in both runs
    pub detect_renames: bool,
    /// Report a change of the page's last-updated marker
    pub track_marker: bool,
}

impl SnapshotSpec {
    /// Comparisons for a snapshot that only reports additions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detect_renames: false,
            track_marker: false,
        }
    }

    pub fn with_renames(mut self) -> Self {
        self.detect_renames = true;
        self
    }

    pub fn with_marker(mut self) -> Self {
        self.track_marker = true;
        self
    }
}

impl From<&TrackedPage> for SnapshotSpec {
    fn from(page: &TrackedPage) -> Self {
        Self {
            name: page.name.clone(),
            detect_renames: page.detects_renames(),
            track_marker: page.tracks_marker(),
        }
    }
}

/// Calculator for computing change sets between states.
#[derive(Debug, Clone, Default)]
pub struct Differ {
    specs: Vec<SnapshotSpec>,
}

impl Differ {
    /// Create a differ over the given tracked snapshots, in report order.
    pub fn new(specs: Vec<SnapshotSpec>) -> Self {
        Self { specs }
    }

    /// Create a differ tracking every configured page.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.pages.iter().map(SnapshotSpec::from).collect())
    }

    pub fn specs(&self) -> &[SnapshotSpec] {
        &self.specs
    }

    /// Classify the changes from `previous` to `current`.
    ///
    /// With no previous state every current item is new and nothing else is
    /// compared. Snapshots missing from `previous` compare against an empty
    /// snapshot; snapshots missing from `current` report no changes.
    pub fn diff(&self, previous: Option<&State>, current: &State) -> ChangeSet {
        let Some(previous) = previous else {
            return ChangeSet {
                is_first_run: true,
                snapshots: self
                    .specs
                    .iter()
                    .map(|spec| SnapshotChanges {
                        name: spec.name.clone(),
                        new_items: dedupe_items(current.items(&spec.name).iter().cloned()),
                        ..SnapshotChanges::default()
                    })
                    .collect(),
            };
        };

        let snapshots = self
            .specs
            .iter()
            .map(|spec| match current.snapshot(&spec.name) {
                Some(curr) => Self::diff_snapshot(spec, previous.snapshot(&spec.name), curr),
                None => SnapshotChanges::empty(&spec.name),
            })
            .collect();

        ChangeSet {
            is_first_run: false,
            snapshots,
        }
    }

    fn diff_snapshot(
        spec: &SnapshotSpec,
        previous: Option<&PageSnapshot>,
        current: &PageSnapshot,
    ) -> SnapshotChanges {
        let prev_items = previous.map(|p| p.items.as_slice()).unwrap_or(&[]);
        let prev_map = index_by_url(prev_items);

        let mut changes = SnapshotChanges::empty(&spec.name);

        for item in dedupe_items(current.items.iter().cloned()) {
            match prev_map.get(item.url.as_str()) {
                None => changes.new_items.push(item),
                Some(prev) if spec.detect_renames && prev.title != item.title => {
                    changes.changed_items.push(ItemChange {
                        url: item.url.clone(),
                        old_title: prev.title.clone(),
                        new_title: item.title.clone(),
                    });
                }
                Some(_) => {}
            }
        }

        // A snapshot that was not tracked last run has no marker to compare.
        if spec.track_marker {
            if let Some(prev) = previous {
                changes.page_updated = prev.marker() != current.marker();
            }
        }

        changes
    }
}

/// Map items by URL; the first occurrence of a URL wins.
fn index_by_url(items: &[Item]) -> HashMap<&str, &Item> {
    let mut map = HashMap::with_capacity(items.len());
    for item in items {
        map.entry(item.url.as_str()).or_insert(item);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCS: &str = "specific_page";
    const PUBS: &str = "desnz_publications";

    fn differ() -> Differ {
        Differ::new(vec![
            SnapshotSpec::new(DOCS).with_marker(),
            SnapshotSpec::new(PUBS).with_renames(),
        ])
    }

    fn item(url: &str, title: &str) -> Item {
        Item::new(url, title, "document")
    }

    fn state(docs: Vec<Item>, pubs: Vec<Item>) -> State {
        State::default()
            .with_snapshot(DOCS, PageSnapshot::new(docs).with_last_updated("1 July 2025"))
            .with_snapshot(PUBS, PageSnapshot::new(pubs))
    }

    fn urls(items: &[Item]) -> Vec<&str> {
        let mut urls: Vec<&str> = items.iter().map(|i| i.url.as_str()).collect();
        urls.sort();
        urls
    }

    #[test]
    fn test_first_run_reports_everything() {
        let current = state(
            vec![item("/a.pdf", "A"), item("/b.pdf", "B")],
            vec![item("/pub/1", "One")],
        );

        let changes = differ().diff(None, &current);

        assert!(changes.is_first_run);
        assert_eq!(changes.new_items(DOCS), current.items(DOCS));
        assert_eq!(changes.new_items(PUBS), current.items(PUBS));
        assert_eq!(changes.changed_item_count(), 0);
        assert_eq!(changes.updated_pages().count(), 0);
    }

    #[test]
    fn test_first_run_with_missing_snapshot() {
        let current =
            State::default().with_snapshot(DOCS, PageSnapshot::new(vec![item("/a.pdf", "A")]));

        let changes = differ().diff(None, &current);

        assert!(changes.is_first_run);
        assert_eq!(changes.new_items(DOCS).len(), 1);
        assert!(changes.new_items(PUBS).is_empty());
    }

    #[test]
    fn test_same_state_has_no_changes() {
        let s = state(
            vec![item("/a.pdf", "A"), item("/b.pdf", "B")],
            vec![item("/pub/1", "One"), item("/pub/2", "Two")],
        );

        let changes = differ().diff(Some(&s), &s);

        assert!(!changes.is_first_run);
        assert!(!changes.has_changes());
        assert!(!changes.should_notify());
    }

    #[test]
    fn test_additions_ignore_order() {
        let prev = state(Vec::new(), vec![item("/pub/a", "A"), item("/pub/b", "B")]);
        let curr = state(
            Vec::new(),
            vec![item("/pub/c", "C"), item("/pub/b", "B"), item("/pub/a", "A")],
        );

        let changes = differ().diff(Some(&prev), &curr);

        assert_eq!(urls(changes.new_items(PUBS)), vec!["/pub/c"]);
    }

    #[test]
    fn test_new_items_keep_current_order() {
        let prev = state(Vec::new(), vec![item("/pub/a", "A")]);
        let curr = state(
            Vec::new(),
            vec![item("/pub/z", "Z"), item("/pub/a", "A"), item("/pub/m", "M")],
        );

        let changes = differ().diff(Some(&prev), &curr);
        let order: Vec<&str> = changes
            .new_items(PUBS)
            .iter()
            .map(|i| i.url.as_str())
            .collect();

        assert_eq!(order, vec!["/pub/z", "/pub/m"]);
    }

    #[test]
    fn test_removals_are_not_reported() {
        let prev = state(
            vec![item("/a.pdf", "A"), item("/b.pdf", "B")],
            vec![item("/pub/a", "A"), item("/pub/b", "B")],
        );
        let curr = state(vec![item("/a.pdf", "A")], vec![item("/pub/a", "A")]);

        let changes = differ().diff(Some(&prev), &curr);

        assert!(!changes.has_changes());
        assert_eq!(changes.new_item_count(), 0);
    }

    #[test]
    fn test_rename_detected_on_listing() {
        let prev = state(Vec::new(), vec![item("/pub/u", "Old")]);
        let curr = state(Vec::new(), vec![item("/pub/u", "New")]);

        let changes = differ().diff(Some(&prev), &curr);
        let pubs = changes.get(PUBS).unwrap();

        assert!(pubs.new_items.is_empty());
        assert_eq!(
            pubs.changed_items,
            vec![ItemChange {
                url: "/pub/u".into(),
                old_title: "Old".into(),
                new_title: "New".into(),
            }]
        );
    }

    #[test]
    fn test_equal_titles_produce_no_rename() {
        let prev = state(Vec::new(), vec![item("/pub/u", "Same")]);
        let curr = state(Vec::new(), vec![item("/pub/u", "Same")]);

        let changes = differ().diff(Some(&prev), &curr);

        assert!(changes.get(PUBS).unwrap().changed_items.is_empty());
    }

    #[test]
    fn test_rename_ignored_without_toggle() {
        let prev = state(vec![item("/a.pdf", "Old")], Vec::new());
        let curr = state(vec![item("/a.pdf", "New")], Vec::new());

        let changes = differ().diff(Some(&prev), &curr);

        assert!(changes.get(DOCS).unwrap().changed_items.is_empty());
        assert!(!changes.has_changes());
    }

    #[test]
    fn test_missing_title_compares_as_empty() {
        let untitled: Item = serde_json::from_str(r#"{"url": "/pub/u"}"#).unwrap();
        let prev = state(Vec::new(), vec![untitled]);
        let curr = state(Vec::new(), vec![item("/pub/u", "Now titled")]);

        let changes = differ().diff(Some(&prev), &curr);
        let change = &changes.get(PUBS).unwrap().changed_items[0];

        assert_eq!(change.old_title, "");
        assert_eq!(change.new_title, "Now titled");
    }

    #[test]
    fn test_marker_change_sets_page_updated() {
        let prev = state(vec![item("/a.pdf", "A")], Vec::new());
        let mut curr = prev.clone();
        curr.snapshots.get_mut(DOCS).unwrap().last_updated = Some("2 July 2025".into());

        let changes = differ().diff(Some(&prev), &curr);

        assert!(changes.get(DOCS).unwrap().page_updated);
        assert!(changes.should_notify());
    }

    #[test]
    fn test_marker_missing_on_both_sides_is_unchanged() {
        let prev = State::default().with_snapshot(DOCS, PageSnapshot::new(Vec::new()));
        let curr = prev.clone();

        let changes = differ().diff(Some(&prev), &curr);

        assert!(!changes.get(DOCS).unwrap().page_updated);
    }

    #[test]
    fn test_marker_ignored_without_toggle() {
        let marked = |marker: &str| PageSnapshot::new(Vec::new()).with_last_updated(marker);
        let prev = State::default().with_snapshot(PUBS, marked("x"));
        let curr = State::default().with_snapshot(PUBS, marked("y"));

        let changes = differ().diff(Some(&prev), &curr);

        assert!(!changes.get(PUBS).unwrap().page_updated);
    }

    #[test]
    fn test_newly_tracked_snapshot_compares_against_empty() {
        let prev =
            State::default().with_snapshot(PUBS, PageSnapshot::new(vec![item("/pub/a", "A")]));
        let curr = state(vec![item("/a.pdf", "A")], vec![item("/pub/a", "A")]);

        let changes = differ().diff(Some(&prev), &curr);
        let docs = changes.get(DOCS).unwrap();

        assert!(!changes.is_first_run);
        assert_eq!(urls(&docs.new_items), vec!["/a.pdf"]);
        assert!(!docs.page_updated);
    }

    #[test]
    fn test_snapshot_missing_from_current_reports_nothing() {
        let prev = state(vec![item("/a.pdf", "A")], vec![item("/pub/a", "A")]);
        let curr = State::default().with_snapshot(DOCS, prev.snapshot(DOCS).unwrap().clone());

        let changes = differ().diff(Some(&prev), &curr);

        assert_eq!(changes.snapshots.len(), 2);
        assert!(!changes.has_changes());
    }

    #[test]
    fn test_duplicate_urls_collapse_first_wins() {
        let prev = state(Vec::new(), vec![item("/pub/a", "A")]);
        let mut curr = state(Vec::new(), Vec::new());
        // Bypass the snapshot constructor to simulate a hand-edited state file.
        curr.snapshots.get_mut(PUBS).unwrap().items = vec![
            item("/pub/a", "A"),
            item("/pub/b", "First"),
            item("/pub/b", "Second"),
            item("/pub/a", "Renamed later"),
        ];

        let changes = differ().diff(Some(&prev), &curr);
        let pubs = changes.get(PUBS).unwrap();

        assert_eq!(pubs.new_items.len(), 1);
        assert_eq!(pubs.new_items[0].title, "First");
        assert!(pubs.changed_items.is_empty());
    }

    #[test]
    fn test_report_a_to_report_b_scenario() {
        let prev = state(vec![item("/a.pdf", "Report A")], Vec::new());
        let curr = state(
            vec![item("/a.pdf", "Report A"), item("/b.pdf", "Report B")],
            Vec::new(),
        );

        let changes = differ().diff(Some(&prev), &curr);
        let docs = changes.get(DOCS).unwrap();

        assert_eq!(docs.new_items, vec![item("/b.pdf", "Report B")]);
        assert!(docs.changed_items.is_empty());
    }

    #[test]
    fn test_from_config_follows_page_kinds() {
        let differ = Differ::from_config(&Config::default());
        assert_eq!(
            differ.specs(),
            &[
                SnapshotSpec::new("specific_page").with_marker(),
                SnapshotSpec::new("desnz_publications").with_renames(),
            ]
        );
    }
}
