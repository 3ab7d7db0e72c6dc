// src/models/change.rs

//! Classified differences between two states.

use serde::{Deserialize, Serialize};

use crate::models::Item;

/// A tracked item whose title changed between runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemChange {
    pub url: String,
    pub old_title: String,
    pub new_title: String,
}

/// Changes detected for one tracked snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SnapshotChanges {
    /// Tracked-page name
    pub name: String,

    /// Items whose URL was not present in the previous snapshot
    pub new_items: Vec<Item>,

    /// Items present in both snapshots whose title differs
    #[serde(default)]
    pub changed_items: Vec<ItemChange>,

    /// The page's last-updated marker changed
    #[serde(default)]
    pub page_updated: bool,
}

impl SnapshotChanges {
    /// An empty change record for the named snapshot.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn has_changes(&self) -> bool {
        !self.new_items.is_empty() || !self.changed_items.is_empty() || self.page_updated
    }
}

/// Output of the diff, consumed by the notification step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ChangeSet {
    /// No previous state existed; every current item is reported as new
    pub is_first_run: bool,

    /// Per tracked snapshot, in tracked-page order
    pub snapshots: Vec<SnapshotChanges>,
}

impl ChangeSet {
    /// Look up the changes for a named snapshot.
    pub fn get(&self, name: &str) -> Option<&SnapshotChanges> {
        self.snapshots.iter().find(|s| s.name == name)
    }

    /// New items for a named snapshot; empty if the snapshot is not tracked.
    pub fn new_items(&self, name: &str) -> &[Item] {
        self.get(name).map(|s| s.new_items.as_slice()).unwrap_or(&[])
    }

    /// Whether any snapshot has new items, renamed items, or a page update.
    pub fn has_changes(&self) -> bool {
        self.snapshots.iter().any(SnapshotChanges::has_changes)
    }

    /// Notification is due on the first run or when anything changed.
    pub fn should_notify(&self) -> bool {
        self.is_first_run || self.has_changes()
    }

    pub fn new_item_count(&self) -> usize {
        self.snapshots.iter().map(|s| s.new_items.len()).sum()
    }

    pub fn changed_item_count(&self) -> usize {
        self.snapshots.iter().map(|s| s.changed_items.len()).sum()
    }

    /// Names of snapshots whose last-updated marker changed.
    pub fn updated_pages(&self) -> impl Iterator<Item = &str> {
        self.snapshots
            .iter()
            .filter(|s| s.page_updated)
            .map(|s| s.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_change_set_does_not_notify() {
        let changes = ChangeSet {
            is_first_run: false,
            snapshots: vec![SnapshotChanges::empty("listing")],
        };
        assert!(!changes.has_changes());
        assert!(!changes.should_notify());
    }

    #[test]
    fn test_first_run_always_notifies() {
        let changes = ChangeSet {
            is_first_run: true,
            snapshots: Vec::new(),
        };
        assert!(changes.should_notify());
    }

    #[test]
    fn test_page_update_alone_counts_as_change() {
        let mut page = SnapshotChanges::empty("page");
        page.page_updated = true;
        let changes = ChangeSet {
            is_first_run: false,
            snapshots: vec![page, SnapshotChanges::empty("listing")],
        };

        assert!(changes.should_notify());
        assert_eq!(changes.new_item_count(), 0);
        assert_eq!(changes.updated_pages().collect::<Vec<_>>(), vec!["page"]);
    }
}
