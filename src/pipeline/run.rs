// src/pipeline/run.rs

//! One monitoring run: fetch, diff, notify, save.

use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{ChangeSet, Config, PageSnapshot, State, TrackedPage};
use crate::pipeline::diff::Differ;
use crate::services::{Notifier, PageFetcher};
use crate::storage::StateStore;
use crate::utils::log as report;

/// Switches for a single run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Diff and log only: no notification, no state write
    pub dry_run: bool,
}

/// Outcome of a run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub changes: ChangeSet,
    /// Items across all snapshots in the new state
    pub item_count: usize,
    pub notified: bool,
    pub saved: bool,
}

impl RunReport {
    pub fn is_first_run(&self) -> bool {
        self.changes.is_first_run
    }
}

/// Run the monitor once.
///
/// A failed fetch of a `required` page aborts the run before the state is
/// touched. Other failed pages keep their previous snapshot so they read as
/// unchanged. Notification failures are logged and never prevent the save.
pub async fn run_monitor(
    config: &Config,
    fetcher: &dyn PageFetcher,
    store: &dyn StateStore,
    notifier: &dyn Notifier,
    options: RunOptions,
) -> Result<RunReport> {
    let start_time = Utc::now();
    report::header(&format!("govwatch run at {}", start_time.format("%Y-%m-%d %H:%M:%S")));

    let mut fetched: Vec<(&TrackedPage, Option<PageSnapshot>)> = Vec::new();
    for page in &config.pages {
        log::info!("Checking {}: {}", page.label(), page.url);
        let snapshot = fetcher.fetch_page(page).await;

        if snapshot.is_none() && page.required {
            log::error!(
                "Failed to fetch required page {}; state left untouched",
                page.label()
            );
            return Err(AppError::fetch(&page.name, "required page could not be fetched"));
        }
        fetched.push((page, snapshot));
    }

    let previous = store.load().await;

    let mut current = State::new(start_time);
    for (page, snapshot) in fetched {
        match snapshot {
            Some(snapshot) => current.insert(&page.name, snapshot),
            None => carry_forward(&mut current, previous.as_ref(), page),
        }
    }

    let changes = Differ::from_config(config).diff(previous.as_ref(), &current);
    log_changes(config, &changes);

    let notified = if options.dry_run || !changes.should_notify() {
        false
    } else {
        match notifier.notify(&changes, &current).await {
            Ok(sent) => sent,
            Err(e) => {
                log::error!("Error sending notification: {}", e);
                false
            }
        }
    };

    let saved = if options.dry_run {
        log::info!("Dry run: state not saved");
        false
    } else {
        store.save(&current).await?;
        log::info!("State saved successfully");
        true
    };

    let run_report = RunReport {
        item_count: current.item_count(),
        changes,
        notified,
        saved,
    };

    report::summary(
        "Run complete",
        &[
            ("Tracked items", run_report.item_count.to_string()),
            ("New items", run_report.changes.new_item_count().to_string()),
            ("Renamed items", run_report.changes.changed_item_count().to_string()),
            ("Notification sent", run_report.notified.to_string()),
            (
                "Duration",
                format!("{}ms", (Utc::now() - start_time).num_milliseconds()),
            ),
        ],
    );

    Ok(run_report)
}

fn carry_forward(current: &mut State, previous: Option<&State>, page: &TrackedPage) {
    match previous.and_then(|p| p.snapshot(&page.name)) {
        Some(snapshot) => {
            log::warn!(
                "Keeping previous snapshot of {} ({} items)",
                page.label(),
                snapshot.len()
            );
            current.insert(&page.name, snapshot.clone());
        }
        None => log::warn!("No snapshot of {} this run", page.label()),
    }
}

fn log_changes(config: &Config, changes: &ChangeSet) {
    let label = |name: &str| {
        config
            .page(name)
            .map(|p| p.label().to_string())
            .unwrap_or_else(|| name.to_string())
    };

    if changes.is_first_run {
        log::info!("First run - establishing baseline");
        for snapshot in &changes.snapshots {
            report::sub_item(&format!(
                "Monitoring {} items on {}",
                snapshot.new_items.len(),
                label(&snapshot.name)
            ));
        }
        return;
    }

    if !changes.has_changes() {
        log::info!("No new changes detected");
        return;
    }

    for snapshot in &changes.snapshots {
        if !snapshot.new_items.is_empty() {
            log::info!(
                "ALERT: {} new item(s) on {}",
                snapshot.new_items.len(),
                label(&snapshot.name)
            );
            for item in &snapshot.new_items {
                report::sub_item(&format!("- {}", item.title));
                if let Some(date) = item.date.as_deref() {
                    report::sub_item(&format!("  Published: {}", date));
                }
            }
        }
        for change in &snapshot.changed_items {
            log::info!(
                "Renamed on {}: {} -> {}",
                label(&snapshot.name),
                change.old_title,
                change.new_title
            );
        }
        if snapshot.page_updated {
            log::info!("{} was updated", label(&snapshot.name));
        }
    }
}
