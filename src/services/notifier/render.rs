//! Email body rendering.

use std::borrow::Cow;

use html_escape::{encode_double_quoted_attribute, encode_text};
use unicode_segmentation::UnicodeSegmentation;

use crate::models::{ChangeSet, Item, PageKind, SnapshotChanges, State, TrackedPage, UNKNOWN};

const TEXT_DESCRIPTION_LIMIT: usize = 100;
const HTML_DESCRIPTION_LIMIT: usize = 150;
const FOOTER: &str = "This is an automated message from govwatch.";

/// A rendered notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Renders change sets into plain-text and HTML email bodies.
pub struct Renderer<'a> {
    pages: &'a [TrackedPage],
    preview_count: usize,
}

impl<'a> Renderer<'a> {
    pub fn new(pages: &'a [TrackedPage], preview_count: usize) -> Self {
        Self {
            pages,
            preview_count,
        }
    }

    /// Render a notification, or `None` when there is nothing to report.
    pub fn render(&self, changes: &ChangeSet, state: &State) -> Option<EmailContent> {
        if !changes.should_notify() {
            return None;
        }
        if changes.is_first_run {
            Some(self.first_run(state))
        } else {
            Some(self.alert(changes, state))
        }
    }

    fn first_run(&self, state: &State) -> EmailContent {
        let checked = check_time(state);

        let mut text = String::from("\nMonitoring Started\n==================\n\n");
        let mut html = String::from(
            "<h2 style=\"color: #0066cc;\">Monitoring Started</h2>\n\
             <div style=\"background: #f5f5f5; padding: 15px; border-left: 4px solid #0066cc;\">\n",
        );

        for page in self.pages {
            text.push_str(&format!("{}: {}\n", page.label(), page.url));
            html.push_str(&format!(
                "<p><strong>{}:</strong> <a href=\"{}\">View page</a> ({} tracked)</p>\n",
                encode_text(page.label()),
                encode_double_quoted_attribute(&page.url),
                state.items(&page.name).len()
            ));
        }
        html.push_str("</div>\n");

        text.push_str("\nCurrently tracking:\n");
        for page in self.pages {
            text.push_str(&format!(
                "- {} items on {}\n",
                state.items(&page.name).len(),
                page.label()
            ));
        }
        text.push_str("\nYou will receive alerts for new items on every tracked page.\n");

        for page in self.pages.iter().filter(|p| p.kind == PageKind::Listing) {
            let preview: Vec<&Item> = state
                .items(&page.name)
                .iter()
                .take(self.preview_count)
                .collect();
            if preview.is_empty() {
                continue;
            }

            let heading = format!("Recent {} (first {})", page.label(), preview.len());
            text.push_str(&format!("\n{}:\n", heading));
            html.push_str(&format!("<h3>{}</h3>\n<ul>\n", encode_text(&heading)));
            for item in preview {
                text.push_str(&format!(
                    "  - {}\n    Published: {}\n",
                    item.title,
                    item.display_date()
                ));
                html.push_str(&format!(
                    "<li><strong>{}</strong><br>Published: {}<br>{}</li>\n",
                    encode_text(&item.title),
                    encode_text(item.display_date()),
                    link(&item.url)
                ));
            }
            html.push_str("</ul>\n");
        }

        text.push_str(&format!("\n---\nStarted at: {}\n{}\n", checked, FOOTER));
        html.push_str("<p>You will receive alerts for any new documents or publications.</p>\n");

        EmailContent {
            subject: "Monitoring Started - govwatch".to_string(),
            text,
            html: wrap_html(&html),
        }
    }

    fn alert(&self, changes: &ChangeSet, state: &State) -> EmailContent {
        let checked = check_time(state);

        let mut text = String::from("\nCHANGES DETECTED\n================\n");
        let mut html = String::from(
            "<h2 style=\"color: #d32f2f;\">New Publications Detected</h2>\n\
             <div style=\"background: #fff3cd; padding: 15px; border-left: 4px solid #d32f2f;\">\n",
        );

        for snapshot in changes.snapshots.iter().filter(|s| s.has_changes()) {
            let label = self.label(&snapshot.name);
            self.render_snapshot(snapshot, label, state, &mut text, &mut html);
        }
        html.push_str("</div>\n<div style=\"background: #f5f5f5; padding: 15px;\">\n");

        text.push_str(&format!("\nChecked at: {}\n\n", checked));
        for page in self.pages {
            text.push_str(&format!("View {}: {}\n", page.label(), page.url));
            html.push_str(&format!(
                "<p><strong>{}:</strong> <a href=\"{}\">View page</a></p>\n",
                encode_text(page.label()),
                encode_double_quoted_attribute(&page.url)
            ));
        }
        text.push_str(&format!("\n---\n{}\n", FOOTER));
        html.push_str(&format!(
            "<p><strong>Checked:</strong> {}</p>\n</div>\n",
            encode_text(&checked)
        ));

        let count = changes.new_item_count();
        let subject = if count > 0 {
            format!("ALERT: {} new publication(s) detected", count)
        } else {
            "ALERT: Tracked pages changed".to_string()
        };

        EmailContent {
            subject,
            text,
            html: wrap_html(&html),
        }
    }

    fn render_snapshot(
        &self,
        snapshot: &SnapshotChanges,
        label: &str,
        state: &State,
        text: &mut String,
        html: &mut String,
    ) {
        if !snapshot.new_items.is_empty() {
            let heading = format!("New on {} ({})", label, snapshot.new_items.len());
            text.push_str(&format!("\n{}:\n", heading.to_uppercase()));
            html.push_str(&format!(
                "<h3 style=\"color: #d32f2f;\">{}</h3>\n<ul>\n",
                encode_text(&heading)
            ));

            for item in &snapshot.new_items {
                text.push_str(&format!("  - {}\n", item.title));
                if let Some(date) = item.date.as_deref() {
                    text.push_str(&format!("    Published: {}\n", date));
                }
                if let Some(summary) = item.summary() {
                    text.push_str(&format!(
                        "    {}\n",
                        truncate(summary, TEXT_DESCRIPTION_LIMIT)
                    ));
                }
                text.push_str(&format!("    {}\n", item.url));

                let date = item
                    .date
                    .as_deref()
                    .map(|d| format!("<br>Published: {}", encode_text(d)))
                    .unwrap_or_default();
                let description = item
                    .summary()
                    .map(|s| {
                        format!(
                            "<br><em>{}</em>",
                            encode_text(&truncate(s, HTML_DESCRIPTION_LIMIT))
                        )
                    })
                    .unwrap_or_default();
                html.push_str(&format!(
                    "<li><strong>{}</strong>{}{}<br>{}</li>\n",
                    encode_text(&item.title),
                    date,
                    description,
                    link(&item.url)
                ));
            }
            html.push_str("</ul>\n");
        }

        if !snapshot.changed_items.is_empty() {
            let heading = format!("Renamed on {} ({})", label, snapshot.changed_items.len());
            text.push_str(&format!("\n{}:\n", heading.to_uppercase()));
            html.push_str(&format!(
                "<h3 style=\"color: #ff6f00;\">{}</h3>\n<ul>\n",
                encode_text(&heading)
            ));

            for change in &snapshot.changed_items {
                text.push_str(&format!(
                    "  - {} -> {}\n    {}\n",
                    change.old_title, change.new_title, change.url
                ));
                html.push_str(&format!(
                    "<li><s>{}</s> &rarr; <strong>{}</strong><br>{}</li>\n",
                    encode_text(&change.old_title),
                    encode_text(&change.new_title),
                    link(&change.url)
                ));
            }
            html.push_str("</ul>\n");
        }

        if snapshot.page_updated {
            let marker = state
                .snapshot(&snapshot.name)
                .map(|s| s.marker())
                .unwrap_or(UNKNOWN);
            text.push_str(&format!("\n{} was updated (last updated: {})\n", label, marker));
            html.push_str(&format!(
                "<p><strong>{}</strong> was updated (last updated: {})</p>\n",
                encode_text(label),
                encode_text(marker)
            ));
        }
    }

    fn label<'b>(&'b self, name: &'b str) -> &'b str {
        self.pages
            .iter()
            .find(|p| p.name == name)
            .map(TrackedPage::label)
            .unwrap_or(name)
    }
}

/// Cut `s` to at most `max` graphemes, marking the cut with an ellipsis.
pub fn truncate(s: &str, max: usize) -> Cow<'_, str> {
    match s.grapheme_indices(true).nth(max) {
        Some((idx, _)) => Cow::Owned(format!("{}...", &s[..idx])),
        None => Cow::Borrowed(s),
    }
}

fn check_time(state: &State) -> String {
    state
        .check_time
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

fn link(url: &str) -> String {
    format!(
        "<a href=\"{}\">{}</a>",
        encode_double_quoted_attribute(url),
        encode_text(url)
    )
}

fn wrap_html(body: &str) -> String {
    format!(
        "<html>\n<body style=\"font-family: Arial, sans-serif; line-height: 1.6; color: #333;\">\n\
         {}<hr style=\"margin-top: 30px; border: none; border-top: 1px solid #ddd;\">\n\
         <p style=\"font-size: 12px; color: #666;\">{}</p>\n</body>\n</html>\n",
        body, FOOTER
    )
}
