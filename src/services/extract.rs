// src/services/extract.rs

//! HTML extraction for tracked pages.
//!
//! Selectors follow the GOV.UK design-system markup: attachment sections and
//! `govuk-link` downloads on publication pages, `gem-c-document-list` entries
//! on search pages.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{ExtractionConfig, Item, PageKind, PageSnapshot, TrackedPage, UNKNOWN};
use crate::utils::{normalize_whitespace, resolve_url};

const ATTACHMENT_SECTION: &str = "section.attachment";
const ANY_LINK: &str = "a[href]";
const GOVUK_LINK: &str = "a.govuk-link";
const PAGE_HEADING: &str = "h1";
const TIME: &str = "time";

const LIST_ITEM: &str = "li.gem-c-document-list__item";
const LIST_TITLE: &str = "a.gem-c-document-list__item-title";
const LIST_DESCRIPTION: &str = "p.gem-c-document-list__item-description";

/// Item kind for links inside attachment sections.
pub const KIND_ATTACHMENT: &str = "attachment";
/// Item kind for standalone download links.
pub const KIND_DOCUMENT: &str = "document";

/// Turns fetched HTML into snapshots according to a page's kind.
#[derive(Debug, Clone)]
pub struct Extractor {
    publication_prefix: String,
    document_pattern: Option<Regex>,
}

impl Extractor {
    /// Create an extractor from the configured rules.
    pub fn new(rules: &ExtractionConfig) -> Result<Self> {
        let alternatives: Vec<String> = rules
            .document_extensions
            .iter()
            .map(|ext| regex::escape(ext))
            .collect();
        let document_pattern = if alternatives.is_empty() {
            None
        } else {
            let pattern = format!(r"(?i)(?:{})(?:[?#].*)?$", alternatives.join("|"));
            Some(Regex::new(&pattern)?)
        };

        Ok(Self {
            publication_prefix: rules.publication_prefix.clone(),
            document_pattern,
        })
    }

    /// Whether a link points at a downloadable document by its extension.
    pub fn is_document(&self, href: &str) -> bool {
        self.document_pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(href))
    }

    /// Extract a snapshot from the HTML of a tracked page.
    pub fn extract(&self, page: &TrackedPage, html: &str) -> Result<PageSnapshot> {
        let base = Url::parse(&page.url)?;
        let document = Html::parse_document(html);

        let snapshot = match page.kind {
            PageKind::Attachments => self.extract_attachments(&document, &base)?,
            PageKind::Listing => self.extract_listing(&document, &base, page.item_tag())?,
        };
        Ok(snapshot.with_url(page.url.clone()))
    }

    /// Documents attached to a single publication page.
    fn extract_attachments(&self, document: &Html, base: &Url) -> Result<PageSnapshot> {
        let section_sel = parse_selector(ATTACHMENT_SECTION)?;
        let link_sel = parse_selector(ANY_LINK)?;
        let govuk_sel = parse_selector(GOVUK_LINK)?;

        let mut items = Vec::new();

        for section in document.select(&section_sel) {
            let Some(link) = section.select(&link_sel).next() else {
                continue;
            };
            if let Some(href) = link.value().attr("href") {
                let url = resolve_url(base, href);
                items.push(Item::new(url, text_of(&link), KIND_ATTACHMENT));
            }
        }

        for link in document.select(&govuk_sel) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let is_download = link.value().classes().any(|c| c == "download");
            if is_download || self.is_document(href) {
                let url = resolve_url(base, href);
                items.push(Item::new(url, text_of(&link), KIND_DOCUMENT));
            }
        }

        let title = first_text(document, PAGE_HEADING)?;
        let updated = first_text(document, TIME)?;

        Ok(PageSnapshot::new(items)
            .with_title(title.unwrap_or_else(|| UNKNOWN.to_string()))
            .with_last_updated(updated.unwrap_or_else(|| UNKNOWN.to_string())))
    }

    /// Publications listed on a search page.
    fn extract_listing(&self, document: &Html, base: &Url, tag: &str) -> Result<PageSnapshot> {
        let item_sel = parse_selector(LIST_ITEM)?;
        let title_sel = parse_selector(LIST_TITLE)?;
        let description_sel = parse_selector(LIST_DESCRIPTION)?;
        let time_sel = parse_selector(TIME)?;

        let mut items = Vec::new();

        for entry in document.select(&item_sel) {
            let Some(link) = entry.select(&title_sel).next() else {
                continue;
            };
            let Some(url) = link
                .value()
                .attr("href")
                .and_then(|href| self.publication_url(base, href))
            else {
                continue;
            };

            let description = entry
                .select(&description_sel)
                .next()
                .map(|e| text_of(&e))
                .unwrap_or_default();
            let date = entry
                .select(&time_sel)
                .next()
                .map(|e| text_of(&e))
                .unwrap_or_else(|| UNKNOWN.to_string());

            items.push(
                Item::new(url, text_of(&link), tag)
                    .with_description(description)
                    .with_date(date),
            );
        }

        if items.is_empty() {
            log::debug!("No document-list entries found; falling back to publication links");
            items = self.listing_fallback(document, base, tag)?;
        }

        Ok(PageSnapshot::new(items))
    }

    /// Every titled link to a publication, for pages without list markup.
    fn listing_fallback(&self, document: &Html, base: &Url, tag: &str) -> Result<Vec<Item>> {
        let link_sel = parse_selector(ANY_LINK)?;

        let items = document
            .select(&link_sel)
            .filter_map(|link| {
                let url = self.publication_url(base, link.value().attr("href")?)?;
                let title = text_of(&link);
                if title.is_empty() {
                    return None;
                }
                Some(
                    Item::new(url, title, tag)
                        .with_description("")
                        .with_date(UNKNOWN),
                )
            })
            .collect();
        Ok(items)
    }

    /// Resolve `href` and keep it only if it is a publication on the same host.
    fn publication_url(&self, base: &Url, href: &str) -> Option<String> {
        let url = base.join(href).ok()?;
        let same_host = url.host_str() == base.host_str();
        (same_host && url.path().starts_with(&self.publication_prefix)).then(|| url.to_string())
    }
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

fn text_of(element: &ElementRef) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

fn first_text(document: &Html, selector: &str) -> Result<Option<String>> {
    let sel = parse_selector(selector)?;
    Ok(document.select(&sel).next().map(|e| text_of(&e)))
}
