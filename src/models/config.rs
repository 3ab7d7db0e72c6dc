//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Where the previous run's state is kept
    #[serde(default)]
    pub state: StateConfig,

    /// HTML extraction rules shared by all pages
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Email delivery settings (credentials come from the environment)
    #[serde(default)]
    pub email: EmailConfig,

    /// Pages to watch, in report order
    #[serde(default = "defaults::pages")]
    pub pages: Vec<TrackedPage>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("cannot read {}: {}", path.display(), e)))?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.state.path.as_os_str().is_empty() {
            return Err(AppError::validation("state.path is empty"));
        }
        if self.email.smtp_host.trim().is_empty() {
            return Err(AppError::validation("email.smtp_host is empty"));
        }
        if self.email.smtp_port == 0 {
            return Err(AppError::validation("email.smtp_port must be > 0"));
        }
        if self.pages.is_empty() {
            return Err(AppError::validation("No pages defined"));
        }

        let mut names = HashSet::new();
        for page in &self.pages {
            if page.name.trim().is_empty() {
                return Err(AppError::validation(format!(
                    "Page with url {} has an empty name",
                    page.url
                )));
            }
            if !names.insert(page.name.as_str()) {
                return Err(AppError::validation(format!(
                    "Duplicate page name: {}",
                    page.name
                )));
            }
            url::Url::parse(&page.url).map_err(|e| {
                AppError::validation(format!("Page {} has invalid url: {}", page.name, e))
            })?;
        }
        Ok(())
    }

    /// Look up a tracked page by name.
    pub fn page(&self, name: &str) -> Option<&TrackedPage> {
        self.pages.iter().find(|p| p.name == name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            state: StateConfig::default(),
            extraction: ExtractionConfig::default(),
            email: EmailConfig::default(),
            pages: defaults::pages(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// State file location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default = "defaults::state_path")]
    pub path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: defaults::state_path(),
        }
    }
}

/// HTML extraction rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Link suffixes treated as downloadable documents on attachment pages
    #[serde(default = "defaults::document_extensions")]
    pub document_extensions: Vec<String>,

    /// Path prefix a listing link must have to count as a publication
    #[serde(default = "defaults::publication_prefix")]
    pub publication_prefix: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            document_extensions: defaults::document_extensions(),
            publication_prefix: defaults::publication_prefix(),
        }
    }
}

/// SMTP relay and message settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "defaults::smtp_host")]
    pub smtp_host: String,

    /// Implicit-TLS port
    #[serde(default = "defaults::smtp_port")]
    pub smtp_port: u16,

    /// How many listing entries the first-run email shows per page
    #[serde(default = "defaults::preview_count")]
    pub preview_count: usize,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: defaults::smtp_host(),
            smtp_port: defaults::smtp_port(),
            preview_count: defaults::preview_count(),
        }
    }
}

/// How a tracked page's HTML is turned into items.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    /// A single publication page with attached documents
    Attachments,
    /// A search or listing page of publications
    Listing,
}

/// A page to watch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackedPage {
    /// Snapshot name used as the key in the state file
    pub name: String,

    /// Human-readable label for reports
    #[serde(default)]
    pub display_name: Option<String>,

    pub url: String,

    pub kind: PageKind,

    /// A failed fetch of this page aborts the run without saving state
    #[serde(default)]
    pub required: bool,

    /// Report title changes for URLs seen before (listing pages by default)
    #[serde(default)]
    pub detect_renames: Option<bool>,

    /// Report changes of the page's last-updated marker (attachment pages by default)
    #[serde(default)]
    pub track_marker: Option<bool>,

    /// Kind tag stored on listing items
    #[serde(default)]
    pub tag: Option<String>,
}

impl TrackedPage {
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    pub fn detects_renames(&self) -> bool {
        self.detect_renames.unwrap_or(self.kind == PageKind::Listing)
    }

    pub fn tracks_marker(&self) -> bool {
        self.track_marker.unwrap_or(self.kind == PageKind::Attachments)
    }

    /// Tag for listing items; defaults to the page name.
    pub fn item_tag(&self) -> &str {
        self.tag.as_deref().unwrap_or(&self.name)
    }
}

mod defaults {
    use std::path::PathBuf;

    use super::{PageKind, TrackedPage};

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // State defaults
    pub fn state_path() -> PathBuf {
        PathBuf::from("last_state.json")
    }

    // Extraction defaults
    pub fn document_extensions() -> Vec<String> {
        vec![".pdf".into(), ".docx".into(), ".xlsx".into(), ".csv".into()]
    }
    pub fn publication_prefix() -> String {
        "/government/publications/".into()
    }

    // Email defaults
    pub fn smtp_host() -> String {
        "smtp.gmail.com".into()
    }
    pub fn smtp_port() -> u16 {
        465
    }
    pub fn preview_count() -> usize {
        10
    }

    // Page defaults
    pub fn pages() -> Vec<TrackedPage> {
        vec![
            TrackedPage {
                name: "specific_page".into(),
                display_name: Some("Capacity Market page".into()),
                url: "https://www.gov.uk/government/publications/capacity-market-auction-parameters-letter-from-desnz-to-neso-july-2025".into(),
                kind: PageKind::Attachments,
                required: true,
                detect_renames: None,
                track_marker: None,
                tag: None,
            },
            TrackedPage {
                name: "desnz_publications".into(),
                display_name: Some("DESNZ publications".into()),
                url: "https://www.gov.uk/search/all?organisations[]=department-for-energy-security-and-net-zero&order=updated-newest&parent=department-for-energy-security-and-net-zero".into(),
                kind: PageKind::Listing,
                required: false,
                detect_renames: None,
                track_marker: None,
                tag: Some("desnz_search".into()),
            },
        ]
    }
}
