// src/services/mod.rs

//! I/O services around the diff core.
//!
//! - `fetcher`: Download tracked pages
//! - `extract`: Turn page HTML into snapshots
//! - `notifier`: Email change reports

pub mod extract;
pub mod fetcher;
pub mod notifier;

pub use extract::Extractor;
pub use fetcher::{HttpFetcher, PageFetcher};
pub use notifier::{EmailCredentials, EmailNotifier, Notifier};
