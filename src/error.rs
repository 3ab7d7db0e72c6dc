// src/error.rs

//! Error type shared by every stage of a monitoring run.
//!
//! Library code returns [`AppError`]; only the orchestrator decides which
//! failures abort a run and which are logged and absorbed.

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Regular expression failed to compile
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Email address could not be parsed
    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// Email message could not be built
    #[error("Email build error: {0}")]
    Email(#[from] lettre::error::Error),

    /// SMTP transport failed
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A page the run cannot proceed without was not fetched
    #[error("Fetch error for {page}: {message}")]
    Fetch { page: String, message: String },

    /// The saved state file exists but cannot be used
    #[error("State file {path}: {message}")]
    State { path: String, message: String },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an error for an unreadable state file.
    pub fn state(path: &Path, message: impl fmt::Display) -> Self {
        Self::State {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    /// Create a fetch error for a tracked page.
    pub fn fetch(page: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            page: page.into(),
            message: message.to_string(),
        }
    }
}
