// src/models/mod.rs

//! Domain models for the monitor.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod change;
mod config;
mod item;

// Re-export all public types
pub use change::{ChangeSet, ItemChange, SnapshotChanges};
pub use config::{
    Config, EmailConfig, ExtractionConfig, HttpConfig, PageKind, StateConfig, TrackedPage,
};
pub use item::{Item, PageSnapshot, State, UNKNOWN, dedupe_items};
