//! State persistence.
//!
//! The monitor keeps exactly one JSON document: the [`State`] written by the
//! most recent run. It is read once at start-up and overwritten at the end of
//! every run that got past fetching the required pages.

mod legacy;
pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::State;

// Re-export for convenience
pub use local::LocalStateStore;

/// Trait for state storage backends.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the previous run's state.
    ///
    /// Returns `None` when nothing was saved yet or the stored document cannot
    /// be read; callers treat both as a first run.
    async fn load(&self) -> Option<State>;

    /// Replace the stored state.
    async fn save(&self, state: &State) -> Result<()>;
}
