//! Applying change sets to the target tree
//!
//! [`SyncExecutor`] performs the copies and deletions. [`RouteLocks`] keeps
//! applies to one route from overlapping, [`Selection`] narrows a change set
//! to the entries the user approved, and [`SyncRecord`] carries the list of
//! synced targets from one apply to the next diff.

mod executor;
mod lock;
mod record;
mod reporting;
mod selection;


pub use executor::SyncExecutor;
pub use lock::{ApplyToken, RouteLocks};
pub use record::SyncRecord;
pub use reporting::{ChangeSetReporter, SyncReporter};
pub use selection::Selection;

use crate::path::RelativePath;

/// An entry that could not be applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    /// Target path of the entry
    pub target_path: RelativePath,
    /// Why it failed
    pub reason: String,
}

/// Outcome of one apply
#[derive(Debug, Clone, Default)]
pub struct SyncResult {
    /// Entries applied
    pub applied_count: usize,
    /// Entries not selected, or needing no action
    pub skipped_count: usize,
    /// Entries that failed, in target path order
    pub failures: Vec<SyncFailure>,
    /// Target paths applied, in target path order
    pub applied: Vec<RelativePath>,
    /// Nothing was written
    pub dry_run: bool,
}

impl SyncResult {
    /// Whether every attempted entry landed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Entries considered in total
    #[must_use]
    pub fn total(&self) -> usize {
        self.applied_count + self.skipped_count + self.failures.len()
    }
}
