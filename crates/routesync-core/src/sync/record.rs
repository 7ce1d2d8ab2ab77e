//! Targets written by previous syncs of a route
//!
//! The record is owned and persisted by the caller. The engine reads it to
//! detect deletions and computes the next one after an apply.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use super::SyncResult;
use crate::comparison::{ChangeKind, ChangeSet};
use crate::path::RelativePath;

/// Target paths a route has synced so far
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    #[serde(default)]
    targets: BTreeSet<RelativePath>,
}

impl SyncRecord {
    /// Empty record
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record holding the given targets
    pub fn from_targets(targets: impl IntoIterator<Item = RelativePath>) -> Self {
        Self {
            targets: targets.into_iter().collect(),
        }
    }

    /// Recorded targets in path order
    pub fn targets(&self) -> impl Iterator<Item = &RelativePath> {
        self.targets.iter()
    }

    /// Whether a target is recorded
    #[must_use]
    pub fn contains(&self, target: &RelativePath) -> bool {
        self.targets.contains(target)
    }

    /// Number of recorded targets
    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Whether nothing is recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Record to persist after `result` was produced by applying `change_set`
    ///
    /// Keeps the current targets, adds every unchanged target and every
    /// applied addition or modification, and drops every applied deletion.
    /// A dry run leaves the record as it was.
    #[must_use]
    pub fn updated(&self, change_set: &ChangeSet, result: &SyncResult) -> Self {
        if result.dry_run {
            return self.clone();
        }

        let applied: HashSet<&RelativePath> = result.applied.iter().collect();
        let mut targets = self.targets.clone();

        for entry in &change_set.entries {
            match entry.kind {
                ChangeKind::Unchanged => {
                    targets.insert(entry.target_path.clone());
                }
                ChangeKind::Added | ChangeKind::Modified if applied.contains(&entry.target_path) => {
                    targets.insert(entry.target_path.clone());
                }
                ChangeKind::Deleted if applied.contains(&entry.target_path) => {
                    targets.remove(&entry.target_path);
                }
                _ => {}
            }
        }

        Self { targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let record = SyncRecord::from_targets([
            RelativePath::parse("b.txt").unwrap(),
            RelativePath::parse("a/c.txt").unwrap(),
        ]);

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"targets":["a/c.txt","b.txt"]}"#);

        let back: SyncRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);

        let empty: SyncRecord = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_rejects_escaping_paths() {
        assert!(serde_json::from_str::<SyncRecord>(r#"{"targets":["../x"]}"#).is_err());
    }
}
