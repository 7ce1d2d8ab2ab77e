//! Change classification between a resolved source tree and a target tree
//!
//! [`DiffEngine::diff`] turns a [`Resolution`] into a [`ChangeSet`]: every
//! mapped target is `Added`, `Modified` or `Unchanged`, and targets recorded
//! by a previous sync that are no longer produced by any mapping are
//! `Deleted`. Without a [`SyncRecord`] nothing is ever reported deleted.

pub mod hash;
pub mod text;


use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::path::RelativePath;
use crate::resolver::{MappingConflict, Resolution};
use crate::scanner::{FileEntry, ScanOptions, ScanWarning, TreeScanner};
use crate::sync::SyncRecord;
pub use hash::{FileHash, FileHasher};
pub use text::{ContentDiff, DiffLine, Hunk, LineTag};

/// Default ceiling for reading file contents into memory (1 MiB)
pub const DEFAULT_MAX_CONTENT_BYTES: u64 = 1024 * 1024;
/// Default number of context lines around each hunk
pub const DEFAULT_CONTEXT_LINES: usize = 3;
/// Number of leading bytes inspected when deciding text versus binary
pub const TEXT_SNIFF_LEN: usize = 8000;

/// Classification of one target path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChangeKind {
    /// Target does not exist yet
    Added,
    /// Target exists with different content
    Modified,
    /// Target was synced before but no mapping produces it any more
    Deleted,
    /// Target already has the source content
    Unchanged,
}

impl ChangeKind {
    /// One-letter status code used in listings
    #[must_use]
    pub const fn status_char(self) -> char {
        match self {
            Self::Added => 'A',
            Self::Modified => 'M',
            Self::Deleted => 'D',
            Self::Unchanged => '=',
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Deleted => "deleted",
            Self::Unchanged => "unchanged",
        })
    }
}

/// Size and hash of both sides of a modified file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDelta {
    /// Source size in bytes
    pub source_size: u64,
    /// Current target size in bytes
    pub target_size: u64,
    /// Source SHA-256
    pub source_hash: FileHash,
    /// Current target SHA-256
    pub target_hash: FileHash,
}

/// One classified target path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEntry {
    /// Path relative to the target root
    pub target_path: RelativePath,
    /// Classification
    pub kind: ChangeKind,
    /// Source path; absent for `Deleted`
    pub source_path: Option<RelativePath>,
    /// Line hunks, only for modified text files within the size ceiling
    pub content_diff: Option<ContentDiff>,
    /// Size and hash of both sides, only for `Modified`
    pub delta: Option<ContentDelta>,
    /// Content is binary
    pub binary: bool,
    /// Content was above the size ceiling and was not read
    pub truncated: bool,
}

impl ChangeEntry {
    fn new(target_path: RelativePath, kind: ChangeKind, source_path: Option<RelativePath>) -> Self {
        Self {
            target_path,
            kind,
            source_path,
            content_diff: None,
            delta: None,
            binary: false,
            truncated: false,
        }
    }

    /// Whether applying this entry changes the target tree
    #[must_use]
    pub fn needs_action(&self) -> bool {
        self.kind != ChangeKind::Unchanged
    }
}

/// Entry counts per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChangeCounts {
    /// Added entries
    pub added: usize,
    /// Modified entries
    pub modified: usize,
    /// Deleted entries
    pub deleted: usize,
    /// Unchanged entries
    pub unchanged: usize,
}

/// Classified differences between a resolved source tree and a target tree
#[derive(Debug, Clone)]
pub struct ChangeSet {
    /// Entries sorted by target path
    pub entries: Vec<ChangeEntry>,
    /// Source root the entries were computed against
    pub source_root: PathBuf,
    /// Target root the entries were computed against
    pub target_root: PathBuf,
    /// Mapping conflicts carried over from resolution
    pub conflicts: Vec<MappingConflict>,
    /// Unreadable entries met on either side
    pub warnings: Vec<ScanWarning>,
    conflicts_acknowledged: bool,
}

impl ChangeSet {
    /// Mark the mapping conflicts as seen so the change set may be applied
    pub fn acknowledge_conflicts(&mut self) {
        self.conflicts_acknowledged = true;
    }

    /// Whether the caller acknowledged the conflicts
    #[must_use]
    pub const fn conflicts_acknowledged(&self) -> bool {
        self.conflicts_acknowledged
    }

    /// Whether unacknowledged conflicts block applying
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        !self.conflicts.is_empty() && !self.conflicts_acknowledged
    }

    /// Find the entry for a target path
    #[must_use]
    pub fn entry(&self, target: &RelativePath) -> Option<&ChangeEntry> {
        self.entries
            .binary_search_by(|e| e.target_path.cmp(target))
            .ok()
            .map(|idx| &self.entries[idx])
    }

    /// Entries that change the target tree
    pub fn pending(&self) -> impl Iterator<Item = &ChangeEntry> {
        self.entries.iter().filter(|e| e.needs_action())
    }

    /// Count entries per kind
    #[must_use]
    pub fn counts(&self) -> ChangeCounts {
        let mut counts = ChangeCounts::default();
        for entry in &self.entries {
            match entry.kind {
                ChangeKind::Added => counts.added += 1,
                ChangeKind::Modified => counts.modified += 1,
                ChangeKind::Deleted => counts.deleted += 1,
                ChangeKind::Unchanged => counts.unchanged += 1,
            }
        }
        counts
    }

    /// Whether every entry is unchanged
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.pending().next().is_none()
    }
}

/// Tunables for content comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    /// Files larger than this are compared by hash only and flagged truncated
    pub max_content_bytes: u64,
    /// Unchanged lines around each hunk
    pub context_lines: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            max_content_bytes: DEFAULT_MAX_CONTENT_BYTES,
            context_lines: DEFAULT_CONTEXT_LINES,
        }
    }
}

/// Computes change sets
#[derive(Debug, Clone, Default)]
pub struct DiffEngine {
    options: DiffOptions,
}

impl DiffEngine {
    /// Create an engine with the given options
    #[must_use]
    pub const fn new(options: DiffOptions) -> Self {
        Self { options }
    }

    /// Classify every mapped target against the current target tree
    ///
    /// `record` is the set of targets written by the previous sync of this
    /// route; without it no entry is classified `Deleted`. Deletion
    /// detection is also skipped when the resolution is incomplete (rule
    /// failures or unreadable source entries), since a target missing from
    /// the mapping may only be missing because its source could not be
    /// resolved.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RootNotFound`] if either root is missing. Unreadable
    /// files are reported in [`ChangeSet::warnings`].
    pub fn diff(
        &self,
        resolution: &Resolution,
        source_root: &Path,
        target_root: &Path,
        record: Option<&SyncRecord>,
    ) -> Result<ChangeSet> {
        if !source_root.is_dir() {
            return Err(Error::RootNotFound {
                path: source_root.to_path_buf(),
            });
        }

        // Files ignored by the target's own ignore files still exist on disk,
        // so the target is scanned without them. Only mapped targets are
        // hashed, in `classify`.
        let target_scanner = TreeScanner::new(
            ScanOptions::default()
                .with_hashing(false)
                .with_ignore_files(false),
        );
        let scanned = target_scanner.collect(target_root)?;

        let mut warnings = resolution.warnings.clone();
        warnings.extend(scanned.warnings);

        let target_leaves: HashMap<RelativePath, FileEntry> = scanned
            .entries
            .into_iter()
            .filter(FileEntry::is_leaf)
            .map(|e| (e.relative_path.clone(), e))
            .collect();

        let mut entries = Vec::with_capacity(resolution.mappings.len());
        let mut mapped_targets = HashSet::with_capacity(resolution.mappings.len());

        for mapping in &resolution.mappings {
            mapped_targets.insert(&mapping.target_path);
            let source_file = mapping.source_path.to_path(source_root);
            let target_file = mapping.target_path.to_path(target_root);

            match self.classify(
                &mapping.source_path,
                &mapping.target_path,
                &source_file,
                &target_file,
                target_leaves.get(&mapping.target_path),
            ) {
                Ok(entry) => {
                    debug!(target = %entry.target_path, kind = %entry.kind, "classified");
                    entries.push(entry);
                }
                Err(err) => {
                    warn!(error = %err, "skipping unreadable mapping");
                    warnings.push(err.into());
                }
            }
        }

        match record {
            Some(_) if !resolution.rule_failures.is_empty() || !resolution.warnings.is_empty() => {
                warn!("resolution incomplete, deleted-file detection skipped");
            }
            Some(record) => {
                for target in record.targets() {
                    if !mapped_targets.contains(target) && target_leaves.contains_key(target) {
                        debug!(target = %target, "classified deleted");
                        entries.push(ChangeEntry::new(target.clone(), ChangeKind::Deleted, None));
                    }
                }
            }
            None => {}
        }

        entries.sort_by(|a, b| a.target_path.cmp(&b.target_path));

        let change_set = ChangeSet {
            entries,
            source_root: source_root.to_path_buf(),
            target_root: target_root.to_path_buf(),
            conflicts: resolution.conflicts.clone(),
            warnings,
            conflicts_acknowledged: false,
        };

        let counts = change_set.counts();
        info!(
            added = counts.added,
            modified = counts.modified,
            deleted = counts.deleted,
            unchanged = counts.unchanged,
            "computed change set"
        );
        Ok(change_set)
    }

    fn classify(
        &self,
        source_path: &RelativePath,
        target_path: &RelativePath,
        source_file: &Path,
        target_file: &Path,
        existing: Option<&FileEntry>,
    ) -> Result<ChangeEntry> {
        let source_size = fs::metadata(source_file)
            .map_err(|e| Error::io(source_file, e))?
            .len();
        let source_hash = FileHasher::hash(source_file)?;

        let Some(existing) = existing else {
            let mut entry = ChangeEntry::new(
                target_path.clone(),
                ChangeKind::Added,
                Some(source_path.clone()),
            );
            entry.truncated = source_size > self.options.max_content_bytes;
            return Ok(entry);
        };

        let target_hash = match existing.content_hash {
            Some(hash) => hash,
            None => FileHasher::hash(target_file)?,
        };

        if target_hash == source_hash {
            return Ok(ChangeEntry::new(
                target_path.clone(),
                ChangeKind::Unchanged,
                Some(source_path.clone()),
            ));
        }

        let mut entry = ChangeEntry::new(
            target_path.clone(),
            ChangeKind::Modified,
            Some(source_path.clone()),
        );
        entry.delta = Some(ContentDelta {
            source_size,
            target_size: existing.size,
            source_hash,
            target_hash,
        });

        if source_size > self.options.max_content_bytes
            || existing.size > self.options.max_content_bytes
        {
            entry.truncated = true;
            return Ok(entry);
        }

        let new = fs::read(source_file).map_err(|e| Error::io(source_file, e))?;
        let old = fs::read(target_file).map_err(|e| Error::io(target_file, e))?;

        if text::is_text(&new, TEXT_SNIFF_LEN) && text::is_text(&old, TEXT_SNIFF_LEN) {
            entry.content_diff = Some(ContentDiff::compute(
                &String::from_utf8_lossy(&old),
                &String::from_utf8_lossy(&new),
                self.options.context_lines,
            ));
        } else {
            entry.binary = true;
        }

        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_chars() {
        assert_eq!(ChangeKind::Added.status_char(), 'A');
        assert_eq!(ChangeKind::Modified.status_char(), 'M');
        assert_eq!(ChangeKind::Deleted.status_char(), 'D');
        assert_eq!(ChangeKind::Unchanged.status_char(), '=');
    }

    #[test]
    fn test_default_options() {
        let options = DiffOptions::default();
        assert_eq!(options.max_content_bytes, 1024 * 1024);
        assert_eq!(options.context_lines, 3);
    }

    #[test]
    fn test_acknowledging_conflicts_unblocks() {
        let mut change_set = ChangeSet {
            entries: Vec::new(),
            source_root: PathBuf::from("/src"),
            target_root: PathBuf::from("/dst"),
            conflicts: vec![MappingConflict {
                target_path: RelativePath::parse("dist/a.ts").unwrap(),
                sources: vec![
                    RelativePath::parse("a/a.ts").unwrap(),
                    RelativePath::parse("b/a.ts").unwrap(),
                ],
            }],
            warnings: Vec::new(),
            conflicts_acknowledged: false,
        };

        assert!(change_set.is_blocked());
        change_set.acknowledge_conflicts();
        assert!(!change_set.is_blocked());
        assert!(change_set.conflicts_acknowledged());
    }
}
