//! Applies change sets to a target tree
//!
//! Each file lands atomically: content goes to a temporary sibling which is
//! then renamed over the target. The batch as a whole is best-effort: a
//! failing entry is recorded and the remaining entries are still attempted.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use tracing::{debug, info, warn};

use super::lock::ApplyToken;
use super::selection::Selection;
use super::{SyncFailure, SyncResult};
use crate::comparison::{ChangeEntry, ChangeKind, ChangeSet};
use crate::error::{Error, Result};
use crate::path::RelativePath;
use crate::scanner::{TEMP_FILE_PREFIX, TEMP_FILE_SUFFIX};

/// Performs the filesystem mutations of a change set
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncExecutor {
    dry_run: bool,
}

impl SyncExecutor {
    /// Create an executor; a dry run counts what would be applied and writes nothing
    #[must_use]
    pub const fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Apply the selected entries of `change_set` to `target_root`
    ///
    /// Entries outside `selection` and selected `Unchanged` entries count as
    /// skipped. Per-entry failures are collected in [`SyncResult::failures`];
    /// entries applied before a failure stay applied.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MappingConflict`] if the change set has
    /// unacknowledged conflicts, or [`Error::RootNotFound`] if the target
    /// root is missing. Nothing is written in either case.
    pub fn apply(
        &self,
        change_set: &ChangeSet,
        selection: &Selection,
        target_root: &Path,
        token: &ApplyToken,
    ) -> Result<SyncResult> {
        if change_set.is_blocked() {
            return Err(Error::MappingConflict {
                targets: change_set
                    .conflicts
                    .iter()
                    .map(|c| c.target_path.to_string())
                    .collect(),
            });
        }
        if !target_root.is_dir() {
            return Err(Error::RootNotFound {
                path: target_root.to_path_buf(),
            });
        }

        let mut result = SyncResult {
            dry_run: self.dry_run,
            ..SyncResult::default()
        };

        for entry in &change_set.entries {
            if !entry.needs_action() || !selection.contains(&entry.target_path) {
                result.skipped_count += 1;
                continue;
            }

            match self.apply_entry(entry, &change_set.source_root, target_root) {
                Ok(()) => {
                    debug!(target = %entry.target_path, kind = %entry.kind, dry_run = self.dry_run, "applied");
                    result.applied_count += 1;
                    result.applied.push(entry.target_path.clone());
                }
                Err(err) => {
                    warn!(target = %entry.target_path, error = %err, "apply failed");
                    result.failures.push(SyncFailure {
                        target_path: entry.target_path.clone(),
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            route = %token.route(),
            applied = result.applied_count,
            skipped = result.skipped_count,
            failed = result.failures.len(),
            dry_run = self.dry_run,
            "apply finished"
        );
        Ok(result)
    }

    fn apply_entry(&self, entry: &ChangeEntry, source_root: &Path, target_root: &Path) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }

        match entry.kind {
            ChangeKind::Added | ChangeKind::Modified => {
                let source = entry.source_path.as_ref().ok_or_else(|| {
                    Error::io(
                        entry.target_path.to_path(target_root),
                        io::Error::new(io::ErrorKind::InvalidInput, "entry has no source path"),
                    )
                })?;
                copy_atomic(
                    &source.to_path(source_root),
                    &entry.target_path.to_path(target_root),
                )
            }
            ChangeKind::Deleted => remove_and_prune(target_root, &entry.target_path),
            ChangeKind::Unchanged => Ok(()),
        }
    }
}

/// Copy `source` over `target` through a temporary sibling
fn copy_atomic(source: &Path, target: &Path) -> Result<()> {
    let parent = target.parent().ok_or_else(|| {
        Error::io(
            target,
            io::Error::new(io::ErrorKind::InvalidInput, "target has no parent directory"),
        )
    })?;
    fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

    let mut input = File::open(source).map_err(|e| Error::io(source, e))?;
    let permissions = input
        .metadata()
        .map_err(|e| Error::io(source, e))?
        .permissions();

    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_FILE_PREFIX)
        .suffix(TEMP_FILE_SUFFIX)
        .tempfile_in(parent)
        .map_err(|e| Error::io(parent, e))?;

    io::copy(&mut input, temp.as_file_mut()).map_err(|e| Error::io(temp.path(), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| Error::io(temp.path(), e))?;
    fs::set_permissions(temp.path(), permissions).map_err(|e| Error::io(temp.path(), e))?;

    // the temporary file is removed if persisting fails
    temp.persist(target).map_err(|e| Error::io(target, e.error))?;
    Ok(())
}

/// Remove a target file, then every parent directory it leaves empty
fn remove_and_prune(target_root: &Path, target: &RelativePath) -> Result<()> {
    let file = target.to_path(target_root);
    match fs::remove_file(&file) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(target = %target, "already removed");
        }
        Err(e) => return Err(Error::io(&file, e)),
    }

    let mut current = target.parent();
    while let Some(dir) = current {
        if fs::remove_dir(dir.to_path(target_root)).is_err() {
            break;
        }
        debug!(dir = %dir, "pruned empty directory");
        current = dir.parent();
    }
    Ok(())
}
