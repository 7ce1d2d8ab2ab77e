//! Lazy repository tree scanning
//!
//! [`TreeScanner::scan`] returns a pull-based iterator over the entries below
//! a root. Each call is a fresh snapshot; entries come out in segment-wise
//! lexicographic order because every directory is read sorted by file name
//! and walked depth first. Callers that want to stop early simply stop
//! pulling.
//!
//! Unreadable entries are yielded as `Err(Error::Io)` items and the walk
//! carries on with their siblings. Only a missing root is fatal.

mod symlinks;

#[cfg(test)]
mod integration_tests;

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ignore::{DirEntry, Walk, WalkBuilder};
use tracing::{debug, warn};

use crate::comparison::hash::{FileHash, FileHasher};
use crate::error::{Error, Result};
use crate::path::RelativePath;
use symlinks::SymlinkResolver;

/// Directory names treated as version-control metadata by default
pub const DEFAULT_VCS_DIRS: &[&str] = &[".git", ".hg", ".svn", ".bzr", "_darcs", "CVS"];

/// Prefix of the temporary siblings written while applying
pub(crate) const TEMP_FILE_PREFIX: &str = ".routesync-";
/// Suffix of the temporary siblings written while applying
pub(crate) const TEMP_FILE_SUFFIX: &str = ".tmp";

/// Decides which directories hold version-control metadata
///
/// Implemented by the git metadata collaborator when it knows better than
/// the built-in name list.
pub trait VcsMetadata: Send + Sync {
    /// Whether a directory with this name should be skipped entirely
    fn is_metadata_dir(&self, name: &str) -> bool;
}

/// Skips the directories named in [`DEFAULT_VCS_DIRS`]
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultVcsDirs;

impl VcsMetadata for DefaultVcsDirs {
    fn is_metadata_dir(&self, name: &str) -> bool {
        DEFAULT_VCS_DIRS.contains(&name)
    }
}

/// Kind of a scanned entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// Symlink resolving to a regular file
    Symlink,
}

/// Snapshot of one entry below a scanned root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path relative to the scanned root
    pub relative_path: RelativePath,
    /// What the entry is
    pub kind: EntryKind,
    /// Size in bytes; for symlinks, the size of the file they resolve to
    pub size: u64,
    /// SHA-256 of the content, present only when hashing was requested
    pub content_hash: Option<FileHash>,
}

impl FileEntry {
    /// Whether the entry carries file content (a file or a symlink to one)
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        matches!(self.kind, EntryKind::File | EntryKind::Symlink)
    }
}

/// Scanning behavior
#[derive(Clone)]
pub struct ScanOptions {
    /// Honour `.gitignore` and `.ignore` files found in the tree
    pub respect_ignore_files: bool,
    /// Compute [`FileEntry::content_hash`] for leaves
    pub hash_contents: bool,
    vcs: Arc<dyn VcsMetadata>,
}

impl ScanOptions {
    /// Enable or disable content hashing
    #[must_use]
    pub fn with_hashing(mut self, hash_contents: bool) -> Self {
        self.hash_contents = hash_contents;
        self
    }

    /// Enable or disable ignore-file handling
    #[must_use]
    pub fn with_ignore_files(mut self, respect: bool) -> Self {
        self.respect_ignore_files = respect;
        self
    }

    /// Replace the VCS metadata detector
    #[must_use]
    pub fn with_vcs_metadata(mut self, vcs: impl VcsMetadata + 'static) -> Self {
        self.vcs = Arc::new(vcs);
        self
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            respect_ignore_files: true,
            hash_contents: false,
            vcs: Arc::new(DefaultVcsDirs),
        }
    }
}

impl fmt::Debug for ScanOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanOptions")
            .field("respect_ignore_files", &self.respect_ignore_files)
            .field("hash_contents", &self.hash_contents)
            .finish_non_exhaustive()
    }
}

/// Non-fatal problem met while scanning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanWarning {
    /// Path the problem concerns
    pub path: PathBuf,
    /// Human-readable description
    pub message: String,
}

impl From<Error> for ScanWarning {
    fn from(err: Error) -> Self {
        let path = match &err {
            Error::Io { path, .. } | Error::RootNotFound { path } => path.clone(),
            _ => PathBuf::new(),
        };
        Self {
            path,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ScanWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A fully collected scan
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Entries in scan order
    pub entries: Vec<FileEntry>,
    /// Entries that could not be read
    pub warnings: Vec<ScanWarning>,
}

/// Lists repository trees
#[derive(Debug, Clone, Default)]
pub struct TreeScanner {
    options: ScanOptions,
}

impl TreeScanner {
    /// Create a scanner with the given options
    #[must_use]
    pub const fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    /// Options in effect
    #[must_use]
    pub const fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Start a lazy scan of `root`
    ///
    /// # Errors
    ///
    /// Returns [`Error::RootNotFound`] if `root` does not exist or is not a
    /// directory. Every other problem is reported through the iterator.
    pub fn scan(&self, root: &Path) -> Result<TreeScan> {
        match fs::metadata(root) {
            Ok(meta) if meta.is_dir() => {}
            _ => {
                return Err(Error::RootNotFound {
                    path: root.to_path_buf(),
                });
            }
        }

        let vcs = Arc::clone(&self.options.vcs);
        let respect = self.options.respect_ignore_files;

        let mut builder = WalkBuilder::new(root);
        builder
            .standard_filters(false)
            .hidden(false)
            .parents(false)
            .ignore(respect)
            .git_ignore(respect)
            .git_exclude(respect)
            .git_global(false)
            .require_git(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| !is_vcs_dir(entry, vcs.as_ref()));

        debug!(root = %root.display(), respect_ignore_files = respect, "starting scan");

        Ok(TreeScan {
            root: root.to_path_buf(),
            walk: builder.build(),
            hash_contents: self.options.hash_contents,
        })
    }

    /// Scan `root` to completion, splitting entries from warnings
    ///
    /// # Errors
    ///
    /// Returns [`Error::RootNotFound`] as [`TreeScanner::scan`] does.
    pub fn collect(&self, root: &Path) -> Result<ScanResult> {
        let mut result = ScanResult::default();
        for item in self.scan(root)? {
            match item {
                Ok(entry) => result.entries.push(entry),
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry");
                    result.warnings.push(err.into());
                }
            }
        }
        Ok(result)
    }
}

fn is_vcs_dir(entry: &DirEntry, vcs: &dyn VcsMetadata) -> bool {
    entry.depth() > 0
        && entry.file_type().is_some_and(|t| t.is_dir())
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| vcs.is_metadata_dir(name))
}

fn is_temp_file(name: &str) -> bool {
    name.starts_with(TEMP_FILE_PREFIX) && name.ends_with(TEMP_FILE_SUFFIX)
}

/// In-progress scan; see [`TreeScanner::scan`]
pub struct TreeScan {
    root: PathBuf,
    walk: Walk,
    hash_contents: bool,
}

impl fmt::Debug for TreeScan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeScan")
            .field("root", &self.root)
            .field("hash_contents", &self.hash_contents)
            .finish_non_exhaustive()
    }
}

impl TreeScan {
    /// Only the leaves of the remaining scan
    pub fn leaves(self) -> impl Iterator<Item = Result<FileEntry>> {
        self.filter(|item| item.as_ref().map_or(true, |entry| entry.is_leaf()))
    }

    fn entry_for(&self, entry: &DirEntry) -> Result<Option<FileEntry>> {
        let path = entry.path();
        let relative_path = path
            .strip_prefix(&self.root)
            .ok()
            .and_then(RelativePath::from_path)
            .ok_or_else(|| {
                Error::io(
                    path,
                    io::Error::new(io::ErrorKind::InvalidData, "path is not valid UTF-8"),
                )
            })?;

        let Some(file_type) = entry.file_type() else {
            return Ok(None);
        };

        if file_type.is_dir() {
            return Ok(Some(FileEntry {
                relative_path,
                kind: EntryKind::Directory,
                size: 0,
                content_hash: None,
            }));
        }

        if file_type.is_symlink() {
            let resolved = SymlinkResolver::resolve(path)?;
            let meta = fs::metadata(resolved.path()).map_err(|e| Error::io(path, e))?;
            if !meta.is_file() {
                debug!(path = %relative_path, "skipping symlink to a non-file");
                return Ok(None);
            }
            let content_hash = self.hash(resolved.path())?;
            return Ok(Some(FileEntry {
                relative_path,
                kind: EntryKind::Symlink,
                size: meta.len(),
                content_hash,
            }));
        }

        if !file_type.is_file() {
            debug!(path = %relative_path, "skipping special file");
            return Ok(None);
        }

        if is_temp_file(relative_path.file_name()) {
            return Ok(None);
        }

        let meta = fs::symlink_metadata(path).map_err(|e| Error::io(path, e))?;
        let content_hash = self.hash(path)?;
        Ok(Some(FileEntry {
            relative_path,
            kind: EntryKind::File,
            size: meta.len(),
            content_hash,
        }))
    }

    fn hash(&self, path: &Path) -> Result<Option<FileHash>> {
        if self.hash_contents {
            FileHasher::hash(path).map(Some)
        } else {
            Ok(None)
        }
    }
}

impl Iterator for TreeScan {
    type Item = Result<FileEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walk.next()? {
                Ok(entry) => entry,
                Err(err) => return Some(Err(walk_error(&self.root, &err))),
            };

            // the root itself
            if entry.depth() == 0 {
                continue;
            }

            match self.entry_for(&entry) {
                Ok(Some(file_entry)) => return Some(Ok(file_entry)),
                Ok(None) => {}
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

fn walk_error(root: &Path, err: &ignore::Error) -> Error {
    let path = error_path(err).unwrap_or_else(|| root.to_path_buf());
    let kind = err.io_error().map_or(io::ErrorKind::Other, io::Error::kind);
    Error::io(path, io::Error::new(kind, err.to_string()))
}

fn error_path(err: &ignore::Error) -> Option<PathBuf> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.clone()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => {
            error_path(err)
        }
        _ => None,
    }
}
