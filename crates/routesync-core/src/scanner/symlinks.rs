//! Symlink resolution with broken link handling

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Result of resolving a path (which may or may not be a symlink)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedPath {
    /// Regular file or directory (not a symlink)
    Regular(PathBuf),
    /// Symlink resolved to its canonical target
    Resolved(PathBuf),
}

impl ResolvedPath {
    /// Get a reference to the inner path
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Regular(p) | Self::Resolved(p) => p,
        }
    }
}

/// Follows symlinks to their final target
pub struct SymlinkResolver;

impl SymlinkResolver {
    /// Resolve a path, following it if it is a symlink
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if metadata cannot be read or the symlink does
    /// not lead to an existing entry. A symlink loop is reported as a
    /// broken link.
    pub fn resolve(path: &Path) -> Result<ResolvedPath> {
        let metadata = fs::symlink_metadata(path).map_err(|e| Error::io(path, e))?;

        if !metadata.is_symlink() {
            return Ok(ResolvedPath::Regular(path.to_path_buf()));
        }

        match dunce::canonicalize(path) {
            Ok(canonical) => Ok(ResolvedPath::Resolved(canonical)),
            Err(_) => {
                let target = fs::read_link(path).map_err(|e| Error::io(path, e))?;
                Err(Error::io(
                    path,
                    io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("broken symlink -> {}", target.display()),
                    ),
                ))
            }
        }
    }
}
