//! Error types for the routesync engine

use std::path::PathBuf;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the engine
///
/// Which of these are fatal depends on where they surface: an [`Error::Io`]
/// met while scanning is a warning for that entry only, the same error met
/// while applying becomes a per-entry failure record, and
/// [`Error::RootNotFound`] aborts the whole call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A glob could not be parsed
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// What is wrong with it
        reason: String,
    },

    /// A repository root is missing or is not a directory
    #[error("repository root not found: {path}")]
    RootNotFound {
        /// Root that was looked up
        path: PathBuf,
    },

    /// A rule's target template cannot be filled in for a path
    #[error("rule #{} cannot map '{path}': {reason}", .rule + 1)]
    PatternSubstitution {
        /// Zero-based index of the rule in its route
        rule: usize,
        /// Source path being mapped
        path: String,
        /// What went wrong
        reason: String,
    },

    /// More than one source maps to the same target and nobody acknowledged it
    #[error(
        "{} target path(s) are claimed by more than one source ({}); acknowledge the conflicts before applying",
        .targets.len(),
        .targets.join(", ")
    )]
    MappingConflict {
        /// Conflicting target paths
        targets: Vec<String>,
    },

    /// Operating-system level I/O failure
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path the operation touched
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Another apply holds the lock for this route
    #[error("an apply is already running for route '{route}'")]
    RouteBusy {
        /// Route identifier
        route: String,
    },

    /// The apply token belongs to a different route
    #[error("apply token was issued for route '{held}', not '{requested}'")]
    LockMismatch {
        /// Route the token was acquired for
        held: String,
        /// Route being applied
        requested: String,
    },

    /// The repository registry has no root for this id
    #[error("unknown repository: {id}")]
    UnknownRepository {
        /// Repository identifier
        id: String,
    },
}

impl Error {
    /// Wrap an I/O error with the path it happened at
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build an [`Error::InvalidPattern`]
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error only concerns a single entry and the operation can go on
    #[must_use]
    pub const fn is_entry_local(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::PatternSubstitution { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_display_includes_path() {
        let err = Error::io(
            "/tmp/missing.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );

        let message = err.to_string();
        assert!(message.contains("/tmp/missing.txt"));
        assert!(message.contains("gone"));
        assert!(err.is_entry_local());
    }

    #[test]
    fn test_mapping_conflict_lists_targets() {
        let err = Error::MappingConflict {
            targets: vec!["dist/a.ts".to_string(), "dist/b.ts".to_string()],
        };

        let message = err.to_string();
        assert!(message.starts_with("2 target path(s)"));
        assert!(message.contains("dist/a.ts, dist/b.ts"));
        assert!(!err.is_entry_local());
    }
}
