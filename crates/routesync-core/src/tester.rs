//! Single-pattern preview used while editing a rule
//!
//! Read-only: the source tree is scanned and filtered by one glob, and the
//! scan stops as soon as it is known that more than the cap matched.

use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::path::RelativePath;
use crate::rules::CompiledGlob;
use crate::scanner::TreeScanner;

/// Most matches a preview returns
pub const MAX_PREVIEW_MATCHES: usize = 200;

/// Result of [`RuleTester::test_pattern`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PatternPreview {
    /// Matching source paths in scan order, at most the tester's limit
    pub matches: Vec<RelativePath>,
    /// More files matched than were returned
    pub truncated: bool,
}

/// Previews a single glob against a source tree
#[derive(Debug, Clone)]
pub struct RuleTester {
    scanner: TreeScanner,
    limit: usize,
}

impl Default for RuleTester {
    fn default() -> Self {
        Self::new(TreeScanner::default())
    }
}

impl RuleTester {
    /// Create a tester capped at [`MAX_PREVIEW_MATCHES`]
    #[must_use]
    pub const fn new(scanner: TreeScanner) -> Self {
        Self {
            scanner,
            limit: MAX_PREVIEW_MATCHES,
        }
    }

    /// Use a different cap
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// List the files under `source_root` that `pattern` matches
    ///
    /// Unreadable entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidPattern`] for a malformed glob and
    /// [`crate::Error::RootNotFound`] for a missing root.
    pub fn test_pattern(&self, pattern: &str, source_root: &Path) -> Result<PatternPreview> {
        let glob = CompiledGlob::new(pattern)?;
        let mut preview = PatternPreview::default();

        let matching = self
            .scanner
            .scan(source_root)?
            .leaves()
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.relative_path)
            .filter(|path| glob.is_match(&path.to_string()));

        // one past the cap is enough to know the preview is truncated
        for path in matching.take(self.limit.saturating_add(1)) {
            if preview.matches.len() == self.limit {
                preview.truncated = true;
                break;
            }
            preview.matches.push(path);
        }

        debug!(
            pattern,
            matches = preview.matches.len(),
            truncated = preview.truncated,
            "tested pattern"
        );
        Ok(preview)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::fs;
    use tempfile::TempDir;

    fn tree_with(count: usize, ext: &str) -> TempDir {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("src")).unwrap();
        for i in 0..count {
            fs::write(tmp.path().join(format!("src/file{i:04}.{ext}")), "x").unwrap();
        }
        tmp
    }

    #[test]
    fn test_truncated_at_200() {
        let tmp = tree_with(500, "ts");
        let preview = RuleTester::default()
            .test_pattern("src/*.ts", tmp.path())
            .unwrap();

        assert_eq!(preview.matches.len(), 200);
        assert!(preview.truncated);
        assert_eq!(preview.matches[0], "src/file0000.ts");
    }

    #[test]
    fn test_under_the_cap() {
        let tmp = tree_with(50, "ts");
        let preview = RuleTester::default()
            .test_pattern("**/*.ts", tmp.path())
            .unwrap();

        assert_eq!(preview.matches.len(), 50);
        assert!(!preview.truncated);
    }

    #[test]
    fn test_exactly_at_the_cap_is_not_truncated() {
        let tmp = tree_with(5, "md");
        let preview = RuleTester::default()
            .with_limit(5)
            .test_pattern("src/*.md", tmp.path())
            .unwrap();

        assert_eq!(preview.matches.len(), 5);
        assert!(!preview.truncated);
    }

    #[test]
    fn test_unbounded_limit() {
        let tmp = tree_with(3, "ts");
        let preview = RuleTester::default()
            .with_limit(usize::MAX)
            .test_pattern("src/*.ts", tmp.path())
            .unwrap();

        assert_eq!(preview.matches.len(), 3);
        assert!(!preview.truncated);
    }

    #[test]
    fn test_only_matching_files() {
        let tmp = tree_with(3, "rs");
        fs::write(tmp.path().join("README.md"), "x").unwrap();

        let preview = RuleTester::default()
            .test_pattern("*.md", tmp.path())
            .unwrap();
        assert_eq!(preview.matches.len(), 1);

        // directories never match, even when the glob would
        let dirs = RuleTester::default().test_pattern("src", tmp.path()).unwrap();
        assert!(dirs.matches.is_empty());
    }

    #[test]
    fn test_invalid_pattern() {
        let tmp = tree_with(1, "ts");
        let result = RuleTester::default().test_pattern("src/[bad", tmp.path());
        assert!(matches!(result, Err(Error::InvalidPattern { .. })));
    }
}
