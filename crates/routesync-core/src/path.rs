//! Repository-relative paths stored as ordered segments
//!
//! Ordering is segment-wise, so `a/b` sorts before `a.txt` exactly like a
//! depth-first walk that sorts each directory by file name.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A normalized path relative to a repository root
///
/// Never empty, never absolute, never contains `.` or `..` segments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelativePath {
    segments: Vec<String>,
}

impl RelativePath {
    /// Parse a `/`-separated path, dropping empty and `.` segments
    ///
    /// Returns `None` for paths that are empty after normalization or that
    /// contain a `..` segment.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let mut segments = Vec::new();
        for segment in raw.split('/') {
            match segment {
                "" | "." => {}
                ".." => return None,
                other => segments.push(other.to_string()),
            }
        }
        Self::from_segments(segments)
    }

    /// Build from already split segments
    #[must_use]
    pub fn from_segments(segments: Vec<String>) -> Option<Self> {
        if segments.is_empty()
            || segments
                .iter()
                .any(|s| s.is_empty() || s == "." || s == ".." || s.contains('/'))
        {
            return None;
        }
        Some(Self { segments })
    }

    /// Convert a native relative path; `None` if it is not valid UTF-8 or escapes its root
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let mut segments = Vec::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => segments.push(part.to_str()?.to_string()),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Self::from_segments(segments)
    }

    /// Path segments in order
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.segments.last().map_or("", String::as_str)
    }

    /// Parent path, `None` for a top-level entry
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, parents) = self.segments.split_last()?;
        Self::from_segments(parents.to_vec())
    }

    /// Prepend `prefix` segments to this path
    #[must_use]
    pub fn prefixed(&self, prefix: &Self) -> Self {
        let mut segments = prefix.segments.clone();
        segments.extend(self.segments.iter().cloned());
        Self { segments }
    }

    /// Number of segments
    #[must_use]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Resolve against a filesystem root
    #[must_use]
    pub fn to_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        path.extend(&self.segments);
        path
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

impl PartialEq<&str> for RelativePath {
    fn eq(&self, other: &&str) -> bool {
        Self::parse(other).is_some_and(|p| p == *self)
    }
}

impl Serialize for RelativePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RelativePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid relative path '{raw}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_segments() {
        let path = RelativePath::parse("./src//lib/./mod.rs").unwrap();
        assert_eq!(path.segments(), ["src", "lib", "mod.rs"]);
        assert_eq!(path.to_string(), "src/lib/mod.rs");
        assert_eq!(path.file_name(), "mod.rs");
    }

    #[test]
    fn test_parse_rejects_escapes_and_empty() {
        assert!(RelativePath::parse("../secret").is_none());
        assert!(RelativePath::parse("a/../../b").is_none());
        assert!(RelativePath::parse("").is_none());
        assert!(RelativePath::parse("/./").is_none());
    }

    #[test]
    fn test_ordering_is_segment_wise() {
        let mut paths = vec![
            RelativePath::parse("a.txt").unwrap(),
            RelativePath::parse("a/b").unwrap(),
            RelativePath::parse("B").unwrap(),
        ];
        paths.sort();

        let rendered: Vec<String> = paths.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["B", "a/b", "a.txt"]);
    }

    #[test]
    fn test_parent_and_prefix() {
        let path = RelativePath::parse("src/a/b.ts").unwrap();
        assert_eq!(path.parent().unwrap(), "src/a");
        assert!(RelativePath::parse("top").unwrap().parent().is_none());

        let prefix = RelativePath::parse("vendor").unwrap();
        assert_eq!(path.prefixed(&prefix), "vendor/src/a/b.ts");
    }

    #[test]
    fn test_from_native_path() {
        let path = RelativePath::from_path(Path::new("dir/file.txt")).unwrap();
        assert_eq!(path, "dir/file.txt");
        assert!(RelativePath::from_path(Path::new("/abs/file.txt")).is_none());
        assert!(RelativePath::from_path(Path::new("../file.txt")).is_none());
    }

    #[test]
    fn test_serde_as_string() {
        let path = RelativePath::parse("dist/a.ts").unwrap();
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, r#""dist/a.ts""#);

        let back: RelativePath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
        assert!(serde_json::from_str::<RelativePath>(r#""../x""#).is_err());
    }
}
