//! Which change entries an apply acts on

use std::collections::BTreeSet;

use crate::path::RelativePath;

/// Set of target paths to include in an apply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    /// Every entry of the change set
    #[default]
    All,
    /// Only the listed target paths
    Only(BTreeSet<RelativePath>),
}

impl Selection {
    /// Select the given target paths
    pub fn only(paths: impl IntoIterator<Item = RelativePath>) -> Self {
        Self::Only(paths.into_iter().collect())
    }

    /// Select nothing
    #[must_use]
    pub const fn none() -> Self {
        Self::Only(BTreeSet::new())
    }

    /// Whether a target path is selected
    #[must_use]
    pub fn contains(&self, target: &RelativePath) -> bool {
        match self {
            Self::All => true,
            Self::Only(paths) => paths.contains(target),
        }
    }

    /// Add a target path; no effect on [`Selection::All`]
    pub fn insert(&mut self, target: RelativePath) {
        if let Self::Only(paths) = self {
            paths.insert(target);
        }
    }
}

impl FromIterator<RelativePath> for Selection {
    fn from_iter<I: IntoIterator<Item = RelativePath>>(iter: I) -> Self {
        Self::only(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> RelativePath {
        RelativePath::parse(raw).unwrap()
    }

    #[test]
    fn test_all_contains_everything() {
        assert!(Selection::All.contains(&path("any/path.txt")));
    }

    #[test]
    fn test_only_contains_listed() {
        let mut selection: Selection = [path("a.ts"), path("dir/b.ts")].into_iter().collect();
        assert!(selection.contains(&path("a.ts")));
        assert!(selection.contains(&path("dir/b.ts")));
        assert!(!selection.contains(&path("c.ts")));

        selection.insert(path("c.ts"));
        assert!(selection.contains(&path("c.ts")));
        assert!(!Selection::none().contains(&path("a.ts")));
    }
}
