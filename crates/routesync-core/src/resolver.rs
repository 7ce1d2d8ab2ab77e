//! Source tree resolution through a compiled rule set
//!
//! Every file (or symlink to a file) under the source root is looked up in
//! the rule set. Copy matches become [`ResolvedMapping`]s, everything else
//! is dropped. Target collisions are collected as [`MappingConflict`]s: the
//! first source seen in scan order keeps the target, and the conflict is
//! reported so the caller can decide whether to go ahead.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::path::RelativePath;
use crate::route::RuleMode;
use crate::rules::CompiledRuleSet;
use crate::scanner::{ScanWarning, TreeScanner};

/// One source file and where it lands in the target tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMapping {
    /// Path relative to the source root
    pub source_path: RelativePath,
    /// Path relative to the target root
    pub target_path: RelativePath,
    /// Mode of the rule that produced the mapping
    pub mode: RuleMode,
    /// Index of that rule in the route
    pub rule_index: usize,
}

/// Two or more sources that resolve to the same target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingConflict {
    /// Contested target path
    pub target_path: RelativePath,
    /// Competing sources in scan order; the first one is used for diffing
    pub sources: Vec<RelativePath>,
}

impl MappingConflict {
    /// Source that keeps the target
    #[must_use]
    pub fn winner(&self) -> &RelativePath {
        &self.sources[0]
    }
}

/// A rule whose target template could not be filled for some paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFailure {
    /// Index of the rule in the route
    pub rule_index: usize,
    /// First source path that failed
    pub first_path: String,
    /// Why substitution failed
    pub reason: String,
    /// How many source paths were affected
    pub affected: usize,
}

/// Output of [`PathResolver::resolve`]
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Mappings in source scan order, with unique target paths
    pub mappings: Vec<ResolvedMapping>,
    /// Target collisions, ordered by target path
    pub conflicts: Vec<MappingConflict>,
    /// Rules that failed substitution, ordered by rule index
    pub rule_failures: Vec<RuleFailure>,
    /// Unreadable source entries
    pub warnings: Vec<ScanWarning>,
}

impl Resolution {
    /// Whether any target is claimed by more than one source
    #[must_use]
    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Look up the mapping for a target path
    #[must_use]
    pub fn mapping_for_target(&self, target: &RelativePath) -> Option<&ResolvedMapping> {
        self.mappings.iter().find(|m| &m.target_path == target)
    }
}

/// Resolves source trees into target mappings
#[derive(Debug, Clone, Default)]
pub struct PathResolver {
    scanner: TreeScanner,
}

impl PathResolver {
    /// Create a resolver that scans with `scanner`
    #[must_use]
    pub const fn new(scanner: TreeScanner) -> Self {
        Self { scanner }
    }

    /// Resolve every leaf under `source_root`
    ///
    /// # Errors
    ///
    /// Returns [`Error::RootNotFound`] if the source root is missing. Per-path
    /// substitution failures and unreadable entries are reported inside the
    /// [`Resolution`] instead.
    pub fn resolve(&self, source_root: &Path, rules: &CompiledRuleSet) -> Result<Resolution> {
        let mut resolution = Resolution::default();
        let mut by_target: HashMap<RelativePath, usize> = HashMap::new();
        let mut conflicts: BTreeMap<RelativePath, Vec<RelativePath>> = BTreeMap::new();
        let mut failures: BTreeMap<usize, RuleFailure> = BTreeMap::new();

        for item in self.scanner.scan(source_root)?.leaves() {
            let entry = match item {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(error = %err, "skipping unreadable source entry");
                    resolution.warnings.push(err.into());
                    continue;
                }
            };

            let matched = match rules.resolve(&entry.relative_path) {
                Ok(Some(matched)) if matched.mode == RuleMode::Copy => matched,
                Ok(_) => continue,
                Err(Error::PatternSubstitution { rule, path, reason }) => {
                    match failures.entry(rule) {
                        Entry::Occupied(mut o) => o.get_mut().affected += 1,
                        Entry::Vacant(v) => {
                            v.insert(RuleFailure {
                                rule_index: rule,
                                first_path: path,
                                reason,
                                affected: 1,
                            });
                        }
                    }
                    continue;
                }
                Err(err) => return Err(err),
            };

            if let Some(&winner) = by_target.get(&matched.target) {
                conflicts
                    .entry(matched.target)
                    .or_insert_with(|| vec![resolution.mappings[winner].source_path.clone()])
                    .push(entry.relative_path);
                continue;
            }

            debug!(source = %entry.relative_path, target = %matched.target, rule = matched.rule_index, "resolved");
            by_target.insert(matched.target.clone(), resolution.mappings.len());
            resolution.mappings.push(ResolvedMapping {
                source_path: entry.relative_path,
                target_path: matched.target,
                mode: matched.mode,
                rule_index: matched.rule_index,
            });
        }

        for (target_path, sources) in conflicts {
            warn!(target = %target_path, sources = sources.len(), "mapping conflict");
            resolution.conflicts.push(MappingConflict {
                target_path,
                sources,
            });
        }
        for failure in failures.into_values() {
            warn!(rule = failure.rule_index, affected = failure.affected, reason = %failure.reason, "rule cannot map its matches");
            resolution.rule_failures.push(failure);
        }

        info!(
            mappings = resolution.mappings.len(),
            conflicts = resolution.conflicts.len(),
            warnings = resolution.warnings.len(),
            "resolved source tree"
        );
        Ok(resolution)
    }
}
