//! Route-level entry points
//!
//! [`RouteEngine`] looks repository roots up in the caller's
//! [`RepositoryRegistry`] on every call and wires the scanner, resolver,
//! diff engine, executor and tester together. It keeps no state between
//! calls beyond its configuration.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::path::PathBuf;

use tracing::info;

use crate::comparison::{ChangeSet, DiffEngine, DiffOptions};
use crate::error::{Error, Result};
use crate::resolver::{PathResolver, Resolution};
use crate::route::{RepoId, Route};
use crate::rules::{CompiledRuleSet, Explanation};
use crate::scanner::{ScanOptions, TreeScanner};
use crate::sync::{ApplyToken, Selection, SyncExecutor, SyncRecord, SyncResult};
use crate::tester::{PatternPreview, RuleTester};

/// Resolves repository ids to filesystem roots
pub trait RepositoryRegistry {
    /// Root of the repository, `None` if the id is unknown
    fn root(&self, id: &RepoId) -> Option<PathBuf>;
}

impl<S: BuildHasher> RepositoryRegistry for HashMap<RepoId, PathBuf, S> {
    fn root(&self, id: &RepoId) -> Option<PathBuf> {
        self.get(id).cloned()
    }
}

impl RepositoryRegistry for BTreeMap<RepoId, PathBuf> {
    fn root(&self, id: &RepoId) -> Option<PathBuf> {
        self.get(id).cloned()
    }
}

/// Entry points for previewing and applying routes
#[derive(Debug, Clone)]
pub struct RouteEngine<R> {
    registry: R,
    scan_options: ScanOptions,
    diff_options: DiffOptions,
    dry_run: bool,
}

impl<R: RepositoryRegistry> RouteEngine<R> {
    /// Create an engine with default options
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            scan_options: ScanOptions::default(),
            diff_options: DiffOptions::default(),
            dry_run: false,
        }
    }

    /// Options for scanning source trees
    #[must_use]
    pub fn with_scan_options(mut self, options: ScanOptions) -> Self {
        self.scan_options = options;
        self
    }

    /// Options for content comparison
    #[must_use]
    pub fn with_diff_options(mut self, options: DiffOptions) -> Self {
        self.diff_options = options;
        self
    }

    /// Make [`RouteEngine::apply_sync`] count without writing
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The registry in use
    pub const fn registry(&self) -> &R {
        &self.registry
    }

    /// Root of a repository
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRepository`] if the registry has no entry.
    pub fn repository_root(&self, id: &RepoId) -> Result<PathBuf> {
        self.registry
            .root(id)
            .ok_or_else(|| Error::UnknownRepository { id: id.to_string() })
    }

    /// Compile a route's rules
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] for the first malformed rule.
    pub fn compile(route: &Route) -> Result<CompiledRuleSet> {
        CompiledRuleSet::compile(&route.rules)
    }

    fn resolver(&self) -> PathResolver {
        PathResolver::new(TreeScanner::new(
            self.scan_options.clone().with_hashing(false),
        ))
    }

    /// Resolve the route's source tree into target mappings
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRepository`], [`Error::InvalidPattern`] or
    /// [`Error::RootNotFound`].
    pub fn preview_mapping(&self, route: &Route) -> Result<Resolution> {
        let rules = Self::compile(route)?;
        let source_root = self.repository_root(&route.source_repo_id)?;
        self.resolver().resolve(&source_root, &rules)
    }

    /// Classify the route's mapped targets against the target tree
    ///
    /// `record` is the previous sync record of this route, if the caller
    /// keeps one; without it deletions are not detected.
    ///
    /// # Errors
    ///
    /// As [`RouteEngine::preview_mapping`], for either repository.
    pub fn preview_diff(&self, route: &Route, record: Option<&SyncRecord>) -> Result<ChangeSet> {
        let rules = Self::compile(route)?;
        let source_root = self.repository_root(&route.source_repo_id)?;
        let target_root = self.repository_root(&route.target_repo_id)?;

        let resolution = self.resolver().resolve(&source_root, &rules)?;
        let change_set = DiffEngine::new(self.diff_options).diff(
            &resolution,
            &source_root,
            &target_root,
            record,
        )?;

        info!(route = %route.id, entries = change_set.entries.len(), "previewed diff");
        Ok(change_set)
    }

    /// Apply the selected part of a change set to the route's target
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockMismatch`] if `token` was acquired for another
    /// route, [`Error::MappingConflict`] for unacknowledged conflicts, and
    /// [`Error::UnknownRepository`] or [`Error::RootNotFound`] for the
    /// target. Per-entry failures are in the returned [`SyncResult`].
    pub fn apply_sync(
        &self,
        route: &Route,
        change_set: &ChangeSet,
        selection: &Selection,
        token: &ApplyToken,
    ) -> Result<SyncResult> {
        token.check(&route.id)?;
        let target_root = self.repository_root(&route.target_repo_id)?;
        SyncExecutor::new(self.dry_run).apply(change_set, selection, &target_root, token)
    }

    /// Preview a single glob against a repository
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRepository`], [`Error::InvalidPattern`] or
    /// [`Error::RootNotFound`].
    pub fn test_glob(&self, repo: &RepoId, pattern: &str) -> Result<PatternPreview> {
        let root = self.repository_root(repo)?;
        RuleTester::new(TreeScanner::new(self.scan_options.clone().with_hashing(false)))
            .test_pattern(pattern, &root)
    }

    /// Explain how the route handles one source path
    ///
    /// The path does not need to exist.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] for malformed rules or a path
    /// outside the repository, and [`Error::PatternSubstitution`] if the
    /// winning rule cannot map it.
    #[allow(clippy::unused_self)]
    pub fn explain(&self, route: &Route, path: &str) -> Result<Explanation> {
        Self::compile(route)?.explain(path)
    }
}
