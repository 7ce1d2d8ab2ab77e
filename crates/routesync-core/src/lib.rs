//! # routesync
//!
//! Core engine for rule-based repository synchronization.
//!
//! A [`Route`] pairs a source repository with a target repository and an
//! ordered list of [`MappingRule`]s. The engine turns that rule list plus the
//! two file trees into:
//!
//! - a deterministic source → target path [`Resolution`],
//! - a classified [`ChangeSet`] (added / modified / deleted / unchanged, with
//!   line hunks for modified text files),
//! - a best-effort apply step that copies and deletes files in the target
//!   tree, one atomic rename per file.
//!
//! Every call is synchronous and stateless; anything that has to survive
//! between calls (the previously synced target paths, the route apply locks)
//! is owned by the caller.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;

/// Repository-relative paths
pub mod path;

/// Routes and mapping rules
pub mod route;

/// Glob rule compilation and last-match-wins resolution
pub mod rules;

/// Lazy, ordered repository tree scanning
pub mod scanner;

/// Source tree resolution and mapping conflict detection
pub mod resolver;

/// Change classification and content diffs
pub mod comparison;

/// Applying change sets to the target tree
pub mod sync;

/// Single-pattern preview
pub mod tester;

/// Route-level entry points over a repository registry
pub mod engine;

pub use comparison::{
    ChangeEntry, ChangeKind, ChangeSet, ContentDelta, ContentDiff, DiffEngine, DiffOptions,
};
pub use engine::{RepositoryRegistry, RouteEngine};
pub use error::{Error, Result};
pub use path::RelativePath;
pub use resolver::{MappingConflict, PathResolver, Resolution, ResolvedMapping, RuleFailure};
pub use route::{MappingRule, RepoId, Route, RouteId, RuleMode};
pub use rules::{CompiledRuleSet, Explanation, RuleMatch};
pub use scanner::{EntryKind, FileEntry, ScanOptions, ScanWarning, TreeScanner, VcsMetadata};
pub use sync::{
    ApplyToken, ChangeSetReporter, RouteLocks, Selection, SyncExecutor, SyncFailure, SyncRecord,
    SyncReporter, SyncResult,
};
pub use tester::{PatternPreview, RuleTester};
