//! Configuration types and structures

use std::collections::BTreeMap;
use std::path::PathBuf;

use routesync::{DiffOptions, MappingRule, RepoId, Route, RouteId, ScanOptions};
use serde::{Deserialize, Serialize};

/// A route as written in `routesync.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    /// Route identifier, also the sync record file name
    pub id: RouteId,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Source repository id
    pub source: RepoId,

    /// Target repository id
    pub target: RepoId,

    /// Ordered mapping rules; later rules win
    #[serde(default)]
    pub rules: Vec<MappingRule>,
}

impl RouteConfig {
    /// Engine view of this route
    #[must_use]
    pub fn to_route(&self) -> Route {
        Route {
            id: self.id.clone(),
            source_repo_id: self.source.clone(),
            target_repo_id: self.target.clone(),
            rules: self.rules.clone(),
        }
    }
}

/// Optional `[settings]` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Files above this size are compared by hash only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_content_bytes: Option<u64>,

    /// Context lines around each hunk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_lines: Option<usize>,

    /// Honour `.gitignore`/`.ignore` files in source repositories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub respect_ignore_files: Option<bool>,

    /// Where sync records are kept
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
}

impl Settings {
    /// Diff options with unset values defaulted
    #[must_use]
    pub fn diff_options(&self) -> DiffOptions {
        let defaults = DiffOptions::default();
        DiffOptions {
            max_content_bytes: self.max_content_bytes.unwrap_or(defaults.max_content_bytes),
            context_lines: self.context_lines.unwrap_or(defaults.context_lines),
        }
    }

    /// Scan options for source trees
    #[must_use]
    pub fn scan_options(&self) -> ScanOptions {
        let options = ScanOptions::default();
        match self.respect_ignore_files {
            Some(respect) => options.with_ignore_files(respect),
            None => options,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Repository id to root directory
    #[serde(default)]
    pub repositories: BTreeMap<RepoId, PathBuf>,

    /// Configured routes
    #[serde(default)]
    pub routes: Vec<RouteConfig>,

    /// Engine and storage settings
    #[serde(default)]
    pub settings: Settings,
}

impl Config {
    /// Look up a route by id
    #[must_use]
    pub fn route(&self, id: &str) -> Option<&RouteConfig> {
        self.routes.iter().find(|route| route.id.as_str() == id)
    }
}
