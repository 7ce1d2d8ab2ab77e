//! State shared by every command

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::bail;
use routesync::{RepoId, Route, RouteEngine, RouteLocks};

use crate::config::{ConfigManager, LoadedConfig, RouteConfig};
use crate::state::StateStore;

/// Flags that apply to every command
pub struct GlobalOptions<'a> {
    /// Enable verbose output
    pub verbose: bool,
    /// Path to a specific config file
    pub config_path: Option<&'a Path>,
    /// Override for the sync record directory
    pub state_dir: Option<&'a Path>,
}

impl<'a> GlobalOptions<'a> {
    /// Create new global options
    #[must_use]
    pub const fn new(verbose: bool, config_path: Option<&'a Path>, state_dir: Option<&'a Path>) -> Self {
        Self {
            verbose,
            config_path,
            state_dir,
        }
    }
}

/// Loaded configuration plus the engine and record store built from it
pub struct Session {
    /// Configuration in use
    pub config: LoadedConfig,
    /// Engine over the configured repositories
    pub engine: RouteEngine<BTreeMap<RepoId, PathBuf>>,
    /// Sync record storage
    pub state: StateStore,
    /// Routes being applied by this process
    pub locks: RouteLocks,
}

impl Session {
    /// Load the configuration and set up the engine
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    pub fn open(options: &GlobalOptions<'_>) -> anyhow::Result<Self> {
        let config = ConfigManager::load(options.config_path)?;
        Ok(Self::from_config(config, options.state_dir))
    }

    fn from_config(config: LoadedConfig, state_dir: Option<&Path>) -> Self {
        let settings = &config.config.settings;
        let engine = RouteEngine::new(config.registry())
            .with_scan_options(settings.scan_options())
            .with_diff_options(settings.diff_options());
        let state_dir = config.state_dir(state_dir);
        tracing::debug!(state = %state_dir.display(), "using state directory");
        let state = StateStore::new(state_dir);

        Self {
            config,
            engine,
            state,
            locks: RouteLocks::new(),
        }
    }

    /// Configured route by id
    ///
    /// # Errors
    ///
    /// Returns an error naming the known routes if `id` is not one of them.
    pub fn route_config(&self, id: &str) -> anyhow::Result<&RouteConfig> {
        if let Some(route) = self.config.config.route(id) {
            return Ok(route);
        }

        let known: Vec<&str> = self.config.config.routes.iter().map(|r| r.id.as_str()).collect();
        if known.is_empty() {
            bail!("Unknown route '{id}': no routes are configured");
        }
        bail!("Unknown route '{id}' (configured: {})", known.join(", "))
    }

    /// Engine view of a configured route
    ///
    /// # Errors
    ///
    /// As [`Session::route_config`].
    pub fn route(&self, id: &str) -> anyhow::Result<Route> {
        self.route_config(id).map(RouteConfig::to_route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG_FILE_NAME;
    use std::fs;
    use tempfile::TempDir;

    fn session(text: &str) -> (TempDir, Session) {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, text).unwrap();
        let options = GlobalOptions::new(false, Some(&path), None);
        let session = Session::open(&options).unwrap();
        (tmp, session)
    }

    #[test]
    fn test_route_lookup() {
        let (_tmp, session) = session(
            "[repositories]\na = \"a\"\n\n[[routes]]\nid = \"r\"\nsource = \"a\"\ntarget = \"a\"\n",
        );

        assert_eq!(session.route("r").unwrap().id.as_str(), "r");
        let err = session.route("missing").unwrap_err();
        assert!(err.to_string().contains("configured: r"));
    }

    #[test]
    fn test_no_routes_configured() {
        let (_tmp, session) = session("");
        let err = session.route("any").unwrap_err();
        assert!(err.to_string().contains("no routes are configured"));
    }

    #[test]
    fn test_registry_is_absolute() {
        let (tmp, session) = session("[repositories]\na = \"repos/a\"\n");
        let root = session.engine.repository_root(&RepoId::new("a")).unwrap();

        assert!(root.is_absolute());
        assert_eq!(root, dunce::canonicalize(tmp.path()).unwrap().join("repos/a"));
    }
}
