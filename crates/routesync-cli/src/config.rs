//! Configuration file discovery, parsing and validation
//!
//! The config file doubles as the repository registry: relative repository
//! paths and the state directory are resolved against the directory holding
//! the file.

mod discovery;
mod types;
mod validation;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use routesync::RepoId;

pub use discovery::{CONFIG_FILE_NAME, ConfigDiscovery};
pub use types::{Config, RouteConfig};
pub use validation::ConfigValidator;

/// Default state directory, relative to the config file's directory
const DEFAULT_STATE_DIR: &str = ".routesync/state";

/// A validated configuration and where it came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Parsed configuration
    pub config: Config,
    /// File it was read from
    pub path: PathBuf,
    /// Directory relative paths are resolved against
    pub base_dir: PathBuf,
}

impl LoadedConfig {
    /// Repository registry with every root made absolute
    #[must_use]
    pub fn registry(&self) -> BTreeMap<RepoId, PathBuf> {
        self.config
            .repositories
            .iter()
            .map(|(id, root)| (id.clone(), self.resolve(root)))
            .collect()
    }

    /// Directory sync records live in, `--state-dir` taking precedence
    #[must_use]
    pub fn state_dir(&self, cli_override: Option<&Path>) -> PathBuf {
        match (cli_override, &self.config.settings.state_dir) {
            (Some(dir), _) => dir.to_path_buf(),
            (None, Some(dir)) => self.resolve(dir),
            (None, None) => self.base_dir.join(DEFAULT_STATE_DIR),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

/// Loads the configuration in use
pub struct ConfigManager;

impl ConfigManager {
    /// Discover, parse and validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if no file is found, it cannot be read or parsed, or
    /// it fails validation.
    pub fn load(cli_config_path: Option<&Path>) -> anyhow::Result<LoadedConfig> {
        let path = ConfigDiscovery::discover(cli_config_path)?;
        Self::load_file(&path)
    }

    /// Parse and validate a specific file
    ///
    /// # Errors
    ///
    /// As [`ConfigManager::load`], minus discovery.
    pub fn load_file(path: &Path) -> anyhow::Result<LoadedConfig> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        ConfigValidator::validate(&config)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;

        let path = dunce::canonicalize(path)
            .with_context(|| format!("Failed to resolve config path: {}", path.display()))?;
        let base_dir = path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        tracing::debug!(config = %path.display(), routes = config.routes.len(), "loaded configuration");
        Ok(LoadedConfig {
            config,
            path,
            base_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &Path, text: &str) -> PathBuf {
        let path = dir.join(CONFIG_FILE_NAME);
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_relative_paths_resolved_against_config_dir() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            tmp.path(),
            "[repositories]\napp = \"repos/app\"\nabs = \"/srv/abs\"\n",
        );

        let loaded = ConfigManager::load_file(&path).unwrap();
        let base = dunce::canonicalize(tmp.path()).unwrap();
        let registry = loaded.registry();

        assert_eq!(registry[&RepoId::new("app")], base.join("repos/app"));
        assert_eq!(registry[&RepoId::new("abs")], PathBuf::from("/srv/abs"));
    }

    #[test]
    fn test_state_dir_precedence() {
        let tmp = TempDir::new().unwrap();
        let base = dunce::canonicalize(tmp.path()).unwrap();

        let default = ConfigManager::load_file(&write_config(tmp.path(), "")).unwrap();
        assert_eq!(default.state_dir(None), base.join(".routesync/state"));

        let configured = ConfigManager::load_file(&write_config(
            tmp.path(),
            "[settings]\nstate_dir = \"records\"\n",
        ))
        .unwrap();
        assert_eq!(configured.state_dir(None), base.join("records"));
        assert_eq!(
            configured.state_dir(Some(Path::new("/elsewhere"))),
            PathBuf::from("/elsewhere")
        );
    }

    #[test]
    fn test_invalid_file_is_reported_with_path() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(tmp.path(), "routes = 3\n");

        let err = ConfigManager::load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config file"));
    }

    #[test]
    fn test_validation_runs_on_load() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(
            tmp.path(),
            "[[routes]]\nid = \"r\"\nsource = \"a\"\ntarget = \"b\"\n",
        );

        let err = ConfigManager::load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("unknown repository 'a'"));
    }
}
