//! Configuration file discovery

use std::path::{Path, PathBuf};

use anyhow::bail;

/// File name searched for in the working directory and its parents
pub const CONFIG_FILE_NAME: &str = "routesync.toml";

/// Config file discovery
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Find the configuration file to use
    ///
    /// Precedence: the `--config` path, then the nearest `routesync.toml`
    /// from the working directory upwards, then the user config directory.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit path does not exist or no file is found.
    pub fn discover(cli_path: Option<&Path>) -> anyhow::Result<PathBuf> {
        if let Some(path) = cli_path {
            if !path.is_file() {
                bail!("Config file not found: {}", path.display());
            }
            return Ok(path.to_path_buf());
        }

        let cwd = std::env::current_dir().ok();
        if let Some(found) = cwd.as_deref().and_then(Self::find_upwards) {
            return Ok(found);
        }
        if let Some(found) = Self::find_global_config() {
            return Ok(found);
        }

        bail!("No {CONFIG_FILE_NAME} found in the current directory, its parents or the user config directory")
    }

    /// Nearest config file in `start` or one of its ancestors
    fn find_upwards(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file())
    }

    fn find_global_config() -> Option<PathBuf> {
        let global_config = dirs::config_dir()?.join("routesync").join(CONFIG_FILE_NAME);
        global_config.is_file().then_some(global_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let config = tmp.path().join("custom.toml");
        fs::write(&config, "").unwrap();

        assert_eq!(ConfigDiscovery::discover(Some(&config)).unwrap(), config);
    }

    #[test]
    fn test_explicit_path_missing() {
        let tmp = TempDir::new().unwrap();
        let result = ConfigDiscovery::discover(Some(&tmp.path().join("nope.toml")));

        assert!(result.unwrap_err().to_string().contains("Config file not found"));
    }

    #[test]
    fn test_nearest_ancestor_wins() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "").unwrap();
        fs::write(tmp.path().join("a").join(CONFIG_FILE_NAME), "").unwrap();

        let found = ConfigDiscovery::find_upwards(&nested).unwrap();
        assert_eq!(found, tmp.path().join("a").join(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_directory_with_config_name_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("x");
        fs::create_dir_all(nested.join(CONFIG_FILE_NAME)).unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "").unwrap();

        let found = ConfigDiscovery::find_upwards(&nested).unwrap();
        assert_eq!(found, tmp.path().join(CONFIG_FILE_NAME));
    }
}
