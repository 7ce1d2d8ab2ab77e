//! Sync record storage, one JSON file per route

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use routesync::{RouteId, SyncRecord};

/// Reads and writes sync records under a state directory
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    /// Store rooted at `dir`; nothing is created until the first save
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Record file of a route
    #[must_use]
    pub fn path_for(&self, route: &RouteId) -> PathBuf {
        self.dir.join(format!("{route}.json"))
    }

    /// Lock file of a route
    #[must_use]
    pub fn lock_path_for(&self, route: &RouteId) -> PathBuf {
        self.dir.join(format!("{route}.lock"))
    }

    /// Claim a route so no other process applies it at the same time
    ///
    /// # Errors
    ///
    /// Returns an error if another process holds the lock, or the lock file
    /// cannot be created.
    pub fn lock(&self, route: &RouteId) -> anyhow::Result<RecordLock> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create state directory: {}", self.dir.display())
        })?;

        let path = self.lock_path_for(route);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                bail!(
                    "Route '{route}' is busy: another apply is in progress. If stale, delete: {}",
                    path.display()
                );
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to create lock file: {}", path.display()));
            }
        };

        let lock = RecordLock { path };
        write!(file, "{}", std::process::id())
            .with_context(|| format!("Failed to write lock file: {}", lock.path.display()))?;

        tracing::debug!(route = %route, "acquired record lock");
        Ok(lock)
    }

    /// Last record of a route, `None` if it was never applied
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self, route: &RouteId) -> anyhow::Result<Option<SyncRecord>> {
        let path = self.path_for(route);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read sync record: {}", path.display()));
            }
        };

        let record = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse sync record: {}", path.display()))?;
        Ok(Some(record))
    }

    /// Replace the record of a route
    ///
    /// # Errors
    ///
    /// Returns an error if the state directory or file cannot be written.
    pub fn save(&self, route: &RouteId, record: &SyncRecord) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("Failed to create state directory: {}", self.dir.display())
        })?;

        let path = self.path_for(route);
        let json = serde_json::to_string_pretty(record).context("Failed to serialize sync record")?;
        write_replacing(&path, json.as_bytes())
            .with_context(|| format!("Failed to write sync record: {}", path.display()))?;

        tracing::debug!(route = %route, targets = record.len(), "saved sync record");
        Ok(())
    }
}

/// Exclusive hold on a route's records across processes
///
/// The lock file is removed when the guard is dropped.
#[derive(Debug)]
pub struct RecordLock {
    path: PathBuf,
}

impl Drop for RecordLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Write through a sibling file so readers never see a partial record
fn write_replacing(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let staging = path.with_extension("json.tmp");
    let result = fs::write(&staging, contents).and_then(|()| fs::rename(&staging, path));
    if result.is_err() {
        let _ = fs::remove_file(&staging);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use routesync::RelativePath;
    use tempfile::TempDir;

    #[test]
    fn test_missing_record_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = StateStore::new(tmp.path().join("state"));

        assert!(store.load(&RouteId::new("publish")).unwrap().is_none());
        assert!(!tmp.path().join("state").exists());
    }

    #[test]
    fn test_save_then_load() {
        let tmp = TempDir::new().unwrap();
        let store = StateStore::new(tmp.path().join("nested/state"));
        let route = RouteId::new("publish");
        let record = SyncRecord::from_targets([
            RelativePath::parse("public/a.ts").unwrap(),
            RelativePath::parse("public/b.ts").unwrap(),
        ]);

        store.save(&route, &record).unwrap();

        assert_eq!(store.load(&route).unwrap(), Some(record));
        assert!(store.path_for(&route).ends_with("publish.json"));
        assert!(!store.path_for(&route).with_extension("json.tmp").exists());
    }

    #[test]
    fn test_corrupt_record_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let store = StateStore::new(tmp.path());
        fs::write(tmp.path().join("publish.json"), "{ not json").unwrap();

        let err = store.load(&RouteId::new("publish")).unwrap_err();
        assert!(err.to_string().contains("Failed to parse sync record"));
    }

    #[test]
    fn test_failed_save_leaves_no_staging_file() {
        let tmp = TempDir::new().unwrap();
        let store = StateStore::new(tmp.path());
        let route = RouteId::new("publish");
        // a non-empty directory where the record should go
        fs::create_dir_all(tmp.path().join("publish.json/inner")).unwrap();

        assert!(store.save(&route, &SyncRecord::default()).is_err());
        assert!(!tmp.path().join("publish.json.tmp").exists());
    }

    #[test]
    fn test_lock_is_exclusive_until_dropped() {
        let tmp = TempDir::new().unwrap();
        let store = StateStore::new(tmp.path().join("state"));
        let route = RouteId::new("publish");

        let held = store.lock(&route).unwrap();
        assert!(store.lock_path_for(&route).is_file());

        let err = store.lock(&route).unwrap_err();
        assert!(err.to_string().contains("is busy"));

        // other routes are independent
        drop(store.lock(&RouteId::new("docs")).unwrap());

        drop(held);
        assert!(!store.lock_path_for(&route).exists());
        assert!(store.lock(&route).is_ok());
    }
}
