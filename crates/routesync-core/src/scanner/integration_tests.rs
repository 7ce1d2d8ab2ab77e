//! Integration tests for the scanner module

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use super::{EntryKind, ScanOptions, TreeScanner, VcsMetadata};
use crate::comparison::hash::FileHasher;
use crate::error::Error;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn paths(scanner: &TreeScanner, root: &Path) -> Vec<String> {
    scanner
        .scan(root)
        .unwrap()
        .map(|e| e.unwrap().relative_path.to_string())
        .collect()
}

#[test]
fn test_scan_is_lexicographic_and_depth_first() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "b.txt", "b");
    write(tmp.path(), "a.txt", "a");
    write(tmp.path(), "a/z.txt", "z");
    write(tmp.path(), "a/m/n.txt", "n");

    let scanned = paths(&TreeScanner::default(), tmp.path());

    assert_eq!(scanned, ["a", "a/m", "a/m/n.txt", "a/z.txt", "a.txt", "b.txt"]);
}

#[test]
fn test_scan_is_restartable() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "one.txt", "1");

    let scanner = TreeScanner::default();
    assert_eq!(paths(&scanner, tmp.path()), ["one.txt"]);

    write(tmp.path(), "two.txt", "2");
    assert_eq!(paths(&scanner, tmp.path()), ["one.txt", "two.txt"]);
}

#[test]
fn test_vcs_directories_are_skipped() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), ".git/HEAD", "ref: refs/heads/main");
    write(tmp.path(), ".hg/store", "x");
    write(tmp.path(), ".github/workflows/ci.yml", "on: push");
    write(tmp.path(), "src/lib.rs", "");

    let scanned = paths(&TreeScanner::default(), tmp.path());

    assert!(!scanned.iter().any(|p| p.starts_with(".git/") || p == ".git"));
    assert!(!scanned.iter().any(|p| p.starts_with(".hg")));
    assert!(scanned.contains(&".github/workflows/ci.yml".to_string()));
    assert!(scanned.contains(&"src/lib.rs".to_string()));
}

#[test]
fn test_custom_vcs_metadata() {
    struct SkipBuild;
    impl VcsMetadata for SkipBuild {
        fn is_metadata_dir(&self, name: &str) -> bool {
            name == "build"
        }
    }

    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "build/out.o", "x");
    write(tmp.path(), ".git/HEAD", "x");

    let scanner = TreeScanner::new(ScanOptions::default().with_vcs_metadata(SkipBuild));
    let scanned = paths(&scanner, tmp.path());

    assert!(scanned.contains(&".git/HEAD".to_string()));
    assert!(!scanned.iter().any(|p| p.starts_with("build")));
}

#[test]
fn test_gitignore_respected_without_git_repository() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), ".gitignore", "target/\n*.tmp\n");
    write(tmp.path(), "target/debug/app", "bin");
    write(tmp.path(), "scratch.tmp", "x");
    write(tmp.path(), "src/main.rs", "fn main() {}");

    let respecting = paths(&TreeScanner::default(), tmp.path());
    assert_eq!(respecting, [".gitignore", "src", "src/main.rs"]);

    let everything = paths(
        &TreeScanner::new(ScanOptions::default().with_ignore_files(false)),
        tmp.path(),
    );
    assert!(everything.contains(&"target/debug/app".to_string()));
    assert!(everything.contains(&"scratch.tmp".to_string()));
}

#[test]
fn test_hashing_and_sizes() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "data.txt", "hello");

    let hashed = TreeScanner::new(ScanOptions::default().with_hashing(true));
    let entry = hashed.scan(tmp.path()).unwrap().next().unwrap().unwrap();
    assert_eq!(entry.kind, EntryKind::File);
    assert_eq!(entry.size, 5);
    assert_eq!(entry.content_hash, Some(FileHasher::hash_bytes(b"hello")));

    let plain = TreeScanner::default();
    let entry = plain.scan(tmp.path()).unwrap().next().unwrap().unwrap();
    assert!(entry.content_hash.is_none());
}

#[test]
fn test_leaves_excludes_directories() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "dir/sub/file.txt", "x");
    fs::create_dir(tmp.path().join("empty")).unwrap();

    let leaves: Vec<String> = TreeScanner::default()
        .scan(tmp.path())
        .unwrap()
        .leaves()
        .map(|e| e.unwrap().relative_path.to_string())
        .collect();

    assert_eq!(leaves, ["dir/sub/file.txt"]);
}

#[test]
fn test_leftover_temp_files_are_not_listed() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "dir/.routesync-x1Y2.tmp", "partial");
    write(tmp.path(), "dir/real.txt", "x");

    let scanned = paths(&TreeScanner::default(), tmp.path());
    assert_eq!(scanned, ["dir", "dir/real.txt"]);
}

#[test]
fn test_lazy_scan_can_stop_early() {
    let tmp = TempDir::new().unwrap();
    for i in 0..50 {
        write(tmp.path(), &format!("f{i:02}.txt"), "x");
    }

    let first: Vec<String> = TreeScanner::default()
        .scan(tmp.path())
        .unwrap()
        .take(3)
        .map(|e| e.unwrap().relative_path.to_string())
        .collect();

    assert_eq!(first, ["f00.txt", "f01.txt", "f02.txt"]);
}

#[test]
#[cfg(unix)]
fn test_symlinks() {
    use std::os::unix::fs::symlink;

    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "real.txt", "content");
    write(tmp.path(), "dir/inner.txt", "inner");
    symlink(tmp.path().join("real.txt"), tmp.path().join("link.txt")).unwrap();
    symlink(tmp.path().join("dir"), tmp.path().join("dirlink")).unwrap();
    symlink(tmp.path().join("missing.txt"), tmp.path().join("broken.txt")).unwrap();

    let scanner = TreeScanner::new(ScanOptions::default().with_hashing(true));
    let result = scanner.collect(tmp.path()).unwrap();

    let link = result
        .entries
        .iter()
        .find(|e| e.relative_path == "link.txt")
        .unwrap();
    assert_eq!(link.kind, EntryKind::Symlink);
    assert_eq!(link.size, 7);
    assert_eq!(link.content_hash, Some(FileHasher::hash_bytes(b"content")));

    // symlinked directories are neither listed nor descended into
    assert!(!result
        .entries
        .iter()
        .any(|e| e.relative_path.to_string().starts_with("dirlink")));

    // the broken link is a warning, and its siblings are still scanned
    assert_eq!(result.warnings.len(), 1);
    assert!(result.warnings[0].path.ends_with("broken.txt"));
    assert!(result.entries.iter().any(|e| e.relative_path == "real.txt"));
}

#[test]
#[cfg(unix)]
fn test_unreadable_directory_is_a_warning() {
    use std::os::unix::fs::PermissionsExt;

    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "locked/secret.txt", "x");
    write(tmp.path(), "open/visible.txt", "y");

    let locked = tmp.path().join("locked");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // root ignores permission bits
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let items: Vec<_> = TreeScanner::default().scan(tmp.path()).unwrap().collect();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(items.iter().any(|i| matches!(i, Err(Error::Io { .. }))));
    assert!(items
        .iter()
        .filter_map(|i| i.as_ref().ok())
        .any(|e| e.relative_path == "open/visible.txt"));
}

#[cfg(unix)]
fn mkfifo(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let status = std::process::Command::new("mkfifo").arg(path).status().unwrap();
    assert!(status.success());
}

#[test]
#[cfg(unix)]
fn test_special_files_are_skipped() {
    use std::os::unix::fs::symlink;

    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "a.txt", "a");
    mkfifo(&tmp.path().join("run/pipe"));
    symlink(tmp.path().join("run/pipe"), tmp.path().join("pipe-link")).unwrap();

    // hashing would block on the pipe if it were treated as a file
    let scanner = TreeScanner::new(ScanOptions::default().with_hashing(true));
    let result = scanner.collect(tmp.path()).unwrap();

    let scanned: Vec<String> = result
        .entries
        .iter()
        .map(|e| e.relative_path.to_string())
        .collect();
    assert_eq!(scanned, ["a.txt", "run"]);
    assert!(result.warnings.is_empty());
}
