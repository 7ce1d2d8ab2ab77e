//! File hashing for content comparison using SHA-256

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// File hash result
pub type FileHash = [u8; 32];

/// Streaming file hasher
pub struct FileHasher;

impl FileHasher {
    /// Compute the SHA-256 hash of a file by streaming its contents
    ///
    /// Symlinks are followed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be opened or read.
    pub fn hash(path: &Path) -> Result<FileHash> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;

        let mut reader = BufReader::new(file);
        let mut hasher = Sha256::new();
        let mut buffer = [0; 8192]; // 8KB buffer for streaming

        loop {
            let bytes_read = reader.read(&mut buffer).map_err(|e| Error::io(path, e))?;

            if bytes_read == 0 {
                break;
            }

            hasher.update(&buffer[..bytes_read]);
        }

        Ok(hasher.finalize().into())
    }

    /// Hash an in-memory buffer
    #[must_use]
    pub fn hash_bytes(bytes: &[u8]) -> FileHash {
        Sha256::digest(bytes).into()
    }

    /// Lowercase hex rendering, as shown in reports
    #[must_use]
    pub fn to_hex(hash: &FileHash) -> String {
        hash.iter().fold(String::with_capacity(64), |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_hash_identical_files() {
        let tmp = TempDir::new().unwrap();
        let file1 = tmp.path().join("file1.txt");
        let file2 = tmp.path().join("file2.txt");

        fs::write(&file1, "same content").unwrap();
        fs::write(&file2, "same content").unwrap();

        let hash1 = FileHasher::hash(&file1).unwrap();
        let hash2 = FileHasher::hash(&file2).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1, FileHasher::hash_bytes(b"same content"));
    }

    #[test]
    fn test_hash_different_files() {
        let tmp = TempDir::new().unwrap();
        let file1 = tmp.path().join("file1.txt");
        let file2 = tmp.path().join("file2.txt");

        fs::write(&file1, "content 1").unwrap();
        fs::write(&file2, "content 2").unwrap();

        assert_ne!(
            FileHasher::hash(&file1).unwrap(),
            FileHasher::hash(&file2).unwrap()
        );
    }

    #[test]
    fn test_hash_large_file_streams() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("large.bin");

        // Larger than the read buffer several times over
        let content = vec![7u8; 1024 * 1024];
        fs::write(&file, &content).unwrap();

        assert_eq!(FileHasher::hash(&file).unwrap(), FileHasher::hash_bytes(&content));
    }

    #[test]
    fn test_hash_missing_file_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let result = FileHasher::hash(&tmp.path().join("missing"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[test]
    fn test_hex_rendering() {
        let hex = FileHasher::to_hex(&FileHasher::hash_bytes(b""));
        assert_eq!(
            hex,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
