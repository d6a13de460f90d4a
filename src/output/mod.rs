//! Bucketed plain-text output
//!
//! Accepted records land in `root/<bucket>/<id>.txt`, where the bucket is a
//! stable hash of the title. The hash is explicit and fixed-seed so the
//! same title maps to the same bucket across runs and machines.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

/// Number of output subdirectories.
pub const BUCKET_COUNT: u64 = 256;

/// Deterministic bucket for a title, in `[0, 255]`.
pub fn bucket(title: &str) -> u8 {
    (xxh3_64(title.as_bytes()) % BUCKET_COUNT) as u8
}

/// Per-record write failure. Reported to the caller and skipped; never
/// fatal to the run.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("failed to create bucket directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    WriteFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Writes accepted records beneath a fixed output root.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    root: PathBuf,
}

impl OutputWriter {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a record would be written to.
    pub fn target_path(&self, id: &str, title: &str) -> PathBuf {
        self.root
            .join(format!("{:02x}", bucket(title)))
            .join(format!("{id}.txt"))
    }

    /// Write one record's cleaned text, creating the bucket directory on
    /// demand. Creation is idempotent, so concurrent first-writes to the
    /// same bucket are safe. Returns the number of bytes written.
    pub fn write(&self, id: &str, title: &str, text: &str) -> Result<u64, WriteError> {
        let dir = self.root.join(format!("{:02x}", bucket(title)));
        fs::create_dir_all(&dir).map_err(|source| WriteError::CreateDir {
            path: dir.clone(),
            source,
        })?;

        let path = dir.join(format!("{id}.txt"));
        fs::write(&path, text.as_bytes())
            .map_err(|source| WriteError::WriteFile { path, source })?;

        Ok(text.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn bucket_is_total_and_stable() {
        for title in ["", "X", "Some Article", "مقالة", "Ünïcödé"] {
            let first = bucket(title);
            let second = bucket(title);
            assert_eq!(first, second, "bucket must be stable for {title:?}");
        }
    }

    #[test]
    fn bucket_has_known_values() {
        // Pin a couple of values so an accidental hash change shows up.
        assert_eq!(bucket("X"), (xxh3_64(b"X") % 256) as u8);
        assert_eq!(bucket(""), (xxh3_64(b"") % 256) as u8);
    }

    #[test]
    fn writes_into_two_hex_digit_bucket_dir() {
        let tmp = TempDir::new().unwrap();
        let writer = OutputWriter::new(tmp.path());

        let bytes = writer.write("42", "Some Article", "Hello world.\n").unwrap();
        assert_eq!(bytes, 13);

        let expected = tmp
            .path()
            .join(format!("{:02x}", bucket("Some Article")))
            .join("42.txt");
        assert_eq!(writer.target_path("42", "Some Article"), expected);
        assert_eq!(std::fs::read_to_string(expected).unwrap(), "Hello world.\n");
    }

    #[test]
    fn rewrites_overwrite_the_previous_file() {
        let tmp = TempDir::new().unwrap();
        let writer = OutputWriter::new(tmp.path());

        writer.write("7", "Title", "first").unwrap();
        writer.write("7", "Title", "second").unwrap();

        let path = writer.target_path("7", "Title");
        assert_eq!(std::fs::read_to_string(path).unwrap(), "second");
    }

    #[test]
    fn write_failure_is_reported_not_panicked() {
        // Root is a file, so creating the bucket directory must fail.
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("blocked");
        std::fs::write(&blocker, b"x").unwrap();

        let writer = OutputWriter::new(&blocker);
        let err = writer.write("1", "Title", "text").unwrap_err();
        assert!(matches!(err, WriteError::CreateDir { .. }));
    }
}
