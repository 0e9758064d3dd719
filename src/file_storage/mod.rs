//! File-based JSON storage
//!
//! All persistent state lives as JSON files under the data directory
//! (`~/.pushbox` by default). Writes go through a temp file and an atomic
//! rename while holding an exclusive lock, so concurrent handlers never
//! observe a torn file.

pub mod users;

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Result alias for storage operations
pub type FileResult<T> = Result<T, String>;

/// Get the global pushbox data directory (`~/.pushbox`)
pub fn get_global_pushbox_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".pushbox")
}

/// Create a directory and its parents if missing
pub fn ensure_dir(path: &Path) -> FileResult<()> {
    fs::create_dir_all(path)
        .map_err(|e| format!("Failed to create directory {}: {}", path.display(), e))
}

/// Read and deserialize a JSON file
pub fn read_json<T: DeserializeOwned>(path: &Path) -> FileResult<T> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

/// Serialize a value to pretty JSON and write it atomically
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> FileResult<()> {
    let content = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize {}: {}", path.display(), e))?;
    atomic_write(path, &content)
}

/// Write a file atomically: temp file in the same directory, then rename.
///
/// Writers to the same path serialize on an exclusive lock held for the
/// duration of the write; readers only ever see the old or the new file.
pub fn atomic_write(path: &Path, content: &str) -> FileResult<()> {
    let parent = path
        .parent()
        .ok_or_else(|| format!("No parent directory for {}", path.display()))?;
    ensure_dir(parent)?;

    let lock_path = path.with_extension("lock");
    let lock_file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .open(&lock_path)
        .map_err(|e| format!("Failed to open lock file {}: {}", lock_path.display(), e))?;
    lock_file
        .lock_exclusive()
        .map_err(|e| format!("Failed to lock {}: {}", lock_path.display(), e))?;

    let tmp_path = path.with_extension("tmp");
    let result = fs::write(&tmp_path, content)
        .map_err(|e| format!("Failed to write {}: {}", tmp_path.display(), e))
        .and_then(|_| {
            fs::rename(&tmp_path, path)
                .map_err(|e| format!("Failed to replace {}: {}", path.display(), e))
        });

    let _ = lock_file.unlock();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn test_write_then_read_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");
        let value = Sample {
            name: "pushbox".to_string(),
            count: 3,
        };

        write_json(&path, &value).unwrap();
        let loaded: Sample = read_json(&path).unwrap();
        assert_eq!(loaded, value);
    }

    #[test]
    fn test_read_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let result: FileResult<Sample> = read_json(&path);
        assert!(result.is_err());
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deep").join("file.json");
        atomic_write(&path, "{}").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_atomic_write_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.json");
        atomic_write(&path, "first").unwrap();
        atomic_write(&path, "second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }
}
