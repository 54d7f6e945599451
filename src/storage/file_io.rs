//! Directory-backed key-value store with atomic writes
//!
//! Each key maps to one file under the store root. Writes go to a temp file
//! that is synced and renamed over the target, so a crash leaves either the
//! old value or the new one, never a torn file.

use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{JobsafeError, JobsafeResult};

use super::KeyValueStore;

const VALUE_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "json.tmp";

/// Key-value store keeping one file per key
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub fn open(root: impl Into<PathBuf>) -> JobsafeResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            JobsafeError::Io(format!(
                "Failed to create directory {}: {}",
                root.display(),
                e
            ))
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> JobsafeResult<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(format!("{}.{}", key, VALUE_EXTENSION)))
    }
}

/// Keys become file names, so only a conservative alphabet is allowed
fn validate_key(key: &str) -> JobsafeResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(JobsafeError::Storage(format!("Invalid key: '{}'", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> JobsafeResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(JobsafeError::Io(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> JobsafeResult<()> {
        let path = self.path_for(key)?;
        write_atomic(&path, value)?;
        debug!(key, bytes = value.len(), "stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> JobsafeResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(JobsafeError::Io(format!(
                "Failed to remove {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn keys(&self) -> JobsafeResult<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            JobsafeError::Io(format!("Failed to list {}: {}", self.root.display(), e))
        })?;

        let suffix = format!(".{}", VALUE_EXTENSION);
        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| JobsafeError::Io(e.to_string()))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some(key) = name.strip_suffix(&suffix) {
                if validate_key(key).is_ok() {
                    keys.push(key.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Write bytes to a file atomically (write to temp, sync, then rename)
fn write_atomic(path: &Path, bytes: &[u8]) -> JobsafeResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            JobsafeError::Io(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    // Same directory as the target so the rename stays on one filesystem
    let temp_path = path.with_extension(TEMP_EXTENSION);

    let file = File::create(&temp_path)
        .map_err(|e| JobsafeError::Io(format!("Failed to create temp file: {}", e)))?;

    let mut writer = BufWriter::new(file);
    writer
        .write_all(bytes)
        .map_err(|e| JobsafeError::Io(format!("Failed to write data: {}", e)))?;
    writer
        .flush()
        .map_err(|e| JobsafeError::Io(format!("Failed to flush data: {}", e)))?;
    writer
        .get_ref()
        .sync_all()
        .map_err(|e| JobsafeError::Io(format!("Failed to sync data: {}", e)))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        JobsafeError::Io(format!("Failed to rename temp file: {}", e))
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, FileStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path().join("data")).unwrap();
        (temp_dir, store)
    }

    #[test]
    fn test_get_missing_returns_none() {
        let (_dir, store) = store();
        assert_eq!(store.get("applications").unwrap(), None);
    }

    #[test]
    fn test_set_and_get() {
        let (_dir, store) = store();
        store.set("applications", b"[]").unwrap();
        assert_eq!(store.get("applications").unwrap(), Some(b"[]".to_vec()));

        store.set("applications", b"[1]").unwrap();
        assert_eq!(store.get("applications").unwrap(), Some(b"[1]".to_vec()));
    }

    #[test]
    fn test_atomic_write_no_temp_file_left() {
        let (_dir, store) = store();
        store.set("settings", b"{}").unwrap();

        assert!(store.root().join("settings.json").exists());
        assert!(!store.root().join("settings.json.tmp").exists());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (_dir, store) = store();
        store.set("backup_1", b"x").unwrap();
        store.remove("backup_1").unwrap();
        store.remove("backup_1").unwrap();
        assert_eq!(store.get("backup_1").unwrap(), None);
    }

    #[test]
    fn test_keys_lists_only_values() {
        let (_dir, store) = store();
        store.set("backup_b", b"1").unwrap();
        store.set("backup_a", b"2").unwrap();
        fs::write(store.root().join("stray.txt"), "ignored").unwrap();
        fs::write(store.root().join("half.json.tmp"), "ignored").unwrap();

        assert_eq!(store.keys().unwrap(), vec!["backup_a", "backup_b"]);
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let (_dir, store) = store();
        assert!(matches!(
            store.set("../escape", b"x"),
            Err(JobsafeError::Storage(_))
        ));
        assert!(store.get("").is_err());
        assert!(store.get(".hidden").is_err());
    }
}
