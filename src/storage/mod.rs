//! Key-value storage layer for Jobsafe
//!
//! The core treats its persistence substrate as an abstract key-value
//! store. Anything that can get, set and remove byte blobs by key can back
//! it: a directory of files, an in-memory map, a database row.
//!
//! # Well-known keys
//!
//! - `applications`: the live record set (JSON array)
//! - `backup_metadata`: the snapshot index
//! - `backup_<id>`: one snapshot payload per backup
//! - `preferences`, `settings`: ambient blobs captured in snapshots

mod file_io;
mod memory;
mod retry;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{JobsafeError, JobsafeResult};

pub use file_io::FileStore;
pub use memory::MemoryStore;
pub use retry::{RetryPolicy, RetryingStore};

/// Live record set
pub const APPLICATIONS_KEY: &str = "applications";
/// Snapshot index
pub const BACKUP_INDEX_KEY: &str = "backup_metadata";
/// Prefix of snapshot payload keys
pub const BACKUP_KEY_PREFIX: &str = "backup_";
/// User preferences blob
pub const PREFERENCES_KEY: &str = "preferences";
/// Application settings blob
pub const SETTINGS_KEY: &str = "settings";

/// Byte-oriented key-value store
///
/// "What was set is later gettable until removed" is the only durability
/// guarantee relied upon.
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`, if any
    fn get(&self, key: &str) -> JobsafeResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &[u8]) -> JobsafeResult<()>;

    /// Remove `key`; removing an absent key succeeds
    fn remove(&self, key: &str) -> JobsafeResult<()>;

    /// All keys currently stored
    fn keys(&self) -> JobsafeResult<Vec<String>>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<S> {
    fn get(&self, key: &str) -> JobsafeResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> JobsafeResult<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> JobsafeResult<()> {
        (**self).remove(key)
    }

    fn keys(&self) -> JobsafeResult<Vec<String>> {
        (**self).keys()
    }
}

/// Read a JSON value, returning `None` if the key is absent
pub fn read_json<T, S>(store: &S, key: &str) -> JobsafeResult<Option<T>>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        None => Ok(None),
        Some(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| JobsafeError::Json(format!("Failed to parse '{}': {}", key, e))),
    }
}

/// Write a value as pretty JSON
pub fn write_json<T, S>(store: &S, key: &str, value: &T) -> JobsafeResult<()>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| JobsafeError::Json(format!("Failed to serialize '{}': {}", key, e)))?;
    store.set(key, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::Arc;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
    }

    #[test]
    fn test_json_helpers() {
        let store = MemoryStore::new();
        assert_eq!(read_json::<Sample, _>(&store, "missing").unwrap(), None);

        let value = Sample {
            name: "x".into(),
        };
        write_json(&store, "sample", &value).unwrap();
        assert_eq!(read_json(&store, "sample").unwrap(), Some(value));
    }

    #[test]
    fn test_read_json_reports_bad_payload() {
        let store = MemoryStore::new();
        store.set("sample", b"not json").unwrap();
        let err = read_json::<Sample, _>(&store, "sample").unwrap_err();
        assert!(matches!(err, JobsafeError::Json(_)));
    }

    #[test]
    fn test_arc_store_delegates() {
        let shared: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        shared.set("k", b"v").unwrap();
        let clone = Arc::clone(&shared);
        assert_eq!(clone.get("k").unwrap(), Some(b"v".to_vec()));
    }
}
