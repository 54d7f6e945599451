//! Snapshot index
//!
//! The index is a single JSON array of metadata stored under
//! `backup_metadata`, kept in append order. Every mutation is a
//! read-modify-write of that key, so mutations run under one mutex.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{JobsafeError, JobsafeResult};
use crate::models::BackupMetadata;
use crate::storage::{read_json, write_json, KeyValueStore, BACKUP_INDEX_KEY};

/// Owner of the snapshot index
pub struct VersionIndex {
    store: Arc<dyn KeyValueStore>,
    lock: Mutex<()>,
}

impl VersionIndex {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    /// Current entries in append order
    ///
    /// Reads never block on writers; the store replaces the key atomically.
    pub fn entries(&self) -> JobsafeResult<Vec<BackupMetadata>> {
        Ok(read_json(self.store.as_ref(), BACKUP_INDEX_KEY)?.unwrap_or_default())
    }

    /// Enter the critical section for a read-modify-write
    pub fn lock(&self) -> JobsafeResult<IndexGuard<'_>> {
        let guard = self
            .lock
            .lock()
            .map_err(|_| JobsafeError::Storage("Backup index lock poisoned".into()))?;
        let entries = self.entries()?;
        Ok(IndexGuard {
            _guard: guard,
            store: self.store.as_ref(),
            entries,
            dirty: false,
        })
    }
}

/// Exclusive, in-memory view of the index
///
/// Changes are written back by [`IndexGuard::commit`]; dropping the guard
/// without committing discards them.
pub struct IndexGuard<'a> {
    _guard: MutexGuard<'a, ()>,
    store: &'a dyn KeyValueStore,
    entries: Vec<BackupMetadata>,
    dirty: bool,
}

impl IndexGuard<'_> {
    pub fn entries(&self) -> &[BackupMetadata] {
        &self.entries
    }

    /// Most recently created entry; later appends win timestamp ties
    pub fn newest(&self) -> Option<&BackupMetadata> {
        self.entries
            .iter()
            .enumerate()
            .max_by_key(|(position, meta)| (meta.created_at, *position))
            .map(|(_, meta)| meta)
    }

    pub fn push(&mut self, metadata: BackupMetadata) {
        self.entries.push(metadata);
        self.dirty = true;
    }

    /// Remove the entry with `id`, if present
    pub fn remove(&mut self, id: &str) -> Option<BackupMetadata> {
        let position = self.entries.iter().position(|meta| meta.id == id)?;
        self.dirty = true;
        Some(self.entries.remove(position))
    }

    /// Remove the oldest entries beyond `keep`, returning them oldest-first
    ///
    /// Entries whose id is in `protected` are never evicted, so the index
    /// can stay above `keep` until a later eviction.
    pub fn evict_oldest(&mut self, keep: usize, protected: &[&str]) -> Vec<BackupMetadata> {
        if self.entries.len() <= keep {
            return Vec::new();
        }

        let excess = self.entries.len() - keep;
        let mut order: Vec<usize> = (0..self.entries.len())
            .filter(|&position| !protected.contains(&self.entries[position].id.as_str()))
            .collect();
        order.sort_by_key(|&position| (self.entries[position].created_at, position));
        order.truncate(excess);
        if order.is_empty() {
            return Vec::new();
        }
        let doomed: HashSet<usize> = order.into_iter().collect();

        let mut evicted = Vec::with_capacity(doomed.len());
        let mut kept = Vec::with_capacity(self.entries.len() - doomed.len());
        for (position, meta) in std::mem::take(&mut self.entries).into_iter().enumerate() {
            if doomed.contains(&position) {
                evicted.push((position, meta));
            } else {
                kept.push(meta);
            }
        }
        evicted.sort_by_key(|(position, meta)| (meta.created_at, *position));

        self.entries = kept;
        self.dirty = true;
        evicted.into_iter().map(|(_, meta)| meta).collect()
    }

    /// Write the index back if it changed
    pub fn commit(self) -> JobsafeResult<()> {
        if self.dirty {
            write_json(self.store, BACKUP_INDEX_KEY, &self.entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BackupType;
    use crate::storage::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};

    fn meta(id: &str, minute: i64) -> BackupMetadata {
        BackupMetadata {
            id: id.into(),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
                + Duration::minutes(minute),
            version: format!("v{}", id),
            description: String::new(),
            size_bytes: 0,
            checksum: String::new(),
            backup_type: BackupType::Manual,
            application_count: 0,
            parent_version: None,
            changes: vec![],
            tags: vec![],
        }
    }

    fn index() -> VersionIndex {
        VersionIndex::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_commit_persists_and_drop_discards() {
        let index = index();

        let mut guard = index.lock().unwrap();
        guard.push(meta("a", 0));
        guard.commit().unwrap();

        let mut guard = index.lock().unwrap();
        guard.push(meta("b", 1));
        drop(guard);

        let ids: Vec<String> = index.entries().unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["a"]);
    }

    #[test]
    fn test_remove_missing_is_none() {
        let index = index();
        let mut guard = index.lock().unwrap();
        assert!(guard.remove("ghost").is_none());
        guard.commit().unwrap();
        assert!(index.entries().unwrap().is_empty());
    }

    #[test]
    fn test_evict_oldest_by_timestamp() {
        let index = index();
        let mut guard = index.lock().unwrap();
        guard.push(meta("late", 5));
        guard.push(meta("early", 1));
        guard.push(meta("tie-first", 3));
        guard.push(meta("tie-second", 3));

        let evicted: Vec<String> = guard.evict_oldest(2, &[]).into_iter().map(|m| m.id).collect();
        assert_eq!(evicted, vec!["early", "tie-first"]);

        let kept: Vec<&str> = guard.entries().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(kept, vec!["late", "tie-second"]);
        assert_eq!(guard.newest().unwrap().id, "late");
    }

    #[test]
    fn test_evict_oldest_skips_protected() {
        let index = index();
        let mut guard = index.lock().unwrap();
        guard.push(meta("target", 0));
        guard.push(meta("b", 1));
        guard.push(meta("c", 2));
        guard.push(meta("safety", 3));

        let evicted: Vec<String> = guard
            .evict_oldest(3, &["target", "safety"])
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(evicted, vec!["b"]);

        // Nothing left to evict once only protected entries exceed the cap
        let evicted = guard.evict_oldest(1, &["target", "c", "safety"]);
        assert!(evicted.is_empty());
        assert_eq!(guard.entries().len(), 3);
    }

    #[test]
    fn test_concurrent_pushes_are_not_lost() {
        let index = Arc::new(index());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let index = Arc::clone(&index);
                std::thread::spawn(move || {
                    let mut guard = index.lock().unwrap();
                    guard.push(meta(&format!("m{}", i), i));
                    guard.commit().unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(index.entries().unwrap().len(), 8);
    }
}
