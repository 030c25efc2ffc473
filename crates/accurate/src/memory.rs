//! The in-memory hash-table change-detection backend.

use rustc_hash::FxHashMap;

use crate::store::{ChangeDetectionStore, ChangeEntry, EntryHandle, StoreError};

/// An in-memory implementation of [`ChangeDetectionStore`], used for
/// jobs small enough that the disk-backed variant's overhead is not
/// worth paying.
#[derive(Debug, Default)]
pub struct MemoryStore {
    by_path: FxHashMap<String, ChangeEntry>,
    path_by_handle: FxHashMap<EntryHandle, String>,
    seen: FxHashMap<EntryHandle, bool>,
    next_file_number: u32,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChangeDetectionStore for MemoryStore {
    fn init(&mut self, expected_entries: usize) -> Result<(), StoreError> {
        self.by_path.reserve(expected_entries);
        self.path_by_handle.reserve(expected_entries);
        self.seen.reserve(expected_entries);
        Ok(())
    }

    fn add(
        &mut self,
        path: &str,
        lstat_ascii: &str,
        checksum_ascii: &str,
        delta_sequence: u32,
    ) -> Result<EntryHandle, StoreError> {
        self.next_file_number += 1;
        let handle = EntryHandle(self.next_file_number);
        let entry = ChangeEntry {
            file_number: handle,
            delta_sequence,
            lstat_ascii: lstat_ascii.to_string(),
            checksum_ascii: checksum_ascii.to_string(),
        };
        self.by_path.insert(path.to_string(), entry);
        self.path_by_handle.insert(handle, path.to_string());
        self.seen.insert(handle, false);
        Ok(handle)
    }

    fn lookup(&self, path: &str) -> Option<ChangeEntry> {
        self.by_path.get(path).cloned()
    }

    fn mark_seen(&mut self, handle: EntryHandle) {
        self.seen.insert(handle, true);
    }

    fn iter_unseen(&self, callback: &mut dyn FnMut(&str, &ChangeEntry)) {
        let mut handles: Vec<&EntryHandle> = self.seen.iter().filter(|(_, seen)| !**seen).map(|(h, _)| h).collect();
        handles.sort();
        for handle in handles {
            if let Some(path) = self.path_by_handle.get(handle) {
                callback(path, &self.by_path[path]);
            }
        }
    }

    fn iter_all_seen(&self, callback: &mut dyn FnMut(&str, &ChangeEntry)) {
        let mut handles: Vec<&EntryHandle> = self.seen.iter().filter(|(_, seen)| **seen).map(|(h, _)| h).collect();
        handles.sort();
        for handle in handles {
            if let Some(path) = self.path_by_handle.get(handle) {
                callback(path, &self.by_path[path]);
            }
        }
    }

    fn destroy(&mut self) -> Result<(), StoreError> {
        self.by_path.clear();
        self.path_by_handle.clear();
        self.seen.clear();
        Ok(())
    }
}
