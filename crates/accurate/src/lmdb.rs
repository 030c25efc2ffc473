//! The disk-backed, ordered-key change-detection backend.
//!
//! Each call opens its own short-lived transaction rather than batching
//! writes across calls: `heed`'s `RwTxn` borrows its `Env` for its own
//! lifetime, so holding one open across trait calls (which only borrow
//! `&mut self`, not `&mut self` for a whole job) would require storing a
//! self-referential struct. Per-call transactions keep the backend sound
//! without `unsafe`, at the cost of one fsync per `add`/`mark_seen`
//! rather than a batch — acceptable because the writer mutex (§5) only
//! ever has one job using this environment at a time.

use std::path::{Path, PathBuf};

use heed::byteorder::NativeEndian;
use heed::types::{Str, U32};
use heed::{Database, Env, EnvOpenOptions};

use crate::store::{ChangeDetectionStore, ChangeEntry, EntryHandle, StoreError};

const SEEN_TRUE: u32 = 1;
const SEEN_FALSE: u32 = 0;

fn encode_entry(entry: &ChangeEntry) -> String {
    format!(
        "{}\x1f{}\x1f{}\x1f{}",
        entry.file_number.0, entry.delta_sequence, entry.lstat_ascii, entry.checksum_ascii
    )
}

fn decode_entry(raw: &str) -> Option<ChangeEntry> {
    let mut parts = raw.splitn(4, '\x1f');
    let file_number: u32 = parts.next()?.parse().ok()?;
    let delta_sequence: u32 = parts.next()?.parse().ok()?;
    let lstat_ascii = parts.next()?.to_string();
    let checksum_ascii = parts.next()?.to_string();
    Some(ChangeEntry {
        file_number: EntryHandle(file_number),
        delta_sequence,
        lstat_ascii,
        checksum_ascii,
    })
}

type FileNumberKey = U32<NativeEndian>;

/// A disk-backed [`ChangeDetectionStore`] for jobs too large to hold in
/// memory comfortably, built on an `heed`/LMDB environment.
pub struct LmdbStore {
    env: Env,
    entries_by_path: Database<Str, Str>,
    seen_by_file_number: Database<FileNumberKey, FileNumberKey>,
    path_by_file_number: Database<FileNumberKey, Str>,
    env_path: PathBuf,
    next_file_number: u32,
}

impl LmdbStore {
    /// Opens (creating if necessary) an LMDB environment at `path` for
    /// this job's change-detection store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Environment`] if the environment could not
    /// be created or opened.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path).map_err(|e| StoreError::Environment(e.to_string()))?;

        #[allow(unsafe_code)]
        // `heed::EnvOpenOptions::open` is `unsafe` because LMDB requires
        // the environment not be opened concurrently from another
        // process with an incompatible map size; the per-job directory
        // this receives is exclusive to this daemon process.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(1 << 30)
                .max_dbs(3)
                .open(path)
                .map_err(|e| StoreError::Environment(e.to_string()))?
        };

        let mut wtxn = env
            .write_txn()
            .map_err(|e| StoreError::Environment(e.to_string()))?;
        let entries_by_path: Database<Str, Str> = env
            .create_database(&mut wtxn, Some("entries_by_path"))
            .map_err(|e| StoreError::Environment(e.to_string()))?;
        let seen_by_file_number: Database<FileNumberKey, FileNumberKey> = env
            .create_database(&mut wtxn, Some("seen_by_file_number"))
            .map_err(|e| StoreError::Environment(e.to_string()))?;
        let path_by_file_number: Database<FileNumberKey, Str> = env
            .create_database(&mut wtxn, Some("path_by_file_number"))
            .map_err(|e| StoreError::Environment(e.to_string()))?;
        wtxn.commit()
            .map_err(|e| StoreError::Environment(e.to_string()))?;

        Ok(Self {
            env,
            entries_by_path,
            seen_by_file_number,
            path_by_file_number,
            env_path: path.to_path_buf(),
            next_file_number: 0,
        })
    }

    fn iter_by_seen_state(&self, want: u32, callback: &mut dyn FnMut(&str, &ChangeEntry)) {
        let Ok(txn) = self.env.read_txn() else { return };
        let Ok(iter) = self.seen_by_file_number.iter(&txn) else {
            return;
        };
        for item in iter {
            let Ok((file_number, seen)) = item else { continue };
            if seen != want {
                continue;
            }
            let Ok(Some(path)) = self.path_by_file_number.get(&txn, &file_number) else {
                continue;
            };
            let Ok(Some(encoded)) = self.entries_by_path.get(&txn, path) else {
                continue;
            };
            if let Some(entry) = decode_entry(encoded) {
                callback(path, &entry);
            }
        }
    }
}

impl ChangeDetectionStore for LmdbStore {
    fn init(&mut self, _expected_entries: usize) -> Result<(), StoreError> {
        self.next_file_number = 0;
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
        let encoded = encode_entry(&entry);

        let mut wtxn = self
            .env
            .write_txn()
            .map_err(|e| StoreError::Transaction(e.to_string()))?;
        self.entries_by_path
            .put(&mut wtxn, path, &encoded)
            .map_err(|e| StoreError::Transaction(e.to_string()))?;
        self.seen_by_file_number
            .put(&mut wtxn, &handle.0, &SEEN_FALSE)
            .map_err(|e| StoreError::Transaction(e.to_string()))?;
        self.path_by_file_number
            .put(&mut wtxn, &handle.0, path)
            .map_err(|e| StoreError::Transaction(e.to_string()))?;
        wtxn.commit()
            .map_err(|e| StoreError::Transaction(e.to_string()))?;

        Ok(handle)
    }

    fn lookup(&self, path: &str) -> Option<ChangeEntry> {
        let txn = self.env.read_txn().ok()?;
        let raw = self.entries_by_path.get(&txn, path).ok().flatten()?;
        decode_entry(raw)
    }

    fn mark_seen(&mut self, handle: EntryHandle) {
        let Ok(mut wtxn) = self.env.write_txn() else {
            return;
        };
        let _ = self
            .seen_by_file_number
            .put(&mut wtxn, &handle.0, &SEEN_TRUE);
        let _ = wtxn.commit();
    }

    fn iter_unseen(&self, callback: &mut dyn FnMut(&str, &ChangeEntry)) {
        self.iter_by_seen_state(SEEN_FALSE, callback);
    }

    fn iter_all_seen(&self, callback: &mut dyn FnMut(&str, &ChangeEntry)) {
        self.iter_by_seen_state(SEEN_TRUE, callback);
    }

    fn destroy(&mut self) -> Result<(), StoreError> {
        std::fs::remove_dir_all(&self.env_path).map_err(|e| StoreError::Destroy(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_entries_through_the_environment() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LmdbStore::open(dir.path()).unwrap();
        let handle = store.add("/a", "lstat-a", "sum-a", 3).unwrap();
        assert_eq!(handle, EntryHandle(1));

        let found = store.lookup("/a").expect("entry should be visible");
        assert_eq!(found.checksum_ascii, "sum-a");
        assert_eq!(found.delta_sequence, 3);

        store.mark_seen(handle);
        let mut seen_paths = Vec::new();
        store.iter_all_seen(&mut |path, _| seen_paths.push(path.to_string()));
        assert_eq!(seen_paths, vec!["/a".to_string()]);
    }

    #[test]
    fn destroy_removes_the_environment_directory() {
        let dir = tempfile::tempdir().unwrap();
        let env_path = dir.path().join("store");
        let mut store = LmdbStore::open(&env_path).unwrap();
        store.add("/a", "l", "c", 0).unwrap();
        store.destroy().unwrap();
        assert!(!env_path.exists());
    }
}
