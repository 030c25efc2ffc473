//! Change-detection back-end selection (§9 supplement), grounded on
//! `accurate.c`'s `AccurateInit` choosing a back-end by estimated entry
//! count against a configured memory threshold.

use std::path::Path;

use accurate::lmdb::LmdbStore;
use accurate::memory::MemoryStore;
use accurate::store::{ChangeDetectionStore, StoreError};

/// Chooses a change-detection back-end for a job declaring
/// `expected_entries` paths, against the client resource's configured
/// `memory_limit_entries` threshold. The session context only ever sees
/// the `Box<dyn ChangeDetectionStore>` this returns, never a concrete
/// back-end type.
///
/// # Errors
///
/// Returns [`StoreError`] if the disk-backed back-end's environment could
/// not be opened (the in-memory back-end cannot fail to construct).
pub fn select_change_detection_store(
    expected_entries: usize,
    memory_limit_entries: usize,
    lmdb_environment_dir: &Path,
) -> Result<Box<dyn ChangeDetectionStore>, StoreError> {
    if expected_entries <= memory_limit_entries {
        let mut store = MemoryStore::new();
        store.init(expected_entries)?;
        Ok(Box::new(store))
    } else {
        let mut store = LmdbStore::open(lmdb_environment_dir)?;
        store.init(expected_entries)?;
        Ok(Box::new(store))
    }
}
