//! The change-detection store's capability interface (§4.3, §9).

use thiserror::Error;

/// A dense, monotonically-assigned file number, and the handle returned
/// by [`ChangeDetectionStore::lookup`] used to mark an entry seen.
///
/// Unifies the two shapes the mark-seen API historically took (by-name
/// and by-payload) into one handle type, per the Open Questions
/// resolution in the design notes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct EntryHandle(pub u32);

/// One stored fingerprint: `(file_number, delta_sequence, lstat_ascii,
/// checksum_ascii)` (§3), all but `file_number` kept as ASCII strings to
/// minimize space, matching the wire's own ASCII `stat` encoding.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChangeEntry {
    /// The dense file number assigned when this entry was added.
    pub file_number: EntryHandle,
    /// The delta-sequence counter for chained incremental content.
    pub delta_sequence: u32,
    /// ASCII-encoded `stat` fields, see `core::stat::FileStat`.
    pub lstat_ascii: String,
    /// ASCII-encoded (typically base64 or hex) content checksum.
    pub checksum_ascii: String,
}

/// The capability interface both change-detection backends implement.
///
/// `destroy` takes `&mut self` rather than consuming `self` so the trait
/// stays usable as a trait object; callers drop the store after calling
/// it.
pub trait ChangeDetectionStore {
    /// Reserves space for `expected_entries` entries, called before the
    /// Director's `accurate` command begins streaming paths.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend's allocation or the on-disk
    /// environment could not be prepared.
    fn init(&mut self, expected_entries: usize) -> Result<(), StoreError>;

    /// Adds a path with its fingerprint, assigning the next dense file
    /// number and reserving a bit in the seen-bitmap.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend failed to persist the entry.
    fn add(
        &mut self,
        path: &str,
        lstat_ascii: &str,
        checksum_ascii: &str,
        delta_sequence: u32,
    ) -> Result<EntryHandle, StoreError>;

    /// Looks up a path's stored fingerprint.
    fn lookup(&self, path: &str) -> Option<ChangeEntry>;

    /// Marks an entry's bit in the seen-bitmap. Idempotent.
    fn mark_seen(&mut self, handle: EntryHandle);

    /// Invokes `callback` once per entry whose bit is not set in the
    /// seen-bitmap, in file-number order.
    fn iter_unseen(&self, callback: &mut dyn FnMut(&str, &ChangeEntry));

    /// Invokes `callback` once per entry whose bit is set in the
    /// seen-bitmap, in file-number order.
    fn iter_all_seen(&self, callback: &mut dyn FnMut(&str, &ChangeEntry));

    /// Releases all resources held by the store (for the disk-backed
    /// variant, removes its environment directory).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if cleanup failed.
    fn destroy(&mut self) -> Result<(), StoreError>;
}

/// A change-detection store operation failed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend's on-disk environment could not be opened or created.
    #[error("failed to open change-detection store environment: {0}")]
    Environment(String),
    /// A read or write transaction failed.
    #[error("change-detection store transaction failed: {0}")]
    Transaction(String),
    /// Cleanup of the store's resources failed.
    #[error("failed to destroy change-detection store: {0}")]
    Destroy(String),
}
