//! The shared data model between the backup and restore walks (§3).

use std::io::{Read, Write};

use checksums::strong::DigestAlgorithm;
use compress::algorithm::CompressionAlgorithm;
use fd_core::file_type::FileType;
use fd_core::stat::FileStat;
use filters::option::OptionBlock;
use wire::stream_type::StreamType;

/// Injected source of file content, so the backup walk never hard-codes
/// `std::fs` and tests can substitute an in-memory filesystem.
pub trait BackupSource {
    /// Opens `path` for reading, returning its content stream.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the path cannot be opened.
    fn open(&self, path: &str) -> std::io::Result<Box<dyn Read>>;
}

/// Injected destination for restored file content and metadata
/// application, so the restore walk never hard-codes `std::fs` either.
pub trait RestoreSink {
    /// Creates (or truncates) `path` and returns a writer for its
    /// content.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the path cannot be created.
    fn create(&self, path: &str) -> std::io::Result<Box<dyn Write>>;

    /// Creates a symbolic link at `path` pointing to `target`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the link cannot be created.
    fn symlink(&self, path: &str, target: &str) -> std::io::Result<()>;

    /// Creates a directory at `path` (and any missing parents).
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    fn create_dir(&self, path: &str) -> std::io::Result<()>;

    /// Creates a hard link at `path` pointing at `existing`, an earlier
    /// path already restored in this job.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the link cannot be created.
    fn hard_link(&self, path: &str, existing: &str) -> std::io::Result<()>;
}

/// One fileset entry as classified and stat'd by the walker, ready to
/// hand to the backup orchestrator.
#[derive(Clone, Debug)]
pub struct FileEntry {
    /// The entry's path as it will appear, before `strip_path` is
    /// applied.
    pub path: String,
    /// This entry's classification (§4.4 step 1).
    pub file_type: FileType,
    /// The entry's `stat` snapshot.
    pub stat: FileStat,
    /// Symlink target or hard-link source path, if applicable.
    pub link_target: Option<String>,
    /// The delta-sequence counter for chained incremental content.
    pub delta_sequence: u32,
    /// The fileset option block in effect for this entry.
    pub options: OptionBlock,
    /// Set when this entry is a hard link whose content was already
    /// saved under a different path earlier in this job; carries that
    /// earlier digest forward instead of re-reading the file.
    pub hard_link_digest: Option<Vec<u8>>,
}

/// Strips up to `count` leading `/`-separated path components from
/// `path` (the `P<n>:` fileset option, §4.7).
#[must_use]
pub fn strip_path_components(path: &str, count: Option<u32>) -> String {
    let Some(count) = count else {
        return path.to_string();
    };
    let mut remaining = path;
    for _ in 0..count {
        let Some(rest) = remaining.splitn(2, '/').nth(1) else {
            break;
        };
        remaining = rest;
    }
    remaining.to_string()
}

/// Maps a content-digest algorithm to its wire stream type.
#[must_use]
pub const fn digest_stream_type(algorithm: DigestAlgorithm) -> StreamType {
    match algorithm {
        DigestAlgorithm::Md5 => StreamType::Md5Digest,
        DigestAlgorithm::Sha1 => StreamType::Sha1Digest,
        DigestAlgorithm::Sha256 => StreamType::Sha256Digest,
        DigestAlgorithm::Sha512 => StreamType::Sha512Digest,
    }
}

/// Recovers the digest algorithm a digest stream type carries, or `None`
/// for any other stream type.
#[must_use]
pub const fn digest_algorithm_for_stream(stream: StreamType) -> Option<DigestAlgorithm> {
    match stream {
        StreamType::Md5Digest => Some(DigestAlgorithm::Md5),
        StreamType::Sha1Digest => Some(DigestAlgorithm::Sha1),
        StreamType::Sha256Digest => Some(DigestAlgorithm::Sha256),
        StreamType::Sha512Digest => Some(DigestAlgorithm::Sha512),
        _ => None,
    }
}

/// The size, in bytes, of one content chunk fed through the transform
/// chain (§4.2 stage 1). Matches the traditional Bareos-lineage default
/// network buffer size; large enough to keep per-block framing overhead
/// negligible, small enough that a sparse file's zero runs are caught at
/// a useful granularity.
pub const CONTENT_BLOCK_SIZE: usize = 65_536;

/// Chooses the content stream type for one file's transform output,
/// given whether sparse addressing, compression, and/or encryption were
/// applied. There is no wire stream type for "sparse and encrypted" — the
/// fixed enumeration only pairs sparse addressing with the plain and
/// gzip-compressed streams (§6) — so sparse addressing is only selected
/// when the file is not also being encrypted; callers must keep the
/// transform chain's `sparse` option in agreement with this by disabling
/// sparse detection whenever encryption is active for the same file.
#[must_use]
pub const fn content_stream_type(compression: Option<CompressionAlgorithm>, sparse: bool, encrypted: bool) -> StreamType {
    match (encrypted, sparse, compression.is_some()) {
        (true, _, true) => StreamType::EncryptedGzipFileData,
        (true, _, false) => StreamType::EncryptedFileData,
        (false, true, true) => StreamType::SparseGzipData,
        (false, true, false) => StreamType::SparseData,
        (false, false, true) => StreamType::CompressedData,
        (false, false, false) => StreamType::FileData,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_path_removes_the_requested_number_of_components() {
        assert_eq!(strip_path_components("/a/b/c/file.txt", Some(2)), "c/file.txt");
        assert_eq!(strip_path_components("/a/b/c/file.txt", Some(0)), "/a/b/c/file.txt");
        assert_eq!(strip_path_components("/a/b/c/file.txt", None), "/a/b/c/file.txt");
    }

    #[test]
    fn strip_path_does_not_panic_when_stripping_more_than_available() {
        assert_eq!(strip_path_components("/a", Some(10)), "a");
    }

    #[test]
    fn content_stream_type_dispatches_on_encryption_and_compression() {
        assert_eq!(content_stream_type(None, false, false), StreamType::FileData);
        assert_eq!(content_stream_type(Some(CompressionAlgorithm::Gzip), false, false), StreamType::CompressedData);
        assert_eq!(content_stream_type(None, false, true), StreamType::EncryptedFileData);
        assert_eq!(
            content_stream_type(Some(CompressionAlgorithm::Lz4Fast), false, true),
            StreamType::EncryptedGzipFileData
        );
    }

    #[test]
    fn content_stream_type_selects_sparse_variants_when_not_encrypted() {
        assert_eq!(content_stream_type(None, true, false), StreamType::SparseData);
        assert_eq!(content_stream_type(Some(CompressionAlgorithm::Gzip), true, false), StreamType::SparseGzipData);
    }

    #[test]
    fn content_stream_type_prefers_encryption_over_sparse_when_both_requested() {
        assert_eq!(content_stream_type(None, true, true), StreamType::EncryptedFileData);
        assert_eq!(content_stream_type(Some(CompressionAlgorithm::Gzip), true, true), StreamType::EncryptedGzipFileData);
    }

    #[test]
    fn digest_stream_round_trips_through_algorithm_mapping() {
        for algo in [
            DigestAlgorithm::Md5,
            DigestAlgorithm::Sha1,
            DigestAlgorithm::Sha256,
            DigestAlgorithm::Sha512,
        ] {
            let stream = digest_stream_type(algo);
            assert_eq!(digest_algorithm_for_stream(stream), Some(algo));
        }
    }
}
