//! The per-file restore procedure (§4.5).
//!
//! Records arrive in the same order the backup orchestrator sent them,
//! grouped under a file-index that an attributes record opens. The
//! backup side splits one file's content across as many fixed-size
//! transform blocks as its length requires (see `backup`'s module
//! doc), so restore buffers every content block belonging to the
//! currently open file-index in arrival order and only drives them
//! through a single shared `RestoreTransform` when the next attributes
//! record (or end-of-session marker) closes the file out. Buffering
//! the whole file-index, not just its content, also resolves the
//! ordering problem of needing a digest algorithm before the bytes it
//! applies to arrive: the digest stream always follows the content
//! stream on the wire, so by the time the file closes every stream
//! needed to drive the transform chain is already in hand.

use checksums::strong::DigestAlgorithm;
use fd_core::file_type::FileType;
use fd_core::session::{FileIndex, SessionContext};
use fd_core::stat::FileStat;
use crypto::session_key::SessionKey;
use crypto::signing::verify_against_trusted_signers;
use metadata::acl::AclBackend;
use metadata::finder_info::FINDER_INFO_LEN;
use metadata::xattr::{XattrBackend, XattrEntry};
use rsa::{RsaPrivateKey, RsaPublicKey};
use transform::pipeline::{RestoreTransform, TransformOptions};
use wire::attributes::AttributesRecord;
use wire::digest;
use wire::framing::{RecordHeader, END_OF_SESSION_FILE_INDEX};
use wire::stream_type::StreamType;

use crate::packet::{CONTENT_BLOCK_SIZE, RestoreSink, digest_algorithm_for_stream};

/// Drives the restore procedure for one job, consuming records read off
/// the Storage-Daemon channel in wire order.
pub struct RestoreOrchestrator<'a, S, A, X> {
    sink: &'a S,
    acl_backend: Option<&'a A>,
    xattr_backend: Option<&'a X>,
    decryption_key: Option<&'a RsaPrivateKey>,
    trusted_signers: &'a [RsaPublicKey],
    session_key: Option<[u8; crypto::session_key::SESSION_KEY_LEN]>,
    current: Option<ActiveFile>,
}

/// Every record collected for the file-index currently open between two
/// attributes records.
struct ActiveFile {
    file_index: FileIndex,
    classification: Option<FileType>,
    path: String,
    link: String,
    content: Vec<(StreamType, Vec<u8>)>,
    digest: Option<(DigestAlgorithm, Vec<u8>)>,
    signature: Option<Vec<u8>>,
    acl_blobs: Vec<Vec<u8>>,
    xattr_entries: Vec<XattrEntry>,
    finder_info: Option<[u8; FINDER_INFO_LEN]>,
    mac_fork: Option<Vec<u8>>,
}

impl ActiveFile {
    fn new(file_index: FileIndex, attrs: &AttributesRecord) -> Self {
        Self {
            file_index,
            classification: file_type_from_code(attrs.file_type),
            path: attrs.path.clone(),
            link: attrs.link.clone(),
            content: Vec::new(),
            digest: None,
            signature: None,
            acl_blobs: Vec::new(),
            xattr_entries: Vec::new(),
            finder_info: None,
            mac_fork: None,
        }
    }
}

impl<'a, S, A, X> RestoreOrchestrator<'a, S, A, X>
where
    S: RestoreSink,
    A: AclBackend,
    X: XattrBackend,
{
    /// Starts a new restore orchestrator for one job's incoming record
    /// stream.
    #[must_use]
    pub fn new(
        sink: &'a S,
        acl_backend: Option<&'a A>,
        xattr_backend: Option<&'a X>,
        decryption_key: Option<&'a RsaPrivateKey>,
        trusted_signers: &'a [RsaPublicKey],
    ) -> Self {
        Self {
            sink,
            acl_backend,
            xattr_backend,
            decryption_key,
            trusted_signers,
            session_key: None,
            current: None,
        }
    }

    /// Feeds one record into the restore state machine.
    ///
    /// An attributes record (or the end-of-session marker) closes out
    /// whatever file was previously open, writing and applying it to
    /// the [`RestoreSink`]. Every other stream type is buffered against
    /// the currently open file.
    ///
    /// # Errors
    ///
    /// Returns [`fd_core::error::FileError`] if the sink could not be
    /// written to or the transform chain reported a state corruption.
    /// Digest and signature mismatches are logged, not propagated: a
    /// restore that detects corruption still leaves the file on disk
    /// for the operator to inspect (§4.5).
    pub fn feed_record(
        &mut self,
        ctx: &mut SessionContext,
        header: &RecordHeader,
        payload: &[u8],
    ) -> Result<(), fd_core::error::FileError> {
        if header.file_index == END_OF_SESSION_FILE_INDEX {
            return self.close_current(ctx);
        }

        if header.stream_type == StreamType::UnixAttributes {
            self.close_current(ctx)?;
            let Ok(attrs) = AttributesRecord::decode(payload) else {
                ctx.counters.errors += 1;
                return Ok(());
            };
            self.current = Some(ActiveFile::new(FileIndex(header.file_index as u32), &attrs));
            return Ok(());
        }

        if header.stream_type == StreamType::EncryptedSessionData {
            if let Some(key) = self.decryption_key {
                if let Ok(unsealed) = SessionKey::unseal(payload, key) {
                    self.session_key = Some(*unsealed.bytes());
                }
            }
            return Ok(());
        }

        let Some(active) = self.current.as_mut() else {
            return Ok(());
        };
        if header.file_index as u32 != active.file_index.0 {
            // A record for a file-index that isn't the one currently open;
            // the Storage-Daemon channel is desynchronized. Count it and
            // drop the record rather than corrupting the open file.
            ctx.counters.errors += 1;
            return Ok(());
        }

        match header.stream_type {
            StreamType::FileData
            | StreamType::CompressedData
            | StreamType::EncryptedFileData
            | StreamType::EncryptedGzipFileData
            | StreamType::SparseData
            | StreamType::GzipData
            | StreamType::SparseGzipData => {
                active.content.push((header.stream_type, payload.to_vec()));
            }
            StreamType::SignedDigest => active.signature = Some(payload.to_vec()),
            StreamType::HfsAttributes => {
                if let Ok(info) = <[u8; FINDER_INFO_LEN]>::try_from(payload) {
                    active.finder_info = Some(info);
                }
            }
            StreamType::MacosForkData => active.mac_fork = Some(payload.to_vec()),
            StreamType::Acl(_) => active.acl_blobs.push(payload.to_vec()),
            StreamType::Xattr(_) => {
                if let Some(entry) = parse_xattr_entry(payload) {
                    active.xattr_entries.push(entry);
                }
            }
            StreamType::Md5Digest | StreamType::Sha1Digest | StreamType::Sha256Digest | StreamType::Sha512Digest => {
                if let (Some(algorithm), Ok(bytes)) =
                    (digest_algorithm_for_stream(header.stream_type), digest::decode(payload))
                {
                    active.digest = Some((algorithm, bytes));
                }
            }
            StreamType::PluginName | StreamType::RestoreObject | StreamType::ProgramNames | StreamType::ProgramData => {}
            StreamType::Unknown(_) | StreamType::UnixAttributesEx => {}
            StreamType::UnixAttributes | StreamType::EncryptedSessionData => unreachable!("handled above"),
        }
        Ok(())
    }

    /// Closes whatever file is currently open, if any, performing its
    /// filesystem write and metadata application.
    ///
    /// # Errors
    ///
    /// Returns [`fd_core::error::FileError`] if the sink's write failed or
    /// the transform chain reported a state corruption.
    pub fn close_current(&mut self, ctx: &mut SessionContext) -> Result<(), fd_core::error::FileError> {
        let Some(active) = self.current.take() else {
            return Ok(());
        };
        let path = active.path.clone();

        match active.classification {
            Some(FileType::DirectoryBegin | FileType::DirectoryEnd) => {
                let _ = self.sink.create_dir(&path);
            }
            Some(FileType::Symlink) => {
                let _ = self.sink.symlink(&path, &active.link);
            }
            Some(FileType::HardLinkSaved) => {
                let _ = self.sink.hard_link(&path, &active.link);
            }
            _ => {}
        }

        if !active.content.is_empty() {
            self.restore_content(ctx, &path, &active)?;
        }

        if let Some(backend) = self.acl_backend {
            for blob in &active.acl_blobs {
                if let Err(err) = backend.apply(std::path::Path::new(&path), blob) {
                    self.note_soft_error(ctx, fd_core::error::SoftErrorKind::Acl, &path, &err.to_string());
                }
            }
        }
        if let Some(backend) = self.xattr_backend {
            if !active.xattr_entries.is_empty() {
                if let Err(err) = backend.apply(std::path::Path::new(&path), &active.xattr_entries) {
                    self.note_soft_error(ctx, fd_core::error::SoftErrorKind::Xattr, &path, &err.to_string());
                }
            }
        }
        if let Some(info) = &active.finder_info {
            let _ = metadata::finder_info::apply_finder_info(std::path::Path::new(&path), info);
        }
        if let Some(fork) = &active.mac_fork {
            let _ = metadata::finder_info::write_resource_fork(std::path::Path::new(&path), fork);
        }

        Ok(())
    }

    /// Reverses the backup side's fixed-size content chunking. Every
    /// block belonging to the file is fed through one shared
    /// [`RestoreTransform`] in wire order, so a digest or compression
    /// dictionary carried across blocks stays consistent; a sparse
    /// block's decoded address drives zero-padding for any gap the
    /// Storage-Daemon channel skipped over rather than transmitted.
    fn restore_content(&mut self, ctx: &mut SessionContext, path: &str, active: &ActiveFile) -> Result<(), fd_core::error::FileError> {
        let stream = active.content[0].0;
        let sparse = matches!(stream, StreamType::SparseData | StreamType::SparseGzipData);
        let compressed = matches!(
            stream,
            StreamType::CompressedData | StreamType::EncryptedGzipFileData | StreamType::GzipData | StreamType::SparseGzipData
        );
        let encrypted = matches!(stream, StreamType::EncryptedFileData | StreamType::EncryptedGzipFileData);

        // `decompressed_len` is an upper-bound buffer capacity for
        // lz4/lzo (truncated to the actual decoded length) and ignored
        // entirely by zlib, so one generous constant covers every block
        // regardless of its original chunk size — the sparse address
        // prefix needed to know the exact length lives inside the
        // payload this call decodes.
        let decompressed_len = CONTENT_BLOCK_SIZE + 8;

        let options = TransformOptions {
            sparse,
            compression: compressed.then_some((compress::algorithm::CompressionAlgorithm::Gzip, 0)),
            digest: active.digest.as_ref().map(|(algo, _)| *algo),
            session_key: encrypted.then_some(self.session_key).flatten(),
        };

        let mut transform = RestoreTransform::new(options);
        let mut writer = self.sink.create(path).map_err(fd_core::error::FileError::AttributesSend)?;
        let mut write_pos: u64 = 0;
        let mut total_written: u64 = 0;

        for (_, payload) in &active.content {
            let (address, plaintext) = transform.process_block(payload, decompressed_len).map_err(fd_core::error::FileError::from)?;
            if sparse && address > write_pos {
                let gap = address - write_pos;
                let zeros = vec![0u8; gap as usize];
                std::io::Write::write_all(&mut writer, &zeros).map_err(fd_core::error::FileError::AttributesSend)?;
                write_pos = address;
            }
            std::io::Write::write_all(&mut writer, &plaintext).map_err(fd_core::error::FileError::AttributesSend)?;
            write_pos += plaintext.len() as u64;
            total_written += plaintext.len() as u64;
        }

        let recomputed = transform.finish();
        if let (Some((_, expected)), Some(actual)) = (&active.digest, &recomputed) {
            if expected != actual {
                ctx.counters.errors += 1;
                tracing::warn!(path, "restored content digest does not match the transmitted digest");
            }
        }
        if let Some(signature) = &active.signature {
            if let Some(actual) = &recomputed {
                if !verify_against_trusted_signers(self.trusted_signers, actual, signature) {
                    ctx.counters.errors += 1;
                    tracing::warn!(path, "signed digest did not verify against any trusted signer");
                }
            }
        }
        ctx.counters.bytes_read += total_written;
        Ok(())
    }

    fn note_soft_error(&self, ctx: &mut SessionContext, kind: fd_core::error::SoftErrorKind, path: &str, detail: &str) {
        if ctx.counters.record_soft_error(kind) {
            tracing::warn!(path, kind = kind.label(), detail, "soft per-file error during restore");
        }
    }
}

fn parse_xattr_entry(payload: &[u8]) -> Option<XattrEntry> {
    let nul = payload.iter().position(|&b| b == 0)?;
    let name = String::from_utf8(payload[..nul].to_vec()).ok()?;
    let value = payload[nul + 1..].to_vec();
    Some(XattrEntry { name, value })
}

/// Reverses [`crate::backup::classification_code`].
#[must_use]
const fn file_type_from_code(code: i32) -> Option<FileType> {
    Some(match code {
        0 => FileType::Regular,
        1 => FileType::EmptyRegular,
        2 => FileType::Symlink,
        3 => FileType::HardLinkSaved,
        4 => FileType::DirectoryBegin,
        5 => FileType::DirectoryEnd,
        6 => FileType::ReparsePoint,
        7 => FileType::Junction,
        8 => FileType::BlockDevice,
        9 => FileType::CharDevice,
        10 => FileType::Fifo,
        11 => FileType::Socket,
        12 => FileType::NoAccess,
        13 => FileType::NoFollow,
        14 => FileType::NoStat,
        15 => FileType::NoChange,
        16 => FileType::ArchiveBit,
        17 => FileType::NoOpen,
        18 => FileType::Deleted,
        19 => FileType::RestoreObject,
        20 => FileType::PluginConfig,
        21 => FileType::Base,
        _ => return None,
    })
}
