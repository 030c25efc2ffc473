//! The per-file backup procedure (§4.4).
//!
//! Every fileset entry the walker hands in passes through the same
//! shape: classify and skip (already done by the caller), strip the
//! reported path, emit the attributes record under a freshly assigned
//! file-index, lazily emit the sealed session key once per job, read and
//! transform content if the classification carries any, then — in this
//! fixed order — Mac resource-fork data, Finder info, ACLs, xattrs, the
//! signed digest, and finally the content digest. Any deviation in this
//! order is a bug (§4.2, §4.4). Hard-link re-saves short-circuit straight
//! to re-emitting the remembered digest.

use std::io::{Read, Write};

use fd_core::error::{FileError, SoftErrorKind};
use fd_core::file_type::FileType;
use fd_core::session::{FileIndex, SessionContext};
use crypto::session_key::SessionKey;
use metadata::acl::AclBackend;
use metadata::xattr::XattrBackend;
use rsa::{RsaPrivateKey, RsaPublicKey};
use transform::pipeline::{BackupTransform, BlockOutcome, FinishedFile, TransformOptions};
use wire::attributes::AttributesRecord;
use wire::digest;
use wire::framing::send_header;
use wire::stream_type::StreamType;

use crate::packet::{BackupSource, CONTENT_BLOCK_SIZE, FileEntry, content_stream_type, digest_stream_type, strip_path_components};

/// Drives the backup procedure for one job, writing framed records
/// directly to the Storage-Daemon channel.
pub struct BackupOrchestrator<'a, W, S, A, X> {
    writer: &'a mut W,
    source: &'a S,
    acl_backend: Option<&'a A>,
    xattr_backend: Option<&'a X>,
    signing_key: Option<&'a RsaPrivateKey>,
    encryption: Option<(SessionKey, &'a RsaPublicKey)>,
    volume_session_id: i32,
    volume_session_time: i32,
    session_key_sent: bool,
}

impl<'a, W, S, A, X> BackupOrchestrator<'a, W, S, A, X>
where
    W: Write,
    S: BackupSource,
    A: AclBackend,
    X: XattrBackend,
{
    /// Starts a new backup orchestrator for one job's Storage-Daemon
    /// channel.
    #[must_use]
    pub fn new(
        writer: &'a mut W,
        source: &'a S,
        acl_backend: Option<&'a A>,
        xattr_backend: Option<&'a X>,
        signing_key: Option<&'a RsaPrivateKey>,
        encryption: Option<(SessionKey, &'a RsaPublicKey)>,
        volume_session_id: i32,
        volume_session_time: i32,
    ) -> Self {
        Self {
            writer,
            source,
            acl_backend,
            xattr_backend,
            signing_key,
            encryption,
            volume_session_id,
            volume_session_time,
            session_key_sent: false,
        }
    }

    /// Runs the full per-file procedure for one classified, stat'd
    /// fileset entry.
    ///
    /// # Errors
    ///
    /// Returns [`FileError`] if a record could not be sent or the
    /// transform chain reported a state corruption. ACL/xattr/content
    /// read failures are soft errors (§7): they are logged up to the
    /// per-kind cap and counted, not propagated.
    pub fn backup_entry(&mut self, ctx: &mut SessionContext, entry: &FileEntry) -> Result<(), FileError> {
        ctx.counters.files_examined += 1;
        if entry.file_type.is_skipped() {
            return Ok(());
        }

        let file_index = ctx.assign_file_index();
        let path = strip_path_components(&entry.path, entry.options.strip_path);
        let attrs = AttributesRecord {
            file_index: file_index.0 as i32,
            file_type: classification_code(entry.file_type),
            path,
            attrs: entry.stat.encode_ascii(),
            link: entry.link_target.clone().unwrap_or_default(),
            ex_attrs: String::new(),
            delta: entry.delta_sequence,
        };
        self.send_record(file_index, StreamType::UnixAttributes, &attrs.encode())?;
        ctx.counters.files_sent += 1;

        if let Some(digest_bytes) = &entry.hard_link_digest {
            if let Some(algorithm) = entry.options.digest {
                self.emit_digest(ctx, file_index, digest_bytes, algorithm)?;
            }
            return Ok(());
        }

        let finished = if entry.file_type.carries_data() {
            self.backup_content(ctx, file_index, entry)?
        } else {
            None
        };

        if entry.options.mac_resource_forks && matches!(entry.file_type, FileType::Regular) {
            self.backup_mac_fork(ctx, file_index, &entry.path)?;
        }

        if entry.options.acl {
            self.backup_acl(ctx, file_index, &entry.path);
        }
        if entry.options.xattr {
            self.backup_xattr(ctx, file_index, &entry.path);
        }

        if let Some(finished) = finished {
            if let Some(signature) = &finished.signature {
                self.send_record(file_index, StreamType::SignedDigest, signature)?;
            }
            if let Some(digest_bytes) = &finished.digest {
                if let Some(algorithm) = entry.options.digest {
                    self.emit_digest(ctx, file_index, digest_bytes, algorithm)?;
                }
            }
        }

        Ok(())
    }

    /// Reads, transforms, and frames one entry's content in fixed-size
    /// chunks (§4.2 stage 1), returning the finalized digest/signature so
    /// the caller can emit them after the fork/ACL/xattr streams (§4.2,
    /// §4.4). Each chunk is fed through the transform chain with
    /// `is_terminal` set only on the file's last chunk, so interior
    /// all-zero chunks of a sparse file are eligible for suppression
    /// (§4.2 stage 2) — a whole-file single block would never suppress
    /// anything but a trailing run.
    fn backup_content(
        &mut self,
        ctx: &mut SessionContext,
        file_index: FileIndex,
        entry: &FileEntry,
    ) -> Result<Option<FinishedFile>, FileError> {
        let mut reader = match self.source.open(&entry.path) {
            Ok(r) => r,
            Err(err) => {
                self.note_soft_error(ctx, SoftErrorKind::Unreadable, &entry.path, &err.to_string());
                return Ok(None);
            }
        };
        let mut content = Vec::new();
        if let Err(err) = reader.read_to_end(&mut content) {
            self.note_soft_error(ctx, SoftErrorKind::Unreadable, &entry.path, &err.to_string());
            return Ok(None);
        }
        ctx.counters.bytes_read += content.len() as u64;

        self.emit_session_key_if_needed(ctx, file_index)?;

        let session_key = self.encryption.as_ref().map(|(key, _)| *key.bytes());
        // No wire stream type pairs sparse addressing with encryption
        // (§6); sparse detection is disabled whenever this file is also
        // being encrypted so the transform chain and the stream-type
        // choice below stay in agreement.
        let sparse = entry.options.sparse && session_key.is_none();
        let transform_options = TransformOptions {
            sparse,
            compression: entry.options.compression.map(|(algo, level)| (algo, u16::from(level))),
            digest: entry.options.digest,
            session_key,
        };
        let is_zero_length_device = content.is_empty()
            && matches!(entry.file_type, FileType::BlockDevice | FileType::CharDevice | FileType::Fifo);

        let stream = content_stream_type(entry.options.compression.map(|(algo, _)| algo), sparse, session_key.is_some());
        let mut transform = BackupTransform::new(transform_options);
        let chunks: Vec<&[u8]> = if content.is_empty() {
            vec![&content[..]]
        } else {
            content.chunks(CONTENT_BLOCK_SIZE).collect()
        };
        let last = chunks.len() - 1;
        for (index, chunk) in chunks.into_iter().enumerate() {
            let outcome = transform
                .process_block(chunk, index == last, is_zero_length_device)
                .map_err(FileError::from)?;
            if let BlockOutcome::Emit(bytes) = outcome {
                ctx.counters.bytes_sent += bytes.len() as u64;
                self.send_record(file_index, stream, &bytes)?;
            }
        }

        let finished = transform.finish(self.signing_key).map_err(FileError::from)?;
        Ok(Some(finished))
    }

    fn emit_session_key_if_needed(&mut self, ctx: &mut SessionContext, file_index: FileIndex) -> Result<(), FileError> {
        if self.session_key_sent {
            return Ok(());
        }
        let Some((key, recipient)) = &self.encryption else {
            return Ok(());
        };
        let sealed = key
            .seal_for(recipient)
            .map_err(|err| FileError::EncryptionInit(err.to_string()))?;
        self.send_record(file_index, StreamType::EncryptedSessionData, &sealed)?;
        self.session_key_sent = true;
        Ok(())
    }

    fn emit_digest(
        &mut self,
        ctx: &mut SessionContext,
        file_index: FileIndex,
        digest_bytes: &[u8],
        algorithm: checksums::strong::DigestAlgorithm,
    ) -> Result<(), FileError> {
        let stream = digest_stream_type(algorithm);
        let encoded = digest::encode(digest_bytes);
        self.send_record(file_index, stream, encoded.as_bytes())
    }

    fn backup_acl(&mut self, ctx: &mut SessionContext, file_index: FileIndex, path: &str) {
        let Some(backend) = self.acl_backend else {
            return;
        };
        match backend.gather(std::path::Path::new(path)) {
            Ok(Some(blob)) => {
                ctx.counters.bytes_sent += blob.len() as u64;
                let _ = self.send_record(file_index, StreamType::Acl(1000), &blob);
            }
            Ok(None) => {}
            Err(err) => self.note_soft_error(ctx, SoftErrorKind::Acl, path, &err.to_string()),
        }
    }

    fn backup_xattr(&mut self, ctx: &mut SessionContext, file_index: FileIndex, path: &str) {
        let Some(backend) = self.xattr_backend else {
            return;
        };
        match backend.gather(std::path::Path::new(path)) {
            Ok(entries) if !entries.is_empty() => {
                for entry in entries {
                    let mut blob = entry.name.into_bytes();
                    blob.push(0);
                    blob.extend_from_slice(&entry.value);
                    ctx.counters.bytes_sent += blob.len() as u64;
                    let _ = self.send_record(file_index, StreamType::Xattr(1900), &blob);
                }
            }
            Ok(_) => {}
            Err(err) => self.note_soft_error(ctx, SoftErrorKind::Xattr, path, &err.to_string()),
        }
    }

    fn backup_mac_fork(&mut self, ctx: &mut SessionContext, file_index: FileIndex, path: &str) -> Result<(), FileError> {
        let path = std::path::Path::new(path);
        if let Ok(fork) = metadata::finder_info::read_resource_fork(path) {
            if !fork.is_empty() {
                self.send_record(file_index, StreamType::MacosForkData, &fork)?;
            }
        }
        if let Ok(info) = metadata::finder_info::read_finder_info(path) {
            self.send_record(file_index, StreamType::HfsAttributes, &info)?;
        }
        Ok(())
    }

    fn note_soft_error(&self, ctx: &mut SessionContext, kind: SoftErrorKind, path: &str, detail: &str) {
        if ctx.counters.record_soft_error(kind) {
            tracing::warn!(path, kind = kind.label(), detail, "soft per-file error during backup");
        }
    }

    fn send_record(
        &mut self,
        file_index: FileIndex,
        stream: StreamType,
        payload: &[u8],
    ) -> Result<(), FileError> {
        send_header(
            self.writer,
            self.volume_session_id,
            self.volume_session_time,
            file_index.0 as i32,
            stream,
            payload.len() as u32,
        )
        .map_err(FileError::AttributesSend)?;
        wire::framing::send_payload(self.writer, payload).map_err(FileError::AttributesSend)
    }
}

/// The numeric classification code carried in an attributes record's
/// `<type>` field.
#[must_use]
pub const fn classification_code(file_type: FileType) -> i32 {
    match file_type {
        FileType::Regular => 0,
        FileType::EmptyRegular => 1,
        FileType::Symlink => 2,
        FileType::HardLinkSaved => 3,
        FileType::DirectoryBegin => 4,
        FileType::DirectoryEnd => 5,
        FileType::ReparsePoint => 6,
        FileType::Junction => 7,
        FileType::BlockDevice => 8,
        FileType::CharDevice => 9,
        FileType::Fifo => 10,
        FileType::Socket => 11,
        FileType::NoAccess => 12,
        FileType::NoFollow => 13,
        FileType::NoStat => 14,
        FileType::NoChange => 15,
        FileType::ArchiveBit => 16,
        FileType::NoOpen => 17,
        FileType::Deleted => 18,
        FileType::RestoreObject => 19,
        FileType::PluginConfig => 20,
        FileType::Base => 21,
    }
}
