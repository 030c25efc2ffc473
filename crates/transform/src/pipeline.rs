//! Per-file backup and restore transform objects composing stages 2-6 of
//! the transform chain (§4.2): sparse detection, compression, encryption,
//! digesting, and signing.
//!
//! Per the design note that a file's pipeline state should live behind a
//! single small object whose methods return a result variant rather than
//! threading five independent stage objects through the orchestrator,
//! [`BackupTransform`] and [`RestoreTransform`] each own every stage's
//! state for one file and are driven one block at a time.

use checksums::strong::{ContentDigest, DigestAlgorithm};
use compress::algorithm::CompressionAlgorithm;
use crypto::cipher;
use crypto::session_key::{SESSION_KEY_LEN, sign_digest};
use rsa::RsaPrivateKey;
use thiserror::Error;

use crate::compression::{self, CompressionError};
use crate::sparse;

/// Per-file options selecting which optional stages run, mirroring the
/// fileset option-string selections (§4.7) that feed into the transform
/// chain for one file.
#[derive(Clone, Default)]
pub struct TransformOptions {
    /// Suppress all-zero blocks (sparse-file support).
    pub sparse: bool,
    /// Compression algorithm and level, if this file is compressed.
    pub compression: Option<(CompressionAlgorithm, u16)>,
    /// Content digest algorithm, if this file is digested.
    pub digest: Option<DigestAlgorithm>,
    /// Per-job session key, if this file is encrypted.
    pub session_key: Option<[u8; SESSION_KEY_LEN]>,
}

/// The outcome of feeding one block through [`BackupTransform::process_block`].
#[derive(Debug, Eq, PartialEq)]
pub enum BlockOutcome {
    /// The block was an interior all-zero run; nothing is emitted.
    Suppressed,
    /// The fully transformed bytes ready to frame onto the wire.
    Emit(Vec<u8>),
}

/// Drives one file's data through stages 2-4 of the backup-side transform
/// chain, accumulating the digesting state (stage 5) as blocks pass
/// through.
pub struct BackupTransform {
    options: TransformOptions,
    digest: Option<ContentDigest>,
    address: u64,
}

impl BackupTransform {
    /// Starts a new transform for one file.
    #[must_use]
    pub fn new(options: TransformOptions) -> Self {
        let digest = options.digest.map(ContentDigest::new);
        Self {
            options,
            digest,
            address: 0,
        }
    }

    /// Feeds one read block through sparse detection, compression, and
    /// encryption, updating the running digest over the pre-encryption
    /// plaintext (post sparse/compression) as it goes.
    ///
    /// `is_terminal` marks the file's last block; `is_zero_length_device`
    /// marks a zero-length special file whose only block must never be
    /// suppressed (§4.2 step 2).
    ///
    /// # Errors
    ///
    /// Returns [`TransformError`] if compression fails.
    pub fn process_block(
        &mut self,
        block: &[u8],
        is_terminal: bool,
        is_zero_length_device: bool,
    ) -> Result<BlockOutcome, TransformError> {
        let block_address = self.address;
        self.address = self.address.saturating_add(block.len() as u64);

        if self.options.sparse && sparse::should_suppress(block, is_terminal, is_zero_length_device) {
            return Ok(BlockOutcome::Suppressed);
        }

        let mut staged = if self.options.sparse {
            sparse::encode_block(block_address, block)
        } else {
            block.to_vec()
        };

        if let Some((algorithm, level)) = self.options.compression {
            staged = compression::compress_block(&staged, algorithm, level)?;
        }

        if let Some(digest) = &mut self.digest {
            digest.update(&staged);
        }

        if let Some(key) = &self.options.session_key {
            staged = cipher::encrypt_emission(key, &staged);
        }

        Ok(BlockOutcome::Emit(staged))
    }

    /// Finalizes the digest (if any) and, when `signing_key` is provided,
    /// signs it, producing stage 6's `signed-digest` payload.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Signing`] if RSA signing fails.
    pub fn finish(self, signing_key: Option<&RsaPrivateKey>) -> Result<FinishedFile, TransformError> {
        let digest = self.digest.map(ContentDigest::finalize);
        let signature = match (signing_key, &digest) {
            (Some(key), Some(digest_bytes)) => {
                Some(sign_digest(key, digest_bytes).map_err(|err| TransformError::Signing(err.to_string()))?)
            }
            _ => None,
        };
        Ok(FinishedFile { digest, signature })
    }
}

/// The digest and, if requested, signature produced at the end of one
/// file's backup-side transform.
#[derive(Clone, Debug, Default)]
pub struct FinishedFile {
    /// The finalized content digest, if digesting was enabled.
    pub digest: Option<Vec<u8>>,
    /// The PKI signature over the digest, if signing was enabled.
    pub signature: Option<Vec<u8>>,
}

/// Drives one file's data through the restore-side reversal of stages 2-4,
/// in the opposite order (decrypt, decompress, de-sparse) and recomputes
/// the digest over the same post-sparse/compression bytes backup digested.
pub struct RestoreTransform {
    options: TransformOptions,
    digest: Option<ContentDigest>,
}

impl RestoreTransform {
    /// Starts a new restore-side transform for one file.
    #[must_use]
    pub fn new(options: TransformOptions) -> Self {
        let digest = options.digest.map(ContentDigest::new);
        Self { options, digest }
    }

    /// Reverses one emitted block back into plaintext file bytes, updating
    /// the running digest in the process.
    ///
    /// `decompressed_len` is the expected length of the block once
    /// decompressed, carried alongside the attributes record since the
    /// compression header alone does not name it.
    ///
    /// Returns the block's logical file address alongside its plaintext;
    /// the address is always `0` when sparse addressing is not in effect,
    /// in which case the caller should treat blocks as contiguous.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError`] if decryption or decompression fails.
    pub fn process_block(&mut self, emission: &[u8], decompressed_len: usize) -> Result<(u64, Vec<u8>), TransformError> {
        let mut staged = if let Some(key) = &self.options.session_key {
            cipher::decrypt_emission(key, emission).map_err(|err| TransformError::Cipher(err.to_string()))?
        } else {
            emission.to_vec()
        };

        if let Some(digest) = &mut self.digest {
            digest.update(&staged);
        }

        if self.options.compression.is_some() {
            staged = compression::decompress_block(&staged, decompressed_len)?;
        }

        if self.options.sparse {
            let (address, data) = sparse::decode_block(&staged).map_err(|_| TransformError::SparseFraming)?;
            Ok((address, data.to_vec()))
        } else {
            Ok((0, staged))
        }
    }

    /// Finalizes the recomputed digest for comparison against the
    /// transmitted digest and signature.
    #[must_use]
    pub fn finish(self) -> Option<Vec<u8>> {
        self.digest.map(ContentDigest::finalize)
    }
}

/// Any failure within the per-file transform chain.
#[derive(Debug, Error)]
pub enum TransformError {
    /// The compression stage failed.
    #[error(transparent)]
    Compression(#[from] CompressionError),
    /// The encryption/decryption stage failed.
    #[error("cipher error: {0}")]
    Cipher(String),
    /// Signing the finalized digest failed.
    #[error("signing error: {0}")]
    Signing(String),
    /// A sparse-data block was missing its address prefix on restore.
    #[error("sparse block framing was malformed")]
    SparseFraming,
}

impl From<TransformError> for fd_core::error::FileError {
    fn from(err: TransformError) -> Self {
        Self::Transform(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> [u8; SESSION_KEY_LEN] {
        [9u8; SESSION_KEY_LEN]
    }

    #[test]
    fn plain_round_trip_with_no_optional_stages() {
        let mut backup = BackupTransform::new(TransformOptions::default());
        let block = b"plain file contents";
        let outcome = backup.process_block(block, true, false).unwrap();
        let BlockOutcome::Emit(emitted) = outcome else {
            panic!("expected an emitted block");
        };
        assert_eq!(emitted, block);

        let mut restore = RestoreTransform::new(TransformOptions::default());
        let (address, recovered) = restore.process_block(&emitted, block.len()).unwrap();
        assert_eq!(address, 0);
        assert_eq!(recovered, block);
    }

    #[test]
    fn sparse_interior_zero_block_is_suppressed_and_tail_is_not() {
        let options = TransformOptions {
            sparse: true,
            ..Default::default()
        };
        let mut backup = BackupTransform::new(options);

        let zero_block = vec![0u8; 64];
        let outcome = backup.process_block(&zero_block, false, false).unwrap();
        assert_eq!(outcome, BlockOutcome::Suppressed);

        let tail = b"tail bytes";
        let outcome = backup.process_block(tail, true, false).unwrap();
        assert!(matches!(outcome, BlockOutcome::Emit(_)));
    }

    #[test]
    fn sparse_round_trip_preserves_address_and_bytes() {
        let options = TransformOptions {
            sparse: true,
            ..Default::default()
        };
        let mut backup = BackupTransform::new(options.clone());
        let head = vec![0u8; 64];
        let outcome = backup.process_block(&head, false, false).unwrap();
        assert_eq!(outcome, BlockOutcome::Suppressed);

        let block = b"some file bytes";
        let BlockOutcome::Emit(emitted) = backup.process_block(block, true, false).unwrap() else {
            panic!("expected emission");
        };

        let mut restore = RestoreTransform::new(options);
        let (address, recovered) = restore.process_block(&emitted, block.len() + 8).unwrap();
        assert_eq!(address, head.len() as u64);
        assert_eq!(recovered, block);
    }

    #[test]
    fn compression_and_encryption_compose_and_round_trip() {
        let options = TransformOptions {
            compression: Some((CompressionAlgorithm::Gzip, 6)),
            session_key: Some(test_key()),
            digest: Some(DigestAlgorithm::Sha256),
            ..Default::default()
        };
        let mut backup = BackupTransform::new(options.clone());
        let block = b"compressible payload compressible payload".repeat(4);
        let BlockOutcome::Emit(emitted) = backup.process_block(&block, true, false).unwrap() else {
            panic!("expected emission");
        };
        let finished = backup.finish(None).unwrap();
        assert!(finished.digest.is_some());

        let mut restore = RestoreTransform::new(options);
        let (_address, recovered) = restore.process_block(&emitted, block.len()).unwrap();
        assert_eq!(recovered, block);
        let restored_digest = restore.finish();
        assert_eq!(restored_digest, finished.digest);
    }

    #[test]
    fn signing_produces_a_signature_only_when_a_key_is_supplied() {
        use rand::rngs::OsRng;

        let options = TransformOptions {
            digest: Some(DigestAlgorithm::Sha256),
            ..Default::default()
        };
        let mut backup = BackupTransform::new(options);
        backup.process_block(b"signed content", true, false).unwrap();

        let key = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
        let finished = backup.finish(Some(&key)).unwrap();
        assert!(finished.signature.is_some());
    }

    #[test]
    fn zero_length_device_block_is_never_suppressed() {
        let options = TransformOptions {
            sparse: true,
            ..Default::default()
        };
        let mut backup = BackupTransform::new(options);
        let outcome = backup.process_block(&[0u8; 16], false, true).unwrap();
        assert!(matches!(outcome, BlockOutcome::Emit(_)));
    }

    fn round_trip_blocks(options: TransformOptions, blocks: &[Vec<u8>]) -> Vec<u8> {
        let mut backup = BackupTransform::new(options.clone());
        let mut restore = RestoreTransform::new(options);
        let mut recovered = Vec::new();
        for (i, block) in blocks.iter().enumerate() {
            let is_terminal = i == blocks.len() - 1;
            match backup.process_block(block, is_terminal, false).unwrap() {
                BlockOutcome::Suppressed => recovered.extend(std::iter::repeat(0u8).take(block.len())),
                BlockOutcome::Emit(emitted) => {
                    let (_address, plaintext) = restore.process_block(&emitted, block.len() + 8).unwrap();
                    recovered.extend(plaintext);
                }
            }
        }
        recovered
    }

    proptest::proptest! {
        #[test]
        fn plain_blocks_round_trip_for_arbitrary_content(blocks in proptest::collection::vec(proptest::collection::vec(proptest::prelude::any::<u8>(), 0..256), 1..8)) {
            let recovered = round_trip_blocks(TransformOptions::default(), &blocks);
            let expected: Vec<u8> = blocks.into_iter().flatten().collect();
            proptest::prelude::prop_assert_eq!(recovered, expected);
        }

        #[test]
        fn sparse_blocks_round_trip_with_interior_zero_runs(
            head in proptest::collection::vec(proptest::prelude::any::<u8>(), 1..64),
            zero_run_len in 1usize..64,
            tail in proptest::collection::vec(proptest::prelude::any::<u8>(), 1..64),
        ) {
            let zero_run = vec![0u8; zero_run_len];
            let blocks = vec![head.clone(), zero_run.clone(), tail.clone()];
            let options = TransformOptions { sparse: true, ..Default::default() };
            let recovered = round_trip_blocks(options, &blocks);
            let mut expected = head;
            expected.extend(vec![0u8; zero_run_len]);
            expected.extend(tail);
            proptest::prelude::prop_assert_eq!(recovered, expected);
        }
    }
}
