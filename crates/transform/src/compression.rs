//! The 12-byte compression header (§4.2 stage 3) wrapping the four
//! algorithms in `compress`.
//!
//! Wire shape, all fields big-endian:
//!
//! | offset | len | field              |
//! |--------|-----|--------------------|
//! | 0      | 4   | magic (algorithm)  |
//! | 4      | 4   | compressed length  |
//! | 8      | 2   | level              |
//! | 10     | 2   | version            |
//!
//! `magic` stores [`CompressionAlgorithm::id`] zero-extended to 32 bits
//! rather than a 4-byte ASCII tag, since this domain's stream already
//! carries a separate stream-type discriminator (§6) and does not need a
//! second self-describing magic number.

use compress::algorithm::{CompressionAlgorithm, UnknownAlgorithmError};
use compress::{lz4, lzo, zlib};
use thiserror::Error;

/// Header version emitted by this implementation; bumped only if the
/// 12-byte layout itself changes.
pub const HEADER_VERSION: u16 = 1;

/// Fixed size in bytes of the compression header.
pub const HEADER_LEN: usize = 12;

/// The 12-byte compression header.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CompressionHeader {
    /// Algorithm that produced (and must reverse) the following payload.
    pub algorithm: CompressionAlgorithm,
    /// Length in bytes of the compressed payload that follows the header.
    pub compressed_length: u32,
    /// Encoder-specific level, e.g. GZIP's 0-9 deflate level.
    pub level: u16,
}

impl CompressionHeader {
    /// Serializes the header to its fixed 12-byte wire form.
    #[must_use]
    pub fn encode(self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..4].copy_from_slice(&u32::from(self.algorithm.id()).to_be_bytes());
        out[4..8].copy_from_slice(&self.compressed_length.to_be_bytes());
        out[8..10].copy_from_slice(&self.level.to_be_bytes());
        out[10..12].copy_from_slice(&HEADER_VERSION.to_be_bytes());
        out
    }

    /// Parses a header from the front of `bytes`, returning the header and
    /// the remaining slice.
    ///
    /// # Errors
    ///
    /// Returns [`CompressionError::ShortHeader`] if fewer than
    /// [`HEADER_LEN`] bytes are available, [`CompressionError::UnknownAlgorithm`]
    /// if the `magic` field names an id `compress::algorithm` does not
    /// recognise, or [`CompressionError::UnsupportedVersion`] if the header
    /// version is newer than this implementation understands.
    pub fn decode(bytes: &[u8]) -> Result<(Self, &[u8]), CompressionError> {
        if bytes.len() < HEADER_LEN {
            return Err(CompressionError::ShortHeader);
        }
        let (header, rest) = bytes.split_at(HEADER_LEN);
        let magic = u32::from_be_bytes(header[0..4].try_into().expect("4-byte slice"));
        let magic_id = u8::try_from(magic).map_err(|_| CompressionError::UnknownAlgorithm(UnknownAlgorithmError(0xFF)))?;
        let algorithm = CompressionAlgorithm::from_id(magic_id)?;
        let compressed_length = u32::from_be_bytes(header[4..8].try_into().expect("4-byte slice"));
        let level = u16::from_be_bytes(header[8..10].try_into().expect("2-byte slice"));
        let version = u16::from_be_bytes(header[10..12].try_into().expect("2-byte slice"));
        if version > HEADER_VERSION {
            return Err(CompressionError::UnsupportedVersion(version));
        }
        Ok((
            Self {
                algorithm,
                compressed_length,
                level,
            },
            rest,
        ))
    }
}

/// Errors raised while framing or parsing a compression header, or while
/// invoking the underlying codec.
#[derive(Debug, Error)]
pub enum CompressionError {
    /// Fewer than [`HEADER_LEN`] bytes were available to parse a header.
    #[error("compressed block shorter than the {HEADER_LEN}-byte header")]
    ShortHeader,
    /// The header's `magic` field did not name a known algorithm.
    #[error(transparent)]
    UnknownAlgorithm(#[from] UnknownAlgorithmError),
    /// The header declared a version newer than this implementation
    /// understands; restore must refuse rather than guess at the layout.
    #[error("compression header version {0} is newer than the supported version {HEADER_VERSION}")]
    UnsupportedVersion(u16),
    /// The declared compressed length did not match the bytes actually
    /// available after the header.
    #[error("compression header declared {declared} bytes but only {available} were available")]
    TruncatedPayload {
        /// Length declared in the header.
        declared: u32,
        /// Bytes actually present after the header.
        available: usize,
    },
    /// The underlying codec failed.
    #[error("compression codec error: {0}")]
    Codec(#[from] std::io::Error),
}

/// Compresses `block` with `algorithm` at `level`, returning the framed
/// header-plus-payload bytes.
///
/// # Errors
///
/// Propagates any I/O error the underlying codec reports.
pub fn compress_block(
    block: &[u8],
    algorithm: CompressionAlgorithm,
    level: u16,
) -> Result<Vec<u8>, CompressionError> {
    let payload = match algorithm {
        CompressionAlgorithm::Gzip => {
            let zlib_level = zlib::CompressionLevel::from_numeric(u32::from(level))
                .unwrap_or(zlib::CompressionLevel::Default);
            zlib::compress_to_vec(block, zlib_level)?
        }
        CompressionAlgorithm::Lzo1x => lzo::compress(block)?,
        CompressionAlgorithm::Lz4Fast => lz4::compress_fast(block)?,
        CompressionAlgorithm::Lz4Hc => lz4::compress_hc(block, i32::from(level))?,
    };
    let header = CompressionHeader {
        algorithm,
        compressed_length: u32::try_from(payload.len()).unwrap_or(u32::MAX),
        level,
    };
    let mut framed = Vec::with_capacity(HEADER_LEN + payload.len());
    framed.extend_from_slice(&header.encode());
    framed.extend_from_slice(&payload);
    Ok(framed)
}

/// Parses and reverses a header-plus-payload block produced by
/// [`compress_block`], given the original uncompressed length.
///
/// # Errors
///
/// See [`CompressionHeader::decode`] and [`CompressionError`].
pub fn decompress_block(framed: &[u8], decompressed_len: usize) -> Result<Vec<u8>, CompressionError> {
    let (header, rest) = CompressionHeader::decode(framed)?;
    let declared = header.compressed_length as usize;
    if rest.len() < declared {
        return Err(CompressionError::TruncatedPayload {
            declared: header.compressed_length,
            available: rest.len(),
        });
    }
    let payload = &rest[..declared];
    let out = match header.algorithm {
        CompressionAlgorithm::Gzip => zlib::decompress_to_vec(payload)?,
        CompressionAlgorithm::Lzo1x => lzo::decompress(payload, decompressed_len)?,
        CompressionAlgorithm::Lz4Fast | CompressionAlgorithm::Lz4Hc => {
            lz4::decompress_block(payload, decompressed_len)?
        }
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips_through_encode_decode() {
        let header = CompressionHeader {
            algorithm: CompressionAlgorithm::Lz4Fast,
            compressed_length: 42,
            level: 0,
        };
        let encoded = header.encode();
        let (decoded, rest) = CompressionHeader::decode(&encoded).unwrap();
        assert_eq!(decoded, header);
        assert!(rest.is_empty());
    }

    #[test]
    fn decode_rejects_short_input() {
        assert!(matches!(
            CompressionHeader::decode(&[0u8; 4]),
            Err(CompressionError::ShortHeader)
        ));
    }

    #[test]
    fn decode_rejects_newer_version() {
        let mut encoded = CompressionHeader {
            algorithm: CompressionAlgorithm::Gzip,
            compressed_length: 0,
            level: 0,
        }
        .encode();
        encoded[10..12].copy_from_slice(&(HEADER_VERSION + 1).to_be_bytes());
        assert!(matches!(
            CompressionHeader::decode(&encoded),
            Err(CompressionError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn gzip_round_trips_through_compress_and_decompress_block() {
        let payload = b"The quick brown fox jumps over the lazy dog".repeat(8);
        let framed = compress_block(&payload, CompressionAlgorithm::Gzip, 6).unwrap();
        let restored = decompress_block(&framed, payload.len()).unwrap();
        assert_eq!(restored, payload);
    }

    #[test]
    fn lz4_fast_round_trips() {
        let payload = b"lz4 fast payload repeated many times ".repeat(4);
        let framed = compress_block(&payload, CompressionAlgorithm::Lz4Fast, 0).unwrap();
        let restored = decompress_block(&framed, payload.len()).unwrap();
        assert_eq!(restored, payload);
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let payload = b"payload long enough to compress".repeat(4);
        let mut framed = compress_block(&payload, CompressionAlgorithm::Gzip, 6).unwrap();
        framed.truncate(HEADER_LEN + 1);
        assert!(matches!(
            decompress_block(&framed, payload.len()),
            Err(CompressionError::TruncatedPayload { .. })
        ));
    }
}
