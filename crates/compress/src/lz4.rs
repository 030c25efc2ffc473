//! LZ4 block compression in both fast and high-compression modes.
//!
//! Unlike [`crate::zlib`], LZ4 here operates on whole blocks rather than a
//! streaming encoder: the transform chain's sparse-detection stage already
//! hands it one block at a time, and LZ4's block API avoids the frame
//! overhead (magic bytes, content checksums) that a streaming frame format
//! would add per block.

use std::io;

use lz4::block::{CompressionMode, compress, decompress};

/// Compresses `input` in LZ4 fast mode.
///
/// # Errors
///
/// Returns an [`io::Error`] if the underlying LZ4 encoder fails.
pub fn compress_fast(input: &[u8]) -> io::Result<Vec<u8>> {
    compress(input, Some(CompressionMode::FAST(1)), false)
}

/// Compresses `input` in LZ4 high-compression mode at the given level
/// (`1..=12`; higher trades CPU time for a smaller block).
///
/// # Errors
///
/// Returns an [`io::Error`] if the underlying LZ4 encoder fails.
pub fn compress_hc(input: &[u8], level: i32) -> io::Result<Vec<u8>> {
    compress(input, Some(CompressionMode::HIGHCOMPRESSION(level)), false)
}

/// Decompresses an LZ4 block produced by either [`compress_fast`] or
/// [`compress_hc`] into exactly `decompressed_len` bytes.
///
/// # Errors
///
/// Returns an [`io::Error`] if the block is truncated or corrupt.
pub fn decompress_block(input: &[u8], decompressed_len: usize) -> io::Result<Vec<u8>> {
    decompress(input, Some(decompressed_len as i32))
}
