//! LZO1X block compression at its one fixed, non-negotiable level.
//!
//! Bareos-lineage file daemons expose LZO1X alongside GZIP and LZ4 as a
//! compression choice but, unlike GZIP, do not allow a level to be tuned —
//! the option grammar's `Z<level>` only ever drives the GZIP/LZ4 knobs, and
//! selecting `lzo1x` always runs the library's default single-pass mode.

use std::io;

/// Compresses `input` with LZO1X.
///
/// # Errors
///
/// Returns an [`io::Error`] if the underlying compressor fails.
pub fn compress(input: &[u8]) -> io::Result<Vec<u8>> {
    lzokay_native::compress(input)
        .map_err(|err| io::Error::other(format!("lzo1x compress failed: {err:?}")))
}

/// Decompresses an LZO1X block into exactly `decompressed_len` bytes.
///
/// # Errors
///
/// Returns an [`io::Error`] if the block is truncated or corrupt.
pub fn decompress(input: &[u8], decompressed_len: usize) -> io::Result<Vec<u8>> {
    let mut reader = io::Cursor::new(input);
    lzokay_native::decompress(&mut reader, Some(decompressed_len))
        .map_err(|err| io::Error::other(format!("lzo1x decompress failed: {err:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_arbitrary_data() {
        let data = b"lzo1x test payload, repeated. ".repeat(64);
        let compressed = compress(&data).unwrap();
        let restored = decompress(&compressed, data.len()).unwrap();
        assert_eq!(restored, data);
    }

    #[test]
    fn round_trips_empty_input() {
        let compressed = compress(&[]).unwrap();
        let restored = decompress(&compressed, 0).unwrap();
        assert!(restored.is_empty());
    }
}
