//! Compression algorithm enumeration shared by the transform chain.
//!
//! The four algorithms below are the ones a fileset entry's option block can
//! select (`Z<level>` in the option-string grammar). Each carries a fixed
//! numeric id that becomes the `magic` field of the 12-byte compression
//! header the transform chain prefixes to every compressed emission; the ids
//! are part of the wire contract and must not be renumbered.

use std::fmt;

use thiserror::Error;

/// Compression algorithms the transform chain can select per file.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CompressionAlgorithm {
    /// Deflate-based compression, levels 0-9.
    Gzip,
    /// LZO1X with a fixed, non-negotiable compression level.
    Lzo1x,
    /// LZ4 in its fast (low-latency) mode.
    Lz4Fast,
    /// LZ4 in high-compression mode.
    Lz4Hc,
}

impl CompressionAlgorithm {
    /// Numeric id stored in the compression header's `magic` field.
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Gzip => 1,
            Self::Lzo1x => 2,
            Self::Lz4Fast => 3,
            Self::Lz4Hc => 4,
        }
    }

    /// Recovers an algorithm from a header `magic` byte.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownAlgorithmError`] for any id outside the fixed set
    /// above; restore treats this as a hard error rather than silently
    /// skipping the block.
    pub fn from_id(id: u8) -> Result<Self, UnknownAlgorithmError> {
        match id {
            1 => Ok(Self::Gzip),
            2 => Ok(Self::Lzo1x),
            3 => Ok(Self::Lz4Fast),
            4 => Ok(Self::Lz4Hc),
            other => Err(UnknownAlgorithmError(other)),
        }
    }

    /// Canonical lowercase name used in diagnostics and the `Z` option string.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Lzo1x => "lzo1x",
            Self::Lz4Fast => "lz4",
            Self::Lz4Hc => "lz4hc",
        }
    }
}

impl fmt::Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A compression header `magic` byte did not match any known algorithm.
///
/// Per the open questions in the core design, restore treats a missing or
/// unrecognised codec as fatal rather than silently passing the block
/// through.
#[derive(Debug, Error)]
#[error("unknown compression algorithm id {0}")]
pub struct UnknownAlgorithmError(pub u8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trips_through_from_id() {
        for algo in [
            CompressionAlgorithm::Gzip,
            CompressionAlgorithm::Lzo1x,
            CompressionAlgorithm::Lz4Fast,
            CompressionAlgorithm::Lz4Hc,
        ] {
            assert_eq!(CompressionAlgorithm::from_id(algo.id()).unwrap(), algo);
        }
    }

    #[test]
    fn unknown_id_is_rejected() {
        assert!(CompressionAlgorithm::from_id(0xFF).is_err());
    }
}
