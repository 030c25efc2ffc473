#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `compress` provides the compression primitives the transform chain's
//! compression stage selects between: GZIP (raw deflate), LZO1X, and LZ4 in
//! its fast and high-compression modes. Higher layers (`transform`) own the
//! 12-byte per-block header framing; this crate only compresses and
//! decompresses raw byte buffers.
//!
//! # Design
//!
//! [`zlib`] implements a streaming encoder/decoder on top of
//! [`flate2`](https://docs.rs/flate2) since GZIP blocks benefit from
//! incremental writes. [`lz4`] and [`lzo`] operate on whole blocks, matching
//! how the sparse-detection stage already hands data to the compressor one
//! fixed-size block at a time.
//!
//! # Invariants
//!
//! - Encoders and decoders never allocate internal output buffers beyond
//!   their return value; callers own buffer reuse.
//! - Errors surface as [`std::io::Error`] so they integrate with the rest of
//!   the workspace's error handling.
//!
//! # Examples
//!
//! ```
//! use compress::zlib::{CompressionLevel, compress_to_vec, decompress_to_vec};
//!
//! # fn main() -> std::io::Result<()> {
//! let data = b"streaming example payload";
//! let compressed = compress_to_vec(data, CompressionLevel::Default)?;
//! let decompressed = decompress_to_vec(&compressed)?;
//! assert_eq!(decompressed, data);
//! # Ok(())
//! # }
//! ```
//!
//! # See also
//!
//! - [`algorithm`] for the [`algorithm::CompressionAlgorithm`] enum shared
//!   with the compression header in `transform`.
//! - `transform` for the pipeline that frames these primitives onto the wire.

pub mod algorithm;
mod common;
pub mod lz4;
pub mod lzo;
pub mod zlib;

pub use common::CountingSink;
