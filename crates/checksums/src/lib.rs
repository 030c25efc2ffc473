#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `checksums` provides the content-digest primitives the transform chain
//! uses when backing up and restoring files. It exposes MD5, SHA1, SHA256,
//! and SHA512 behind a common [`strong::StrongDigest`] trait so the
//! orchestrator can select an algorithm per fileset entry without branching
//! on the concrete hasher type, and a [`strong::ContentDigest`] enum for the
//! common case of choosing the algorithm at runtime.
//!
//! # Design
//!
//! SHA256 plays two roles: it may be the selected content digest, and it is
//! unconditionally the signing digest fed into PKI signature generation
//! (falling back to SHA1 only when a SHA256 implementation is unavailable,
//! per the transform chain's signing stage).
//!
//! # Invariants
//!
//! - Every digest streams data incrementally and never panics; failures
//!   surface through the standard digest traits only at the type level
//!   (there is no fallible `update`).
//! - `ContentDigest::finalize` returns the raw digest bytes; callers base64-
//!   encode them when framing the wire-format digest stream.
//!
//! # Examples
//!
//! ```
//! use checksums::strong::{ContentDigest, DigestAlgorithm};
//!
//! let mut digest = ContentDigest::new(DigestAlgorithm::Sha256);
//! digest.update(b"plaintext block");
//! let bytes = digest.finalize();
//! assert_eq!(bytes.len(), 32);
//! ```

pub mod strong;
