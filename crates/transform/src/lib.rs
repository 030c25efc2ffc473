#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! The per-file transform chain (§4.2): sparse-block detection,
//! compression, encryption, digesting, and signing, applied in that
//! fixed order on backup and reversed on restore. Framing (stage 7) is
//! left to the `wire` crate; this crate produces and consumes the
//! plaintext/ciphertext blocks that framing then wraps in record
//! headers.
//!
//! # Design
//!
//! [`sparse`] implements stage 2 (all-zero block suppression with an
//! 8-byte big-endian address prefix). [`compression`] implements stage 3
//! (the 12-byte compression header plus the four algorithms in
//! `compress`). [`pipeline::BackupTransform`] and
//! [`pipeline::RestoreTransform`] compose stages 2–6 into the single
//! per-file object the backup and restore orchestrators drive one block
//! at a time.
//!
//! # See also
//!
//! - `crypto` for the encryption stage's session-key sealing and signing.
//! - `checksums` for the digesting stage's hash algorithms.
//! - `wire` for the framing stage and stream-type enumeration.

pub mod compression;
pub mod pipeline;
pub mod sparse;
