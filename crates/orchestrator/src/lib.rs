#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `orchestrator` drives the two walks the File Daemon performs once a
//! session is authorized: backup (§4.4) and restore (§4.5). Both walks
//! are expressed against the [`packet::BackupSource`]/[`packet::RestoreSink`]
//! traits rather than `std::fs` directly, so the filesystem boundary
//! stays injectable for tests and, eventually, plugin I/O vectors.
//!
//! # Design
//!
//! [`backup::BackupOrchestrator`] classifies and stats each fileset
//! entry upstream, then emits the attributes record, content, and
//! metadata streams in the fixed order the restore side expects.
//! [`restore::RestoreOrchestrator`] consumes that same record order,
//! buffering everything belonging to one file-index until the next
//! attributes record (or end-of-session marker) closes it out.
//!
//! Both sides push a file's bytes through `transform`'s
//! [`transform::pipeline::BackupTransform`]/[`transform::pipeline::RestoreTransform`]
//! in fixed-size chunks (`packet::CONTENT_BLOCK_SIZE`) rather than one
//! block for the whole file, so an interior all-zero chunk of a sparse
//! file is eligible for suppression and not just a trailing run. The
//! LZO/LZ4 codecs the compression stage can select both treat their
//! `decompressed_len` argument as an upper-bound buffer capacity rather
//! than an exact length, so restore can reuse one generous constant for
//! every chunk instead of needing the exact original length of each.
//!
//! # Invariants
//!
//! - Every fileset entry produces a soft or fatal outcome, never a
//!   silent drop: skipped classifications are the only case with no
//!   wire output at all (§4.4 step 1).
//! - ACL, xattr, and Mac-fork gathering failures are soft per-file
//!   errors (§7); a file's attributes and content records are still
//!   sent even if its metadata could not be gathered.
//! - Restore never deletes or refuses a file over a digest or signature
//!   mismatch; both are logged and counted, the write already happened.
//!
//! # See also
//!
//! - `wire` for the record framing and stream-type enumeration both
//!   walks speak.
//! - `transform` for the per-file sparse/compression/encryption/digest
//!   chain.
//! - `daemon` for the session state machine that owns when these walks
//!   run.

pub mod backup;
pub mod packet;
pub mod restore;
