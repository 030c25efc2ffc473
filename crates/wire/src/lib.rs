#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `wire` implements the Storage-Daemon record framing (§4.1) and the
//! Director command-line language (§6): the textual, line-oriented
//! protocol surface the session state machine parses and emits.
//!
//! # Design
//!
//! [`framing`] serializes/parses the fixed five-field ASCII header and
//! exposes length-bounded payload I/O. [`stream_type`] is the fixed,
//! ABI-stable stream-type enumeration dispatched on by the orchestrator.
//! [`director`] covers the Director's `key=value` command lines and
//! 4-digit response codes.
//!
//! # Invariants
//!
//! - Stream-type codes are never renumbered; unknown codes map to
//!   [`stream_type::StreamType::Unknown`] rather than failing.
//! - A framing mismatch (header/payload length disagreement) is always
//!   reported as [`framing::FramingError`], never silently truncated.
//!
//! # See also
//!
//! - `daemon` for the session state machine driving this protocol.
//! - `orchestrator` for the backup/restore stream sequencing.

pub mod attributes;
pub mod digest;
pub mod director;
pub mod framing;
pub mod stream_type;
