#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `core` holds the types shared by every other crate in this workspace:
//! the session context, the job and file-classification vocabulary, the
//! four-kind error taxonomy, per-job counters, and the cooperative
//! cancellation flag. Nothing in here talks to a socket or the filesystem;
//! those live in `wire`, `transform`, `orchestrator`, and `daemon`.
//!
//! # Design
//!
//! Error handling follows the severity levels this workspace observes
//! throughout: fatal session errors abort the job, fatal per-file errors
//! abort one file and continue, soft per-file errors are rate-limited and
//! logged, and informational events are logged once. See [`error`] and
//! [`severity`].
//!
//! # See also
//!
//! - `daemon` for the state machine that owns a [`session::SessionContext`].
//! - `orchestrator` for the backup/restore loops that consult
//!   [`file_type::FileType`] and [`error::JobError`].

pub mod cancel;
pub mod counters;
pub mod error;
pub mod file_type;
pub mod job;
pub mod session;
pub mod severity;
pub mod stat;
