//! Shared test fixtures for the File Daemon workspace.
//!
//! # Overview
//!
//! Every crate in this workspace that needs a fake filesystem, a canned
//! fileset, a deterministic RSA keypair, or an in-memory Storage-Daemon
//! channel pulls it from here instead of re-deriving its own. Keeping
//! these fixtures in one place means a change to a trait they implement
//! (`orchestrator::packet::BackupSource`, for instance) only needs
//! updating once.
//!
//! # Design
//!
//! Fixtures favor real production types (`orchestrator::packet::FileEntry`,
//! `wire::framing::RecordHeader`) over ad hoc stand-ins, so tests built on
//! them exercise the same code paths production callers do.
//!
//! # See also
//!
//! - [`filesystem`] — an in-memory `BackupSource`/`RestoreSink`.
//! - [`fileset`] — a fixed, ordered list of fileset entries.
//! - [`keys`] — deterministic canned RSA keypairs.
//! - [`sd_channel`] — an in-memory duplex Storage-Daemon channel.

pub mod fileset;
pub mod filesystem;
pub mod keys;
pub mod sd_channel;
