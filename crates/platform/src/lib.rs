#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(clippy::undocumented_unsafe_blocks)]

//! # Overview
//!
//! Process-wide daemon resources that do not belong to any one session:
//! the two mutexes named in §5/§9 (authentication-failure-sleep
//! serialization, VSS-initialization serialization), PID file and state
//! file management (§6), and daemonization (§6's CLI entry point).
//!
//! This crate is where the daemon's few genuinely unsafe operations
//! (forking, `setsid`) are isolated, mirroring how the rest of the
//! workspace keeps `unsafe` out of its higher-level crates.

pub mod daemonize;
pub mod pidfile;
pub mod privilege;
pub mod process_locks;
