#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `daemon` owns everything about one Director connection that is not the
//! backup/restore walk itself (that is `orchestrator`'s job): the
//! connection's [`state::SessionState`] machine (§4.6), the heartbeat
//! thread that keeps the Director channel alive while a job runs (§5),
//! admin command dispatch and status reporting (§4.6 supplement), the
//! clock-sync sub-protocol for `since_utime` jobs, change-detection
//! back-end selection (§9), and the config resource-block parser (§6).
//!
//! # Design
//!
//! [`session::JobSessionFactory`] holds the process-wide resources
//! ([`platform::process_locks::ProcessLocks`]) that must be constructed
//! once and outlive every individual [`session::JobSession`]; sessions
//! never own or re-create them (§5 supplement). The heartbeat thread in
//! [`heartbeat`] and the session thread each hold an independent handle
//! over the shared Storage-Daemon/Director transport, coordinated only by
//! a [`core::cancel::CancelToken`] — never a shared mutable session
//! pointer (§9).
//!
//! # Invariants
//!
//! - [`state::SessionState::Closed`] is terminal; no event moves a session
//!   out of it.
//! - A Director `EOF` closes the session from any state, regardless of
//!   what job work was in flight.
//! - Admin commands other than `status`/`.status` are only dispatched in
//!   [`state::SessionState::Ready`], and only ever for a non-monitor
//!   director.
//!
//! # See also
//!
//! - `orchestrator` for the backup/restore walks this crate's `backing_up`
//!   and `restoring` states run.
//! - `wire` for the Director command-line parsing this crate's `admin`
//!   module builds on.

pub mod accurate_select;
pub mod admin;
pub mod clock_sync;
pub mod config;
pub mod heartbeat;
pub mod job_commands;
pub mod session;
pub mod state;
pub mod status;
