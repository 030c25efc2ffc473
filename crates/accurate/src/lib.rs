#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `accurate` implements the change-detection store (§4.3): a keyed
//! record of every path the Director believes was previously backed up,
//! with a seen-bitmap used to find deleted files at job end.
//!
//! # Design
//!
//! [`store::ChangeDetectionStore`] is the capability interface (§9:
//! "no base class required"), implemented by [`memory::MemoryStore`] (an
//! in-memory hash table) and [`lmdb::LmdbStore`] (a disk-backed ordered-
//! key store with a single writer transaction). Both assign dense,
//! monotonic file numbers on [`store::ChangeDetectionStore::add`] and
//! unify "mark seen" on the [`store::EntryHandle`] returned by lookup,
//! per the Open Questions resolution in the design notes.
//!
//! # Invariants
//!
//! - File numbers are dense and monotonic from 1.
//! - The seen-bitmap always covers every assigned file number.
//!
//! # See also
//!
//! - `orchestrator` for `accurate_check_file`, the per-file decision
//!   function built on top of this store.
//! - `core::stat` for the `FileStat`/`AccurateCompareOptions` types used
//!   to decide whether a looked-up entry still matches.

pub mod lmdb;
pub mod memory;
pub mod store;
