#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `filters` holds the fileset data model (§3) and the line-oriented
//! parser for the Director's fileset definition (§4.7): the fixed
//! one-letter line codes and the single-character option-string grammar.
//!
//! # Design
//!
//! [`fileset::Fileset`] accumulates `I`/`E`/`F`/`P`/`R`/`W`/`O`/`B`/`X`/
//! `Z`/`N`/`G` lines into ordered include/exclude entries. A parse failure
//! sets a sticky error flag; every line after that point is silently
//! dropped, matching the upstream parser's behavior. [`option`] decodes
//! the per-entry option string into a typed [`option::OptionBlock`].
//! [`matcher`] turns a committed fileset into something a directory
//! walker can query per path.
//!
//! # See also
//!
//! - `accurate` for how `accurate_opts`/`basejob_opts` drive the
//!   change-detection comparison.
//! - `orchestrator` for how a committed fileset drives the backup walk.

pub mod fileset;
pub mod matcher;
pub mod option;
