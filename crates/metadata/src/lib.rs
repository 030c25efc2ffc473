#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! Reads and applies the metadata surfaces beyond the plain `stat`
//! fields: ACLs, extended attributes, and (on Darwin) Finder info and
//! resource forks (§4.4 steps 8–9, §4.5 ACL/xattr/Finder-info records).
//!
//! # Design
//!
//! [`stat::collect`]/[`stat::apply`] bridge the filesystem to
//! `core::stat::FileStat`. [`acl::AclBackend`] and [`xattr::XattrBackend`]
//! are capability traits with a Unix implementation each, so the
//! orchestrators depend on the trait, not a concrete OS backend.

pub mod acl;
pub mod finder_info;
pub mod stat;
pub mod xattr;
