#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `crypto` implements the encryption and signing stages of the transform
//! chain (§4.2 steps 4 and 6): generating and sealing a per-job symmetric
//! session key, framing encrypted emissions, and producing/verifying PKI
//! signatures over the signing digest.
//!
//! # Design
//!
//! [`session_key`] generates the per-job AES key and seals it once per
//! recipient RSA public key, matching the `encrypted-session-data` stream
//! (§6). [`cipher`] implements the encrypt/decrypt framing: a 4-byte
//! big-endian plaintext-length prefix followed by cipher blocks, with the
//! decrypt side buffering partial blocks across calls. [`signing`] wraps
//! an RSA keypair over a SHA256 (or SHA1 fallback) digest.
//!
//! # Invariants
//!
//! - The session key is generated once per job and sealed for every
//!   recipient, self included, before any encrypted data stream.
//! - Decryption never returns partial-block residue as plaintext; residue
//!   is held until a full block or finalize arrives.
//!
//! # See also
//!
//! - `transform` for the pipeline stage that drives this crate.
//! - `checksums` for the digest families this crate signs over.

pub mod cipher;
pub mod session_key;
pub mod signing;
