//! cachemgr core: transport-agnostic primitives for the cache manager
//! (`cache_object://`) status protocol.
//!
//! This crate defines the request encoding, the PROXY v1 preamble, response
//! head parsing, report line decoding, and the error surface shared by the
//! exporter. It carries no runtime or socket dependencies so it can be reused
//! with any transport.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed server output must surface as `CacheMgrError`/`LineError` so a
//! misbehaving proxy cannot crash the process.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;
pub mod record;

/// Shared result type.
pub use error::{CacheMgrError, ErrorKind, LineError, Result};
pub use record::{FetchOutcome, Record};
