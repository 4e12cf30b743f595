//! Download cache for getbin.
//!
//! Two pieces live here:
//!
//! - [`fingerprint`] computes a cheap structural hash of an extracted tree
//!   from entry paths and timestamps, never reading file contents.
//! - [`CacheIndex`] persists `url -> CacheEntry` as one JSON document and
//!   serializes every read-modify-write behind a single writer section.

mod error;
mod fingerprint;
mod index;

pub use error::{CacheError, Result};
pub use fingerprint::{Fingerprint, fingerprint, fingerprint_blocking};
pub use index::{CacheEntry, CacheIndex};
