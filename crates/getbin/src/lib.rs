//! Fetch platform-specific prebuilt binaries once and reuse them.
//!
//! A batch of [`BinarySpec`]s is filtered by platform, validated, and each
//! surviving request is resolved independently:
//!
//! 1. a `PATH` lookup of its command names,
//! 2. a previously recorded download whose fingerprint still matches,
//! 3. an existing `dir/name` target,
//! 4. otherwise a fresh download, extraction and cache write.
//!
//! One request failing never prevents the others from resolving; see
//! [`Getbin::get_all`].

mod batch;
mod error;
pub mod manifest;
mod pipeline;
pub mod progress;
mod request;
mod resolver;
pub mod settings;

pub use batch::{BatchReport, Getbin, RequestFailure};
pub use error::{Error, Result};
pub use manifest::Manifest;
pub use request::{BinaryRequest, BinarySpec, CommandNames, LocalHints, LocalHintsSpec, OsConstraintSpec};
pub use resolver::{ResolvedBinary, Source};
pub use settings::Settings;
