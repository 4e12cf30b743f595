//! Archive extraction with path sanitization.
//!
//! # Architecture
//!
//! - `format.rs` - Formats, codecs and inference from file names
//! - `detect.rs` - Format detection from magic bytes
//! - `sanitize.rs` - Path sanitization (zip-slip prevention)
//! - `extract.rs` - Per-format extraction into a directory

pub use detect::{detect_format, detect_from_reader};
pub use error::{Error, Result};
pub use extract::{ExtractReport, extract};
pub use format::{ArchiveFormat, Compression};

mod detect;
mod error;
mod extract;
mod format;
mod sanitize;
