//! Platform detection and constraint matching.
//!
//! A request may restrict itself to one operating system and, optionally, one
//! CPU architecture. [`matches`] decides whether such a constraint admits the
//! running machine; absent fields admit anything.

pub use arch::Arch;
pub use error::{Error, Result};
pub use matcher::{OsConstraint, matches};
pub use os::Platform;

pub mod arch;
pub mod dir;
mod error;
mod matcher;
pub mod os;

/// The platform and architecture of the running process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Current {
    pub platform: Platform,
    pub arch: Arch,
}

impl Current {
    /// Detect the running platform. Detection is cached for the process lifetime.
    pub fn detect() -> Self {
        Self {
            platform: os::detect(),
            arch: arch::detect(),
        }
    }
}

impl std::fmt::Display for Current {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.platform, self.arch)
    }
}
