//! Matching a request's OS constraint against the running host.

use serde::{Deserialize, Serialize};

use crate::{Arch, Current, Platform};

/// Restricts a request to a platform and/or an architecture.
///
/// Either field may be left out, in which case it admits anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsConstraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<Arch>,
}

impl OsConstraint {
    pub fn platform(platform: Platform) -> Self {
        Self {
            platform: Some(platform),
            arch: None,
        }
    }

    pub fn with_arch(mut self, arch: Arch) -> Self {
        self.arch = Some(arch);
        self
    }
}

/// Whether a request with `constraint` applies to `current`.
pub fn matches(constraint: Option<&OsConstraint>, current: &Current) -> bool {
    let Some(constraint) = constraint else {
        return true;
    };
    let platform_ok = constraint
        .platform
        .is_none_or(|platform| platform == current.platform);
    let arch_ok = constraint
        .arch
        .as_ref()
        .is_none_or(|arch| *arch == current.arch);
    platform_ok && arch_ok
}
