//! Architecture detection and alias normalization.

use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static CURRENT: Lazy<Arch> = Lazy::new(|| Arch::parse(&sysinfo::System::cpu_arch()));

/// CPU architecture.
///
/// Well-known spellings collapse onto one variant so that `x64`, `amd64` and
/// `x86_64` all compare equal. Anything else is kept as a lowercase string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Arch {
    X86,
    X86_64,
    Arm,
    Arm64,
    Other(String),
}

impl Arch {
    pub fn parse(raw: &str) -> Self {
        let lowered = raw.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "x86" | "ia32" | "i386" | "i686" => Self::X86,
            "x64" | "x86_64" | "amd64" => Self::X86_64,
            "arm" | "armv7l" | "armv7" => Self::Arm,
            "arm64" | "aarch64" => Self::Arm64,
            _ => Self::Other(lowered),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::X86 => "x86",
            Self::X86_64 => "x86_64",
            Self::Arm => "arm",
            Self::Arm64 => "arm64",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Arch {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<Arch> for String {
    fn from(arch: Arch) -> Self {
        arch.as_str().to_string()
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Detect the current architecture.
pub fn detect() -> Arch {
    CURRENT.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_collapse() {
        assert_eq!(Arch::parse("x64"), Arch::X86_64);
        assert_eq!(Arch::parse("AMD64"), Arch::X86_64);
        assert_eq!(Arch::parse("x86_64"), Arch::X86_64);
        assert_eq!(Arch::parse("aarch64"), Arch::Arm64);
        assert_eq!(Arch::parse("arm64"), Arch::Arm64);
        assert_eq!(Arch::parse("ia32"), Arch::X86);
    }

    #[test]
    fn unknown_arch_is_case_folded() {
        assert_eq!(Arch::parse("RISCV64"), Arch::Other("riscv64".into()));
        assert_eq!(Arch::parse("riscv64"), Arch::parse("RiscV64"));
    }

    #[test]
    fn detect_is_stable() {
        assert_eq!(detect(), detect());
    }
}
