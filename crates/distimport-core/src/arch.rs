//! Supported distro architectures.

use std::fmt;
use std::str::FromStr;

use crate::error::ImportError;

/// Architecture accepted by the import command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    I386,
    X86_64,
    Arm,
}

impl Arch {
    /// Canonical lowercase name, as passed to `cobbler import --arch=`.
    pub fn as_str(self) -> &'static str {
        match self {
            Arch::I386 => "i386",
            Arch::X86_64 => "x86_64",
            Arch::Arm => "arm",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Arch {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [Arch::I386, Arch::X86_64, Arch::Arm]
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ImportError::UnsupportedArch(s.to_string()))
    }
}
