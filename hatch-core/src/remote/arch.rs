//! Host CPU architecture and the artifact name it maps to

use std::fmt;

use super::error::RemoteError;

/// OS family every published artifact targets
pub const OS_FAMILY: &str = std::env::consts::OS;

/// The two architectures releases are published for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    Arm64,
    X86,
}

impl Arch {
    /// Detect the architecture this process runs on
    pub fn detect() -> Result<Self, RemoteError> {
        Self::from_target(std::env::consts::ARCH)
    }

    /// Map a Rust target architecture name
    pub fn from_target(arch: &str) -> Result<Self, RemoteError> {
        match arch {
            "aarch64" => Ok(Self::Arm64),
            "x86_64" => Ok(Self::X86),
            other => Err(RemoteError::InvalidArch {
                arch: other.to_string(),
            }),
        }
    }

    /// Name used in artifact file names
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Arm64 => "arm64",
            Self::X86 => "x86",
        }
    }

    /// Release asset name: `{os-family}_{arch}.zip`
    pub fn artifact_name(self) -> String {
        format!("{}_{}.zip", OS_FAMILY, self.as_str())
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
