use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::StageError;

/// Target platforms the orchestrator builds the SDK for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetPlatform {
    Win64,
    Win32,
    Linux,
    LinuxArm64,
    Mac,
}

/// Host family, which decides how files are copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformFamily {
    Windows,
    Posix,
}

impl TargetPlatform {
    pub const ALL: [TargetPlatform; 5] = [
        TargetPlatform::Win64,
        TargetPlatform::Win32,
        TargetPlatform::Linux,
        TargetPlatform::LinuxArm64,
        TargetPlatform::Mac,
    ];

    /// Name used for the `Binaries/<platform>` directory.
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetPlatform::Win64 => "Win64",
            TargetPlatform::Win32 => "Win32",
            TargetPlatform::Linux => "Linux",
            TargetPlatform::LinuxArm64 => "LinuxArm64",
            TargetPlatform::Mac => "Mac",
        }
    }

    pub fn family(&self) -> PlatformFamily {
        match self {
            TargetPlatform::Win64 | TargetPlatform::Win32 => PlatformFamily::Windows,
            _ => PlatformFamily::Posix,
        }
    }

    pub fn host() -> Self {
        if cfg!(target_os = "windows") {
            if cfg!(target_pointer_width = "32") {
                TargetPlatform::Win32
            } else {
                TargetPlatform::Win64
            }
        } else if cfg!(target_os = "macos") {
            TargetPlatform::Mac
        } else if cfg!(target_arch = "aarch64") {
            TargetPlatform::LinuxArm64
        } else {
            TargetPlatform::Linux
        }
    }
}

impl FromStr for TargetPlatform {
    type Err = StageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept the orchestrator's names plus the common aliases it emits
        match s.to_ascii_lowercase().as_str() {
            "win64" | "windows" | "x64" => Ok(TargetPlatform::Win64),
            "win32" | "x86" => Ok(TargetPlatform::Win32),
            "linux" | "linux64" => Ok(TargetPlatform::Linux),
            "linuxarm64" | "linuxaarch64" => Ok(TargetPlatform::LinuxArm64),
            "mac" | "macos" | "osx" => Ok(TargetPlatform::Mac),
            _ => Err(StageError::UnknownPlatform(s.to_string())),
        }
    }
}

impl fmt::Display for TargetPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_identifiers() {
        assert_eq!("Win64".parse::<TargetPlatform>().unwrap(), TargetPlatform::Win64);
        assert_eq!("win32".parse::<TargetPlatform>().unwrap(), TargetPlatform::Win32);
        assert_eq!("LINUX".parse::<TargetPlatform>().unwrap(), TargetPlatform::Linux);
        assert_eq!("macos".parse::<TargetPlatform>().unwrap(), TargetPlatform::Mac);
    }

    #[test]
    fn test_unknown_platform() {
        let err = "PlayStation".parse::<TargetPlatform>().unwrap_err();
        assert!(matches!(err, StageError::UnknownPlatform(ref s) if s == "PlayStation"));
    }

    #[test]
    fn test_families() {
        assert_eq!(TargetPlatform::Win64.family(), PlatformFamily::Windows);
        assert_eq!(TargetPlatform::Win32.family(), PlatformFamily::Windows);
        assert_eq!(TargetPlatform::Linux.family(), PlatformFamily::Posix);
        assert_eq!(TargetPlatform::Mac.family(), PlatformFamily::Posix);
    }

    #[test]
    fn test_names_round_trip_through_parse() {
        for platform in TargetPlatform::ALL {
            assert_eq!(platform.as_str().parse::<TargetPlatform>().unwrap(), platform);
        }
    }

    #[test]
    fn test_host_matches_build_os() {
        let host = TargetPlatform::host();
        if cfg!(target_os = "windows") {
            assert_eq!(host.family(), PlatformFamily::Windows);
        } else {
            assert_eq!(host.family(), PlatformFamily::Posix);
        }
    }
}
