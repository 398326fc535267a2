//! Platform families that change how hotkeys resolve and display

use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// The platform family a hotkey is resolved for.
///
/// The abstract `Mod` modifier is `Meta` (Command) on [`Platform::Mac`] and
/// `Control` everywhere else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Mac,
    Windows,
    Linux,
}

static DETECTED: OnceLock<Platform> = OnceLock::new();

impl Platform {
    /// Detect the platform of the running process.
    ///
    /// Detection happens once; later calls return the cached value.
    pub fn detect() -> Self {
        *DETECTED.get_or_init(|| {
            let platform = if cfg!(any(target_os = "macos", target_os = "ios")) {
                Platform::Mac
            } else if cfg!(target_os = "windows") {
                Platform::Windows
            } else {
                Platform::Linux
            };
            tracing::debug!("Detected platform: {}", platform);
            platform
        })
    }

    /// Whether this platform belongs to the Mac family.
    pub fn is_mac(self) -> bool {
        matches!(self, Platform::Mac)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Mac => write!(f, "mac"),
            Platform::Windows => write!(f, "windows"),
            Platform::Linux => write!(f, "linux"),
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mac" | "macos" | "darwin" | "ios" => Ok(Self::Mac),
            "windows" | "win" => Ok(Self::Windows),
            "linux" | "unix" => Ok(Self::Linux),
            _ => Err(format!("Unknown platform: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_is_stable() {
        assert_eq!(Platform::detect(), Platform::detect());
    }

    #[test]
    fn test_platform_from_str_aliases() {
        assert_eq!("macOS".parse::<Platform>(), Ok(Platform::Mac));
        assert_eq!("darwin".parse::<Platform>(), Ok(Platform::Mac));
        assert_eq!("Win".parse::<Platform>(), Ok(Platform::Windows));
        assert_eq!("linux".parse::<Platform>(), Ok(Platform::Linux));
        assert!("amiga".parse::<Platform>().is_err());
    }

    #[test]
    fn test_only_mac_is_mac_family() {
        assert!(Platform::Mac.is_mac());
        assert!(!Platform::Windows.is_mac());
        assert!(!Platform::Linux.is_mac());
    }
}
