//! Per-registration policy enums shared by the dispatcher and the config

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which key event phase fires a registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    #[default]
    Press,
    Release,
}

impl std::str::FromStr for Trigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "press" | "keydown" | "down" => Ok(Self::Press),
            "release" | "keyup" | "up" => Ok(Self::Release),
            _ => Err(format!("Unknown trigger: {}", s)),
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Press => write!(f, "press"),
            Trigger::Release => write!(f, "release"),
        }
    }
}

/// What to do when a new registration has the same hotkey and scope as an
/// existing one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictBehavior {
    /// Log a warning; both registrations stay active
    #[default]
    Warn,
    /// Refuse the new registration
    Error,
    /// Unregister the existing registration first
    Replace,
    /// Keep both, silently
    Allow,
}

impl std::str::FromStr for ConflictBehavior {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "replace" => Ok(Self::Replace),
            "allow" => Ok(Self::Allow),
            _ => Err(format!("Unknown conflict behavior: {}", s)),
        }
    }
}

impl fmt::Display for ConflictBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictBehavior::Warn => write!(f, "warn"),
            ConflictBehavior::Error => write!(f, "error"),
            ConflictBehavior::Replace => write!(f, "replace"),
            ConflictBehavior::Allow => write!(f, "allow"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_from_str() {
        assert_eq!("keydown".parse::<Trigger>(), Ok(Trigger::Press));
        assert_eq!("Release".parse::<Trigger>(), Ok(Trigger::Release));
        assert!("hold".parse::<Trigger>().is_err());
    }

    #[test]
    fn test_conflict_from_str() {
        assert_eq!("replace".parse::<ConflictBehavior>(), Ok(ConflictBehavior::Replace));
        assert_eq!("WARNING".parse::<ConflictBehavior>(), Ok(ConflictBehavior::Warn));
        assert!("ignore".parse::<ConflictBehavior>().is_err());
    }
}
