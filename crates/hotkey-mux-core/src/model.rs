//! Bindings file data model

use crate::policy::{ConflictBehavior, Trigger};
use crate::platform::Platform;

/// Root of a bindings file
#[derive(Debug, Clone, Default)]
pub struct BindingsConfig {
    pub settings: Settings,
    pub elements: Vec<ElementSpec>,
    pub hotkeys: Vec<HotkeyBinding>,
    pub sequences: Vec<SequenceBinding>,
    /// Scripted input played back by `hotkey-mux replay`
    pub replay: Vec<ReplayStep>,
}

/// Global settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Overrides platform detection when set
    pub platform: Option<Platform>,
    pub log_level: LogLevel,
    /// Default timeout for sequences that don't set their own
    pub sequence_timeout_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            platform: None,
            log_level: LogLevel::Warn,
            sequence_timeout_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

/// A named UI element that hotkeys can be scoped to and replay can focus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSpec {
    pub name: String,
    /// Tag or input type, e.g. "div", "input", "textarea", "select"
    pub kind: String,
    /// Name of the enclosing element, if any
    pub parent: Option<String>,
    pub editable: bool,
}

/// A single-key hotkey and the action it reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyBinding {
    /// Descriptor as written (e.g., "Mod+S")
    pub hotkey: String,
    pub action: String,
    /// Element name; `None` binds at document level
    pub scope: Option<String>,
    pub trigger: Trigger,
    pub enabled: bool,
    pub prevent_default: bool,
    pub stop_propagation: bool,
    pub require_reset: bool,
    pub ignore_inputs: bool,
    pub conflict: ConflictBehavior,
}

impl HotkeyBinding {
    pub fn new(hotkey: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            hotkey: hotkey.into(),
            action: action.into(),
            scope: None,
            trigger: Trigger::Press,
            enabled: true,
            prevent_default: true,
            stop_propagation: true,
            require_reset: false,
            ignore_inputs: true,
            conflict: ConflictBehavior::Warn,
        }
    }
}

/// An ordered key sequence and the action it reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceBinding {
    /// Steps as written, e.g. ["g", "g"]
    pub steps: Vec<String>,
    pub action: String,
    /// Falls back to `Settings::sequence_timeout_ms`
    pub timeout_ms: Option<u64>,
}

/// A single step of a replay script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayStep {
    /// Move focus to a named element; `None` focuses the document body
    Focus(Option<String>),
    /// Press (and hold) a key or combo
    Press(String),
    /// Release a key or combo
    Release(String),
    /// Press and release a key or combo
    Tap(String),
    /// Delay in milliseconds
    Delay(u64),
}
