//! Hotkey parsing, matching and validation for hotkey-mux
//!
//! This crate turns hotkey descriptors into canonical, platform-resolved
//! values, matches key input against them, validates descriptors, and parses
//! KDL bindings files.

mod error;
mod hotkey;
pub mod keys;
mod matcher;
mod model;
mod parser;
mod platform;
mod policy;
mod validate;

pub use error::{ConfigError, InvalidDescriptorInfo, ParseError, SourceLocation, ValidationError};
pub use hotkey::{parse_hotkey, HotkeyDescriptor, ParsedHotkey, RawHotkey};
pub use keys::{canonical_key, Modifier};
pub use matcher::{matches_event, KeyInput, ModifierState};
pub use model::*;
pub use parser::{parse_config, parse_config_str};
pub use platform::Platform;
pub use policy::{ConflictBehavior, Trigger};
pub use validate::{assert_valid_hotkey, check_hotkey, validate_hotkey, ValidationResult};
