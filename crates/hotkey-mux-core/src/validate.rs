//! Static checks on hotkey descriptors
//!
//! [`validate_hotkey`] never fails: parse failures become `errors`, and
//! combinations that parse but behave badly on real keyboards become
//! `warnings`. The throwing and logging wrappers are both derived from the
//! same [`ValidationResult`].

use serde::Serialize;

use crate::error::ValidationError;
use crate::hotkey::{parse_hotkey, HotkeyDescriptor};
use crate::keys::{is_digit, is_known_key, is_letter};
use crate::platform::Platform;

/// Outcome of validating one descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Validate a descriptor for a platform.
///
/// Warnings (the result stays valid):
/// - Alt + letter alone on the Mac family (Option types accented characters)
/// - Shift + digit alone (the symbol on a digit varies across layouts)
/// - Alt + Shift + letter
/// - A key outside the recognized key table
pub fn validate_hotkey(descriptor: &HotkeyDescriptor, platform: Platform) -> ValidationResult {
    let parsed = match parse_hotkey(descriptor, platform) {
        Ok(parsed) => parsed,
        Err(e) => {
            return ValidationResult {
                valid: false,
                errors: vec![e.to_string()],
                warnings: Vec::new(),
            };
        }
    };

    let mut warnings = Vec::new();
    let letter = is_letter(&parsed.key);

    if platform.is_mac() && letter && parsed.alt && !parsed.ctrl && !parsed.shift && !parsed.meta
    {
        warnings.push(format!(
            "Alt+{} types a special character on macOS and may never reach the page",
            parsed.key
        ));
    }

    if is_digit(&parsed.key) && parsed.shift && !parsed.ctrl && !parsed.alt && !parsed.meta {
        warnings.push(format!(
            "Shift+{} produces a different symbol on different keyboard layouts",
            parsed.key
        ));
    }

    if letter && parsed.alt && parsed.shift {
        warnings.push(format!(
            "Alt+Shift+{} is used for input switching or special characters on some systems",
            parsed.key
        ));
    }

    if !is_known_key(&parsed.key) {
        warnings.push(format!("Unknown key '{}'", parsed.key));
    }

    ValidationResult {
        valid: true,
        errors: Vec::new(),
        warnings,
    }
}

/// Validate and fail on errors. Warnings are ignored.
pub fn assert_valid_hotkey(
    descriptor: &HotkeyDescriptor,
    platform: Platform,
) -> Result<ValidationResult, ValidationError> {
    let result = validate_hotkey(descriptor, platform);
    if result.valid {
        Ok(result)
    } else {
        Err(ValidationError {
            descriptor: descriptor.to_string(),
            errors: result.errors,
        })
    }
}

/// Validate, log every finding, and report validity. Never fails.
pub fn check_hotkey(descriptor: &HotkeyDescriptor, platform: Platform) -> bool {
    let result = validate_hotkey(descriptor, platform);

    for error in &result.errors {
        tracing::error!(hotkey = %descriptor, "{}", error);
    }
    for warning in &result.warnings {
        tracing::warn!(hotkey = %descriptor, "{}", warning);
    }

    result.valid
}
