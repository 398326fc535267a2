//! Key-name table: canonical names, aliases and modifier tokens
//!
//! Every key name that enters the crate (from a descriptor, an event or a
//! sequence step) goes through [`canonical_key`] so that comparisons are
//! case-insensitive and alias-folded in one place.

use std::fmt;

use crate::platform::Platform;

/// A concrete modifier key, after `Mod` has been resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Modifier {
    Control,
    Alt,
    Shift,
    Meta,
}

impl Modifier {
    pub const ALL: [Modifier; 4] = [
        Modifier::Control,
        Modifier::Alt,
        Modifier::Shift,
        Modifier::Meta,
    ];

    /// Canonical key name of this modifier (as reported by a key event).
    pub fn key_name(self) -> &'static str {
        match self {
            Modifier::Control => "Control",
            Modifier::Alt => "Alt",
            Modifier::Shift => "Shift",
            Modifier::Meta => "Meta",
        }
    }

    /// The modifier whose physical key has the given name, if any.
    pub fn from_key_name(name: &str) -> Option<Self> {
        match canonical_key(name).as_str() {
            "Control" => Some(Modifier::Control),
            "Alt" => Some(Modifier::Alt),
            "Shift" => Some(Modifier::Shift),
            "Meta" => Some(Modifier::Meta),
            _ => None,
        }
    }

    /// Symbol used when rendering for the Mac family.
    pub fn mac_symbol(self) -> &'static str {
        match self {
            Modifier::Control => "⌃",
            Modifier::Alt => "⌥",
            Modifier::Shift => "⇧",
            Modifier::Meta => "⌘",
        }
    }

    /// Label used when rendering for Windows and Linux.
    pub fn label(self) -> &'static str {
        match self {
            Modifier::Control => "Ctrl",
            Modifier::Alt => "Alt",
            Modifier::Shift => "Shift",
            Modifier::Meta => "Meta",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_name())
    }
}

/// A modifier token as written in a descriptor, before platform resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierToken {
    Concrete(Modifier),
    /// `Mod`: Meta on the Mac family, Control elsewhere
    Mod,
}

impl ModifierToken {
    /// Parse a modifier token (case-insensitive, alias-folded).
    ///
    /// Recognized names:
    /// - Control: "control", "ctrl", "ctl"
    /// - Shift: "shift"
    /// - Alt: "alt", "option", "opt"
    /// - Meta: "meta", "cmd", "command", "windows", "win", "super", "os"
    /// - Mod: "mod", "cmdorctrl", "commandorcontrol"
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_uppercase().as_str() {
            "CONTROL" | "CTRL" | "CTL" => Some(Self::Concrete(Modifier::Control)),
            "SHIFT" => Some(Self::Concrete(Modifier::Shift)),
            "ALT" | "OPTION" | "OPT" => Some(Self::Concrete(Modifier::Alt)),
            "META" | "CMD" | "COMMAND" | "WINDOWS" | "WIN" | "SUPER" | "OS" => {
                Some(Self::Concrete(Modifier::Meta))
            }
            "MOD" | "CMDORCTRL" | "COMMANDORCONTROL" => Some(Self::Mod),
            _ => None,
        }
    }

    /// Resolve `Mod` for a platform.
    pub fn resolve(self, platform: Platform) -> Modifier {
        match self {
            Self::Concrete(modifier) => modifier,
            Self::Mod if platform.is_mac() => Modifier::Meta,
            Self::Mod => Modifier::Control,
        }
    }
}

/// Look up the canonical name of a recognized key.
///
/// Returns `None` for names outside the table; such keys are still usable
/// (see [`canonical_key`]) but the validator flags them.
pub fn lookup_key(name: &str) -> Option<&'static str> {
    if name == " " {
        return Some("Space");
    }
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return None;
    }
    let upper = trimmed.to_uppercase();

    let canonical = match upper.as_str() {
        // Modifiers
        "CONTROL" | "CTRL" | "CTL" => "Control",
        "SHIFT" => "Shift",
        "ALT" | "OPTION" | "OPT" | "ALTGRAPH" => "Alt",
        "META" | "CMD" | "COMMAND" | "WINDOWS" | "WIN" | "SUPER" | "OS" => "Meta",

        // Special keys
        "ESCAPE" | "ESC" => "Escape",
        "ENTER" | "RETURN" => "Enter",
        "TAB" => "Tab",
        "SPACE" | "SPACEBAR" => "Space",
        "BACKSPACE" => "Backspace",
        "DELETE" | "DEL" => "Delete",
        "INSERT" | "INS" => "Insert",
        "CAPSLOCK" | "CAPS_LOCK" | "CAPS" => "CapsLock",
        "NUMLOCK" | "NUM_LOCK" => "NumLock",
        "SCROLLLOCK" | "SCROLL_LOCK" => "ScrollLock",
        "PRINTSCREEN" | "PRTSC" | "PRINT" => "PrintScreen",
        "PAUSE" | "BREAK" => "Pause",
        "CONTEXTMENU" | "MENU" | "APPS" => "ContextMenu",

        // Arrow keys
        "ARROWUP" | "UP" | "UPARROW" => "ArrowUp",
        "ARROWDOWN" | "DOWN" | "DOWNARROW" => "ArrowDown",
        "ARROWLEFT" | "LEFT" | "LEFTARROW" => "ArrowLeft",
        "ARROWRIGHT" | "RIGHT" | "RIGHTARROW" => "ArrowRight",

        // Navigation keys
        "HOME" => "Home",
        "END" => "End",
        "PAGEUP" | "PGUP" => "PageUp",
        "PAGEDOWN" | "PGDN" | "PGDOWN" => "PageDown",

        // Symbol keys
        "-" | "MINUS" => "-",
        "=" | "EQUAL" | "EQUALS" => "=",
        "+" | "PLUS" => "+",
        "[" | "BRACKETLEFT" | "LEFTBRACE" => "[",
        "]" | "BRACKETRIGHT" | "RIGHTBRACE" => "]",
        ";" | "SEMICOLON" => ";",
        "'" | "QUOTE" | "APOSTROPHE" => "'",
        "`" | "BACKQUOTE" | "GRAVE" => "`",
        "\\" | "BACKSLASH" => "\\",
        "," | "COMMA" => ",",
        "." | "PERIOD" | "DOT" => ".",
        "/" | "SLASH" => "/",

        _ => return lookup_letter_digit_function(&upper),
    };

    Some(canonical)
}

const LETTERS: [&str; 26] = [
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R",
    "S", "T", "U", "V", "W", "X", "Y", "Z",
];

const DIGITS: [&str; 10] = ["0", "1", "2", "3", "4", "5", "6", "7", "8", "9"];

const FUNCTION_KEYS: [&str; 24] = [
    "F1", "F2", "F3", "F4", "F5", "F6", "F7", "F8", "F9", "F10", "F11", "F12", "F13", "F14",
    "F15", "F16", "F17", "F18", "F19", "F20", "F21", "F22", "F23", "F24",
];

fn lookup_letter_digit_function(upper: &str) -> Option<&'static str> {
    LETTERS
        .iter()
        .chain(DIGITS.iter())
        .chain(FUNCTION_KEYS.iter())
        .find(|candidate| **candidate == upper)
        .copied()
}

/// Canonicalize a key name.
///
/// Recognized names fold to their table entry (`"esc"` → `"Escape"`,
/// `"a"` → `"A"`). Unrecognized names are trimmed and folded to an initial
/// capital (`"mediaPlayPause"` → `"Mediaplaypause"`), so two spellings that
/// differ only in case canonicalize identically.
pub fn canonical_key(name: &str) -> String {
    if let Some(known) = lookup_key(name) {
        return known.to_string();
    }
    let mut chars = name.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Whether a key name is in the recognized key table.
pub fn is_known_key(name: &str) -> bool {
    lookup_key(name).is_some()
}

/// Whether a key name names one of the four modifier keys.
pub fn is_modifier_key(name: &str) -> bool {
    Modifier::from_key_name(name).is_some()
}

/// Whether two key names denote the same key.
pub fn keys_equal(a: &str, b: &str) -> bool {
    canonical_key(a).eq_ignore_ascii_case(&canonical_key(b))
}

/// Whether a canonical key is a single ASCII letter.
pub fn is_letter(key: &str) -> bool {
    key.len() == 1 && key.chars().all(|c| c.is_ascii_alphabetic())
}

/// Whether a canonical key is a single ASCII digit.
pub fn is_digit(key: &str) -> bool {
    key.len() == 1 && key.chars().all(|c| c.is_ascii_digit())
}

/// Derive a key name from a physical key code (`KeyA` → `A`, `Digit1` → `1`).
///
/// Only letter and digit codes are translated; other codes return `None`.
pub fn key_from_code(code: &str) -> Option<String> {
    let rest = code
        .strip_prefix("Key")
        .or_else(|| code.strip_prefix("Digit"))?;
    if is_letter(rest) || is_digit(rest) {
        Some(rest.to_uppercase())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_aliases() {
        assert_eq!(canonical_key("Esc"), "Escape");
        assert_eq!(canonical_key("del"), "Delete");
        assert_eq!(canonical_key("Return"), "Enter");
        assert_eq!(canonical_key("up"), "ArrowUp");
        assert_eq!(canonical_key(" "), "Space");
        assert_eq!(canonical_key("pgdn"), "PageDown");
    }

    #[test]
    fn test_canonical_case_folding() {
        assert_eq!(canonical_key("a"), "A");
        assert_eq!(canonical_key("f5"), "F5");
        assert_eq!(canonical_key("ESCAPE"), "Escape");
        assert_eq!(canonical_key("capslock"), "CapsLock");
    }

    #[test]
    fn test_canonical_modifier_keys() {
        assert_eq!(canonical_key("ctrl"), "Control");
        assert_eq!(canonical_key("Option"), "Alt");
        assert_eq!(canonical_key("Cmd"), "Meta");
        assert_eq!(canonical_key("Windows"), "Meta");
    }

    #[test]
    fn test_unknown_key_folded() {
        assert!(!is_known_key("MediaPlayPause"));
        assert_eq!(canonical_key("MediaPlayPause"), "Mediaplaypause");
        assert_eq!(canonical_key("mediaplaypause"), canonical_key("MEDIAPLAYPAUSE"));
        assert_eq!(canonical_key(" BrowserBack "), "Browserback");
        assert_eq!(canonical_key("é"), "É");
        assert!(keys_equal("mediaplaypause", "MediaPlayPause"));
    }

    #[test]
    fn test_modifier_token_resolution() {
        assert_eq!(
            ModifierToken::parse("mod").map(|t| t.resolve(Platform::Mac)),
            Some(Modifier::Meta)
        );
        assert_eq!(
            ModifierToken::parse("Mod").map(|t| t.resolve(Platform::Windows)),
            Some(Modifier::Control)
        );
        assert_eq!(
            ModifierToken::parse("command"),
            Some(ModifierToken::Concrete(Modifier::Meta))
        );
        assert_eq!(ModifierToken::parse("Hyper"), None);
    }

    #[test]
    fn test_key_from_code() {
        assert_eq!(key_from_code("KeyS"), Some("S".to_string()));
        assert_eq!(key_from_code("Digit7"), Some("7".to_string()));
        assert_eq!(key_from_code("Numpad7"), None);
        assert_eq!(key_from_code("KeyEnter"), None);
    }

    #[test]
    fn test_modifier_from_key_name() {
        assert_eq!(Modifier::from_key_name("Control"), Some(Modifier::Control));
        assert_eq!(Modifier::from_key_name("cmd"), Some(Modifier::Meta));
        assert_eq!(Modifier::from_key_name("S"), None);
    }
}
