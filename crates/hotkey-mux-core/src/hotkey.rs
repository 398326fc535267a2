//! Hotkey descriptors and their canonical parsed form
//!
//! A descriptor is what a caller writes (`"Mod+Shift+S"` or a [`RawHotkey`]);
//! a [`ParsedHotkey`] is the platform-resolved value every other component
//! works with. No abstract `Mod` survives parsing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::keys::{canonical_key, Modifier, ModifierToken};
use crate::platform::Platform;

/// Canonical, platform-resolved hotkey.
///
/// Two descriptors that denote the same shortcut on a platform parse to equal
/// values, so equality here is what conflict detection compares.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedHotkey {
    /// Canonical key name (see [`canonical_key`])
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl ParsedHotkey {
    /// A hotkey with no modifiers.
    pub fn new(key: &str) -> Self {
        Self {
            key: canonical_key(key),
            ctrl: false,
            shift: false,
            alt: false,
            meta: false,
        }
    }

    /// Add a required modifier.
    pub fn with(mut self, modifier: Modifier) -> Self {
        self.set(modifier, true);
        self
    }

    /// Whether the given modifier must be held.
    pub fn requires(&self, modifier: Modifier) -> bool {
        match modifier {
            Modifier::Control => self.ctrl,
            Modifier::Alt => self.alt,
            Modifier::Shift => self.shift,
            Modifier::Meta => self.meta,
        }
    }

    fn set(&mut self, modifier: Modifier, value: bool) {
        match modifier {
            Modifier::Control => self.ctrl = value,
            Modifier::Alt => self.alt = value,
            Modifier::Shift => self.shift = value,
            Modifier::Meta => self.meta = value,
        }
    }

    /// Required modifiers in canonical order (Control, Alt, Shift, Meta).
    pub fn modifiers(&self) -> Vec<Modifier> {
        Modifier::ALL
            .into_iter()
            .filter(|m| self.requires(*m))
            .collect()
    }

    /// The modifier whose key is this hotkey's primary key, for
    /// modifier-only bindings such as `"Shift"`.
    pub fn key_modifier(&self) -> Option<Modifier> {
        Modifier::from_key_name(&self.key)
    }

    /// Render for humans on a platform: `⌃⇧K` on the Mac family,
    /// `Ctrl+Shift+K` elsewhere.
    pub fn display_for(&self, platform: Platform) -> String {
        let mods = self.modifiers();
        if platform.is_mac() {
            let mut out: String = mods.iter().map(|m| m.mac_symbol()).collect();
            out.push_str(&self.key);
            out
        } else {
            let mut parts: Vec<&str> = mods.iter().map(|m| m.label()).collect();
            parts.push(&self.key);
            parts.join("+")
        }
    }
}

/// Canonical string form: `Control+Alt+Shift+Meta+Key`.
///
/// Re-parsing this string yields an identical value on every platform.
impl fmt::Display for ParsedHotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in self.modifiers() {
            write!(f, "{}+", modifier)?;
        }
        write!(f, "{}", self.key)
    }
}

/// Structured descriptor: explicit modifier flags plus a key.
///
/// `mod` resolves exactly like the `Mod` token of a string descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawHotkey {
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub alt: bool,
    #[serde(default)]
    pub meta: bool,
    #[serde(default, rename = "mod")]
    pub mod_key: bool,
}

impl RawHotkey {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }

    pub fn ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn alt(mut self) -> Self {
        self.alt = true;
        self
    }

    pub fn meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// Require the platform's primary modifier.
    pub fn with_mod(mut self) -> Self {
        self.mod_key = true;
        self
    }
}

/// What a caller hands to the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HotkeyDescriptor {
    Text(String),
    Raw(RawHotkey),
}

impl HotkeyDescriptor {
    /// Parse this descriptor for a platform.
    pub fn parse(&self, platform: Platform) -> Result<ParsedHotkey, ParseError> {
        parse_hotkey(self, platform)
    }
}

impl fmt::Display for HotkeyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HotkeyDescriptor::Text(text) => f.write_str(text),
            HotkeyDescriptor::Raw(raw) => {
                if raw.ctrl {
                    f.write_str("Control+")?;
                }
                if raw.alt {
                    f.write_str("Alt+")?;
                }
                if raw.shift {
                    f.write_str("Shift+")?;
                }
                if raw.meta {
                    f.write_str("Meta+")?;
                }
                if raw.mod_key {
                    f.write_str("Mod+")?;
                }
                f.write_str(&raw.key)
            }
        }
    }
}

impl From<&str> for HotkeyDescriptor {
    fn from(text: &str) -> Self {
        HotkeyDescriptor::Text(text.to_string())
    }
}

impl From<String> for HotkeyDescriptor {
    fn from(text: String) -> Self {
        HotkeyDescriptor::Text(text)
    }
}

impl From<&String> for HotkeyDescriptor {
    fn from(text: &String) -> Self {
        HotkeyDescriptor::Text(text.clone())
    }
}

impl From<RawHotkey> for HotkeyDescriptor {
    fn from(raw: RawHotkey) -> Self {
        HotkeyDescriptor::Raw(raw)
    }
}

impl From<&ParsedHotkey> for HotkeyDescriptor {
    fn from(parsed: &ParsedHotkey) -> Self {
        HotkeyDescriptor::Raw(RawHotkey {
            key: parsed.key.clone(),
            ctrl: parsed.ctrl,
            shift: parsed.shift,
            alt: parsed.alt,
            meta: parsed.meta,
            mod_key: false,
        })
    }
}

/// Parse a descriptor into its canonical form for a platform.
///
/// # Format
///
/// String descriptors are `[Modifier+]...Key`:
/// - Components are separated by `+`; whitespace around them is ignored
/// - Modifiers are case-insensitive: `Control`/`Ctrl`, `Shift`, `Alt`/`Option`,
///   `Meta`/`Cmd`/`Command`/`Windows`/`Super`, and `Mod`
/// - The last non-modifier component is the key; a literal plus key is
///   written `Control++`
/// - A descriptor made only of modifiers binds the last one as the key
///   (`"Shift"`, `"Control+Shift"`)
///
/// # Errors
///
/// Returns [`ParseError`] if:
/// - The input is empty or whitespace-only
/// - A component before the key is not a recognized modifier
/// - A component is empty (`"Control+"`, `"+S"`)
///
/// # Examples
///
/// ```ignore
/// let parsed = parse_hotkey(&"Mod+S".into(), Platform::Mac)?;
/// assert!(parsed.meta && !parsed.ctrl);
///
/// let parsed = parse_hotkey(&"Mod+S".into(), Platform::Linux)?;
/// assert!(parsed.ctrl && !parsed.meta);
/// ```
pub fn parse_hotkey(
    descriptor: &HotkeyDescriptor,
    platform: Platform,
) -> Result<ParsedHotkey, ParseError> {
    match descriptor {
        HotkeyDescriptor::Text(text) => parse_text(text, platform),
        HotkeyDescriptor::Raw(raw) => parse_raw(raw, platform),
    }
}

fn parse_text(input: &str, platform: Platform) -> Result<ParsedHotkey, ParseError> {
    let input = input.trim();

    if input.is_empty() {
        return Err(ParseError::Empty);
    }

    // A trailing "++" (or a lone "+") names the plus key itself
    let (head, plus_key) = if input == "+" {
        ("", true)
    } else if let Some(head) = input.strip_suffix("++") {
        (head, true)
    } else {
        (input, false)
    };

    let mut parts: Vec<&str> = if head.is_empty() {
        Vec::new()
    } else {
        head.split('+').map(|s| s.trim()).collect()
    };
    if plus_key {
        parts.push("+");
    }

    if parts.iter().any(|p| p.is_empty()) {
        return Err(ParseError::MissingKey {
            input: input.to_string(),
        });
    }

    let key_index = parts
        .iter()
        .rposition(|part| ModifierToken::parse(part).is_none());

    let mut parsed;
    let modifier_parts: Vec<&str> = match key_index {
        Some(index) => {
            parsed = ParsedHotkey::new(parts[index]);
            parts
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, part)| *part)
                .collect()
        }
        None => {
            // Modifier-only binding: the last modifier is the key
            let (last, rest) = parts.split_last().ok_or_else(|| ParseError::MissingKey {
                input: input.to_string(),
            })?;
            let key = ModifierToken::parse(last)
                .map(|token| token.resolve(platform).key_name())
                .unwrap_or(*last);
            parsed = ParsedHotkey::new(key);
            rest.to_vec()
        }
    };

    for part in modifier_parts {
        match ModifierToken::parse(part) {
            Some(token) => parsed.set(token.resolve(platform), true),
            None => {
                return Err(ParseError::UnknownModifier {
                    input: input.to_string(),
                    token: part.to_string(),
                });
            }
        }
    }

    Ok(parsed)
}

fn parse_raw(raw: &RawHotkey, platform: Platform) -> Result<ParsedHotkey, ParseError> {
    if raw.key.trim().is_empty() && raw.key != " " {
        return Err(ParseError::Empty);
    }

    // A raw key names one key; a '+' inside it would spell a combination
    // that the canonical text form cannot parse back.
    let trimmed = raw.key.trim();
    if trimmed != "+" && trimmed.contains('+') {
        if trimmed.ends_with('+') {
            return Err(ParseError::MissingKey {
                input: raw.key.clone(),
            });
        }
        let token = trimmed.split('+').next().unwrap_or_default();
        return Err(ParseError::UnknownModifier {
            input: raw.key.clone(),
            token: token.to_string(),
        });
    }

    let key = match ModifierToken::parse(&raw.key) {
        Some(token) => token.resolve(platform).key_name().to_string(),
        None => canonical_key(&raw.key),
    };

    let mut parsed = ParsedHotkey {
        key,
        ctrl: raw.ctrl,
        shift: raw.shift,
        alt: raw.alt,
        meta: raw.meta,
    };
    if raw.mod_key {
        parsed.set(ModifierToken::Mod.resolve(platform), true);
    }

    Ok(parsed)
}
