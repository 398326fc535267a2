//! Matching live key input against a parsed hotkey
//!
//! A match requires:
//! 1. The pressed key equals the hotkey's key (case-insensitive, alias-folded)
//! 2. Each of the four modifier flags equals the hotkey's flag EXACTLY
//!    (no extra modifiers, no missing modifiers)
//!
//! Example: for `Control+Shift+Q`:
//! - Matches: Control held, Shift held, Q pressed
//! - No match: Control held, Q pressed (missing Shift)
//! - No match: Control, Shift and Alt held, Q pressed (extra modifier)

use crate::hotkey::ParsedHotkey;
use crate::keys::{canonical_key, key_from_code, Modifier};
use crate::platform::Platform;

/// Modifier flags reported by a key event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ModifierState {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl ModifierState {
    pub const NONE: Self = Self {
        ctrl: false,
        shift: false,
        alt: false,
        meta: false,
    };

    /// Flags that exactly embody a parsed hotkey.
    pub fn of(hotkey: &ParsedHotkey) -> Self {
        Self {
            ctrl: hotkey.ctrl,
            shift: hotkey.shift,
            alt: hotkey.alt,
            meta: hotkey.meta,
        }
    }

    pub fn get(&self, modifier: Modifier) -> bool {
        match modifier {
            Modifier::Control => self.ctrl,
            Modifier::Alt => self.alt,
            Modifier::Shift => self.shift,
            Modifier::Meta => self.meta,
        }
    }

    pub fn set(&mut self, modifier: Modifier, value: bool) {
        match modifier {
            Modifier::Control => self.ctrl = value,
            Modifier::Alt => self.alt = value,
            Modifier::Shift => self.shift = value,
            Modifier::Meta => self.meta = value,
        }
    }

    pub fn any(&self) -> bool {
        self.ctrl || self.shift || self.alt || self.meta
    }
}

/// Anything that reports a pressed key and modifier flags.
pub trait KeyInput {
    /// Logical key name as reported by the event source
    fn key(&self) -> &str;

    /// Physical key code (`KeyA`, `Digit1`), when the source reports one
    fn code(&self) -> Option<&str> {
        None
    }

    fn modifiers(&self) -> ModifierState;
}

/// Does `input` trigger `hotkey` on `platform`?
///
/// For a modifier-only binding (`"Shift"`) the flag of the key's own modifier
/// is not compared, since pressing Shift reports `shift=true`.
///
/// When the logical key differs but the event carries a letter or digit code,
/// the code is tried instead while Shift is held (layouts move symbols onto
/// digits) or while Alt is held on the Mac family (Option composes accented
/// characters).
pub fn matches_event(input: &impl KeyInput, hotkey: &ParsedHotkey, platform: Platform) -> bool {
    let mods = input.modifiers();
    let own = hotkey.key_modifier();

    let modifiers_match = Modifier::ALL
        .into_iter()
        .filter(|m| Some(*m) != own)
        .all(|m| mods.get(m) == hotkey.requires(m));
    if !modifiers_match {
        return false;
    }

    let key = canonical_key(input.key());
    if key.eq_ignore_ascii_case(&hotkey.key) {
        return true;
    }

    let composes = mods.shift || (mods.alt && platform.is_mac());
    if composes {
        if let Some(from_code) = input.code().and_then(key_from_code) {
            return from_code.eq_ignore_ascii_case(&hotkey.key);
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkey::{parse_hotkey, HotkeyDescriptor};

    struct Press {
        key: &'static str,
        code: Option<&'static str>,
        mods: ModifierState,
    }

    impl KeyInput for Press {
        fn key(&self) -> &str {
            self.key
        }

        fn code(&self) -> Option<&str> {
            self.code
        }

        fn modifiers(&self) -> ModifierState {
            self.mods
        }
    }

    fn press(key: &'static str, mods: ModifierState) -> Press {
        Press {
            key,
            code: None,
            mods,
        }
    }

    fn parse(text: &str, platform: Platform) -> ParsedHotkey {
        parse_hotkey(&HotkeyDescriptor::from(text), platform).expect("should parse")
    }

    fn ctrl_shift() -> ModifierState {
        ModifierState {
            ctrl: true,
            shift: true,
            ..ModifierState::NONE
        }
    }

    #[test]
    fn test_match_exact_modifiers() {
        let hotkey = parse("Control+Shift+Q", Platform::Linux);
        assert!(matches_event(&press("q", ctrl_shift()), &hotkey, Platform::Linux));
        assert!(matches_event(&press("Q", ctrl_shift()), &hotkey, Platform::Linux));
    }

    #[test]
    fn test_no_match_extra_modifier() {
        let hotkey = parse("Control+Shift+Q", Platform::Linux);
        let mods = ModifierState {
            alt: true,
            ..ctrl_shift()
        };
        assert!(!matches_event(&press("q", mods), &hotkey, Platform::Linux));
    }

    #[test]
    fn test_no_match_missing_modifier() {
        let hotkey = parse("Control+Shift+Q", Platform::Linux);
        let mods = ModifierState {
            ctrl: true,
            ..ModifierState::NONE
        };
        assert!(!matches_event(&press("q", mods), &hotkey, Platform::Linux));
    }

    #[test]
    fn test_no_match_wrong_key() {
        let hotkey = parse("Control+Shift+Q", Platform::Linux);
        assert!(!matches_event(&press("w", ctrl_shift()), &hotkey, Platform::Linux));
    }

    #[test]
    fn test_single_flag_flip_breaks_match() {
        for platform in [Platform::Mac, Platform::Windows, Platform::Linux] {
            let hotkey = parse("Mod+Alt+K", platform);
            let exact = ModifierState::of(&hotkey);
            assert!(matches_event(&press("k", exact), &hotkey, platform));

            for modifier in Modifier::ALL {
                let mut flipped = exact;
                flipped.set(modifier, !exact.get(modifier));
                assert!(
                    !matches_event(&press("k", flipped), &hotkey, platform),
                    "flipping {} should break the match on {}",
                    modifier,
                    platform
                );
            }
        }
    }

    #[test]
    fn test_event_key_alias_folding() {
        let hotkey = parse("Escape", Platform::Linux);
        assert!(matches_event(&press("Esc", ModifierState::NONE), &hotkey, Platform::Linux));

        let hotkey = parse("Space", Platform::Linux);
        assert!(matches_event(&press(" ", ModifierState::NONE), &hotkey, Platform::Linux));
    }

    #[test]
    fn test_modifier_only_binding() {
        let hotkey = parse("Shift", Platform::Linux);
        let mods = ModifierState {
            shift: true,
            ..ModifierState::NONE
        };
        assert!(matches_event(&press("Shift", mods), &hotkey, Platform::Linux));
        assert!(!matches_event(&press("Shift", ctrl_shift()), &hotkey, Platform::Linux));
    }

    #[test]
    fn test_code_fallback_with_shift() {
        let hotkey = parse("Shift+1", Platform::Linux);
        let mods = ModifierState {
            shift: true,
            ..ModifierState::NONE
        };
        let event = Press {
            key: "!",
            code: Some("Digit1"),
            mods,
        };
        assert!(matches_event(&event, &hotkey, Platform::Linux));
    }

    #[test]
    fn test_code_fallback_alt_only_on_mac() {
        let mods = ModifierState {
            alt: true,
            ..ModifierState::NONE
        };
        let event = Press {
            key: "ß",
            code: Some("KeyS"),
            mods,
        };
        assert!(matches_event(&event, &parse("Alt+S", Platform::Mac), Platform::Mac));
        assert!(!matches_event(&event, &parse("Alt+S", Platform::Linux), Platform::Linux));
    }
}
