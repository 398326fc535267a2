//! Keyboard state tracking
//!
//! Turns a stream of bare key-down/key-up names into [`KeyboardEvent`]s
//! carrying the modifier flags and repeat bit a real keyboard would report.
//!
//! ## State
//!
//! - `held_modifiers`: modifier keys currently down
//! - `held_keys`: every key currently down (canonical names)
//! - `focus`: the target new events originate at

use std::collections::HashSet;

use hotkey_mux_core::keys::{is_digit, is_letter};
use hotkey_mux_core::{canonical_key, Modifier, ModifierState, ParsedHotkey};

use crate::event::KeyboardEvent;
use crate::target::Target;

#[derive(Debug, Clone)]
pub struct KeyboardState {
    held_modifiers: HashSet<Modifier>,
    held_keys: HashSet<String>,
    focus: Target,
}

impl Default for KeyboardState {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyboardState {
    pub fn new() -> Self {
        Self {
            held_modifiers: HashSet::new(),
            held_keys: HashSet::new(),
            focus: Target::Document,
        }
    }

    /// Move focus; later events originate at `target`.
    pub fn focus(&mut self, target: impl Into<Target>) {
        self.focus = target.into();
    }

    pub fn focused(&self) -> &Target {
        &self.focus
    }

    pub fn modifiers(&self) -> ModifierState {
        let mut state = ModifierState::NONE;
        for modifier in &self.held_modifiers {
            state.set(*modifier, true);
        }
        state
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.held_keys.contains(&canonical_key(key))
    }

    /// Forget every held key, e.g. after the device was lost.
    pub fn clear(&mut self) {
        self.held_modifiers.clear();
        self.held_keys.clear();
    }

    /// A key went down. Pressing a key that is already down is a repeat.
    pub fn key_down(&mut self, key: &str) -> KeyboardEvent {
        let name = canonical_key(key);
        if let Some(modifier) = Modifier::from_key_name(&name) {
            self.held_modifiers.insert(modifier);
        }
        let repeat = !self.held_keys.insert(name.clone());

        let event = self.event(KeyboardEvent::press(&name), &name);
        if repeat {
            event.repeating()
        } else {
            event
        }
    }

    /// A key went up. Releasing a modifier clears its flag on this event.
    pub fn key_up(&mut self, key: &str) -> KeyboardEvent {
        let name = canonical_key(key);
        if let Some(modifier) = Modifier::from_key_name(&name) {
            self.held_modifiers.remove(&modifier);
        }
        self.held_keys.remove(&name);

        self.event(KeyboardEvent::release(&name), &name)
    }

    fn event(&self, event: KeyboardEvent, name: &str) -> KeyboardEvent {
        let event = event
            .with_modifiers(self.modifiers())
            .from_origin(self.focus.clone());
        match physical_code(name) {
            Some(code) => event.with_code(&code),
            None => event,
        }
    }

    /// Press a whole combination: required modifiers in canonical order,
    /// then the key. A modifier that is itself the key is pressed once.
    pub fn press_combo(&mut self, hotkey: &ParsedHotkey) -> Vec<KeyboardEvent> {
        let own = hotkey.key_modifier();
        let mut events: Vec<KeyboardEvent> = hotkey
            .modifiers()
            .into_iter()
            .filter(|m| Some(*m) != own)
            .map(|m| self.key_down(m.key_name()))
            .collect();
        events.push(self.key_down(&hotkey.key));
        events
    }

    /// Release a combination: the key, then its modifiers in reverse order.
    pub fn release_combo(&mut self, hotkey: &ParsedHotkey) -> Vec<KeyboardEvent> {
        let mut events = vec![self.key_up(&hotkey.key)];
        for modifier in hotkey.modifiers().into_iter().rev() {
            if self.held_modifiers.contains(&modifier) {
                events.push(self.key_up(modifier.key_name()));
            }
        }
        events
    }
}

/// Physical code for letter and digit keys (`KeyA`, `Digit1`).
fn physical_code(name: &str) -> Option<String> {
    if is_letter(name) {
        Some(format!("Key{}", name))
    } else if is_digit(name) {
        Some(format!("Digit{}", name))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use hotkey_mux_core::{parse_hotkey, HotkeyDescriptor, Platform};

    use super::*;
    use crate::event::KeyEventKind;
    use crate::target::{Element, ElementKind};

    #[test]
    fn test_modifier_flags() {
        let mut state = KeyboardState::new();

        let ctrl = state.key_down("Ctrl");
        assert!(ctrl.modifiers.ctrl);
        assert_eq!(ctrl.key, "Control");

        let s = state.key_down("s");
        assert_eq!(s.key, "S");
        assert_eq!(s.code.as_deref(), Some("KeyS"));
        assert!(s.modifiers.ctrl && !s.modifiers.shift);

        let up = state.key_up("Control");
        assert_eq!(up.kind, KeyEventKind::Release);
        assert!(!up.modifiers.ctrl);
        assert!(state.is_held("s"));
        assert!(!state.is_held("Control"));
    }

    #[test]
    fn test_repeat_detection() {
        let mut state = KeyboardState::new();
        assert!(!state.key_down("a").repeat);
        assert!(state.key_down("A").repeat);
        state.key_up("a");
        assert!(!state.key_down("a").repeat);
    }

    #[test]
    fn test_focus_sets_origin() {
        let mut state = KeyboardState::new();
        let input = Element::new("name", ElementKind::Input("text".to_string()));
        state.focus(input.clone());

        let event = state.key_down("x");
        assert_eq!(event.origin, Target::Element(input.clone()));
        assert_eq!(event.current_target, Target::Element(input));

        state.focus(Target::Document);
        assert_eq!(state.key_down("y").origin, Target::Document);
    }

    #[test]
    fn test_combo_round_trip() {
        let mut state = KeyboardState::new();
        let hotkey = parse_hotkey(&HotkeyDescriptor::from("Ctrl+Shift+1"), Platform::Linux)
            .expect("should parse");

        let pressed = state.press_combo(&hotkey);
        let keys: Vec<&str> = pressed.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["Control", "Shift", "1"]);
        let last = pressed.last().expect("should press the key");
        assert!(last.modifiers.ctrl && last.modifiers.shift);
        assert_eq!(last.code.as_deref(), Some("Digit1"));

        let released = state.release_combo(&hotkey);
        let keys: Vec<&str> = released.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["1", "Shift", "Control"]);
        assert_eq!(state.modifiers(), ModifierState::NONE);
    }

    #[test]
    fn test_modifier_only_combo() {
        let mut state = KeyboardState::new();
        let shift = ParsedHotkey::new("Shift").with(Modifier::Shift);

        let pressed = state.press_combo(&shift);
        assert_eq!(pressed.len(), 1);
        assert!(!pressed[0].repeat);
        assert!(pressed[0].modifiers.shift);

        let released = state.release_combo(&shift);
        assert_eq!(released.len(), 1);
        assert_eq!(state.modifiers(), ModifierState::NONE);
    }

    #[test]
    fn test_clear() {
        let mut state = KeyboardState::new();
        state.key_down("Shift");
        state.key_down("q");
        state.clear();
        assert_eq!(state.modifiers(), ModifierState::NONE);
        assert!(!state.key_down("q").repeat);
    }
}
