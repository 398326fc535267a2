//! Keyboard events as observed by a scope's listener

use std::cell::Cell;
use std::rc::Rc;

use hotkey_mux_core::{KeyInput, Modifier, ModifierState, ParsedHotkey};

use crate::target::Target;

/// Press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyEventKind {
    Press,
    Release,
}

#[derive(Debug, Default)]
struct EventFlags {
    default_prevented: Cell<bool>,
    propagation_stopped: Cell<bool>,
}

/// One key press or release.
///
/// `origin` is where the key was pressed; `current_target` is the listener
/// currently handling the event. Copies made with [`KeyboardEvent::at`] share
/// the prevent-default and stop-propagation flags with the original, so a
/// handler anywhere on the bubble path sees what earlier handlers did.
#[derive(Debug, Clone)]
pub struct KeyboardEvent {
    pub kind: KeyEventKind,
    pub key: String,
    pub code: Option<String>,
    pub modifiers: ModifierState,
    /// Auto-repeat from a held key
    pub repeat: bool,
    pub origin: Target,
    pub current_target: Target,
    flags: Rc<EventFlags>,
}

impl KeyboardEvent {
    fn new(kind: KeyEventKind, key: &str) -> Self {
        Self {
            kind,
            key: key.to_string(),
            code: None,
            modifiers: ModifierState::NONE,
            repeat: false,
            origin: Target::Document,
            current_target: Target::Document,
            flags: Rc::default(),
        }
    }

    /// A press of `key` at the document, with no modifiers held.
    pub fn press(key: &str) -> Self {
        Self::new(KeyEventKind::Press, key)
    }

    /// A release of `key` at the document, with no modifiers held.
    pub fn release(key: &str) -> Self {
        Self::new(KeyEventKind::Release, key)
    }

    /// A press whose key and modifier flags exactly embody `hotkey`.
    pub fn embodying(hotkey: &ParsedHotkey) -> Self {
        Self::press(&hotkey.key).with_modifiers(ModifierState::of(hotkey))
    }

    pub fn with_modifiers(mut self, modifiers: ModifierState) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Set one modifier flag.
    pub fn holding(mut self, modifier: Modifier) -> Self {
        self.modifiers.set(modifier, true);
        self
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.code = Some(code.to_string());
        self
    }

    pub fn repeating(mut self) -> Self {
        self.repeat = true;
        self
    }

    /// Originate the event at `origin`; the listener defaults to the same
    /// target.
    pub fn from_origin(mut self, origin: impl Into<Target>) -> Self {
        let origin = origin.into();
        self.current_target = origin.clone();
        self.origin = origin;
        self
    }

    /// The same event as seen by the listener on `current_target`.
    pub fn at(&self, current_target: impl Into<Target>) -> Self {
        Self {
            current_target: current_target.into(),
            ..self.clone()
        }
    }

    pub fn is_press(&self) -> bool {
        self.kind == KeyEventKind::Press
    }

    pub fn prevent_default(&self) {
        self.flags.default_prevented.set(true);
    }

    pub fn stop_propagation(&self) {
        self.flags.propagation_stopped.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.flags.default_prevented.get()
    }

    pub fn propagation_stopped(&self) -> bool {
        self.flags.propagation_stopped.get()
    }
}

impl KeyInput for KeyboardEvent {
    fn key(&self) -> &str {
        &self.key
    }

    fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    fn modifiers(&self) -> ModifierState {
        self.modifiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_shared_across_targets() {
        let event = KeyboardEvent::press("k");
        let seen_by_window = event.at(Target::Window);

        seen_by_window.prevent_default();
        assert!(event.default_prevented());
        assert!(!event.propagation_stopped());

        event.stop_propagation();
        assert!(seen_by_window.propagation_stopped());
        assert_eq!(seen_by_window.current_target, Target::Window);
        assert_eq!(seen_by_window.origin, Target::Document);
    }

    #[test]
    fn test_embodying_hotkey() {
        let hotkey = ParsedHotkey::new("S").with(Modifier::Control).with(Modifier::Shift);
        let event = KeyboardEvent::embodying(&hotkey);

        assert!(event.is_press());
        assert_eq!(event.key, "S");
        assert!(event.modifiers.ctrl && event.modifiers.shift);
        assert!(!event.modifiers.alt && !event.modifiers.meta);
    }
}
