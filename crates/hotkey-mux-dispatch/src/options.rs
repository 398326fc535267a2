//! Per-registration options

use hotkey_mux_core::{ConflictBehavior, HotkeyBinding, Platform, Trigger};

use crate::target::Scope;

/// Options for [`HotkeyManager::register`](crate::HotkeyManager::register).
///
/// `scope` and `platform` are resolved once at registration; the rest can be
/// changed later through the handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyOptions {
    pub enabled: bool,
    pub trigger: Trigger,
    pub prevent_default: bool,
    pub stop_propagation: bool,
    /// Fire once, then wait for the key or a required modifier to be released
    pub require_reset: bool,
    /// Suppress while an editable control has focus, unless scoped to it
    pub ignore_inputs: bool,
    pub conflict: ConflictBehavior,
    /// Defaults to the document
    pub scope: Option<Scope>,
    /// Defaults to the manager's platform
    pub platform: Option<Platform>,
}

impl Default for HotkeyOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            trigger: Trigger::Press,
            prevent_default: true,
            stop_propagation: true,
            require_reset: false,
            ignore_inputs: true,
            conflict: ConflictBehavior::Warn,
            scope: None,
            platform: None,
        }
    }
}

impl HotkeyOptions {
    /// Options equivalent to a bindings-file entry. The entry's scope is a
    /// name, so the caller resolves it.
    pub fn from_binding(binding: &HotkeyBinding, scope: Option<Scope>) -> Self {
        Self {
            enabled: binding.enabled,
            trigger: binding.trigger,
            prevent_default: binding.prevent_default,
            stop_propagation: binding.stop_propagation,
            require_reset: binding.require_reset,
            ignore_inputs: binding.ignore_inputs,
            conflict: binding.conflict,
            scope,
            platform: None,
        }
    }

    pub fn scope(mut self, scope: impl Into<Scope>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn conflict(mut self, conflict: ConflictBehavior) -> Self {
        self.conflict = conflict;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn require_reset(mut self, require_reset: bool) -> Self {
        self.require_reset = require_reset;
        self
    }

    pub fn ignore_inputs(mut self, ignore_inputs: bool) -> Self {
        self.ignore_inputs = ignore_inputs;
        self
    }

    pub fn prevent_default(mut self, prevent_default: bool) -> Self {
        self.prevent_default = prevent_default;
        self
    }

    pub fn stop_propagation(mut self, stop_propagation: bool) -> Self {
        self.stop_propagation = stop_propagation;
        self
    }

    /// Merge a partial update. Scope and platform are untouched.
    pub fn merge(&mut self, update: &OptionsUpdate) {
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        if let Some(trigger) = update.trigger {
            self.trigger = trigger;
        }
        if let Some(prevent_default) = update.prevent_default {
            self.prevent_default = prevent_default;
        }
        if let Some(stop_propagation) = update.stop_propagation {
            self.stop_propagation = stop_propagation;
        }
        if let Some(require_reset) = update.require_reset {
            self.require_reset = require_reset;
        }
        if let Some(ignore_inputs) = update.ignore_inputs {
            self.ignore_inputs = ignore_inputs;
        }
        if let Some(conflict) = update.conflict {
            self.conflict = conflict;
        }
    }
}

/// A partial options update; `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionsUpdate {
    pub enabled: Option<bool>,
    pub trigger: Option<Trigger>,
    pub prevent_default: Option<bool>,
    pub stop_propagation: Option<bool>,
    pub require_reset: Option<bool>,
    pub ignore_inputs: Option<bool>,
    pub conflict: Option<ConflictBehavior>,
}

impl OptionsUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = Some(trigger);
        self
    }

    pub fn require_reset(mut self, require_reset: bool) -> Self {
        self.require_reset = Some(require_reset);
        self
    }

    pub fn ignore_inputs(mut self, ignore_inputs: bool) -> Self {
        self.ignore_inputs = Some(ignore_inputs);
        self
    }

    pub fn prevent_default(mut self, prevent_default: bool) -> Self {
        self.prevent_default = Some(prevent_default);
        self
    }

    pub fn stop_propagation(mut self, stop_propagation: bool) -> Self {
        self.stop_propagation = Some(stop_propagation);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = HotkeyOptions::default();
        assert!(options.enabled);
        assert!(options.prevent_default);
        assert!(options.stop_propagation);
        assert!(options.ignore_inputs);
        assert!(!options.require_reset);
        assert_eq!(options.trigger, Trigger::Press);
        assert_eq!(options.conflict, ConflictBehavior::Warn);
        assert_eq!(options.scope, None);
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut options = HotkeyOptions::default()
            .scope(Scope::window())
            .require_reset(true);
        options.merge(&OptionsUpdate::new().enabled(false).trigger(Trigger::Release));

        assert!(!options.enabled);
        assert_eq!(options.trigger, Trigger::Release);
        assert!(options.require_reset);
        assert_eq!(options.scope, Some(Scope::window()));
    }

    #[test]
    fn test_from_binding() {
        let mut binding = HotkeyBinding::new("Mod+S", "save");
        binding.ignore_inputs = false;
        binding.conflict = ConflictBehavior::Replace;

        let options = HotkeyOptions::from_binding(&binding, Some(Scope::window()));
        assert!(!options.ignore_inputs);
        assert_eq!(options.conflict, ConflictBehavior::Replace);
        assert_eq!(options.scope, Some(Scope::window()));
    }
}
