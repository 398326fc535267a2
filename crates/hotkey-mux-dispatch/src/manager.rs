//! Registration multiplexer
//!
//! [`HotkeyManager`] owns every hotkey registration and one press/release
//! listener pair per scope in use. Events observed on a scope's listener are
//! routed to that scope's registrations in registration order.
//!
//! ## State
//!
//! ```text
//! registrations: id -> Registration { parsed, scope, options, latch, callback }
//! scopes:        ScopeKey -> { ids (registration order), listeners }
//! ```
//!
//! A scope has listeners attached exactly while its id list is non-empty.
//!
//! ## Re-entrancy
//!
//! Dispatch walks a snapshot of the scope's ids and releases its borrow of
//! the tables before invoking a callback, so callbacks may register,
//! unregister or replace registrations. Every change is visible to the next
//! event; registrations added during a pass are not part of that pass.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::{Rc, Weak};

use hotkey_mux_core::{
    canonical_key, matches_event, parse_hotkey, ConflictBehavior, HotkeyDescriptor, Modifier,
    ParseError, ParsedHotkey, Platform, Trigger,
};
use thiserror::Error;
use tracing::debug;

use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::event::{KeyEventKind, KeyboardEvent};
use crate::options::{HotkeyOptions, OptionsUpdate};
use crate::surface::{InputSurface, ListenerId, SimulatedSurface};
use crate::target::{Scope, ScopeKey, WeakScope};

// ============================================================================
// Types
// ============================================================================

/// Identity of a registration, unique for the manager's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegistrationId(u64);

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Latch-until-release state of a registration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LatchState {
    /// May fire on the next matching press
    #[default]
    Armed,
    /// Fired; waiting for the key or a required modifier to be released
    Latched,
}

/// What a hotkey callback learns about the registration that fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyContext {
    pub descriptor: HotkeyDescriptor,
    pub parsed: ParsedHotkey,
}

pub type HotkeyCallback = Rc<dyn Fn(&KeyboardEvent, &HotkeyContext)>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("hotkey '{descriptor}' is already registered on {scope} as '{existing}'")]
pub struct ConflictError {
    pub descriptor: String,
    pub existing: String,
    pub scope: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegisterError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Conflict(#[from] ConflictError),
}

struct Registration {
    descriptor: HotkeyDescriptor,
    parsed: ParsedHotkey,
    platform: Platform,
    scope: WeakScope,
    /// Stored with `scope` cleared; [`HotkeyHandle::options`] restores it.
    options: HotkeyOptions,
    latch: LatchState,
    callback: HotkeyCallback,
}

/// Side effects and callback for one matched registration.
struct Firing {
    callback: HotkeyCallback,
    context: HotkeyContext,
    prevent_default: bool,
    stop_propagation: bool,
    latch_after: bool,
}

impl Registration {
    /// Apply the routing rules for one event. Updates the latch on release
    /// and returns what to run when the registration fires.
    ///
    /// Only releases the registration would otherwise see re-arm the latch:
    /// a disabled or input-suppressed registration stays latched.
    fn route(&mut self, event: &KeyboardEvent) -> Option<Firing> {
        if !self.scope.is_satisfied_by(&event.current_target, &event.origin) {
            return None;
        }

        if !self.options.enabled || self.suppressed_by_input(event) {
            return None;
        }

        if event.kind == KeyEventKind::Release && self.latch == LatchState::Latched && self.releases(event) {
            self.latch = LatchState::Armed;
        }

        let wanted = match event.kind {
            KeyEventKind::Press => {
                self.options.trigger == Trigger::Press
                    && !(self.options.require_reset && self.latch == LatchState::Latched)
            }
            KeyEventKind::Release => self.options.trigger == Trigger::Release,
        };
        if !wanted || !matches_event(event, &self.parsed, self.platform) {
            return None;
        }

        Some(Firing {
            callback: Rc::clone(&self.callback),
            context: HotkeyContext {
                descriptor: self.descriptor.clone(),
                parsed: self.parsed.clone(),
            },
            prevent_default: self.options.prevent_default,
            stop_propagation: self.options.stop_propagation,
            latch_after: event.is_press() && self.options.require_reset,
        })
    }

    /// Editable origins suppress a registration unless it is scoped to that
    /// exact element.
    fn suppressed_by_input(&self, event: &KeyboardEvent) -> bool {
        if !self.options.ignore_inputs {
            return false;
        }
        match event.origin.element() {
            Some(origin) if origin.is_editable() => !self.scope.is_element(origin),
            _ => false,
        }
    }

    /// Whether releasing this event's key re-arms the latch: the primary key
    /// or one of the required modifiers.
    fn releases(&self, event: &KeyboardEvent) -> bool {
        let released = canonical_key(&event.key);
        if released.eq_ignore_ascii_case(&self.parsed.key) {
            return true;
        }
        Modifier::from_key_name(&released).is_some_and(|m| self.parsed.requires(m))
    }
}

#[derive(Default)]
struct ScopePartition {
    ids: Vec<RegistrationId>,
    listeners: Vec<ListenerId>,
}

#[derive(Default)]
struct ManagerState {
    next_id: u64,
    registrations: BTreeMap<RegistrationId, Registration>,
    scopes: HashMap<ScopeKey, ScopePartition>,
}

struct Shared {
    platform: Platform,
    surface: Rc<dyn InputSurface>,
    diagnostics: Rc<dyn DiagnosticSink>,
    state: RefCell<ManagerState>,
}

// ============================================================================
// Manager
// ============================================================================

/// Shared-listener hotkey registry.
///
/// Cheap to clone; clones are the same manager.
///
/// # Example
///
/// ```ignore
/// let manager = HotkeyManager::new();
/// let handle = manager.register("Mod+S", |_event, ctx| {
///     println!("save ({})", ctx.parsed);
/// }, HotkeyOptions::default())?;
///
/// manager.handle_event(&KeyboardEvent::press("s").holding(Modifier::Control));
/// handle.unregister();
/// ```
#[derive(Clone)]
pub struct HotkeyManager {
    shared: Rc<Shared>,
}

/// Configures a [`HotkeyManager`].
#[derive(Default)]
pub struct HotkeyManagerBuilder {
    platform: Option<Platform>,
    surface: Option<Rc<dyn InputSurface>>,
    diagnostics: Option<Rc<dyn DiagnosticSink>>,
}

impl HotkeyManagerBuilder {
    /// Default platform for registrations (auto-detected when unset).
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Where listeners are attached ([`SimulatedSurface`] when unset).
    pub fn surface(mut self, surface: impl InputSurface + 'static) -> Self {
        self.surface = Some(Rc::new(surface));
        self
    }

    /// Where conflict diagnostics go ([`TracingSink`] when unset).
    pub fn diagnostics(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.diagnostics = Some(Rc::new(sink));
        self
    }

    pub fn build(self) -> HotkeyManager {
        HotkeyManager {
            shared: Rc::new(Shared {
                platform: self.platform.unwrap_or_else(Platform::detect),
                surface: self
                    .surface
                    .unwrap_or_else(|| Rc::new(SimulatedSurface::new())),
                diagnostics: self.diagnostics.unwrap_or_else(|| Rc::new(TracingSink)),
                state: RefCell::new(ManagerState::default()),
            }),
        }
    }
}

impl Default for HotkeyManager {
    fn default() -> Self {
        Self::new()
    }
}

impl HotkeyManager {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> HotkeyManagerBuilder {
        HotkeyManagerBuilder::default()
    }

    pub fn platform(&self) -> Platform {
        self.shared.platform
    }

    /// Register a hotkey.
    ///
    /// # Arguments
    ///
    /// * `descriptor` - A string (`"Mod+S"`) or [`RawHotkey`](hotkey_mux_core::RawHotkey)
    /// * `callback` - Invoked with the event and a [`HotkeyContext`] on each match
    /// * `options` - Scope, trigger, latch, suppression and conflict policy
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError::Parse`] for a malformed descriptor, and
    /// [`RegisterError::Conflict`] when the `error` conflict policy meets an
    /// identical hotkey on the same scope. Neither leaves any trace in the
    /// manager.
    pub fn register<D, F>(
        &self,
        descriptor: D,
        callback: F,
        mut options: HotkeyOptions,
    ) -> Result<HotkeyHandle, RegisterError>
    where
        D: Into<HotkeyDescriptor>,
        F: Fn(&KeyboardEvent, &HotkeyContext) + 'static,
    {
        let descriptor = descriptor.into();
        let platform = options.platform.unwrap_or(self.shared.platform);
        let parsed = parse_hotkey(&descriptor, platform)?;
        let scope = options.scope.take().unwrap_or_else(Scope::document);

        let colliding = self.colliding(&parsed, &scope);
        if let Some((_, existing)) = colliding.first() {
            match options.conflict {
                ConflictBehavior::Warn => self.shared.diagnostics.emit(Diagnostic::warning(
                    "hotkey::conflict",
                    format!(
                        "hotkey '{}' conflicts with '{}' already registered on {}",
                        descriptor, existing, scope
                    ),
                )),
                ConflictBehavior::Error => {
                    return Err(ConflictError {
                        descriptor: descriptor.to_string(),
                        existing: existing.to_string(),
                        scope: scope.to_string(),
                    }
                    .into());
                }
                ConflictBehavior::Replace => {
                    for (id, _) in &colliding {
                        self.unregister(*id);
                    }
                }
                ConflictBehavior::Allow => {}
            }
        }

        let (id, first_in_scope) = {
            let mut state = self.shared.state.borrow_mut();
            state.next_id += 1;
            let id = RegistrationId(state.next_id);
            state.registrations.insert(
                id,
                Registration {
                    descriptor: descriptor.clone(),
                    parsed,
                    platform,
                    scope: scope.downgrade(),
                    options,
                    latch: LatchState::Armed,
                    callback: Rc::new(callback),
                },
            );
            let partition = state.scopes.entry(scope.key()).or_default();
            partition.ids.push(id);
            (id, partition.ids.len() == 1)
        };

        if first_in_scope {
            self.attach(&scope);
        }
        debug!("Registered hotkey {} '{}' on {}", id, descriptor, scope);

        Ok(HotkeyHandle {
            id,
            manager: Rc::downgrade(&self.shared),
        })
    }

    /// Registrations with the same parsed hotkey on the same scope.
    fn colliding(&self, parsed: &ParsedHotkey, scope: &Scope) -> Vec<(RegistrationId, HotkeyDescriptor)> {
        let key = scope.key();
        self.shared
            .state
            .borrow()
            .registrations
            .iter()
            .filter(|(_, reg)| reg.scope.key() == key && reg.parsed == *parsed)
            .map(|(id, reg)| (*id, reg.descriptor.clone()))
            .collect()
    }

    fn attach(&self, scope: &Scope) {
        let mut listeners = Vec::new();
        for kind in [KeyEventKind::Press, KeyEventKind::Release] {
            match self.shared.surface.attach(scope, kind) {
                Ok(listener) => listeners.push(listener),
                Err(e) => {
                    debug!("Cannot listen on {}, its hotkeys will not fire: {}", scope, e);
                    self.detach_all(listeners);
                    return;
                }
            }
        }
        debug!("Attached listeners on {}", scope);

        if let Some(partition) = self.shared.state.borrow_mut().scopes.get_mut(&scope.key()) {
            partition.listeners = listeners;
        }
    }

    fn detach_all(&self, listeners: Vec<ListenerId>) {
        for listener in listeners {
            if let Err(e) = self.shared.surface.detach(listener) {
                debug!("Failed to detach listener: {}", e);
            }
        }
    }

    /// Remove a registration. Returns `false` when it was already gone.
    pub fn unregister(&self, id: RegistrationId) -> bool {
        let (removed, listeners) = {
            let mut state = self.shared.state.borrow_mut();
            let Some(removed) = state.registrations.remove(&id) else {
                return false;
            };
            let key = removed.scope.key();
            let emptied = match state.scopes.get_mut(&key) {
                Some(partition) => {
                    partition.ids.retain(|other| *other != id);
                    partition.ids.is_empty()
                }
                None => false,
            };
            let listeners = if emptied {
                state.scopes.remove(&key).map(|p| p.listeners).unwrap_or_default()
            } else {
                Vec::new()
            };
            (removed, listeners)
        };

        if !listeners.is_empty() {
            debug!("Detaching listeners on {}", removed.scope);
        }
        self.detach_all(listeners);
        debug!("Unregistered hotkey {} '{}'", id, removed.descriptor);
        true
    }

    /// Route one press or release observed on a scope's listener.
    ///
    /// The event's `current_target` selects the scope. Scopes without an
    /// attached listener see nothing.
    pub fn handle_event(&self, event: &KeyboardEvent) {
        let snapshot = {
            let state = self.shared.state.borrow();
            match state.scopes.get(&ScopeKey::of_target(&event.current_target)) {
                Some(partition) if !partition.listeners.is_empty() => partition.ids.clone(),
                _ => return,
            }
        };

        for id in snapshot {
            let firing = {
                let mut state = self.shared.state.borrow_mut();
                match state.registrations.get_mut(&id) {
                    Some(registration) => registration.route(event),
                    // Removed earlier in this pass
                    None => continue,
                }
            };
            let Some(firing) = firing else {
                continue;
            };

            if firing.prevent_default {
                event.prevent_default();
            }
            if firing.stop_propagation {
                event.stop_propagation();
            }
            debug!("Hotkey {} '{}' fired", id, firing.context.descriptor);
            (firing.callback)(event, &firing.context);

            // The callback may have turned require_reset off
            if firing.latch_after {
                if let Some(registration) = self.shared.state.borrow_mut().registrations.get_mut(&id) {
                    if registration.options.require_reset {
                        registration.latch = LatchState::Latched;
                    }
                }
            }
        }
    }

    /// Detach every listener and drop every registration. Safe when empty.
    pub fn destroy(&self) {
        let (registrations, scopes) = {
            let mut state = self.shared.state.borrow_mut();
            (
                std::mem::take(&mut state.registrations),
                std::mem::take(&mut state.scopes),
            )
        };
        for partition in scopes.into_values() {
            self.detach_all(partition.listeners);
        }
        if !registrations.is_empty() {
            debug!("Destroyed {} hotkey registrations", registrations.len());
        }
    }

    pub fn registration_count(&self) -> usize {
        self.shared.state.borrow().registrations.len()
    }

    /// Whether a registration with this hotkey exists on `scope` (the
    /// document when `None`). Descriptors that fail to parse are never
    /// registered.
    pub fn is_registered(&self, descriptor: impl Into<HotkeyDescriptor>, scope: Option<&Scope>) -> bool {
        let Ok(parsed) = parse_hotkey(&descriptor.into(), self.shared.platform) else {
            return false;
        };
        let key = scope.map_or(ScopeKey::Document, Scope::key);
        self.shared
            .state
            .borrow()
            .registrations
            .values()
            .any(|reg| reg.scope.key() == key && reg.parsed == parsed)
    }

    /// Whether listeners are attached for `scope`.
    pub fn is_listening(&self, scope: &Scope) -> bool {
        self.shared
            .state
            .borrow()
            .scopes
            .get(&scope.key())
            .is_some_and(|p| !p.listeners.is_empty())
    }
}

// ============================================================================
// Handle
// ============================================================================

/// A caller's view of one registration.
///
/// Holds only the id and a weak reference to the manager; every accessor
/// reads or writes the manager's table. Once the registration is gone the
/// accessors return `None`/`false`.
#[derive(Clone)]
pub struct HotkeyHandle {
    id: RegistrationId,
    manager: Weak<Shared>,
}

impl HotkeyHandle {
    pub fn id(&self) -> RegistrationId {
        self.id
    }

    fn with_registration<R>(&self, f: impl FnOnce(&mut Registration) -> R) -> Option<R> {
        let shared = self.manager.upgrade()?;
        let mut state = shared.state.borrow_mut();
        state.registrations.get_mut(&self.id).map(f)
    }

    pub fn is_active(&self) -> bool {
        self.with_registration(|_| ()).is_some()
    }

    /// Remove the registration. Safe to call more than once.
    pub fn unregister(&self) -> bool {
        match self.manager.upgrade() {
            Some(shared) => HotkeyManager { shared }.unregister(self.id),
            None => false,
        }
    }

    pub fn callback(&self) -> Option<HotkeyCallback> {
        self.with_registration(|reg| Rc::clone(&reg.callback))
    }

    /// Swap the callback. Takes effect from the next event.
    pub fn set_callback<F>(&self, callback: F) -> bool
    where
        F: Fn(&KeyboardEvent, &HotkeyContext) + 'static,
    {
        self.with_registration(|reg| reg.callback = Rc::new(callback))
            .is_some()
    }

    /// Current options. The scope is `None` once a scoped element has been
    /// dropped.
    pub fn options(&self) -> Option<HotkeyOptions> {
        self.with_registration(|reg| HotkeyOptions {
            scope: reg.scope.upgrade(),
            ..reg.options.clone()
        })
    }

    /// Merge an options update without re-parsing the hotkey or
    /// re-resolving the scope.
    pub fn update_options(&self, update: &OptionsUpdate) -> bool {
        self.with_registration(|reg| {
            reg.options.merge(update);
            if !reg.options.require_reset {
                reg.latch = LatchState::Armed;
            }
        })
        .is_some()
    }

    pub fn latch(&self) -> Option<LatchState> {
        self.with_registration(|reg| reg.latch)
    }

    pub fn parsed(&self) -> Option<ParsedHotkey> {
        self.with_registration(|reg| reg.parsed.clone())
    }
}

impl fmt::Debug for HotkeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HotkeyHandle")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
