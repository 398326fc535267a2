//! Ordered key sequences (`g g`, `Control+K Control+C`)
//!
//! [`SequenceManager`] is independent of the hotkey manager. It listens for
//! presses on the document and keeps, per sequence, how many steps have
//! matched so far and when that progress expires.
//!
//! ## Progress rules
//!
//! On each press, after expiring stale progress:
//! - the expected step matches: advance, firing and resetting on the last step
//! - a bare modifier press: ignored, so `Shift+G` steps stay reachable
//! - the first step matches: restart at progress 1
//! - anything else: reset to 0
//!
//! Every press that leaves progress positive sets a fresh deadline. Expiry is
//! checked on each press and by [`SequenceManager::check_timeouts`], which an
//! event loop calls on a tick.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use hotkey_mux_core::keys::is_modifier_key;
use hotkey_mux_core::{
    canonical_key, matches_event, parse_hotkey, HotkeyDescriptor, ParseError, ParsedHotkey, Platform,
};
use thiserror::Error;
use tracing::debug;

use crate::event::{KeyEventKind, KeyboardEvent};
use crate::surface::{InputSurface, ListenerId, SimulatedSurface};
use crate::target::{Scope, ScopeKey};

/// Default time allowed between the first and the last key of a sequence.
pub const DEFAULT_SEQUENCE_TIMEOUT: Duration = Duration::from_millis(1000);

// ============================================================================
// Clock
// ============================================================================

/// Source of the current time for sequence deadlines.
pub trait Clock {
    fn now(&self) -> Instant;
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SequenceId(u64);

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("a sequence needs at least one key")]
    Empty,

    #[error("invalid step {index} of sequence")]
    Step {
        index: usize,
        #[source]
        source: ParseError,
    },
}

/// What a sequence callback learns about the sequence that completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceContext {
    /// Steps as registered
    pub sequence: Vec<String>,
}

impl fmt::Display for SequenceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sequence.join(" "))
    }
}

pub type SequenceCallback = Rc<dyn Fn(&KeyboardEvent, &SequenceContext)>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceOptions {
    /// `None` keeps progress until a mismatch
    pub timeout: Option<Duration>,
    pub platform: Option<Platform>,
    /// Ignore presses whose origin is an editable control
    pub ignore_inputs: bool,
}

impl Default for SequenceOptions {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_SEQUENCE_TIMEOUT),
            platform: None,
            ignore_inputs: true,
        }
    }
}

impl SequenceOptions {
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn ignore_inputs(mut self, ignore_inputs: bool) -> Self {
        self.ignore_inputs = ignore_inputs;
        self
    }
}

struct SequenceRegistration {
    sequence: Vec<String>,
    steps: Vec<ParsedHotkey>,
    platform: Platform,
    options: SequenceOptions,
    progress: usize,
    deadline: Option<Instant>,
    callback: SequenceCallback,
}

impl SequenceRegistration {
    fn step_matches(&self, index: usize, event: &KeyboardEvent) -> bool {
        let step = &self.steps[index];
        let has_modifiers = step.ctrl || step.shift || step.alt || step.meta;
        if has_modifiers {
            matches_event(event, step, self.platform)
        } else {
            canonical_key(&event.key).eq_ignore_ascii_case(&step.key)
        }
    }

    fn reset(&mut self) {
        self.progress = 0;
        self.deadline = None;
    }

    fn restart_timer(&mut self, now: Instant) {
        self.deadline = self.options.timeout.map(|timeout| now + timeout);
    }

    /// Drop progress whose deadline has passed. Returns whether it did.
    fn expire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.reset();
                true
            }
            _ => false,
        }
    }

    /// Feed one press. Returns the callback to run when the sequence
    /// completes.
    fn advance(&mut self, event: &KeyboardEvent, now: Instant) -> Option<(SequenceCallback, SequenceContext)> {
        self.expire(now);

        if self.options.ignore_inputs && event.origin.is_editable() {
            return None;
        }

        if self.step_matches(self.progress, event) {
            self.progress += 1;
            if self.progress == self.steps.len() {
                self.reset();
                return Some((
                    Rc::clone(&self.callback),
                    SequenceContext {
                        sequence: self.sequence.clone(),
                    },
                ));
            }
            self.restart_timer(now);
            return None;
        }

        if is_modifier_key(&event.key) {
            return None;
        }

        if self.step_matches(0, event) {
            self.progress = 1;
            self.restart_timer(now);
        } else {
            self.reset();
        }
        None
    }
}

#[derive(Default)]
struct SequenceState {
    next_id: u64,
    sequences: BTreeMap<SequenceId, SequenceRegistration>,
    listener: Option<ListenerId>,
}

struct Shared {
    platform: Platform,
    clock: Rc<dyn Clock>,
    surface: Rc<dyn InputSurface>,
    state: RefCell<SequenceState>,
}

// ============================================================================
// Manager
// ============================================================================

/// Tracks in-progress key sequences. Cheap to clone; clones are the same
/// manager.
///
/// # Example
///
/// ```ignore
/// let sequences = SequenceManager::new();
/// sequences.register(["g", "g"], |_event, ctx| {
///     println!("{} -> top", ctx);
/// }, SequenceOptions::default())?;
///
/// sequences.handle_event(&KeyboardEvent::press("g"));
/// sequences.handle_event(&KeyboardEvent::press("g"));
/// ```
#[derive(Clone)]
pub struct SequenceManager {
    shared: Rc<Shared>,
}

#[derive(Default)]
pub struct SequenceManagerBuilder {
    platform: Option<Platform>,
    clock: Option<Rc<dyn Clock>>,
    surface: Option<Rc<dyn InputSurface>>,
}

impl SequenceManagerBuilder {
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Rc::new(clock));
        self
    }

    pub fn surface(mut self, surface: impl InputSurface + 'static) -> Self {
        self.surface = Some(Rc::new(surface));
        self
    }

    pub fn build(self) -> SequenceManager {
        SequenceManager {
            shared: Rc::new(Shared {
                platform: self.platform.unwrap_or_else(Platform::detect),
                clock: self.clock.unwrap_or_else(|| Rc::new(SystemClock)),
                surface: self
                    .surface
                    .unwrap_or_else(|| Rc::new(SimulatedSurface::new())),
                state: RefCell::new(SequenceState::default()),
            }),
        }
    }
}

impl Default for SequenceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SequenceManager {
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> SequenceManagerBuilder {
        SequenceManagerBuilder::default()
    }

    /// Register a sequence of steps, each a hotkey descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::Empty`] for an empty sequence and
    /// [`SequenceError::Step`] when a step does not parse.
    pub fn register<I, D, F>(
        &self,
        steps: I,
        callback: F,
        options: SequenceOptions,
    ) -> Result<SequenceHandle, SequenceError>
    where
        I: IntoIterator<Item = D>,
        D: Into<HotkeyDescriptor>,
        F: Fn(&KeyboardEvent, &SequenceContext) + 'static,
    {
        let platform = options.platform.unwrap_or(self.shared.platform);
        let descriptors: Vec<HotkeyDescriptor> = steps.into_iter().map(Into::into).collect();
        if descriptors.is_empty() {
            return Err(SequenceError::Empty);
        }
        let parsed = descriptors
            .iter()
            .enumerate()
            .map(|(index, step)| {
                parse_hotkey(step, platform).map_err(|source| SequenceError::Step { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let sequence: Vec<String> = descriptors.iter().map(ToString::to_string).collect();

        let (id, needs_listener) = {
            let mut state = self.shared.state.borrow_mut();
            state.next_id += 1;
            let id = SequenceId(state.next_id);
            debug!("Registered sequence {} '{}'", id, sequence.join(" "));
            state.sequences.insert(
                id,
                SequenceRegistration {
                    sequence,
                    steps: parsed,
                    platform,
                    options,
                    progress: 0,
                    deadline: None,
                    callback: Rc::new(callback),
                },
            );
            (id, state.sequences.len() == 1)
        };

        if needs_listener {
            match self.shared.surface.attach(&Scope::document(), KeyEventKind::Press) {
                Ok(listener) => self.shared.state.borrow_mut().listener = Some(listener),
                Err(e) => debug!("Cannot listen for sequences, they will not fire: {}", e),
            }
        }

        Ok(SequenceHandle {
            id,
            manager: Rc::downgrade(&self.shared),
        })
    }

    /// Remove a sequence and its pending deadline. Returns `false` when it
    /// was already gone.
    pub fn unregister(&self, id: SequenceId) -> bool {
        let (removed, listener) = {
            let mut state = self.shared.state.borrow_mut();
            let Some(removed) = state.sequences.remove(&id) else {
                return false;
            };
            let listener = if state.sequences.is_empty() {
                state.listener.take()
            } else {
                None
            };
            (removed, listener)
        };

        self.detach(listener);
        debug!("Unregistered sequence {} '{}'", id, removed.sequence.join(" "));
        true
    }

    fn detach(&self, listener: Option<ListenerId>) {
        if let Some(listener) = listener {
            if let Err(e) = self.shared.surface.detach(listener) {
                debug!("Failed to detach sequence listener: {}", e);
            }
        }
    }

    /// Feed one event observed on the document listener. Releases and
    /// events at other targets are ignored.
    pub fn handle_event(&self, event: &KeyboardEvent) {
        if event.kind != KeyEventKind::Press
            || ScopeKey::of_target(&event.current_target) != ScopeKey::Document
        {
            return;
        }

        let snapshot: Vec<SequenceId> = {
            let state = self.shared.state.borrow();
            if state.listener.is_none() {
                return;
            }
            state.sequences.keys().copied().collect()
        };
        let now = self.shared.clock.now();

        for id in snapshot {
            let completed = {
                let mut state = self.shared.state.borrow_mut();
                match state.sequences.get_mut(&id) {
                    Some(registration) => registration.advance(event, now),
                    None => continue,
                }
            };
            if let Some((callback, context)) = completed {
                debug!("Sequence {} '{}' completed", id, context);
                callback(event, &context);
            }
        }
    }

    /// Expire every sequence whose deadline has passed. Returns how many
    /// lost their progress.
    pub fn check_timeouts(&self) -> usize {
        let now = self.shared.clock.now();
        let mut state = self.shared.state.borrow_mut();
        let mut expired = 0;
        for (id, registration) in state.sequences.iter_mut() {
            if registration.expire(now) {
                debug!("Sequence {} '{}' timed out", id, registration.sequence.join(" "));
                expired += 1;
            }
        }
        expired
    }

    /// Earliest pending deadline, for event loops that sleep until it.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.shared
            .state
            .borrow()
            .sequences
            .values()
            .filter_map(|r| r.deadline)
            .min()
    }

    /// Drop every sequence and detach the listener. Safe when empty.
    pub fn destroy(&self) {
        let (sequences, listener) = {
            let mut state = self.shared.state.borrow_mut();
            (std::mem::take(&mut state.sequences), state.listener.take())
        };
        self.detach(listener);
        if !sequences.is_empty() {
            debug!("Destroyed {} sequences", sequences.len());
        }
    }

    pub fn sequence_count(&self) -> usize {
        self.shared.state.borrow().sequences.len()
    }

    pub fn is_listening(&self) -> bool {
        self.shared.state.borrow().listener.is_some()
    }
}

/// A caller's view of one sequence registration.
#[derive(Clone)]
pub struct SequenceHandle {
    id: SequenceId,
    manager: Weak<Shared>,
}

impl SequenceHandle {
    pub fn id(&self) -> SequenceId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.progress().is_some()
    }

    /// Steps matched so far, or `None` once unregistered.
    pub fn progress(&self) -> Option<usize> {
        let shared = self.manager.upgrade()?;
        let state = shared.state.borrow();
        state.sequences.get(&self.id).map(|r| r.progress)
    }

    /// Remove the sequence. Safe to call more than once.
    pub fn unregister(&self) -> bool {
        match self.manager.upgrade() {
            Some(shared) => SequenceManager { shared }.unregister(self.id),
            None => false,
        }
    }
}

impl fmt::Debug for SequenceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceHandle")
            .field("id", &self.id)
            .field("progress", &self.progress())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use hotkey_mux_core::Modifier;

    use super::*;
    use crate::surface::HeadlessSurface;
    use crate::target::{Element, ElementKind, Target};

    const T: Duration = Duration::from_millis(500);

    fn setup() -> (SequenceManager, ManualClock, SimulatedSurface) {
        let clock = ManualClock::new();
        let surface = SimulatedSurface::new();
        let manager = SequenceManager::builder()
            .platform(Platform::Linux)
            .clock(clock.clone())
            .surface(surface.clone())
            .build();
        (manager, clock, surface)
    }

    fn counter() -> (Rc<Cell<u32>>, impl Fn(&KeyboardEvent, &SequenceContext)) {
        let count = Rc::new(Cell::new(0));
        let inner = Rc::clone(&count);
        (count, move |_: &KeyboardEvent, _: &SequenceContext| inner.set(inner.get() + 1))
    }

    fn press(manager: &SequenceManager, key: &str) {
        manager.handle_event(&KeyboardEvent::press(key));
    }

    #[test]
    fn test_two_keys_within_timeout() {
        let (manager, clock, _) = setup();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_in = Rc::clone(&seen);
        manager
            .register(
                ["g", "i"],
                move |_, ctx| seen_in.borrow_mut().push(ctx.to_string()),
                SequenceOptions::default().timeout(Some(T)),
            )
            .expect("should register");

        press(&manager, "g");
        clock.advance(Duration::from_millis(300));
        press(&manager, "i");

        assert_eq!(*seen.borrow(), vec!["g i".to_string()]);
    }

    #[test]
    fn test_timeout_abandons_progress() {
        let (manager, clock, _) = setup();
        let (count, callback) = counter();
        let handle = manager
            .register(["g", "i"], callback, SequenceOptions::default().timeout(Some(T)))
            .expect("should register");

        press(&manager, "g");
        assert_eq!(handle.progress(), Some(1));
        clock.advance(T + Duration::from_millis(1));
        press(&manager, "i");

        assert_eq!(count.get(), 0);
        assert_eq!(handle.progress(), Some(0));
    }

    #[test]
    fn test_first_key_restarts() {
        let (manager, _, _) = setup();
        let (count, callback) = counter();
        let handle = manager
            .register(["g", "i"], callback, SequenceOptions::default())
            .expect("should register");

        press(&manager, "g");
        press(&manager, "g");
        assert_eq!(count.get(), 0);
        assert_eq!(handle.progress(), Some(1));

        press(&manager, "i");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_restart_renews_deadline() {
        let (manager, clock, _) = setup();
        let (count, callback) = counter();
        manager
            .register(["g", "i"], callback, SequenceOptions::default().timeout(Some(T)))
            .expect("should register");

        press(&manager, "g");
        clock.advance(Duration::from_millis(400));
        press(&manager, "g");
        clock.advance(Duration::from_millis(400));
        press(&manager, "i");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_completes_twice() {
        let (manager, _, _) = setup();
        let (count, callback) = counter();
        let handle = manager
            .register(["g", "g"], callback, SequenceOptions::default())
            .expect("should register");

        for _ in 0..4 {
            press(&manager, "g");
        }
        assert_eq!(count.get(), 2);
        assert_eq!(handle.progress(), Some(0));
    }

    #[test]
    fn test_mismatch_resets() {
        let (manager, _, _) = setup();
        let (count, callback) = counter();
        manager
            .register(["g", "i"], callback, SequenceOptions::default())
            .expect("should register");

        press(&manager, "g");
        press(&manager, "x");
        press(&manager, "i");
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_modifier_step_with_bare_modifier_press() {
        let (manager, _, _) = setup();
        let (count, callback) = counter();
        manager
            .register(["g", "Shift+G"], callback, SequenceOptions::default())
            .expect("should register");

        press(&manager, "g");
        manager.handle_event(&KeyboardEvent::press("Shift").holding(Modifier::Shift));
        manager.handle_event(&KeyboardEvent::press("G").holding(Modifier::Shift));
        assert_eq!(count.get(), 1);

        // Without Shift the second step does not match
        press(&manager, "g");
        press(&manager, "g");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_single_step_sequence() {
        let (manager, _, _) = setup();
        let (count, callback) = counter();
        manager
            .register(["?"], callback, SequenceOptions::default())
            .expect("should register");

        press(&manager, "?");
        press(&manager, "?");
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_check_timeouts() {
        let (manager, clock, _) = setup();
        let (_, callback) = counter();
        let handle = manager
            .register(["g", "i"], callback, SequenceOptions::default().timeout(Some(T)))
            .expect("should register");

        press(&manager, "g");
        assert!(manager.next_deadline().is_some());
        assert_eq!(manager.check_timeouts(), 0);

        clock.advance(T);
        assert_eq!(manager.check_timeouts(), 1);
        assert_eq!(handle.progress(), Some(0));
        assert_eq!(manager.next_deadline(), None);
    }

    #[test]
    fn test_no_timeout_keeps_progress() {
        let (manager, clock, _) = setup();
        let (count, callback) = counter();
        manager
            .register(["g", "i"], callback, SequenceOptions::default().timeout(None))
            .expect("should register");

        press(&manager, "g");
        clock.advance(Duration::from_secs(60));
        assert_eq!(manager.check_timeouts(), 0);
        press(&manager, "i");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_empty_sequence_rejected() {
        let (manager, _, surface) = setup();
        let (_, callback) = counter();
        let steps: Vec<&str> = Vec::new();

        let err = manager
            .register(steps, callback, SequenceOptions::default())
            .unwrap_err();
        assert_eq!(err, SequenceError::Empty);
        assert_eq!(manager.sequence_count(), 0);
        assert_eq!(surface.listener_count(), 0);
    }

    #[test]
    fn test_invalid_step_rejected() {
        let (manager, _, _) = setup();
        let (_, callback) = counter();

        let err = manager
            .register(["g", "Hyper+G"], callback, SequenceOptions::default())
            .unwrap_err();
        match err {
            SequenceError::Step { index, .. } => assert_eq!(index, 1),
            other => panic!("Expected Step error, got: {:?}", other),
        }
    }

    #[test]
    fn test_ignores_releases_and_other_targets() {
        let (manager, _, _) = setup();
        let (count, callback) = counter();
        manager
            .register(["g"], callback, SequenceOptions::default())
            .expect("should register");

        manager.handle_event(&KeyboardEvent::release("g"));
        manager.handle_event(&KeyboardEvent::press("g").at(Target::Window));
        assert_eq!(count.get(), 0);

        manager.handle_event(&KeyboardEvent::press("g").at(Target::DocumentElement));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_ignores_editable_origin() {
        let (manager, _, _) = setup();
        let (count, callback) = counter();
        let (lenient, lenient_cb) = counter();
        let input = Element::new("query", ElementKind::Input("search".to_string()));
        manager
            .register(["g", "g"], callback, SequenceOptions::default())
            .expect("should register");
        manager
            .register(["g", "g"], lenient_cb, SequenceOptions::default().ignore_inputs(false))
            .expect("should register");

        let typed = KeyboardEvent::press("g").from_origin(input).at(Target::Document);
        manager.handle_event(&typed);
        manager.handle_event(&typed);
        assert_eq!((count.get(), lenient.get()), (0, 1));
    }

    #[test]
    fn test_listener_follows_registrations() {
        let (manager, _, surface) = setup();
        let (_, cb1) = counter();
        let (_, cb2) = counter();

        let a = manager.register(["a"], cb1, SequenceOptions::default()).expect("should register");
        let b = manager.register(["b"], cb2, SequenceOptions::default()).expect("should register");
        assert_eq!(surface.listeners_for(&Scope::document()), vec![KeyEventKind::Press]);

        assert!(a.unregister());
        assert!(!a.unregister());
        assert!(manager.is_listening());
        b.unregister();
        assert!(!manager.is_listening());
        assert_eq!(surface.listener_count(), 0);
    }

    #[test]
    fn test_callback_unregisters_itself() {
        let (manager, _, _) = setup();
        let count = Rc::new(Cell::new(0));
        let slot: Rc<RefCell<Option<SequenceHandle>>> = Rc::new(RefCell::new(None));
        let (count_in, slot_in) = (Rc::clone(&count), Rc::clone(&slot));

        let handle = manager
            .register(
                ["g"],
                move |_, _| {
                    count_in.set(count_in.get() + 1);
                    if let Some(handle) = slot_in.borrow().as_ref() {
                        handle.unregister();
                    }
                },
                SequenceOptions::default(),
            )
            .expect("should register");
        *slot.borrow_mut() = Some(handle.clone());

        press(&manager, "g");
        press(&manager, "g");
        assert_eq!(count.get(), 1);
        assert!(!handle.is_active());
    }

    #[test]
    fn test_headless_never_fires() {
        let manager = SequenceManager::builder()
            .platform(Platform::Linux)
            .clock(ManualClock::new())
            .surface(HeadlessSurface)
            .build();
        let (count, callback) = counter();
        manager
            .register(["g"], callback, SequenceOptions::default())
            .expect("should register");

        press(&manager, "g");
        assert_eq!(count.get(), 0);
        assert_eq!(manager.sequence_count(), 1);
    }

    #[test]
    fn test_destroy() {
        let (manager, _, surface) = setup();
        let (_, callback) = counter();
        let handle = manager
            .register(["g", "g"], callback, SequenceOptions::default())
            .expect("should register");

        manager.destroy();
        manager.destroy();
        assert_eq!(manager.sequence_count(), 0);
        assert_eq!(surface.listener_count(), 0);
        assert!(!handle.is_active());
    }
}
