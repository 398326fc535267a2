//! Shared-listener hotkey dispatch for hotkey-mux
//!
//! Many callers register hotkeys against a scope (the document, the window,
//! or one element). The [`HotkeyManager`] keeps one press/release listener
//! per scope in use and routes each event to the registrations bound there.
//! The [`SequenceManager`] tracks ordered multi-key sequences on its own
//! listener. Everything is single-threaded and synchronous.

mod delivery;
mod diagnostics;
mod event;
mod manager;
mod options;
mod runtime;
mod sequence;
mod surface;
mod target;
mod tracker;

pub use delivery::{deliver, Delivery, EventSink};
pub use diagnostics::{Diagnostic, DiagnosticSink, RecordingSink, Severity, TracingSink};
pub use event::{KeyEventKind, KeyboardEvent};
pub use manager::{
    ConflictError, HotkeyCallback, HotkeyContext, HotkeyHandle, HotkeyManager,
    HotkeyManagerBuilder, LatchState, RegisterError, RegistrationId,
};
pub use options::{HotkeyOptions, OptionsUpdate};
pub use runtime::HotkeyRuntime;
pub use sequence::{
    Clock, ManualClock, SequenceCallback, SequenceContext, SequenceError, SequenceHandle,
    SequenceId, SequenceManager, SequenceManagerBuilder, SequenceOptions, SystemClock,
    DEFAULT_SEQUENCE_TIMEOUT,
};
pub use surface::{HeadlessSurface, InputSurface, ListenerId, SimulatedSurface, SurfaceError};
pub use target::{
    Element, ElementId, ElementKind, GlobalTarget, Scope, ScopeKey, Target, WeakElement, WeakScope,
};
pub use tracker::KeyboardState;
