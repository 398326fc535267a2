//! One hotkey manager and one sequence manager, built on first use
//!
//! Consumers receive a [`HotkeyRuntime`] instead of reaching for a global.
//! `reset` tears both managers down; the next access builds fresh ones.

use std::cell::RefCell;
use std::rc::Rc;

use hotkey_mux_core::Platform;

use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::manager::HotkeyManager;
use crate::sequence::{Clock, SequenceManager, SystemClock};
use crate::surface::{InputSurface, SimulatedSurface};

/// Owner of the process's hotkey and sequence managers.
pub struct HotkeyRuntime {
    platform: Platform,
    surface: Rc<dyn InputSurface>,
    diagnostics: Rc<dyn DiagnosticSink>,
    clock: Rc<dyn Clock>,
    hotkeys: RefCell<Option<HotkeyManager>>,
    sequences: RefCell<Option<SequenceManager>>,
}

impl Default for HotkeyRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl HotkeyRuntime {
    /// A runtime for the detected platform, recording listeners in memory.
    pub fn new() -> Self {
        Self {
            platform: Platform::detect(),
            surface: Rc::new(SimulatedSurface::new()),
            diagnostics: Rc::new(TracingSink),
            clock: Rc::new(SystemClock),
            hotkeys: RefCell::new(None),
            sequences: RefCell::new(None),
        }
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_surface(mut self, surface: impl InputSurface + 'static) -> Self {
        self.surface = Rc::new(surface);
        self
    }

    pub fn with_diagnostics(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.diagnostics = Rc::new(sink);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Rc::new(clock);
        self
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// The hotkey manager, built on first call.
    pub fn hotkeys(&self) -> HotkeyManager {
        self.hotkeys
            .borrow_mut()
            .get_or_insert_with(|| {
                HotkeyManager::builder()
                    .platform(self.platform)
                    .surface(Rc::clone(&self.surface))
                    .diagnostics(Rc::clone(&self.diagnostics))
                    .build()
            })
            .clone()
    }

    /// The sequence manager, built on first call.
    pub fn sequences(&self) -> SequenceManager {
        self.sequences
            .borrow_mut()
            .get_or_insert_with(|| {
                SequenceManager::builder()
                    .platform(self.platform)
                    .clock(Rc::clone(&self.clock))
                    .surface(Rc::clone(&self.surface))
                    .build()
            })
            .clone()
    }

    /// Managers built so far, without building missing ones.
    pub(crate) fn built(&self) -> (Option<HotkeyManager>, Option<SequenceManager>) {
        (self.hotkeys.borrow().clone(), self.sequences.borrow().clone())
    }

    /// Destroy both managers. Handles from before the reset become inactive.
    pub fn reset(&self) {
        let hotkeys = self.hotkeys.borrow_mut().take();
        let sequences = self.sequences.borrow_mut().take();
        if let Some(manager) = hotkeys {
            manager.destroy();
        }
        if let Some(manager) = sequences {
            manager.destroy();
        }
    }
}
