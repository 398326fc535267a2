//! Bubbling one event through the targets that listen for it
//!
//! A real UI delivers an event to the origin's listeners, then its
//! ancestors', then the document's and the window's. Drivers without such
//! a UI (replay, raw device input) use [`deliver`] to get the same order.

use crate::event::KeyboardEvent;
use crate::manager::HotkeyManager;
use crate::runtime::HotkeyRuntime;
use crate::sequence::SequenceManager;
use crate::target::Target;

/// Anything that consumes events delivered to a listener.
pub trait EventSink {
    fn dispatch(&self, event: &KeyboardEvent);
}

impl EventSink for HotkeyManager {
    fn dispatch(&self, event: &KeyboardEvent) {
        self.handle_event(event);
    }
}

impl EventSink for SequenceManager {
    fn dispatch(&self, event: &KeyboardEvent) {
        self.handle_event(event);
    }
}

/// Routes to whichever managers the runtime has built.
impl EventSink for HotkeyRuntime {
    fn dispatch(&self, event: &KeyboardEvent) {
        let (hotkeys, sequences) = self.built();
        if let Some(hotkeys) = hotkeys {
            hotkeys.handle_event(event);
        }
        if let Some(sequences) = sequences {
            sequences.handle_event(event);
        }
    }
}

/// How far an event got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Targets the event was delivered at, in order
    pub path: Vec<Target>,
    pub default_prevented: bool,
}

/// Deliver `event` at each target on its origin's bubble path, stopping
/// after the target where propagation was stopped.
///
/// Every sink sees the event at a target before it moves on.
pub fn deliver(event: &KeyboardEvent, sinks: &[&dyn EventSink]) -> Delivery {
    let mut path = Vec::new();
    for target in event.origin.bubble_path() {
        let at = event.at(target.clone());
        for sink in sinks {
            sink.dispatch(&at);
        }
        path.push(target);
        if at.propagation_stopped() {
            break;
        }
    }
    Delivery {
        path,
        default_prevented: event.default_prevented(),
    }
}
