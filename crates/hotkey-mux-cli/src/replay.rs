//! Scripted input playback
//!
//! This module provides the [`ReplayExecutor`] struct for playing back the
//! `replay` block of a bindings file (focus changes, key presses, key
//! combos, and delays) through a loaded [`Bindings`].

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use hotkey_mux_core::{parse_hotkey, HotkeyDescriptor, ParsedHotkey, ReplayStep};
use hotkey_mux_dispatch::{Clock, KeyboardEvent, KeyboardState, Target};

use crate::bindings::Bindings;

/// Clock backed by tokio's timer, so paused test time drives sequence
/// timeouts too.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        tokio::time::Instant::now().into_std()
    }
}

/// Plays replay steps against a set of bindings.
///
/// The executor owns the simulated keyboard, so modifiers pressed by one
/// `press` step stay held until a matching `release`.
///
/// # Example
///
/// ```ignore
/// let bindings = Bindings::load(&config, runtime)?;
/// let mut executor = ReplayExecutor::new(&bindings);
/// executor.execute(&config.replay).await?;
/// for fired in bindings.take_fired() {
///     println!("{}", fired);
/// }
/// ```
pub struct ReplayExecutor<'a> {
    bindings: &'a Bindings,
    keyboard: KeyboardState,
}

impl<'a> ReplayExecutor<'a> {
    pub fn new(bindings: &'a Bindings) -> Self {
        Self {
            bindings,
            keyboard: KeyboardState::new(),
        }
    }

    pub fn keyboard(&self) -> &KeyboardState {
        &self.keyboard
    }

    /// Execute steps in order.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A `focus` step names an element the bindings don't declare
    /// - A key step holds a descriptor that doesn't parse
    pub async fn execute(&mut self, steps: &[ReplayStep]) -> Result<()> {
        for step in steps {
            self.execute_step(step).await?;
        }
        Ok(())
    }

    async fn execute_step(&mut self, step: &ReplayStep) -> Result<()> {
        match step {
            ReplayStep::Focus(None) => {
                tracing::debug!("Replay: focus document");
                self.keyboard.focus(Target::Document);
            }
            ReplayStep::Focus(Some(name)) => {
                let element = self
                    .bindings
                    .element(name)
                    .with_context(|| format!("Replay focuses unknown element '{}'", name))?
                    .clone();
                tracing::debug!("Replay: focus {}", name);
                self.keyboard.focus(element);
            }
            ReplayStep::Press(combo) => {
                let hotkey = self.parse_combo(combo)?;
                let events = self.keyboard.press_combo(&hotkey);
                self.send(&events);
            }
            ReplayStep::Release(combo) => {
                let hotkey = self.parse_combo(combo)?;
                let events = self.keyboard.release_combo(&hotkey);
                self.send(&events);
            }
            ReplayStep::Tap(combo) => {
                let hotkey = self.parse_combo(combo)?;
                let mut events = self.keyboard.press_combo(&hotkey);
                events.extend(self.keyboard.release_combo(&hotkey));
                self.send(&events);
            }
            ReplayStep::Delay(ms) => {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
                let expired = self.bindings.runtime().sequences().check_timeouts();
                if expired > 0 {
                    tracing::debug!("Replay: {} sequence(s) timed out", expired);
                }
            }
        }
        Ok(())
    }

    fn parse_combo(&self, combo: &str) -> Result<ParsedHotkey> {
        parse_hotkey(&HotkeyDescriptor::from(combo), self.bindings.platform())
            .with_context(|| format!("Invalid replay key '{}'", combo))
    }

    fn send(&self, events: &[KeyboardEvent]) {
        for event in events {
            let delivery = self.bindings.dispatch(event);
            tracing::trace!(
                "Replay: {:?} {} reached {} target(s)",
                event.kind,
                event.key,
                delivery.path.len()
            );
        }
    }
}
