//! Loading a bindings file into a hotkey runtime
//!
//! Every hotkey and sequence in the file is registered with a callback that
//! records the action it names. Drivers (replay, listen) feed events through
//! [`Bindings::dispatch`] and collect what fired with [`Bindings::take_fired`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use hotkey_mux_core::{BindingsConfig, ElementSpec, Platform};
use hotkey_mux_dispatch::{
    deliver, Delivery, Element, ElementKind, HotkeyOptions, HotkeyRuntime, KeyboardEvent,
    SequenceOptions,
};
use serde::Serialize;

/// What kind of registration fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FiredKind {
    Hotkey,
    Sequence,
}

/// One action reported by a registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fired {
    pub kind: FiredKind,
    /// Descriptor or sequence as written in the file
    pub trigger: String,
    pub action: String,
}

impl std::fmt::Display for Fired {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            FiredKind::Hotkey => "hotkey",
            FiredKind::Sequence => "sequence",
        };
        write!(f, "{} {} -> {}", kind, self.trigger, self.action)
    }
}

/// A runtime populated from a bindings file.
pub struct Bindings {
    runtime: HotkeyRuntime,
    elements: HashMap<String, Element>,
    fired: Rc<RefCell<Vec<Fired>>>,
}

impl Bindings {
    /// Register everything in `config` with `runtime`.
    ///
    /// # Errors
    ///
    /// Returns an error if an element kind is invalid, a scope names an
    /// undeclared element, or a registration is refused (parse failure or
    /// the `error` conflict policy).
    pub fn load(config: &BindingsConfig, runtime: HotkeyRuntime) -> Result<Self> {
        let elements = build_elements(&config.elements)?;
        let fired = Rc::new(RefCell::new(Vec::new()));
        let platform = runtime.platform();

        for binding in &config.hotkeys {
            let scope = match &binding.scope {
                Some(name) => Some(
                    elements
                        .get(name)
                        .cloned()
                        .with_context(|| format!("Unknown element '{}' in hotkey '{}'", name, binding.hotkey))?
                        .into(),
                ),
                None => None,
            };
            let options = HotkeyOptions::from_binding(binding, scope).platform(platform);
            let log = Rc::clone(&fired);
            let action = binding.action.clone();

            runtime
                .hotkeys()
                .register(
                    binding.hotkey.as_str(),
                    move |_, ctx| {
                        log.borrow_mut().push(Fired {
                            kind: FiredKind::Hotkey,
                            trigger: ctx.descriptor.to_string(),
                            action: action.clone(),
                        })
                    },
                    options,
                )
                .with_context(|| format!("Failed to register hotkey '{}'", binding.hotkey))?;
        }

        for binding in &config.sequences {
            let timeout_ms = binding
                .timeout_ms
                .unwrap_or(config.settings.sequence_timeout_ms);
            let timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms));
            let log = Rc::clone(&fired);
            let action = binding.action.clone();

            runtime
                .sequences()
                .register(
                    binding.steps.iter().map(String::as_str),
                    move |_, ctx| {
                        log.borrow_mut().push(Fired {
                            kind: FiredKind::Sequence,
                            trigger: ctx.to_string(),
                            action: action.clone(),
                        })
                    },
                    SequenceOptions::default().timeout(timeout).platform(platform),
                )
                .with_context(|| format!("Failed to register sequence '{}'", binding.steps.join(" ")))?;
        }

        tracing::debug!(
            "Loaded {} hotkey(s) and {} sequence(s)",
            config.hotkeys.len(),
            config.sequences.len()
        );

        Ok(Self {
            runtime,
            elements,
            fired,
        })
    }

    pub fn runtime(&self) -> &HotkeyRuntime {
        &self.runtime
    }

    pub fn platform(&self) -> Platform {
        self.runtime.platform()
    }

    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements.get(name)
    }

    /// Deliver one event along its bubble path.
    pub fn dispatch(&self, event: &KeyboardEvent) -> Delivery {
        deliver(event, &[&self.runtime])
    }

    /// Actions fired since the last call.
    pub fn take_fired(&self) -> Vec<Fired> {
        std::mem::take(&mut *self.fired.borrow_mut())
    }
}

/// Build the element tree. Parents are declared before their children.
fn build_elements(specs: &[ElementSpec]) -> Result<HashMap<String, Element>> {
    let mut elements: HashMap<String, Element> = HashMap::new();
    for spec in specs {
        let kind: ElementKind = spec
            .kind
            .parse()
            .map_err(|e: String| anyhow::anyhow!("Element '{}': {}", spec.name, e))?;
        let element = match &spec.parent {
            Some(parent) => {
                let parent = elements
                    .get(parent)
                    .with_context(|| format!("Element '{}' has unknown parent '{}'", spec.name, parent))?;
                Element::child_of(parent, spec.name.clone(), kind)
            }
            None => Element::new(spec.name.clone(), kind),
        };
        let element = if spec.editable {
            element.content_editable()
        } else {
            element
        };
        elements.insert(spec.name.clone(), element);
    }
    Ok(elements)
}
