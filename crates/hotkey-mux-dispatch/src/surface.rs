//! Input surfaces: where scope listeners get attached
//!
//! The managers never read keys themselves. They attach one listener per
//! scope and event kind to an [`InputSurface`], and whoever owns the real
//! event source routes events back through `handle_event`.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use thiserror::Error;

use crate::event::KeyEventKind;
use crate::target::{Scope, ScopeKey};

/// Handle for an attached listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("no input surface available for {scope}")]
    Unavailable { scope: String },

    #[error("listener {0:?} is not attached")]
    NotAttached(ListenerId),
}

/// Something that can attach and detach keyboard listeners.
pub trait InputSurface {
    /// Attach a listener for `kind` events on `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Unavailable`] when the environment has no
    /// event source for the scope.
    fn attach(&self, scope: &Scope, kind: KeyEventKind) -> Result<ListenerId, SurfaceError>;

    /// Detach a previously attached listener.
    fn detach(&self, listener: ListenerId) -> Result<(), SurfaceError>;
}

impl<S: InputSurface + ?Sized> InputSurface for Rc<S> {
    fn attach(&self, scope: &Scope, kind: KeyEventKind) -> Result<ListenerId, SurfaceError> {
        (**self).attach(scope, kind)
    }

    fn detach(&self, listener: ListenerId) -> Result<(), SurfaceError> {
        (**self).detach(listener)
    }
}

#[derive(Debug, Default)]
struct Listeners {
    next_id: u64,
    attached: BTreeMap<ListenerId, (ScopeKey, KeyEventKind)>,
    total_attached: usize,
}

/// A surface that records attached listeners in memory.
///
/// Used when the caller drives events itself (replay, a raw evdev stream,
/// tests). Clones share the same listener table.
#[derive(Debug, Clone, Default)]
pub struct SimulatedSurface {
    inner: Rc<RefCell<Listeners>>,
}

impl SimulatedSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of listeners currently attached.
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().attached.len()
    }

    /// Number of attach calls ever made.
    pub fn total_attached(&self) -> usize {
        self.inner.borrow().total_attached
    }

    /// Event kinds listened for on `scope`, in attach order.
    pub fn listeners_for(&self, scope: &Scope) -> Vec<KeyEventKind> {
        let key = scope.key();
        self.inner
            .borrow()
            .attached
            .values()
            .filter(|(scope_key, _)| *scope_key == key)
            .map(|(_, kind)| *kind)
            .collect()
    }

    pub fn is_listening(&self, scope: &Scope) -> bool {
        !self.listeners_for(scope).is_empty()
    }
}

impl InputSurface for SimulatedSurface {
    fn attach(&self, scope: &Scope, kind: KeyEventKind) -> Result<ListenerId, SurfaceError> {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = ListenerId(inner.next_id);
        inner.attached.insert(id, (scope.key(), kind));
        inner.total_attached += 1;
        Ok(id)
    }

    fn detach(&self, listener: ListenerId) -> Result<(), SurfaceError> {
        self.inner
            .borrow_mut()
            .attached
            .remove(&listener)
            .map(|_| ())
            .ok_or(SurfaceError::NotAttached(listener))
    }
}

/// A surface for environments without keyboard input. Nothing attaches.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessSurface;

impl InputSurface for HeadlessSurface {
    fn attach(&self, scope: &Scope, _kind: KeyEventKind) -> Result<ListenerId, SurfaceError> {
        Err(SurfaceError::Unavailable {
            scope: scope.to_string(),
        })
    }

    fn detach(&self, listener: ListenerId) -> Result<(), SurfaceError> {
        Err(SurfaceError::NotAttached(listener))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_attach_detach() {
        let surface = SimulatedSurface::new();
        let view = surface.clone();
        let scope = Scope::document();

        let press = surface.attach(&scope, KeyEventKind::Press).expect("should attach");
        let release = surface.attach(&scope, KeyEventKind::Release).expect("should attach");
        assert_eq!(view.listener_count(), 2);
        assert_eq!(
            view.listeners_for(&scope),
            vec![KeyEventKind::Press, KeyEventKind::Release]
        );
        assert!(!view.is_listening(&Scope::window()));

        surface.detach(press).expect("should detach");
        surface.detach(release).expect("should detach");
        assert_eq!(view.listener_count(), 0);
        assert_eq!(view.total_attached(), 2);

        assert_eq!(surface.detach(press), Err(SurfaceError::NotAttached(press)));
    }

    #[test]
    fn test_headless_never_attaches() {
        let err = HeadlessSurface
            .attach(&Scope::document(), KeyEventKind::Press)
            .unwrap_err();
        match err {
            SurfaceError::Unavailable { scope } => assert_eq!(scope, "document"),
            other => panic!("Expected Unavailable error, got: {:?}", other),
        }
    }
}
