//! Event targets and listening scopes
//!
//! Elements are observed, never owned: an [`Element`] is a cheap reference
//! whose equality is identity, so two elements with the same name and kind
//! are still different scopes.

use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_ELEMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u64);

/// Input types that accept typed text.
const TEXT_INPUT_TYPES: &[&str] = &[
    "text",
    "search",
    "email",
    "password",
    "url",
    "tel",
    "number",
    "date",
    "datetime-local",
    "month",
    "time",
    "week",
];

/// What kind of element this is, as far as input suppression cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    /// `<input>` with its `type` attribute (lowercase, "text" by default)
    Input(String),
    TextArea,
    Select,
    /// Any other tag
    Other(String),
}

impl ElementKind {
    /// Whether typing into this element produces text.
    pub fn accepts_text(&self) -> bool {
        match self {
            ElementKind::Input(input_type) => TEXT_INPUT_TYPES.contains(&input_type.as_str()),
            ElementKind::TextArea | ElementKind::Select => true,
            ElementKind::Other(_) => false,
        }
    }
}

impl std::str::FromStr for ElementKind {
    type Err = String;

    /// Accepts `"input"`, `"input:checkbox"`, `"textarea"`, `"select"` or
    /// any other tag name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        if lower.is_empty() {
            return Err("Element kind is empty".to_string());
        }
        let kind = match lower.split_once(':') {
            Some(("input", input_type)) if !input_type.is_empty() => {
                ElementKind::Input(input_type.to_string())
            }
            Some(_) => return Err(format!("Unknown element kind: {}", s)),
            None => match lower.as_str() {
                "input" => ElementKind::Input("text".to_string()),
                "textarea" => ElementKind::TextArea,
                "select" => ElementKind::Select,
                tag => ElementKind::Other(tag.to_string()),
            },
        };
        Ok(kind)
    }
}

#[derive(Debug)]
struct ElementNode {
    id: ElementId,
    name: String,
    kind: ElementKind,
    content_editable: bool,
    parent: Option<Element>,
}

/// A UI element that can be an event origin or a listening scope.
#[derive(Clone)]
pub struct Element(Rc<ElementNode>);

impl Element {
    /// Create a top-level element.
    pub fn new(name: impl Into<String>, kind: ElementKind) -> Self {
        Self::build(name.into(), kind, false, None)
    }

    /// Create an element nested inside `parent`.
    pub fn child_of(parent: &Element, name: impl Into<String>, kind: ElementKind) -> Self {
        Self::build(name.into(), kind, false, Some(parent.clone()))
    }

    /// Same element description, with content editing enabled.
    ///
    /// Returns a new element (new identity).
    pub fn content_editable(self) -> Self {
        let node = &self.0;
        Self::build(node.name.clone(), node.kind.clone(), true, node.parent.clone())
    }

    fn build(name: String, kind: ElementKind, content_editable: bool, parent: Option<Element>) -> Self {
        let id = ElementId(NEXT_ELEMENT_ID.fetch_add(1, Ordering::Relaxed));
        Self(Rc::new(ElementNode {
            id,
            name,
            kind,
            content_editable,
            parent,
        }))
    }

    pub fn id(&self) -> ElementId {
        self.0.id
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn kind(&self) -> &ElementKind {
        &self.0.kind
    }

    pub fn parent(&self) -> Option<&Element> {
        self.0.parent.as_ref()
    }

    /// Editable controls: text-entry inputs, text areas, selects, and any
    /// element with content editing enabled.
    pub fn is_editable(&self) -> bool {
        self.0.content_editable || self.0.kind.accepts_text()
    }

    /// Whether `other` is this element or one of its descendants.
    pub fn contains(&self, other: &Element) -> bool {
        let mut current = Some(other);
        while let Some(element) = current {
            if element == self {
                return true;
            }
            current = element.parent();
        }
        false
    }

    /// A reference that does not keep the element alive.
    pub fn downgrade(&self) -> WeakElement {
        WeakElement {
            id: self.0.id,
            name: self.0.name.clone(),
            node: Rc::downgrade(&self.0),
        }
    }

    /// This element followed by its ancestors, innermost first.
    pub fn ancestry(&self) -> Vec<Element> {
        let mut chain = vec![self.clone()];
        let mut current = self.parent();
        while let Some(element) = current {
            chain.push(element.clone());
            current = element.parent();
        }
        chain
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.0.id)
            .field("name", &self.0.name)
            .field("kind", &self.0.kind)
            .finish()
    }
}

/// A non-owning [`Element`] reference. Keeps the identity and name so a
/// dropped element can still be named and matched by id.
#[derive(Debug, Clone)]
pub struct WeakElement {
    id: ElementId,
    name: String,
    node: Weak<ElementNode>,
}

impl WeakElement {
    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn upgrade(&self) -> Option<Element> {
        self.node.upgrade().map(Element)
    }
}

/// Where an event originated, or which listener is handling it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Window,
    Document,
    /// The document's root element. Some browsers' privacy hardening report
    /// it instead of the document as a listener's attachment point.
    DocumentElement,
    Element(Element),
}

impl Target {
    pub fn element(&self) -> Option<&Element> {
        match self {
            Target::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Whether this target is an editable control.
    pub fn is_editable(&self) -> bool {
        self.element().is_some_and(Element::is_editable)
    }

    /// Targets an event visits while bubbling from this origin: the element
    /// and its ancestors, then the document, then the window.
    pub fn bubble_path(&self) -> Vec<Target> {
        let mut path: Vec<Target> = match self {
            Target::Element(element) => element.ancestry().into_iter().map(Target::Element).collect(),
            Target::Window => return vec![Target::Window],
            Target::Document | Target::DocumentElement => Vec::new(),
        };
        path.push(Target::Document);
        path.push(Target::Window);
        path
    }
}

impl From<Element> for Target {
    fn from(element: Element) -> Self {
        Target::Element(element)
    }
}

/// A global listening target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalTarget {
    Document,
    Window,
}

/// The listening target a registration is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    Global(GlobalTarget),
    Element(Element),
}

/// Identity of a scope, used to partition listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKey {
    Document,
    Window,
    Element(ElementId),
}

impl Scope {
    /// The default scope.
    pub fn document() -> Self {
        Scope::Global(GlobalTarget::Document)
    }

    pub fn window() -> Self {
        Scope::Global(GlobalTarget::Window)
    }

    pub fn key(&self) -> ScopeKey {
        match self {
            Scope::Global(GlobalTarget::Document) => ScopeKey::Document,
            Scope::Global(GlobalTarget::Window) => ScopeKey::Window,
            Scope::Element(element) => ScopeKey::Element(element.id()),
        }
    }

    /// Whether this scope is exactly `element`.
    pub fn is_element(&self, element: &Element) -> bool {
        matches!(self, Scope::Element(scoped) if scoped == element)
    }

    /// Whether an event with this attachment point and origin belongs to
    /// this scope.
    ///
    /// The attachment point must equal the scope (the document's root
    /// element counts as the document), or for an element scope the origin
    /// must be the element or one of its descendants.
    pub fn is_satisfied_by(&self, current_target: &Target, origin: &Target) -> bool {
        match self {
            Scope::Global(global) => global.is_satisfied_by(current_target),
            Scope::Element(element) => {
                current_target.element() == Some(element)
                    || origin.element().is_some_and(|o| element.contains(o))
            }
        }
    }

    /// The same scope without keeping its element alive.
    pub fn downgrade(&self) -> WeakScope {
        match self {
            Scope::Global(global) => WeakScope::Global(*global),
            Scope::Element(element) => WeakScope::Element(element.downgrade()),
        }
    }
}

impl GlobalTarget {
    fn is_satisfied_by(self, current_target: &Target) -> bool {
        match self {
            GlobalTarget::Document => {
                matches!(current_target, Target::Document | Target::DocumentElement)
            }
            GlobalTarget::Window => matches!(current_target, Target::Window),
        }
    }
}

/// A [`Scope`] as held by a registry: element scopes are observed through
/// a [`WeakElement`], so registering never extends an element's lifetime.
///
/// Matching goes by element id, which stays valid after the element is
/// dropped; a dropped element simply never shows up as a target again.
#[derive(Debug, Clone)]
pub enum WeakScope {
    Global(GlobalTarget),
    Element(WeakElement),
}

impl WeakScope {
    pub fn key(&self) -> ScopeKey {
        match self {
            WeakScope::Global(GlobalTarget::Document) => ScopeKey::Document,
            WeakScope::Global(GlobalTarget::Window) => ScopeKey::Window,
            WeakScope::Element(element) => ScopeKey::Element(element.id()),
        }
    }

    pub fn is_element(&self, element: &Element) -> bool {
        matches!(self, WeakScope::Element(scoped) if scoped.id() == element.id())
    }

    /// Same rules as [`Scope::is_satisfied_by`].
    pub fn is_satisfied_by(&self, current_target: &Target, origin: &Target) -> bool {
        match self {
            WeakScope::Global(global) => global.is_satisfied_by(current_target),
            WeakScope::Element(scoped) => {
                let id = scoped.id();
                current_target.element().is_some_and(|e| e.id() == id)
                    || origin
                        .element()
                        .is_some_and(|o| o.ancestry().iter().any(|e| e.id() == id))
            }
        }
    }

    /// The strong scope, or `None` once its element is gone.
    pub fn upgrade(&self) -> Option<Scope> {
        match self {
            WeakScope::Global(global) => Some(Scope::Global(*global)),
            WeakScope::Element(element) => element.upgrade().map(Scope::Element),
        }
    }
}

impl fmt::Display for WeakScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeakScope::Global(GlobalTarget::Document) => write!(f, "document"),
            WeakScope::Global(GlobalTarget::Window) => write!(f, "window"),
            WeakScope::Element(element) => write!(f, "element '{}'", element.name()),
        }
    }
}

impl ScopeKey {
    /// The scope whose listener an event at this attachment point was
    /// delivered by.
    pub fn of_target(target: &Target) -> Self {
        match target {
            Target::Window => ScopeKey::Window,
            Target::Document | Target::DocumentElement => ScopeKey::Document,
            Target::Element(element) => ScopeKey::Element(element.id()),
        }
    }
}

impl From<Element> for Scope {
    fn from(element: Element) -> Self {
        Scope::Element(element)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Global(GlobalTarget::Document) => write!(f, "document"),
            Scope::Global(GlobalTarget::Window) => write!(f, "window"),
            Scope::Element(element) => write!(f, "element '{}'", element.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn div(name: &str) -> Element {
        Element::new(name, ElementKind::Other("div".to_string()))
    }

    #[test]
    fn test_element_identity() {
        let a = div("panel");
        let b = div("panel");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_ne!(Scope::from(a.clone()).key(), Scope::from(b).key());
    }

    #[test]
    fn test_contains_descendants() {
        let panel = div("panel");
        let form = Element::child_of(&panel, "form", ElementKind::Other("form".to_string()));
        let input = Element::child_of(&form, "name", ElementKind::Input("text".to_string()));

        assert!(panel.contains(&input));
        assert!(form.contains(&input));
        assert!(input.contains(&input));
        assert!(!input.contains(&panel));
    }

    #[test]
    fn test_editable_kinds() {
        assert!("input".parse::<ElementKind>().unwrap().accepts_text());
        assert!("input:search".parse::<ElementKind>().unwrap().accepts_text());
        assert!(!"input:checkbox".parse::<ElementKind>().unwrap().accepts_text());
        assert!("textarea".parse::<ElementKind>().unwrap().accepts_text());
        assert!("select".parse::<ElementKind>().unwrap().accepts_text());
        assert!(!"div".parse::<ElementKind>().unwrap().accepts_text());
        assert!("span:x".parse::<ElementKind>().is_err());

        let notes = div("notes").content_editable();
        assert!(notes.is_editable());
    }

    #[test]
    fn test_document_scope_accepts_root_element() {
        let scope = Scope::document();
        assert!(scope.is_satisfied_by(&Target::Document, &Target::Document));
        assert!(scope.is_satisfied_by(&Target::DocumentElement, &Target::Document));
        assert!(!scope.is_satisfied_by(&Target::Window, &Target::Document));
    }

    #[test]
    fn test_element_scope_satisfaction() {
        let panel = div("panel");
        let input = Element::child_of(&panel, "name", ElementKind::Input("text".to_string()));
        let other = div("other");
        let scope = Scope::from(panel.clone());

        assert!(scope.is_satisfied_by(&Target::Element(panel.clone()), &Target::Element(input.clone())));
        assert!(scope.is_satisfied_by(&Target::Document, &Target::Element(input)));
        assert!(!scope.is_satisfied_by(&Target::Document, &Target::Element(other)));
    }

    #[test]
    fn test_weak_scope_outlives_element() {
        let panel = div("panel");
        let button = Element::child_of(&panel, "ok", ElementKind::Other("button".to_string()));
        let scope = Scope::from(panel.clone()).downgrade();

        assert_eq!(scope.key(), Scope::from(panel.clone()).key());
        assert!(scope.is_element(&panel));
        assert!(scope.is_satisfied_by(&Target::Document, &Target::Element(button.clone())));
        assert!(!scope.is_satisfied_by(&Target::Document, &Target::Document));
        assert_eq!(scope.upgrade(), Some(Scope::from(panel.clone())));

        drop(button);
        drop(panel);
        assert_eq!(scope.upgrade(), None);
        assert_eq!(scope.to_string(), "element 'panel'");
    }

    #[test]
    fn test_bubble_path() {
        let panel = div("panel");
        let input = Element::child_of(&panel, "name", ElementKind::Input("text".to_string()));

        let path = Target::Element(input.clone()).bubble_path();
        assert_eq!(
            path,
            vec![
                Target::Element(input),
                Target::Element(panel),
                Target::Document,
                Target::Window,
            ]
        );
        assert_eq!(Target::Document.bubble_path(), vec![Target::Document, Target::Window]);
    }
}
