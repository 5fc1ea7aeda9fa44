//! Declared element tree.
//!
//! Elements are the immutable description of what the UI should look
//! like. The reconciler diffs a new element tree against the current
//! fiber tree and produces the minimal set of host effects.
//!
//! # Example
//!
//! ```ignore
//! use filament::element::{Element, ComponentDef};
//! use filament::types::Props;
//!
//! let app = ComponentDef::new("App", |_props| {
//!     Ok(vec![
//!         Element::host("div", Props::new(), vec![Element::text("hello")]),
//!     ])
//! });
//! let tree = Element::component(app, Props::new());
//! ```

use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::types::{Key, Props};

// =============================================================================
// Render Error
// =============================================================================

/// Error returned by a component render function.
///
/// Propagates to the nearest error-boundary ancestor; with no boundary
/// the render pass fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("render error: {0}")]
pub struct RenderError(pub String);

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

// =============================================================================
// Component Definition
// =============================================================================

/// Render function: props in, child elements out.
pub type RenderFn = Box<dyn Fn(&Props) -> Result<Vec<Element>, RenderError>>;

/// Handler invoked at commit time when a boundary captured an error.
pub type ErrorHandler = Rc<dyn Fn(&RenderError)>;

/// A composite component type.
///
/// Component identity is the `Rc` pointer: two elements share a type
/// only if they share the same `ComponentDef` allocation.
pub struct ComponentDef {
    pub name: String,
    pub render: RenderFn,
    pub error_boundary: bool,
    pub on_error: Option<ErrorHandler>,
}

/// Shared handle to a component definition.
pub type Component = Rc<ComponentDef>;

impl ComponentDef {
    /// Define a plain function component.
    pub fn new(
        name: impl Into<String>,
        render: impl Fn(&Props) -> Result<Vec<Element>, RenderError> + 'static,
    ) -> Component {
        Rc::new(Self {
            name: name.into(),
            render: Box::new(render),
            error_boundary: false,
            on_error: None,
        })
    }

    /// Define an error boundary.
    ///
    /// Render errors thrown anywhere below this component mark it with
    /// the Err effect; `on_error` runs during the commit phase.
    pub fn boundary(
        name: impl Into<String>,
        render: impl Fn(&Props) -> Result<Vec<Element>, RenderError> + 'static,
        on_error: ErrorHandler,
    ) -> Component {
        Rc::new(Self {
            name: name.into(),
            render: Box::new(render),
            error_boundary: true,
            on_error: Some(on_error),
        })
    }
}

impl fmt::Debug for ComponentDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDef")
            .field("name", &self.name)
            .field("error_boundary", &self.error_boundary)
            .finish()
    }
}

// =============================================================================
// Element
// =============================================================================

/// One node of the declared UI tree.
#[derive(Debug, Clone)]
pub enum Element {
    Host(HostElement),
    Text(String),
    Composite(CompositeElement),
    Fragment(FragmentElement),
}

/// A host element (`div`, `input`, ...).
#[derive(Debug, Clone)]
pub struct HostElement {
    pub ty: String,
    pub key: Option<Key>,
    pub props: Props,
    pub children: Vec<Element>,
}

/// A composite element: a component type plus props.
#[derive(Debug, Clone)]
pub struct CompositeElement {
    pub component: Component,
    pub key: Option<Key>,
    pub props: Props,
}

/// A keyed grouping with no host node of its own.
#[derive(Debug, Clone)]
pub struct FragmentElement {
    pub key: Option<Key>,
    pub children: Vec<Element>,
}

impl Element {
    /// Create a host element.
    pub fn host(ty: impl Into<String>, props: Props, children: Vec<Element>) -> Self {
        Element::Host(HostElement {
            ty: ty.into(),
            key: None,
            props,
            children,
        })
    }

    /// Create a text element.
    pub fn text(text: impl Into<String>) -> Self {
        Element::Text(text.into())
    }

    /// Create a composite element.
    pub fn component(component: Component, props: Props) -> Self {
        Element::Composite(CompositeElement {
            component,
            key: None,
            props,
        })
    }

    /// Create a fragment.
    pub fn fragment(children: Vec<Element>) -> Self {
        Element::Fragment(FragmentElement {
            key: None,
            children,
        })
    }

    /// Attach a key.
    pub fn keyed(mut self, key: impl Into<Key>) -> Self {
        let key = key.into();
        match &mut self {
            Element::Host(el) => el.key = Some(key),
            Element::Composite(el) => el.key = Some(key),
            Element::Fragment(el) => el.key = Some(key),
            // Text nodes carry no key; positional identity only.
            Element::Text(_) => {}
        }
        self
    }

    pub fn key(&self) -> Option<&Key> {
        match self {
            Element::Host(el) => el.key.as_ref(),
            Element::Composite(el) => el.key.as_ref(),
            Element::Fragment(el) => el.key.as_ref(),
            Element::Text(_) => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyed_builder() {
        let el = Element::host("div", Props::new(), vec![]).keyed("a");
        assert_eq!(el.key().map(Key::as_str), Some("a"));

        let text = Element::text("hi").keyed("ignored");
        assert!(text.key().is_none());
    }

    #[test]
    fn test_component_identity_is_pointer_identity() {
        let render = |_: &Props| Ok(vec![]);
        let a = ComponentDef::new("Same", render);
        let b = ComponentDef::new("Same", render);
        assert!(Rc::ptr_eq(&a, &a.clone()));
        assert!(!Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_boundary_flag() {
        let b = ComponentDef::boundary("Boundary", |_| Ok(vec![]), Rc::new(|_| {}));
        assert!(b.error_boundary);
        assert!(b.on_error.is_some());
    }
}
