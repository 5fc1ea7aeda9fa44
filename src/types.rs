//! Core types for filament.
//!
//! These types define the foundation that everything builds on.
//! They flow through the reconciler and define what hosts and the
//! event layer understand.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

// =============================================================================
// Instance Handle
// =============================================================================

/// Opaque handle to a host instance.
///
/// The host allocates these; the reconciler only stores and forwards them.
/// Using a plain index keeps fibers free of host-specific types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u32);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Key
// =============================================================================

/// Stable identity for an element across renders.
///
/// Two elements with the same type and key are treated as the same
/// logical node and diffed in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key(String);

impl Key {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<i64> for Key {
    fn from(key: i64) -> Self {
        Self(key.to_string())
    }
}

// =============================================================================
// Priority
// =============================================================================

/// Scheduling priority for root updates.
///
/// A render pass in progress is abandoned when a strictly higher priority
/// update arrives before it commits. Ordering: `Normal < High < Sync`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Priority {
    /// Default priority for declarative updates.
    Normal,
    /// User-visible updates that should preempt background work.
    High,
    /// Must render and commit before control returns to the caller.
    Sync,
}

// =============================================================================
// Prop Values
// =============================================================================

/// A property value.
///
/// Values compare as DOM strings where the host needs string semantics:
/// `Num(42.0)` and `Str("42")` produce the same DOM string.
#[derive(Debug, Clone, PartialEq)]
pub enum PropValue {
    Str(String),
    Num(f64),
    Bool(bool),
}

impl PropValue {
    /// Coerce to the string form a DOM host stores.
    ///
    /// Whole numbers drop the fractional part, so `42` renders as "42".
    pub fn to_dom_string(&self) -> String {
        match self {
            PropValue::Str(s) => s.clone(),
            PropValue::Num(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            PropValue::Bool(b) => b.to_string(),
        }
    }

    /// Truthiness for boolean-ish attributes (`checked`, `disabled`).
    pub fn is_truthy(&self) -> bool {
        match self {
            PropValue::Str(s) => !s.is_empty(),
            PropValue::Num(n) => *n != 0.0,
            PropValue::Bool(b) => *b,
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Num(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        PropValue::Num(value as f64)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

// =============================================================================
// Callbacks
// =============================================================================

/// Callback ref: receives `Some(instance)` on attach, `None` on detach.
pub type RefCallback = Rc<dyn Fn(Option<InstanceId>)>;

/// Commit-phase callback, invoked after host mutations have been applied.
pub type CommitCallback = Rc<dyn Fn()>;

// =============================================================================
// Props
// =============================================================================

/// Property bag for a declared element.
///
/// Attributes are plain data; `node_ref` and `on_commit` are commit-phase
/// callbacks compared by identity when diffing.
#[derive(Clone, Default)]
pub struct Props {
    attrs: FxHashMap<String, PropValue>,
    pub node_ref: Option<RefCallback>,
    pub on_commit: Option<CommitCallback>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style attribute setter.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Builder-style ref setter.
    pub fn with_ref(mut self, node_ref: RefCallback) -> Self {
        self.node_ref = Some(node_ref);
        self
    }

    /// Builder-style commit callback setter.
    pub fn with_on_commit(mut self, on_commit: CommitCallback) -> Self {
        self.on_commit = Some(on_commit);
        self
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.attrs.get(name)
    }

    /// Attribute coerced to its DOM string, if present.
    pub fn string(&self, name: &str) -> Option<String> {
        self.attrs.get(name).map(PropValue::to_dom_string)
    }

    /// Attribute coerced to a boolean, if present.
    pub fn truthy(&self, name: &str) -> Option<bool> {
        self.attrs.get(name).map(PropValue::is_truthy)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty() && self.node_ref.is_none() && self.on_commit.is_none()
    }
}

impl PartialEq for Props {
    fn eq(&self, other: &Self) -> bool {
        self.attrs == other.attrs
            && rc_eq(&self.node_ref, &other.node_ref)
            && rc_eq(&self.on_commit, &other.on_commit)
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Props")
            .field("attrs", &self.attrs)
            .field("node_ref", &self.node_ref.is_some())
            .field("on_commit", &self.on_commit.is_some())
            .finish()
    }
}

/// Identity comparison for optional callbacks.
pub(crate) fn rc_eq<T: ?Sized>(a: &Option<Rc<T>>, b: &Option<Rc<T>>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => Rc::ptr_eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prop_value_dom_string() {
        assert_eq!(PropValue::from(42i64).to_dom_string(), "42");
        assert_eq!(PropValue::from("42").to_dom_string(), "42");
        assert_eq!(PropValue::from(1.5).to_dom_string(), "1.5");
        assert_eq!(PropValue::from(true).to_dom_string(), "true");
    }

    #[test]
    fn test_props_equality_by_callback_identity() {
        let a = Props::new().attr("value", "x");
        let b = Props::new().attr("value", "x");
        assert_eq!(a, b);

        let cb: RefCallback = Rc::new(|_| {});
        let c = Props::new().attr("value", "x").with_ref(cb.clone());
        let d = Props::new().attr("value", "x").with_ref(cb);
        assert_eq!(c, d);

        let e = Props::new().attr("value", "x").with_ref(Rc::new(|_| {}));
        assert_ne!(c, e);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Normal < Priority::High);
        assert!(Priority::High < Priority::Sync);
    }

    #[test]
    fn test_props_lookup() {
        let props = Props::new().attr("type", "checkbox").attr("checked", true);
        assert_eq!(props.string("type").as_deref(), Some("checkbox"));
        assert_eq!(props.truthy("checked"), Some(true));
        assert!(props.get("name").is_none());
    }
}
