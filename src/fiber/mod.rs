//! Fiber tree - the mutable shadow of the declared element tree.
//!
//! A fiber is one unit of work: it mirrors one element position and
//! carries the diffing state (alternate pairing), the tree links
//! (parent/child/sibling), and the pending side effects for the commit
//! phase.
//!
//! Fibers live in a [`FiberArena`] and reference each other by
//! [`FiberId`] index, never by pointer. The arena owns every fiber;
//! links are plain indices that the arena outlives within a render pass.

use std::fmt;

use crate::element::{Component, Element, RenderError};
use crate::types::{InstanceId, Key, Props};

pub mod arena;

pub use arena::{FiberArena, FiberId};

// =============================================================================
// Fiber Tag
// =============================================================================

/// What kind of work a fiber represents.
///
/// This is a closed enumeration with fixed numbering: the debug
/// formatter rejects any value outside it. Several variants exist only
/// so the numbering stays exhaustive; the reconciler itself creates
/// `FunctionComponent`, `ClassComponent`, `HostRoot`, `Host`, `Text`
/// and `Fragment` fibers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FiberTag {
    Indeterminate = 0,
    FunctionComponent = 1,
    ClassComponent = 2,
    HostRoot = 3,
    Portal = 4,
    Host = 5,
    Text = 6,
    Coroutine = 7,
    Handler = 8,
    Yield = 9,
    Fragment = 10,
}

impl FiberTag {
    /// Raw numeric tag, as exposed to inspection tooling.
    pub fn raw(self) -> u8 {
        self as u8
    }

    /// Parse a raw tag. `None` for values outside the enumeration.
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Indeterminate),
            1 => Some(Self::FunctionComponent),
            2 => Some(Self::ClassComponent),
            3 => Some(Self::HostRoot),
            4 => Some(Self::Portal),
            5 => Some(Self::Host),
            6 => Some(Self::Text),
            7 => Some(Self::Coroutine),
            8 => Some(Self::Handler),
            9 => Some(Self::Yield),
            10 => Some(Self::Fragment),
            _ => None,
        }
    }
}

// =============================================================================
// Effect Tag (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Pending side effects for a fiber, as a bitfield.
    ///
    /// Combine with bitwise OR: `EffectTag::PLACEMENT | EffectTag::UPDATE`.
    /// A fiber may carry several effects at once; the commit phase
    /// decodes the combination.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EffectTag: u8 {
        const NONE = 0;
        const PERFORMED_WORK = 1;
        const PLACEMENT = 1 << 1;
        const UPDATE = 1 << 2;
        const DELETION = 1 << 3;
        const CONTENT_RESET = 1 << 4;
        const CALLBACK = 1 << 5;
        const ERR = 1 << 6;
        const REF = 1 << 7;
    }
}

impl EffectTag {
    /// Effects the commit phase acts on (everything but PerformedWork).
    pub fn needs_commit(self) -> bool {
        self.intersects(
            Self::PLACEMENT
                | Self::UPDATE
                | Self::DELETION
                | Self::CONTENT_RESET
                | Self::CALLBACK
                | Self::ERR
                | Self::REF,
        )
    }
}

// =============================================================================
// Fiber Type
// =============================================================================

/// Component identity for a fiber.
#[derive(Debug, Clone, Default)]
pub enum FiberType {
    /// Roots and text fibers have no component type.
    #[default]
    None,
    /// Host element tag name.
    Host(String),
    /// Composite component; identity is the `Rc` pointer.
    Composite(Component),
    Fragment,
}

impl FiberType {
    /// Human-readable type name, as shown by the debug formatter.
    pub fn name(&self) -> Option<String> {
        match self {
            FiberType::None => None,
            FiberType::Host(ty) => Some(ty.clone()),
            FiberType::Composite(component) => Some(component.name.clone()),
            FiberType::Fragment => Some("Fragment".to_string()),
        }
    }
}

// =============================================================================
// Fiber
// =============================================================================

/// One fiber record.
///
/// Invariants:
/// - every non-root fiber has a non-null `parent`
/// - `alternate` pairs are mutually referential and never chain
#[derive(Debug)]
pub struct Fiber {
    pub tag: FiberTag,
    pub ty: FiberType,
    pub key: Option<Key>,

    /// Monotonic identity assigned at arena insertion. Survives slot
    /// reuse, so identity-keyed side tables stay correct.
    pub serial: u64,

    /// Position among siblings in the most recent reconcile.
    pub index: u32,

    pub parent: Option<FiberId>,
    pub child: Option<FiberId>,
    pub sibling: Option<FiberId>,
    pub alternate: Option<FiberId>,

    pub effect_tag: EffectTag,
    pub state_node: Option<InstanceId>,

    pub pending_props: Props,
    pub memoized_props: Props,

    /// Text content for `Text` fibers.
    pub pending_text: Option<String>,
    pub memoized_text: Option<String>,

    /// Children declared for this fiber, consumed by begin-work.
    pub pending_children: Vec<Element>,

    // Effect list links, anchored on the in-progress root.
    pub next_effect: Option<FiberId>,
    pub first_effect: Option<FiberId>,
    pub last_effect: Option<FiberId>,

    /// Error captured by a boundary, reported during commit.
    pub captured_error: Option<RenderError>,
}

impl Fiber {
    /// Create a blank fiber. The arena assigns `serial` on insertion.
    pub fn new(tag: FiberTag, ty: FiberType, key: Option<Key>) -> Self {
        Self {
            tag,
            ty,
            key,
            serial: 0,
            index: 0,
            parent: None,
            child: None,
            sibling: None,
            alternate: None,
            effect_tag: EffectTag::NONE,
            state_node: None,
            pending_props: Props::new(),
            memoized_props: Props::new(),
            pending_text: None,
            memoized_text: None,
            pending_children: Vec::new(),
            next_effect: None,
            first_effect: None,
            last_effect: None,
            captured_error: None,
        }
    }

    /// Is this fiber a composite (renders children from a function)?
    pub fn is_composite(&self) -> bool {
        matches!(
            self.tag,
            FiberTag::FunctionComponent | FiberTag::ClassComponent
        )
    }

    /// Is this fiber an error boundary?
    pub fn is_error_boundary(&self) -> bool {
        match &self.ty {
            FiberType::Composite(component) => component.error_boundary,
            _ => false,
        }
    }

    /// Clear effect bookkeeping for a fresh render pass.
    pub fn reset_effects(&mut self) {
        self.effect_tag = EffectTag::NONE;
        self.next_effect = None;
        self.first_effect = None;
        self.last_effect = None;
        self.captured_error = None;
    }
}

impl fmt::Display for Fiber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty.name() {
            Some(name) => write!(f, "{:?}<{}>", self.tag, name),
            None => write!(f, "{:?}", self.tag),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
