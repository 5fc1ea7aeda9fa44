//! # filament
//!
//! Fiber-based UI reconciliation engine.
//!
//! ## Architecture
//!
//! filament keeps two fiber trees in one arena: the committed tree and
//! a work-in-progress tree, paired fiber-by-fiber through `alternate`
//! links. A render pass diffs declared elements against the committed
//! tree one unit of work at a time, accumulating an effect list; the
//! commit phase then applies that list to the host in one
//! non-interruptible sweep.
//!
//! ```text
//! Element tree → begin/complete work loop → effect list → commit → Host
//! ```
//!
//! The work loop is cooperative: drive it with [`Reconciler::step`] or
//! a unit budget via [`Reconciler::flush_units`], and a higher-priority
//! update can discard an uncommitted pass at any point.
//!
//! On top of the reconciler sit an in-memory DOM host ([`dom`]), a
//! controlled-input event layer ([`events`]), and a fiber tree
//! inspector ([`inspect`]).
//!
//! ## Modules
//!
//! - [`types`] - Core types (InstanceId, Props, Priority)
//! - [`element`] - Declared element tree and component definitions
//! - [`fiber`] - Fiber records, tags, effects, and the arena
//! - [`reconciler`] - Work loop, diffing, and the commit phase
//! - [`dom`] - In-memory document implementing [`host::Host`]
//! - [`events`] - Input responder, value tracking, state restore
//! - [`inspect`] - Snapshot formatter for debugging tools

pub mod dom;
pub mod element;
pub mod events;
pub mod fiber;
pub mod host;
pub mod inspect;
pub mod reconciler;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use element::{
    Component, ComponentDef, CompositeElement, Element, ErrorHandler, FragmentElement,
    HostElement, RenderError, RenderFn,
};

pub use fiber::{EffectTag, Fiber, FiberArena, FiberId, FiberTag, FiberType};

pub use host::Host;

pub use reconciler::{ReconcileError, Reconciler, Step, WorkStatus};

pub use dom::{Document, DomNode};

pub use events::{
    process_native_event, EventError, EventPriority, EventResponder, InputEvent,
    InputEventType, InputResponder, InputResponderProps, KeyboardEvent, KeyboardEventType,
    Listener, NativeEvent, NativeEventType, ResponderContext, ResponderEvent, RestoreQueue,
    SyntheticEvent,
};

pub use inspect::{FiberSnapshot, FiberView, InspectError, Inspector};
