//! Event responder layer.
//!
//! Raw host events come in, deduplicated synthetic events go out:
//!
//! ```text
//! native event -> responder (value tracker gate) -> dispatch -> state restore
//! ```
//!
//! - [`responder`] - responder contract and dispatch context
//! - [`tracker`] - per-node last-known-value cache
//! - [`input`] - the Input responder (change/keyboard events)
//! - [`restore`] - post-dispatch controlled-state reconciliation

use thiserror::Error;

use crate::dom::Document;
use crate::types::InstanceId;

pub mod input;
pub mod responder;
pub mod restore;
pub mod tracker;

pub use input::{InputResponder, InputResponderProps};
pub use responder::{
    EventPriority, EventResponder, InputEvent, InputEventType, KeyboardEvent, KeyboardEventType,
    Listener, NativeEvent, NativeEventType, ResponderContext, ResponderEvent, SyntheticEvent,
};
pub use restore::RestoreQueue;

// =============================================================================
// Errors
// =============================================================================

/// Framework-level event system failures.
///
/// These signal inconsistent internal bookkeeping, not user error, and
/// are reported loudly instead of being papered over.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// A radio group scan produced a node that is no longer in the
    /// document.
    #[error("radio group member {0} is not in the document")]
    MissingRadioNode(InstanceId),

    /// A radio sharing the group name has no value tracker: it was not
    /// mounted by this framework. Mixing tracked and foreign radio
    /// inputs with the same name is not supported.
    #[error("radio group member {0} has no value tracker installed")]
    UntrackedRadio(InstanceId),
}

// =============================================================================
// Native event processing
// =============================================================================

/// Run one native event through a responder.
///
/// Builds the dispatch context, lets the responder decide what to
/// dispatch, flushes queued (non-discrete) dispatches, then restores
/// controlled DOM state for any targets the responder enqueued.
pub fn process_native_event<R: EventResponder>(
    doc: &mut Document,
    responder: &R,
    props: &R::Props,
    event: &ResponderEvent,
) -> Result<(), EventError> {
    tracing::trace!(ty = ?event.ty, target = %event.target, "processing native event");

    let mut restore_queue = RestoreQueue::new();
    {
        let mut ctx = ResponderContext::new(doc, &mut restore_queue, event.native.time_stamp);
        responder.on_event(event, &mut ctx, props)?;
        ctx.flush();
    }
    restore::restore_state_if_needed(doc, &mut restore_queue);
    Ok(())
}
