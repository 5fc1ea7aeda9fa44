//! Event responder contract.
//!
//! A responder declares which native event types it wants and gets an
//! `on_event` call per raw event, together with a [`ResponderContext`]
//! it uses to dispatch synthetic events to declared listeners and to
//! schedule post-dispatch DOM state restoration.

use std::rc::Rc;

use crate::dom::Document;
use crate::events::restore::RestoreQueue;
use crate::events::EventError;
use crate::types::InstanceId;

// =============================================================================
// Native events
// =============================================================================

/// Raw event names a responder can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeEventType {
    Input,
    Change,
    BeforeInput,
    KeyDown,
    KeyUp,
    KeyPress,
    Click,
}

/// Payload of a raw host event.
#[derive(Debug, Clone, Default)]
pub struct NativeEvent {
    pub data: Option<String>,
    pub data_transfer: Option<String>,
    pub input_type: Option<String>,
    pub is_composing: bool,
    pub key: Option<String>,
    pub repeat: bool,
    pub alt_key: bool,
    pub ctrl_key: bool,
    pub meta_key: bool,
    pub shift_key: bool,
    pub time_stamp: u64,
}

/// A raw event as delivered to a responder.
#[derive(Debug, Clone)]
pub struct ResponderEvent {
    pub ty: NativeEventType,
    /// The node the raw event fired on.
    pub target: InstanceId,
    /// The node the responder is attached to, if still mounted.
    pub responder_target: Option<InstanceId>,
    pub native: NativeEvent,
}

// =============================================================================
// Synthetic events
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEventType {
    Change,
    BeforeChange,
    ValueChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardEventType {
    KeyDown,
    KeyUp,
    KeyPress,
}

/// Normalized input event handed to declared listeners.
#[derive(Debug, Clone)]
pub struct InputEvent {
    pub ty: InputEventType,
    pub target: InstanceId,
    pub data: Option<String>,
    pub data_transfer: Option<String>,
    pub input_type: Option<String>,
    pub is_composing: bool,
    pub time_stamp: u64,
}

/// Normalized keyboard event handed to declared listeners.
#[derive(Debug, Clone)]
pub struct KeyboardEvent {
    pub ty: KeyboardEventType,
    pub target: InstanceId,
    pub key: Option<String>,
    pub repeat: bool,
    pub is_composing: bool,
    pub alt_key: bool,
    pub ctrl_key: bool,
    pub meta_key: bool,
    pub shift_key: bool,
    pub time_stamp: u64,
}

/// Any synthetic event a responder can dispatch.
#[derive(Debug, Clone)]
pub enum SyntheticEvent {
    Input(InputEvent),
    Keyboard(KeyboardEvent),
    /// Current DOM value of the target ("true"/"false" for checkables).
    ValueChange { value: String, time_stamp: u64 },
}

/// Declared event listener.
pub type Listener = Rc<dyn Fn(&SyntheticEvent)>;

/// How urgently a dispatched event reaches its listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPriority {
    /// Invoked synchronously inside `dispatch_event`.
    Discrete,
    /// Queued; runs when the native event finishes processing.
    UserBlocking,
    /// Queued; runs when the native event finishes processing.
    Continuous,
}

// =============================================================================
// Responder contract
// =============================================================================

/// An event responder: declares target event types and handles raw
/// events by dispatching synthetic ones.
pub trait EventResponder {
    type Props;

    /// Native event names this responder listens for.
    fn target_event_types(&self) -> &[NativeEventType];

    /// Handle one raw event.
    fn on_event(
        &self,
        event: &ResponderEvent,
        ctx: &mut ResponderContext<'_>,
        props: &Self::Props,
    ) -> Result<(), EventError>;
}

// =============================================================================
// Responder context
// =============================================================================

/// Per-event dispatch context handed to a responder.
pub struct ResponderContext<'a> {
    /// The live document; responders read node state through it.
    pub doc: &'a mut Document,
    restore: &'a mut RestoreQueue,
    queued: Vec<(SyntheticEvent, Listener)>,
    time_stamp: u64,
}

impl<'a> ResponderContext<'a> {
    pub fn new(doc: &'a mut Document, restore: &'a mut RestoreQueue, time_stamp: u64) -> Self {
        Self {
            doc,
            restore,
            queued: Vec::new(),
            time_stamp,
        }
    }

    /// Dispatch a synthetic event to a listener.
    ///
    /// Discrete priority invokes the listener synchronously; the other
    /// priorities queue the pair until the native event finishes
    /// processing. Either way each dispatch reaches its listener exactly
    /// once.
    pub fn dispatch_event(
        &mut self,
        event: SyntheticEvent,
        listener: &Listener,
        priority: EventPriority,
    ) {
        match priority {
            EventPriority::Discrete => listener(&event),
            EventPriority::UserBlocking | EventPriority::Continuous => {
                self.queued.push((event, listener.clone()));
            }
        }
    }

    /// Schedule post-dispatch restoration of controlled DOM state for
    /// `target`.
    pub fn enqueue_state_restore(&mut self, target: InstanceId) {
        self.restore.enqueue(target);
    }

    /// Timestamp of the native event being processed.
    pub fn time_stamp(&self) -> u64 {
        self.time_stamp
    }

    /// Run queued dispatches, in dispatch order.
    pub fn flush(self) {
        for (event, listener) in self.queued {
            listener(&event);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_discrete_dispatch_is_synchronous() {
        let mut doc = Document::new();
        let mut restore = RestoreQueue::new();
        let mut ctx = ResponderContext::new(&mut doc, &mut restore, 7);

        let seen: Rc<RefCell<Vec<u64>>> = Rc::new(RefCell::new(Vec::new()));
        let seen_in = seen.clone();
        let listener: Listener = Rc::new(move |event| {
            if let SyntheticEvent::ValueChange { time_stamp, .. } = event {
                seen_in.borrow_mut().push(*time_stamp);
            }
        });

        let ts = ctx.time_stamp();
        ctx.dispatch_event(
            SyntheticEvent::ValueChange {
                value: "x".into(),
                time_stamp: ts,
            },
            &listener,
            EventPriority::Discrete,
        );
        assert_eq!(*seen.borrow(), vec![7]);
        ctx.flush();
        assert_eq!(*seen.borrow(), vec![7]);
    }

    #[test]
    fn test_queued_dispatch_runs_on_flush_in_order() {
        let mut doc = Document::new();
        let mut restore = RestoreQueue::new();
        let mut ctx = ResponderContext::new(&mut doc, &mut restore, 0);

        let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let seen_in = seen.clone();
        let listener: Listener = Rc::new(move |event| {
            if let SyntheticEvent::ValueChange { value, .. } = event {
                seen_in.borrow_mut().push(value.clone());
            }
        });

        for value in ["a", "b"] {
            ctx.dispatch_event(
                SyntheticEvent::ValueChange {
                    value: value.into(),
                    time_stamp: 0,
                },
                &listener,
                EventPriority::Continuous,
            );
        }
        assert!(seen.borrow().is_empty());
        ctx.flush();
        assert_eq!(*seen.borrow(), vec!["a".to_string(), "b".to_string()]);
    }
}
