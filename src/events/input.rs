//! Input responder - change and keyboard events for form controls.
//!
//! Listens to the raw `input`/`change`/`click` family and keyboard
//! events, gates change notifications through the value tracker, and
//! dispatches normalized synthetic events to declared listeners.
//!
//! Decision table for the change family:
//! - `select` / `input[type=file]`: the raw `change` event is
//!   authoritative, no tracker gate.
//! - text inputs: raw `input` or `change`, gated by
//!   [`tracker::update_value_if_changed`].
//! - checkables (checkbox/radio): raw `click`, gated likewise; a radio
//!   change additionally revalidates its group's trackers.

use crate::events::responder::{
    EventPriority, EventResponder, InputEvent, InputEventType, KeyboardEvent, KeyboardEventType,
    Listener, NativeEventType, ResponderContext, ResponderEvent, SyntheticEvent,
};
use crate::events::{tracker, EventError};
use crate::types::InstanceId;

// =============================================================================
// Props
// =============================================================================

/// Declared handlers for the Input responder.
#[derive(Clone, Default)]
pub struct InputResponderProps {
    pub disabled: bool,
    pub on_key_down: Option<Listener>,
    pub on_key_up: Option<Listener>,
    pub on_key_press: Option<Listener>,
    /// Change notification carrying the synthetic event.
    pub on_change: Option<Listener>,
    /// Change notification carrying the current DOM value.
    pub on_value_change: Option<Listener>,
}

// =============================================================================
// Responder
// =============================================================================

/// The Input responder.
pub struct InputResponder;

const TARGET_EVENT_TYPES: &[NativeEventType] = &[
    NativeEventType::Input,
    NativeEventType::Change,
    NativeEventType::BeforeInput,
    NativeEventType::KeyDown,
    NativeEventType::KeyUp,
    NativeEventType::KeyPress,
    NativeEventType::Click,
];

impl EventResponder for InputResponder {
    type Props = InputResponderProps;

    fn target_event_types(&self) -> &[NativeEventType] {
        TARGET_EVENT_TYPES
    }

    fn on_event(
        &self,
        event: &ResponderEvent,
        ctx: &mut ResponderContext<'_>,
        props: &InputResponderProps,
    ) -> Result<(), EventError> {
        if props.disabled {
            return Ok(());
        }
        let Some(responder_target) = event.responder_target else {
            return Ok(());
        };
        if event.target != responder_target {
            return Ok(());
        }

        match event.ty {
            NativeEventType::KeyDown => {
                if let Some(listener) = &props.on_key_down {
                    dispatch_keyboard_event(
                        event,
                        ctx,
                        KeyboardEventType::KeyDown,
                        listener,
                        responder_target,
                    );
                }
            }
            NativeEventType::KeyUp => {
                if let Some(listener) = &props.on_key_up {
                    dispatch_keyboard_event(
                        event,
                        ctx,
                        KeyboardEventType::KeyUp,
                        listener,
                        responder_target,
                    );
                }
            }
            NativeEventType::KeyPress => {
                if let Some(listener) = &props.on_key_press {
                    dispatch_keyboard_event(
                        event,
                        ctx,
                        KeyboardEventType::KeyPress,
                        listener,
                        responder_target,
                    );
                }
            }
            _ => {
                let target = event.target;
                let (uses_change, is_text, is_checkable) = match ctx.doc.get(target) {
                    Some(node) => (
                        node.uses_change_event(),
                        node.is_text_input(),
                        node.is_checkable(),
                    ),
                    None => return Ok(()),
                };

                let fires = if uses_change && event.ty == NativeEventType::Change {
                    true
                } else if is_text
                    && matches!(event.ty, NativeEventType::Input | NativeEventType::Change)
                {
                    tracker::update_value_if_changed(ctx.doc, target)
                } else if is_checkable && event.ty == NativeEventType::Click {
                    tracker::update_value_if_changed(ctx.doc, target)
                } else {
                    false
                };

                if fires {
                    dispatch_both_change_events(event, ctx, props, responder_target)?;
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// Dispatch helpers
// =============================================================================

fn create_input_event(
    event: &ResponderEvent,
    ctx: &ResponderContext<'_>,
    ty: InputEventType,
    target: InstanceId,
) -> InputEvent {
    InputEvent {
        ty,
        target,
        data: event.native.data.clone(),
        data_transfer: event.native.data_transfer.clone(),
        input_type: event.native.input_type.clone(),
        is_composing: event.native.is_composing,
        time_stamp: ctx.time_stamp(),
    }
}

fn create_keyboard_event(
    event: &ResponderEvent,
    ctx: &ResponderContext<'_>,
    ty: KeyboardEventType,
    target: InstanceId,
) -> KeyboardEvent {
    KeyboardEvent {
        ty,
        target,
        key: event.native.key.clone(),
        repeat: event.native.repeat,
        is_composing: event.native.is_composing,
        alt_key: event.native.alt_key,
        ctrl_key: event.native.ctrl_key,
        meta_key: event.native.meta_key,
        shift_key: event.native.shift_key,
        time_stamp: ctx.time_stamp(),
    }
}

fn dispatch_keyboard_event(
    event: &ResponderEvent,
    ctx: &mut ResponderContext<'_>,
    ty: KeyboardEventType,
    listener: &Listener,
    target: InstanceId,
) {
    let synthetic = create_keyboard_event(event, ctx, ty, target);
    ctx.dispatch_event(
        SyntheticEvent::Keyboard(synthetic),
        listener,
        EventPriority::Discrete,
    );
}

/// Dispatch `onChange` and `onValueChange`, enqueue a state restore for
/// the target, and revalidate the radio group when applicable.
fn dispatch_both_change_events(
    event: &ResponderEvent,
    ctx: &mut ResponderContext<'_>,
    props: &InputResponderProps,
    target: InstanceId,
) -> Result<(), EventError> {
    ctx.enqueue_state_restore(target);

    if let Some(on_change) = &props.on_change {
        let synthetic = create_input_event(event, ctx, InputEventType::Change, target);
        ctx.dispatch_event(
            SyntheticEvent::Input(synthetic),
            on_change,
            EventPriority::Discrete,
        );
    }
    if let Some(on_value_change) = &props.on_value_change {
        let value = tracker::get_value_from_node(ctx.doc, target);
        let time_stamp = ctx.time_stamp();
        ctx.dispatch_event(
            SyntheticEvent::ValueChange { value, time_stamp },
            on_value_change,
            EventPriority::Discrete,
        );
    }

    // Only one radio per group can be checked: refresh the others'
    // trackers so their next real change still notifies.
    let is_radio = ctx
        .doc
        .get(target)
        .is_some_and(|node| node.input_type.as_deref() == Some("radio"));
    if is_radio {
        tracker::revalidate_radio_group(ctx.doc, target)?;
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
