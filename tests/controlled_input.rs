//! Controlled-input behavior: rendered form controls, simulated user
//! interaction, change deduplication, and post-event state restore.

use std::cell::RefCell;
use std::rc::Rc;

use filament::{
    process_native_event, Document, Element, EventError, InputResponder, InputResponderProps,
    InstanceId, NativeEvent, NativeEventType, Props, Reconciler, ResponderEvent, SyntheticEvent,
};

fn new_reconciler() -> Reconciler<Document> {
    let doc = Document::new();
    let container = doc.root();
    Reconciler::new(doc, container)
}

fn value_changes() -> (Rc<RefCell<Vec<String>>>, InputResponderProps) {
    let values: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = values.clone();
    let props = InputResponderProps {
        on_value_change: Some(Rc::new(move |event| {
            if let SyntheticEvent::ValueChange { value, .. } = event {
                sink.borrow_mut().push(value.clone());
            }
        })),
        ..Default::default()
    };
    (values, props)
}

fn raw(ty: NativeEventType, target: InstanceId) -> ResponderEvent {
    ResponderEvent {
        ty,
        target,
        responder_target: Some(target),
        native: NativeEvent::default(),
    }
}

/// First child of the container, i.e. the rendered root element.
fn rendered(reconciler: &Reconciler<Document>) -> InstanceId {
    reconciler.host()[reconciler.container()].children[0]
}

// =============================================================================
// Text inputs
// =============================================================================

#[test]
fn controlled_text_input_round_trip() {
    let mut reconciler = new_reconciler();
    reconciler
        .render(Element::host(
            "input",
            Props::new().attr("type", "text").attr("value", "start"),
            vec![],
        ))
        .unwrap();
    let input = rendered(&reconciler);
    assert_eq!(reconciler.host()[input].value, "start");

    let (values, props) = value_changes();

    // The user types; the browser mutates the node out from under us.
    reconciler.host_mut().force_value(input, "start!");
    process_native_event(
        reconciler.host_mut(),
        &InputResponder,
        &props,
        &raw(NativeEventType::Input, input),
    )
    .unwrap();

    // One notification carrying what the user typed...
    assert_eq!(*values.borrow(), vec!["start!".to_string()]);
    // ...and the DOM snapped back to the declared value afterwards.
    assert_eq!(reconciler.host()[input].value, "start");

    // Rendering a new declared value moves the input forward.
    reconciler
        .render(Element::host(
            "input",
            Props::new().attr("type", "text").attr("value", "next"),
            vec![],
        ))
        .unwrap();
    assert_eq!(reconciler.host()[input].value, "next");

    // The restore was a tracked write: a redundant input event after it
    // notifies nothing.
    process_native_event(
        reconciler.host_mut(),
        &InputResponder,
        &props,
        &raw(NativeEventType::Input, input),
    )
    .unwrap();
    assert_eq!(values.borrow().len(), 1);
}

#[test]
fn uncontrolled_text_input_keeps_user_value() {
    let mut reconciler = new_reconciler();
    reconciler
        .render(Element::host(
            "input",
            Props::new().attr("type", "text").attr("defaultValue", "d"),
            vec![],
        ))
        .unwrap();
    let input = rendered(&reconciler);

    let (values, props) = value_changes();
    reconciler.host_mut().force_value(input, "typed");
    process_native_event(
        reconciler.host_mut(),
        &InputResponder,
        &props,
        &raw(NativeEventType::Input, input),
    )
    .unwrap();

    assert_eq!(*values.borrow(), vec!["typed".to_string()]);
    // No controlled prop: nothing to restore.
    assert_eq!(reconciler.host()[input].value, "typed");
}

#[test]
fn numeric_value_compares_as_dom_string() {
    let mut reconciler = new_reconciler();
    reconciler
        .render(Element::host(
            "input",
            Props::new().attr("type", "number").attr("value", 42i64),
            vec![],
        ))
        .unwrap();
    let input = rendered(&reconciler);
    assert_eq!(reconciler.host()[input].value, "42");

    let (values, props) = value_changes();

    // The DOM already holds "42": no change to report.
    process_native_event(
        reconciler.host_mut(),
        &InputResponder,
        &props,
        &raw(NativeEventType::Input, input),
    )
    .unwrap();
    assert!(values.borrow().is_empty());
}

// =============================================================================
// Checkboxes
// =============================================================================

#[test]
fn checkbox_click_gated_by_tracker() {
    let mut reconciler = new_reconciler();
    reconciler
        .render(Element::host(
            "input",
            Props::new().attr("type", "checkbox").attr("defaultChecked", false),
            vec![],
        ))
        .unwrap();
    let checkbox = rendered(&reconciler);
    let (values, props) = value_changes();

    let click = |reconciler: &mut Reconciler<Document>, props: &InputResponderProps| {
        process_native_event(
            reconciler.host_mut(),
            &InputResponder,
            props,
            &raw(NativeEventType::Click, checkbox),
        )
        .unwrap();
    };

    // The browser toggles before the click event is processed.
    reconciler.host_mut().force_checked(checkbox, true);
    click(&mut reconciler, &props);
    assert_eq!(*values.borrow(), vec!["true".to_string()]);

    // A redundant click with no state change notifies nothing.
    reconciler.host_mut().force_checked(checkbox, true);
    click(&mut reconciler, &props);
    assert_eq!(values.borrow().len(), 1);

    // Unchecking notifies exactly once more.
    reconciler.host_mut().force_checked(checkbox, false);
    click(&mut reconciler, &props);
    assert_eq!(*values.borrow(), vec!["true".to_string(), "false".to_string()]);
}

#[test]
fn forced_checkbox_state_is_invisible_to_the_tracker() {
    let mut reconciler = new_reconciler();
    reconciler
        .render(Element::host(
            "input",
            Props::new().attr("type", "checkbox"),
            vec![],
        ))
        .unwrap();
    let checkbox = rendered(&reconciler);
    let (values, props) = value_changes();

    // Programmatic (tracked) check, then a forced uncheck behind the
    // tracker's back: the tracker still says "true".
    reconciler.host_mut().set_checked(checkbox, true);
    reconciler.host_mut().force_checked(checkbox, false);

    // A native click toggles it back to where the tracker already is:
    // nothing changed as far as the framework knows.
    reconciler.host_mut().force_checked(checkbox, true);
    process_native_event(
        reconciler.host_mut(),
        &InputResponder,
        &props,
        &raw(NativeEventType::Click, checkbox),
    )
    .unwrap();
    assert!(values.borrow().is_empty());

    // A real transition to false notifies exactly once.
    reconciler.host_mut().force_checked(checkbox, false);
    process_native_event(
        reconciler.host_mut(),
        &InputResponder,
        &props,
        &raw(NativeEventType::Click, checkbox),
    )
    .unwrap();
    assert_eq!(*values.borrow(), vec!["false".to_string()]);
}

#[test]
fn controlled_checkbox_snaps_back_after_notifying() {
    let mut reconciler = new_reconciler();
    let tree = |checked: bool| {
        Element::host(
            "input",
            Props::new().attr("type", "checkbox").attr("checked", checked),
            vec![],
        )
    };
    reconciler.render(tree(false)).unwrap();
    let checkbox = rendered(&reconciler);
    let (values, props) = value_changes();

    for _ in 0..2 {
        reconciler.host_mut().force_checked(checkbox, true);
        process_native_event(
            reconciler.host_mut(),
            &InputResponder,
            &props,
            &raw(NativeEventType::Click, checkbox),
        )
        .unwrap();
        // Restored to the declared state each time.
        assert!(!reconciler.host()[checkbox].checked);
    }
    // The restore resets the tracker too, so both clicks notified.
    assert_eq!(*values.borrow(), vec!["true".to_string(), "true".to_string()]);

    // Committing checked=true releases the input.
    reconciler.render(tree(true)).unwrap();
    assert!(reconciler.host()[checkbox].checked);
}

// =============================================================================
// Radio groups
// =============================================================================

#[test]
fn radio_group_revalidation_keeps_every_member_notifying() {
    let mut reconciler = new_reconciler();
    let radio = |key: &str| {
        Element::host(
            "input",
            Props::new().attr("type", "radio").attr("name", "color"),
            vec![],
        )
        .keyed(key)
    };
    reconciler
        .render(Element::host(
            "form",
            Props::new(),
            vec![radio("a"), radio("b")],
        ))
        .unwrap();

    let doc = reconciler.host();
    let form = doc[reconciler.container()].children[0];
    let a = doc[form].children[0];
    let b = doc[form].children[1];

    let (values, props) = value_changes();
    let mut click = |reconciler: &mut Reconciler<Document>, target: InstanceId| {
        // Native radio semantics: the click checks the target and
        // unchecks the rest of the group before the event is seen.
        reconciler.host_mut().force_checked(target, true);
        process_native_event(
            reconciler.host_mut(),
            &InputResponder,
            &props,
            &raw(NativeEventType::Click, target),
        )
        .unwrap();
    };

    click(&mut reconciler, a);
    click(&mut reconciler, b);
    assert!(!reconciler.host()[a].checked);

    // Without group revalidation a's tracker would still say "true"
    // here and this third change would be swallowed.
    click(&mut reconciler, a);

    assert_eq!(
        *values.borrow(),
        vec!["true".to_string(), "true".to_string(), "true".to_string()]
    );
}

#[test]
fn foreign_radio_in_group_is_a_loud_error() {
    let mut reconciler = new_reconciler();
    reconciler
        .render(Element::host(
            "input",
            Props::new().attr("type", "radio").attr("name", "g"),
            vec![],
        ))
        .unwrap();
    let tracked = rendered(&reconciler);

    // A radio created behind the framework's back: same group, no
    // tracker.
    let foreign = {
        let doc = reconciler.host_mut();
        let id = doc.create_element("input");
        doc[id].input_type = Some("radio".to_string());
        doc[id].name = Some("g".to_string());
        let root = doc.root();
        doc.append(root, id);
        id
    };

    let (_values, props) = value_changes();
    reconciler.host_mut().force_checked(tracked, true);
    let result = process_native_event(
        reconciler.host_mut(),
        &InputResponder,
        &props,
        &raw(NativeEventType::Click, tracked),
    );
    assert_eq!(result, Err(EventError::UntrackedRadio(foreign)));
}

// =============================================================================
// Selects and keyboard
// =============================================================================

#[test]
fn select_change_event_is_authoritative() {
    let mut reconciler = new_reconciler();
    reconciler
        .render(Element::host("select", Props::new(), vec![]))
        .unwrap();
    let select = rendered(&reconciler);
    let (values, props) = value_changes();

    // No tracker gate: even a no-op change event notifies.
    process_native_event(
        reconciler.host_mut(),
        &InputResponder,
        &props,
        &raw(NativeEventType::Change, select),
    )
    .unwrap();
    assert_eq!(values.borrow().len(), 1);

    // But input events on a select are ignored.
    process_native_event(
        reconciler.host_mut(),
        &InputResponder,
        &props,
        &raw(NativeEventType::Input, select),
    )
    .unwrap();
    assert_eq!(values.borrow().len(), 1);
}

#[test]
fn keyboard_events_reach_their_listeners() {
    let mut reconciler = new_reconciler();
    reconciler
        .render(Element::host(
            "input",
            Props::new().attr("type", "text"),
            vec![],
        ))
        .unwrap();
    let input = rendered(&reconciler);

    let keys: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = keys.clone();
    let props = InputResponderProps {
        on_key_down: Some(Rc::new(move |event| {
            if let SyntheticEvent::Keyboard(key_event) = event {
                sink.borrow_mut().push(key_event.key.clone().unwrap_or_default());
            }
        })),
        ..Default::default()
    };

    let mut event = raw(NativeEventType::KeyDown, input);
    event.native.key = Some("Enter".to_string());
    process_native_event(reconciler.host_mut(), &InputResponder, &props, &event).unwrap();

    assert_eq!(*keys.borrow(), vec!["Enter".to_string()]);
}

#[test]
fn disabled_responder_ignores_everything() {
    let mut reconciler = new_reconciler();
    reconciler
        .render(Element::host(
            "input",
            Props::new().attr("type", "text"),
            vec![],
        ))
        .unwrap();
    let input = rendered(&reconciler);

    let (values, mut props) = value_changes();
    props.disabled = true;

    reconciler.host_mut().force_value(input, "typed");
    process_native_event(
        reconciler.host_mut(),
        &InputResponder,
        &props,
        &raw(NativeEventType::Input, input),
    )
    .unwrap();
    assert!(values.borrow().is_empty());
}
