//! Controlled-value tracker.
//!
//! Every change-capable node carries a last-known-value string. On each
//! raw event the responder compares the node's real value against the
//! tracked one before deciding whether to notify declared handlers, so
//! redundant native notifications collapse to nothing.
//!
//! A node without a tracker degrades gracefully: it is treated as
//! "always changed" and never raises an error.

use crate::dom::Document;
use crate::events::EventError;
use crate::types::InstanceId;

/// Install a tracker on a node, seeded with its current value.
pub fn track(doc: &mut Document, id: InstanceId) {
    if let Some(node) = doc.get_mut(id) {
        let seed = node.current_dom_value();
        node.tracker = Some(seed);
    }
}

/// Remove a node's tracker (on unmount).
pub fn untrack(doc: &mut Document, id: InstanceId) {
    if let Some(node) = doc.get_mut(id) {
        node.tracker = None;
    }
}

/// The tracked value, if a tracker is installed.
pub fn tracked_value(doc: &Document, id: InstanceId) -> Option<String> {
    doc.get(id).and_then(|node| node.tracker.clone())
}

/// The value the change machinery compares: checkables report
/// "true"/"false", everything else reports the value string. A missing
/// node reports the empty string.
pub fn get_value_from_node(doc: &Document, id: InstanceId) -> String {
    doc.get(id)
        .map(|node| node.current_dom_value())
        .unwrap_or_default()
}

/// Compare the node's real value against the tracked one, refreshing
/// the tracked value, and report whether they differed.
///
/// No tracker (or no node) is treated as changed.
pub fn update_value_if_changed(doc: &mut Document, id: InstanceId) -> bool {
    let Some(node) = doc.get_mut(id) else {
        return true;
    };
    let next = node.current_dom_value();
    match node.tracker.as_mut() {
        None => true,
        Some(tracked) => {
            let changed = *tracked != next;
            *tracked = next;
            changed
        }
    }
}

/// After a radio input changed, refresh the tracked value of every
/// other radio in its group. Only one group member can be checked, so
/// siblings may have been unchecked natively without their trackers
/// noticing.
///
/// Bookkeeping inconsistencies fail loudly: a scanned group member that
/// vanished or that carries no tracker is a framework bug.
pub fn revalidate_radio_group(doc: &mut Document, id: InstanceId) -> Result<(), EventError> {
    let name = match doc.get(id) {
        Some(node) if node.is_checkable() => match node.name.clone() {
            Some(name) => name,
            None => return Ok(()),
        },
        _ => return Ok(()),
    };

    for other in doc.radio_group(id, &name) {
        if other == id {
            continue;
        }
        let node = doc.get(other).ok_or(EventError::MissingRadioNode(other))?;
        if node.tracker.is_none() {
            return Err(EventError::UntrackedRadio(other));
        }
        update_value_if_changed(doc, other);
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Host;
    use crate::types::Props;

    fn text_input(doc: &mut Document) -> InstanceId {
        doc.create_instance("input", &Props::new().attr("type", "text"))
    }

    fn radio(doc: &mut Document, name: &str) -> InstanceId {
        let id = doc.create_instance(
            "input",
            &Props::new().attr("type", "radio").attr("name", name),
        );
        doc.append(doc.root(), id);
        id
    }

    #[test]
    fn test_unchanged_value_reports_false() {
        let mut doc = Document::new();
        let id = text_input(&mut doc);
        assert!(!update_value_if_changed(&mut doc, id));
    }

    #[test]
    fn test_changed_value_reports_true_once() {
        let mut doc = Document::new();
        let id = text_input(&mut doc);
        doc.force_value(id, "typed");

        assert!(update_value_if_changed(&mut doc, id));
        // Tracker refreshed: a second inspection sees no change.
        assert!(!update_value_if_changed(&mut doc, id));
        assert_eq!(tracked_value(&doc, id).as_deref(), Some("typed"));
    }

    #[test]
    fn test_missing_tracker_is_always_changed() {
        let mut doc = Document::new();
        let id = text_input(&mut doc);
        untrack(&mut doc, id);
        assert!(update_value_if_changed(&mut doc, id));
        assert!(update_value_if_changed(&mut doc, id));
    }

    #[test]
    fn test_checkable_value_is_checked_string() {
        let mut doc = Document::new();
        let id = doc.create_instance("input", &Props::new().attr("type", "checkbox"));
        assert_eq!(get_value_from_node(&doc, id), "false");
        doc.force_checked(id, true);
        assert_eq!(get_value_from_node(&doc, id), "true");
    }

    #[test]
    fn test_radio_revalidation_refreshes_sibling_trackers() {
        let mut doc = Document::new();
        let a = radio(&mut doc, "g");
        let b = radio(&mut doc, "g");

        doc.set_checked(a, true);
        // Native exclusivity: checking b unchecks a behind its tracker.
        doc.force_checked(b, true);
        assert_eq!(tracked_value(&doc, a).as_deref(), Some("true"));

        assert!(update_value_if_changed(&mut doc, b));
        revalidate_radio_group(&mut doc, b).unwrap();
        assert_eq!(tracked_value(&doc, a).as_deref(), Some("false"));
    }

    #[test]
    fn test_untracked_group_member_is_invariant_violation() {
        let mut doc = Document::new();
        let a = radio(&mut doc, "g");
        let b = radio(&mut doc, "g");
        untrack(&mut doc, b);

        let err = revalidate_radio_group(&mut doc, a).unwrap_err();
        assert_eq!(err, EventError::UntrackedRadio(b));
    }
}
