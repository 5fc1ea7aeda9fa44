//! Post-dispatch state restore.
//!
//! Listeners run between a native event and the next render, so a
//! controlled input can drift: the DOM holds what the user typed while
//! the declared props still hold the previous value. Responders enqueue
//! affected targets; after dispatch finishes the queue is drained and
//! every target whose real state differs from its recorded controlled
//! props is snapped back.

use crate::dom::Document;
use crate::types::InstanceId;

/// Queue of nodes whose controlled state needs re-asserting after the
/// current event finishes processing.
#[derive(Debug, Default)]
pub struct RestoreQueue {
    targets: Vec<InstanceId>,
}

impl RestoreQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, target: InstanceId) {
        if !self.targets.contains(&target) {
            self.targets.push(target);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }
}

/// Drain the queue, restoring each target's controlled value/checked
/// state where the DOM drifted. Restores are tracked writes, so the
/// value tracker follows.
pub fn restore_state_if_needed(doc: &mut Document, queue: &mut RestoreQueue) {
    for target in std::mem::take(&mut queue.targets) {
        let Some(node) = doc.get(target) else {
            continue; // unmounted between dispatch and restore
        };

        let value = node.controlled_value.clone();
        let checked = node.controlled_checked;

        if let Some(controlled) = value {
            if doc[target].value != controlled {
                doc.set_value(target, controlled);
            }
        }
        if let Some(controlled) = checked {
            if doc[target].checked != controlled {
                doc.set_checked(target, controlled);
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::Host;
    use crate::types::Props;

    #[test]
    fn test_restore_snaps_value_back_to_controlled_prop() {
        let mut doc = Document::new();
        let id = doc.create_instance(
            "input",
            &Props::new().attr("type", "text").attr("value", "declared"),
        );

        doc.force_value(id, "typed");
        let mut queue = RestoreQueue::new();
        queue.enqueue(id);
        restore_state_if_needed(&mut doc, &mut queue);

        assert_eq!(doc[id].value, "declared");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_uncontrolled_node_left_alone() {
        let mut doc = Document::new();
        let id = doc.create_instance(
            "input",
            &Props::new().attr("type", "text").attr("defaultValue", "d"),
        );

        doc.force_value(id, "typed");
        let mut queue = RestoreQueue::new();
        queue.enqueue(id);
        restore_state_if_needed(&mut doc, &mut queue);

        assert_eq!(doc[id].value, "typed");
    }

    #[test]
    fn test_enqueue_deduplicates() {
        let mut queue = RestoreQueue::new();
        queue.enqueue(InstanceId(3));
        queue.enqueue(InstanceId(3));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_restore_checked_state() {
        let mut doc = Document::new();
        let id = doc.create_instance(
            "input",
            &Props::new().attr("type", "checkbox").attr("checked", false),
        );

        doc.force_checked(id, true);
        let mut queue = RestoreQueue::new();
        queue.enqueue(id);
        restore_state_if_needed(&mut doc, &mut queue);

        assert!(!doc[id].checked);
    }
}
