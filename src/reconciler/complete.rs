//! Complete-work phase: materialize host instances and flag updates.
//!
//! Runs on the way back up the tree, deepest fibers first. New host and
//! text fibers get instances from the host here, and a new host
//! instance adopts its already-completed host descendants, so by the
//! time a Placement commits the inserted subtree is fully assembled.
//! Nothing is attached to the live tree yet; that is the commit phase.

use crate::fiber::{EffectTag, FiberId, FiberTag, FiberType};
use crate::host::Host;

use super::Reconciler;

impl<H: Host> Reconciler<H> {
    pub(crate) fn complete_work(&mut self, wip: FiberId) {
        match self.arena[wip].tag {
            FiberTag::Host => {
                if self.arena[wip].state_node.is_none() {
                    let instance = {
                        let fiber = &self.arena[wip];
                        let ty = match &fiber.ty {
                            FiberType::Host(ty) => ty.clone(),
                            other => unreachable!("host fiber with type {other:?}"),
                        };
                        self.host.create_instance(&ty, &fiber.pending_props)
                    };
                    self.arena[wip].state_node = Some(instance);
                    self.append_all_children(instance, wip);
                } else if self.arena[wip].pending_props != self.arena[wip].memoized_props {
                    self.arena[wip].effect_tag |= EffectTag::UPDATE;
                }
                let pending = self.arena[wip].pending_props.clone();
                self.arena[wip].memoized_props = pending;
            }
            FiberTag::Text => {
                if self.arena[wip].state_node.is_none() {
                    let text = self.arena[wip].pending_text.clone().unwrap_or_default();
                    let instance = self.host.create_text_instance(&text);
                    self.arena[wip].state_node = Some(instance);
                } else if self.arena[wip].pending_text != self.arena[wip].memoized_text {
                    self.arena[wip].effect_tag |= EffectTag::UPDATE;
                }
                let pending = self.arena[wip].pending_text.clone();
                self.arena[wip].memoized_text = pending;
            }
            FiberTag::FunctionComponent | FiberTag::ClassComponent => {
                let pending = self.arena[wip].pending_props.clone();
                self.arena[wip].memoized_props = pending;
            }
            FiberTag::HostRoot | FiberTag::Fragment => {}
            tag => unreachable!("complete_work on unsupported fiber tag {tag:?}"),
        }
    }

    /// Append every host descendant of `wip` (stopping at the first
    /// host/text fiber on each path) to the freshly created `parent`
    /// instance.
    fn append_all_children(&mut self, parent: crate::types::InstanceId, wip: FiberId) {
        let mut node = match self.arena[wip].child {
            Some(child) => child,
            None => return,
        };
        loop {
            match self.arena[node].tag {
                FiberTag::Host | FiberTag::Text => {
                    let instance = self.arena[node]
                        .state_node
                        .expect("completed host fiber without an instance");
                    self.host.append_child(parent, instance);
                }
                _ => {
                    if let Some(child) = self.arena[node].child {
                        node = child;
                        continue;
                    }
                }
            }

            // Advance: next sibling, or climb until one exists.
            loop {
                if let Some(sibling) = self.arena[node].sibling {
                    node = sibling;
                    break;
                }
                match self.arena[node].parent {
                    Some(parent_fiber) if parent_fiber != wip => node = parent_fiber,
                    _ => return,
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::dom::Document;
    use crate::element::{ComponentDef, Element};
    use crate::reconciler::Reconciler;
    use crate::types::Props;

    fn new_reconciler() -> Reconciler<Document> {
        let doc = Document::new();
        let container = doc.root();
        Reconciler::new(doc, container)
    }

    #[test]
    fn test_placement_commits_assembled_subtree() {
        let mut reconciler = new_reconciler();
        reconciler
            .render(Element::host(
                "div",
                Props::new(),
                vec![Element::host(
                    "span",
                    Props::new(),
                    vec![Element::text("deep")],
                )],
            ))
            .unwrap();

        let doc = reconciler.host();
        let div = doc.get(reconciler.container()).unwrap().children[0];
        let span = doc.get(div).unwrap().children[0];
        let text = doc.get(span).unwrap().children[0];
        assert_eq!(doc.get(text).unwrap().text, "deep");
    }

    #[test]
    fn test_host_children_skip_composite_layers() {
        let mut reconciler = new_reconciler();
        let item = ComponentDef::new("Item", |_| {
            Ok(vec![Element::host("li", Props::new(), vec![])])
        });
        reconciler
            .render(Element::host(
                "ul",
                Props::new(),
                vec![
                    Element::component(item.clone(), Props::new()),
                    Element::component(item, Props::new()),
                ],
            ))
            .unwrap();

        let doc = reconciler.host();
        let ul = doc.get(reconciler.container()).unwrap().children[0];
        let children = &doc.get(ul).unwrap().children;
        assert_eq!(children.len(), 2);
        assert!(children.iter().all(|&c| doc.get(c).unwrap().node_name == "li"));
    }

    #[test]
    fn test_unchanged_props_mark_no_update() {
        let mut reconciler = new_reconciler();
        let tree = || Element::host("div", Props::new().attr("id", "a"), vec![]);
        reconciler.render(tree()).unwrap();
        reconciler.render(tree()).unwrap();
        reconciler
            .render(Element::host("div", Props::new().attr("id", "b"), vec![]))
            .unwrap();

        let doc = reconciler.host();
        let div = doc.get(reconciler.container()).unwrap().children[0];
        assert_eq!(doc.get(div).unwrap().attrs.get("id").map(String::as_str), Some("b"));
    }
}
