//! Begin-work phase: render composites and diff child lists.
//!
//! For each fiber the work loop descends into, `begin_work` produces
//! the fiber's new children by matching declared elements against the
//! previous child fibers:
//!
//! 1. Keyed elements match any previous child with the same key and
//!    type, wherever it sits in the old list.
//! 2. Keyless elements match the previous child at the same position,
//!    if it is keyless and the types agree.
//! 3. Everything unmatched on the new side becomes a fresh fiber
//!    (Placement); everything unmatched on the old side is marked
//!    Deletion and queued on the parent's effect list immediately.
//!
//! Matched fibers reuse their alternate and keep their host instance;
//! a key match with a different type is no match at all.

use crate::element::Element;
use crate::fiber::{EffectTag, Fiber, FiberId, FiberTag, FiberType};
use crate::host::Host;
use crate::types::rc_eq;

use super::Reconciler;
use crate::element::RenderError;

impl<H: Host> Reconciler<H> {
    /// Process one fiber on the way down. Returns the first child to
    /// descend into, or `None` when this fiber is a leaf.
    pub(crate) fn begin_work(&mut self, wip: FiberId) -> Result<Option<FiberId>, RenderError> {
        match self.arena[wip].tag {
            FiberTag::HostRoot | FiberTag::Fragment => {
                let children = std::mem::take(&mut self.arena[wip].pending_children);
                self.reconcile_children(wip, &children);
                Ok(self.arena[wip].child)
            }
            FiberTag::Host => {
                self.mark_ref(wip);
                if self.arena[wip].pending_props.on_commit.is_some() {
                    self.arena[wip].effect_tag |= EffectTag::CALLBACK;
                }
                let children = std::mem::take(&mut self.arena[wip].pending_children);
                self.reconcile_children(wip, &children);
                Ok(self.arena[wip].child)
            }
            FiberTag::Text => Ok(None),
            FiberTag::FunctionComponent | FiberTag::ClassComponent => {
                let component = match &self.arena[wip].ty {
                    FiberType::Composite(component) => component.clone(),
                    other => unreachable!("composite fiber with type {other:?}"),
                };
                let children = {
                    let props = &self.arena[wip].pending_props;
                    (component.render)(props)?
                };
                self.arena[wip].effect_tag |= EffectTag::PERFORMED_WORK;
                if self.arena[wip].pending_props.on_commit.is_some() {
                    self.arena[wip].effect_tag |= EffectTag::CALLBACK;
                }
                self.reconcile_children(wip, &children);
                Ok(self.arena[wip].child)
            }
            // Legacy tags kept for the closed numbering; never produced
            // by this reconciler.
            tag => unreachable!("begin_work on unsupported fiber tag {tag:?}"),
        }
    }

    /// Flag a Ref effect when a host fiber's callback ref appears,
    /// disappears, or changes identity.
    fn mark_ref(&mut self, wip: FiberId) {
        let changed = match self.arena[wip].alternate {
            None => self.arena[wip].pending_props.node_ref.is_some(),
            Some(alternate) => !rc_eq(
                &self.arena[wip].pending_props.node_ref,
                &self.arena[alternate].memoized_props.node_ref,
            ),
        };
        if changed {
            self.arena[wip].effect_tag |= EffectTag::REF;
        }
    }

    // =========================================================================
    // Child reconciliation
    // =========================================================================

    fn reconcile_children(&mut self, wip: FiberId, new_children: &[Element]) {
        // Only updates track placements: a freshly mounted subtree is
        // attached wholesale when its root is placed.
        let should_track = self.arena[wip].alternate.is_some();

        // Previous committed children, read through the alternate.
        let old: Vec<FiberId> = match self.arena[wip].alternate {
            Some(current) => {
                let mut ids = Vec::new();
                let mut cursor = self.arena[current].child;
                while let Some(id) = cursor {
                    ids.push(id);
                    cursor = self.arena[id].sibling;
                }
                ids
            }
            None => Vec::new(),
        };
        let mut used = vec![false; old.len()];

        let mut previous: Option<FiberId> = None;
        let mut last_placed: i64 = -1;
        self.arena[wip].child = None;

        for (position, element) in new_children.iter().enumerate() {
            let matched = self.match_old_child(element, position, &old, &used);

            let new_fiber = match matched {
                Some(slot) => {
                    used[slot] = true;
                    let old_fiber = old[slot];
                    let old_index = self.arena[old_fiber].index as i64;
                    let child = self.create_work_in_progress(old_fiber);
                    self.apply_element(child, element);

                    // An in-place match behind the placement watermark
                    // must move forward.
                    if should_track && old_index < last_placed {
                        self.arena[child].effect_tag |= EffectTag::PLACEMENT;
                    } else {
                        last_placed = last_placed.max(old_index);
                    }
                    child
                }
                None => {
                    let child = self.create_fiber_from_element(element);
                    if should_track {
                        self.arena[child].effect_tag |= EffectTag::PLACEMENT;
                    }
                    child
                }
            };

            self.arena[new_fiber].parent = Some(wip);
            self.arena[new_fiber].index = position as u32;
            self.arena[new_fiber].sibling = None;
            match previous {
                Some(prev) => self.arena[prev].sibling = Some(new_fiber),
                None => self.arena[wip].child = Some(new_fiber),
            }
            previous = Some(new_fiber);
        }

        for (slot, &old_fiber) in old.iter().enumerate() {
            if !used[slot] {
                self.delete_child(wip, old_fiber);
            }
        }
    }

    /// Find the previous child this element continues, honoring the
    /// type+key identity rule.
    fn match_old_child(
        &self,
        element: &Element,
        position: usize,
        old: &[FiberId],
        used: &[bool],
    ) -> Option<usize> {
        match element.key() {
            Some(key) => old.iter().enumerate().position(|(slot, &fiber)| {
                let candidate = &self.arena[fiber];
                !used[slot]
                    && candidate.key.as_ref() == Some(key)
                    && type_matches(candidate, element)
            }),
            None => {
                let &fiber = old.get(position)?;
                let candidate = &self.arena[fiber];
                (!used[position] && candidate.key.is_none() && type_matches(candidate, element))
                    .then_some(position)
            }
        }
    }

    /// Mark an old child deleted and queue it on the parent's effect
    /// list right away (deletions have no work-in-progress of their own).
    fn delete_child(&mut self, wip: FiberId, old_child: FiberId) {
        self.arena[old_child].effect_tag |= EffectTag::DELETION;
        self.arena[old_child].next_effect = None;

        if self.arena[wip].tag == FiberTag::Host && self.arena[old_child].tag == FiberTag::Text {
            self.arena[wip].effect_tag |= EffectTag::CONTENT_RESET;
        }

        match self.arena[wip].last_effect {
            Some(last) => self.arena[last].next_effect = Some(old_child),
            None => self.arena[wip].first_effect = Some(old_child),
        }
        self.arena[wip].last_effect = Some(old_child);
    }

    // =========================================================================
    // Fiber construction
    // =========================================================================

    /// Stash the declared element's data on a (reused) work-in-progress
    /// fiber for this pass.
    fn apply_element(&mut self, fiber: FiberId, element: &Element) {
        let wip = &mut self.arena[fiber];
        match element {
            Element::Host(el) => {
                wip.pending_props = el.props.clone();
                wip.pending_children = el.children.clone();
            }
            Element::Text(text) => wip.pending_text = Some(text.clone()),
            Element::Composite(el) => wip.pending_props = el.props.clone(),
            Element::Fragment(el) => wip.pending_children = el.children.clone(),
        }
    }

    fn create_fiber_from_element(&mut self, element: &Element) -> FiberId {
        let fiber = match element {
            Element::Host(el) => Fiber::new(
                FiberTag::Host,
                FiberType::Host(el.ty.clone()),
                el.key.clone(),
            ),
            Element::Text(_) => Fiber::new(FiberTag::Text, FiberType::None, None),
            Element::Composite(el) => {
                let tag = if el.component.error_boundary {
                    FiberTag::ClassComponent
                } else {
                    FiberTag::FunctionComponent
                };
                Fiber::new(tag, FiberType::Composite(el.component.clone()), el.key.clone())
            }
            Element::Fragment(el) => {
                Fiber::new(FiberTag::Fragment, FiberType::Fragment, el.key.clone())
            }
        };
        let id = self.arena.insert(fiber);
        self.apply_element(id, element);
        self.pass_allocations.push(id);
        id
    }
}

/// Do a previous fiber and a declared element share a type?
fn type_matches(fiber: &Fiber, element: &Element) -> bool {
    match (&fiber.ty, element) {
        (FiberType::Host(ty), Element::Host(el)) => *ty == el.ty,
        (FiberType::Composite(a), Element::Composite(el)) => std::rc::Rc::ptr_eq(a, &el.component),
        (FiberType::Fragment, Element::Fragment(_)) => true,
        (FiberType::None, Element::Text(_)) => fiber.tag == FiberTag::Text,
        _ => false,
    }
}

// =============================================================================
// Tests
// =============================================================================
