//! Commit phase: apply the effect list to the host, atomically.
//!
//! Runs only once the render phase has produced a complete
//! work-in-progress tree. Two passes over the effect list:
//!
//! 1. host mutations - content resets, ref detaches, placements,
//!    updates, deletions;
//! 2. lifecycle - commit callbacks, boundary error handlers, ref
//!    attaches.
//!
//! The split means every callback in pass 2 observes a host tree with
//! all of this pass's mutations already applied. The commit is not
//! interruptible; once entered it runs to the end, then the
//! work-in-progress tree becomes current.

use crate::fiber::{EffectTag, FiberId, FiberTag, FiberType};
use crate::host::Host;
use crate::types::InstanceId;

use super::{ReconcileError, Reconciler};

impl<H: Host> Reconciler<H> {
    /// Apply the completed render pass to the host and swap trees.
    ///
    /// Errors with [`ReconcileError::RenderIncomplete`] if render-phase
    /// work is still pending; a commit with no pass in progress is a
    /// no-op.
    pub fn commit(&mut self) -> Result<(), ReconcileError> {
        if self.next_unit.is_some() {
            return Err(ReconcileError::RenderIncomplete);
        }
        let Some(wip_root) = self.wip_root.take() else {
            return Ok(());
        };

        // Snapshot the effect list; the root itself joins the end when
        // it carries effects of its own.
        let mut effects = Vec::new();
        let mut cursor = self.arena[wip_root].first_effect;
        while let Some(fiber) = cursor {
            effects.push(fiber);
            cursor = self.arena[fiber].next_effect;
        }
        if self.arena[wip_root].effect_tag.needs_commit() {
            effects.push(wip_root);
        }
        tracing::debug!(effects = effects.len(), "committing render pass");

        // Pass 1: host mutations.
        let mut deleted = Vec::new();
        for &fiber in &effects {
            let tag = self.arena[fiber].effect_tag;

            if tag.contains(EffectTag::CONTENT_RESET) {
                let instance = self.arena[fiber]
                    .state_node
                    .expect("content reset on a fiber without an instance");
                self.host.reset_text_content(instance);
            }

            if tag.contains(EffectTag::REF) {
                if let Some(alternate) = self.arena[fiber].alternate {
                    if let Some(old_ref) = self.arena[alternate].memoized_props.node_ref.clone() {
                        old_ref(None);
                    }
                }
            }

            match tag & (EffectTag::PLACEMENT | EffectTag::UPDATE | EffectTag::DELETION) {
                t if t == EffectTag::PLACEMENT => self.commit_placement(fiber),
                t if t == EffectTag::PLACEMENT | EffectTag::UPDATE => {
                    self.commit_placement(fiber);
                    self.commit_update(fiber);
                }
                t if t == EffectTag::UPDATE => self.commit_update(fiber),
                t if t == EffectTag::DELETION => self.commit_deletion(fiber, &mut deleted),
                _ => {}
            }
        }

        // Pass 2: lifecycle, in effect-list order.
        for &fiber in &effects {
            let tag = self.arena[fiber].effect_tag;
            if tag.contains(EffectTag::DELETION) {
                continue;
            }

            if tag.contains(EffectTag::ERR) {
                let error = self.arena[fiber].captured_error.clone();
                if let (FiberType::Composite(component), Some(error)) =
                    (self.arena[fiber].ty.clone(), error)
                {
                    tracing::debug!(boundary = %component.name, %error, "invoking error handler");
                    if let Some(on_error) = &component.on_error {
                        on_error(&error);
                    }
                }
            }

            if tag.contains(EffectTag::CALLBACK) {
                if let Some(on_commit) = self.arena[fiber].memoized_props.on_commit.clone() {
                    on_commit();
                }
            }

            if tag.contains(EffectTag::REF) {
                if let Some(node_ref) = self.arena[fiber].memoized_props.node_ref.clone() {
                    let instance = self.arena[fiber].state_node;
                    node_ref(instance);
                }
            }
        }

        // Clear effect bookkeeping so nothing runs twice.
        for &fiber in &effects {
            if !self.arena[fiber].effect_tag.contains(EffectTag::DELETION) {
                self.arena[fiber].reset_effects();
            }
        }
        let root = &mut self.arena[wip_root];
        root.first_effect = None;
        root.last_effect = None;

        // Free deleted fibers and their stale alternates.
        for fiber in deleted {
            if let Some(alternate) = self.arena[fiber].alternate {
                self.arena[alternate].alternate = None;
                self.arena.remove(alternate);
            }
            self.arena.remove(fiber);
        }

        // The work-in-progress tree is now current.
        self.current_root = wip_root;
        self.pass_allocations.clear();
        Ok(())
    }

    // =========================================================================
    // Placement
    // =========================================================================

    fn commit_placement(&mut self, fiber: FiberId) {
        let parent = self.host_parent_instance(fiber);
        let before = self.host_sibling(fiber);
        self.insert_placement_node(fiber, parent, before);
        self.arena[fiber].effect_tag -= EffectTag::PLACEMENT;
    }

    /// Insert the host nodes at the top of `fiber`'s subtree, descending
    /// through composite and fragment layers.
    fn insert_placement_node(
        &mut self,
        fiber: FiberId,
        parent: InstanceId,
        before: Option<InstanceId>,
    ) {
        match self.arena[fiber].tag {
            FiberTag::Host | FiberTag::Text => {
                let instance = self.arena[fiber]
                    .state_node
                    .expect("placing a fiber without an instance");
                match before {
                    Some(before) => self.host.insert_before(parent, instance, before),
                    None => self.host.append_child(parent, instance),
                }
            }
            _ => {
                let mut child = self.arena[fiber].child;
                while let Some(id) = child {
                    self.insert_placement_node(id, parent, before);
                    child = self.arena[id].sibling;
                }
            }
        }
    }

    /// Nearest host ancestor's instance.
    fn host_parent_instance(&self, fiber: FiberId) -> InstanceId {
        let mut cursor = self.arena[fiber].parent;
        while let Some(id) = cursor {
            match self.arena[id].tag {
                FiberTag::Host | FiberTag::HostRoot => {
                    return self.arena[id]
                        .state_node
                        .expect("host ancestor without an instance");
                }
                _ => cursor = self.arena[id].parent,
            }
        }
        unreachable!("fiber detached from the root")
    }

    /// The already-placed host node a placement must land before, or
    /// `None` to append. Skips forward past siblings that are themselves
    /// pending placement.
    fn host_sibling(&self, fiber: FiberId) -> Option<InstanceId> {
        let mut node = fiber;
        'siblings: loop {
            while self.arena[node].sibling.is_none() {
                let parent = self.arena[node].parent?;
                if matches!(self.arena[parent].tag, FiberTag::Host | FiberTag::HostRoot) {
                    return None;
                }
                node = parent;
            }
            node = self.arena[node]
                .sibling
                .expect("sibling checked in the loop above");

            while !matches!(self.arena[node].tag, FiberTag::Host | FiberTag::Text) {
                if self.arena[node].effect_tag.contains(EffectTag::PLACEMENT) {
                    continue 'siblings;
                }
                match self.arena[node].child {
                    Some(child) => node = child,
                    None => continue 'siblings,
                }
            }

            if !self.arena[node].effect_tag.contains(EffectTag::PLACEMENT) {
                return self.arena[node].state_node;
            }
        }
    }

    // =========================================================================
    // Updates
    // =========================================================================

    fn commit_update(&mut self, fiber: FiberId) {
        match self.arena[fiber].tag {
            FiberTag::Host => {
                let instance = self.arena[fiber]
                    .state_node
                    .expect("updating a fiber without an instance");
                let new_props = self.arena[fiber].memoized_props.clone();
                let old_props = match self.arena[fiber].alternate {
                    Some(alternate) => self.arena[alternate].memoized_props.clone(),
                    None => Default::default(),
                };
                self.host.commit_update(instance, &old_props, &new_props);
            }
            FiberTag::Text => {
                let instance = self.arena[fiber]
                    .state_node
                    .expect("updating a text fiber without an instance");
                let new_text = self.arena[fiber].memoized_text.clone().unwrap_or_default();
                let old_text = self.arena[fiber]
                    .alternate
                    .and_then(|alt| self.arena[alt].memoized_text.clone())
                    .unwrap_or_default();
                self.host.commit_text_update(instance, &old_text, &new_text);
            }
            _ => {}
        }
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    /// Unmount a subtree: detach its refs, remove its topmost host nodes
    /// from the host parent, and queue every fiber in it for freeing.
    fn commit_deletion(&mut self, fiber: FiberId, deleted: &mut Vec<FiberId>) {
        let parent = self.host_parent_instance(fiber);
        self.detach_refs_in_subtree(fiber);
        self.remove_host_nodes(fiber, parent);
        self.collect_subtree(fiber, deleted);
    }

    fn detach_refs_in_subtree(&mut self, fiber: FiberId) {
        let mut stack = vec![fiber];
        while let Some(id) = stack.pop() {
            if let Some(node_ref) = self.arena[id].memoized_props.node_ref.clone() {
                node_ref(None);
            }
            let mut child = self.arena[id].child;
            while let Some(c) = child {
                stack.push(c);
                child = self.arena[c].sibling;
            }
        }
    }

    /// Remove the topmost host nodes of a deleted subtree. The host
    /// frees everything beneath each one.
    fn remove_host_nodes(&mut self, fiber: FiberId, parent: InstanceId) {
        match self.arena[fiber].tag {
            FiberTag::Host | FiberTag::Text => {
                if let Some(instance) = self.arena[fiber].state_node {
                    self.host.remove_child(parent, instance);
                }
            }
            _ => {
                let mut child = self.arena[fiber].child;
                while let Some(id) = child {
                    self.remove_host_nodes(id, parent);
                    child = self.arena[id].sibling;
                }
            }
        }
    }

    fn collect_subtree(&self, fiber: FiberId, out: &mut Vec<FiberId>) {
        out.push(fiber);
        let mut child = self.arena[fiber].child;
        while let Some(id) = child {
            self.collect_subtree(id, out);
            child = self.arena[id].sibling;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
