//! Fiber reconciler - cooperative diffing and effect scheduling.
//!
//! Given the committed fiber tree and a newly declared element tree,
//! the reconciler produces a minimal effect list and applies it
//! atomically in the commit phase:
//!
//! ```text
//! declared elements -> begin/complete work loop -> effect list -> commit
//! ```
//!
//! Work is processed one fiber at a time through [`Reconciler::step`],
//! so the driving loop can pause between any two units. Nothing touches
//! the host until [`Reconciler::commit`], which makes abandoning an
//! in-progress pass (preemption) always safe.
//!
//! # Example
//!
//! ```ignore
//! use filament::reconciler::Reconciler;
//!
//! let mut reconciler = Reconciler::new(doc, container);
//! reconciler.render(app_element)?;            // synchronous render + commit
//!
//! reconciler.schedule(next_element, Priority::Normal);
//! while reconciler.flush_units(50)? == WorkStatus::Yielded {
//!     // interleave other work between time slices
//! }
//! ```

use thiserror::Error;

use crate::element::{Element, RenderError};
use crate::fiber::{EffectTag, Fiber, FiberArena, FiberId, FiberTag, FiberType};
use crate::host::Host;
use crate::types::{InstanceId, Priority};

mod commit;
mod complete;
mod diff;

// =============================================================================
// Errors
// =============================================================================

/// Failures surfaced by the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    /// A render function failed and no error boundary was above it.
    /// The render pass has been discarded.
    #[error("render failed with no error boundary above the failing component: {0}")]
    Uncaught(RenderError),

    /// `commit` was called while render-phase work was still pending.
    #[error("commit requested before the render pass completed")]
    RenderIncomplete,
}

// =============================================================================
// Step results
// =============================================================================

/// Outcome of processing one unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// No scheduled work.
    Idle,
    /// A unit was processed; more remain.
    Working,
    /// The render pass finished; the effect list is ready to commit.
    RenderComplete,
}

/// Outcome of a budgeted flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkStatus {
    /// All scheduled work rendered and committed.
    Done,
    /// Budget exhausted with work remaining.
    Yielded,
}

// =============================================================================
// Reconciler
// =============================================================================

/// The reconciler: owns the fiber arena, the host, and the state of the
/// in-progress render pass.
pub struct Reconciler<H: Host> {
    pub(crate) arena: FiberArena,
    pub(crate) host: H,
    container: InstanceId,

    /// Root fiber of the committed tree.
    current_root: FiberId,
    /// Root fiber of the in-progress pass, if one is underway.
    wip_root: Option<FiberId>,
    /// Next fiber the work loop will process.
    next_unit: Option<FiberId>,
    /// Priority of the in-progress pass.
    render_priority: Priority,
    /// Latest update that arrived while a pass was in progress.
    pending: Option<(Element, Priority)>,

    /// Fibers inserted during the in-progress pass. Freed on
    /// cancellation; forgotten on commit.
    pub(crate) pass_allocations: Vec<FiberId>,
}

impl<H: Host> Reconciler<H> {
    /// Create a reconciler rendering into `container`.
    pub fn new(host: H, container: InstanceId) -> Self {
        let mut arena = FiberArena::new();
        let mut root = Fiber::new(FiberTag::HostRoot, FiberType::None, None);
        root.state_node = Some(container);
        let current_root = arena.insert(root);

        Self {
            arena,
            host,
            container,
            current_root,
            wip_root: None,
            next_unit: None,
            render_priority: Priority::Normal,
            pending: None,
            pass_allocations: Vec::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn arena(&self) -> &FiberArena {
        &self.arena
    }

    /// Root fiber of the committed tree.
    pub fn current_root(&self) -> FiberId {
        self.current_root
    }

    /// Fiber the work loop will process next, if a pass is in progress.
    pub fn work_in_progress(&self) -> Option<FiberId> {
        self.next_unit
    }

    pub fn container(&self) -> InstanceId {
        self.container
    }

    // =========================================================================
    // Scheduling
    // =========================================================================

    /// Queue a root update.
    ///
    /// A strictly higher priority than the in-progress pass cancels that
    /// pass (safe: no host mutation happens before commit) and starts
    /// over with the new element. Otherwise the update waits until the
    /// current pass commits; only the latest waiting update is kept.
    pub fn schedule(&mut self, element: Element, priority: Priority) {
        tracing::debug!(?priority, "scheduling root update");
        if self.wip_root.is_some() {
            if priority > self.render_priority {
                tracing::debug!(
                    in_progress = ?self.render_priority,
                    preempting = ?priority,
                    "discarding in-progress render pass"
                );
                self.cancel_work_in_progress();
                self.start(element, priority);
            } else {
                self.pending = Some((element, priority));
            }
        } else {
            // A newer root update supersedes anything still waiting.
            self.pending = None;
            self.start(element, priority);
        }
    }

    /// Render synchronously: schedule at `Sync` priority and flush.
    pub fn render(&mut self, element: Element) -> Result<(), ReconcileError> {
        self.schedule(element, Priority::Sync);
        self.flush()
    }

    fn start(&mut self, element: Element, priority: Priority) {
        debug_assert!(self.wip_root.is_none());
        let wip = self.create_work_in_progress(self.current_root);
        let root = &mut self.arena[wip];
        root.parent = None;
        root.sibling = None;
        root.pending_children = vec![element];
        self.wip_root = Some(wip);
        self.next_unit = Some(wip);
        self.render_priority = priority;
    }

    /// Discard the in-progress pass. Fibers allocated for it are freed
    /// and deletion markers on the committed tree are cleared.
    fn cancel_work_in_progress(&mut self) {
        if self.wip_root.take().is_none() {
            return;
        }
        self.next_unit = None;
        for id in std::mem::take(&mut self.pass_allocations) {
            if let Some(alt) = self.arena[id].alternate {
                self.arena[alt].alternate = None;
            }
            self.arena.remove(id);
        }
        self.clear_effects_in_tree(self.current_root);
    }

    /// Reset effect bookkeeping across a committed subtree (deletion
    /// markers set during an abandoned reconcile).
    fn clear_effects_in_tree(&mut self, root: FiberId) {
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            self.arena[id].reset_effects();
            if let Some(child) = self.arena[id].child {
                stack.push(child);
            }
            if id != root {
                if let Some(sibling) = self.arena[id].sibling {
                    stack.push(sibling);
                }
            }
        }
    }

    // =========================================================================
    // Work loop
    // =========================================================================

    /// Process one unit of work.
    pub fn step(&mut self) -> Result<Step, ReconcileError> {
        if self.next_unit.is_none() {
            if self.wip_root.is_some() {
                return Ok(Step::RenderComplete);
            }
            match self.pending.take() {
                Some((element, priority)) => self.start(element, priority),
                None => return Ok(Step::Idle),
            }
        }

        let unit = self.next_unit.expect("work unit scheduled above");
        match self.begin_work(unit) {
            Ok(Some(child)) => self.next_unit = Some(child),
            Ok(None) => self.next_unit = self.complete_unit_of_work(unit),
            Err(error) => self.next_unit = self.unwind(unit, error)?,
        }

        if self.next_unit.is_none() {
            Ok(Step::RenderComplete)
        } else {
            Ok(Step::Working)
        }
    }

    /// Drive the work loop to completion and commit.
    pub fn flush(&mut self) -> Result<(), ReconcileError> {
        loop {
            match self.step()? {
                Step::Idle => return Ok(()),
                Step::Working => {}
                Step::RenderComplete => self.commit()?,
            }
        }
    }

    /// Process up to `budget` units, committing when a pass finishes.
    ///
    /// Returns `Yielded` when the budget ran out first; call again later
    /// to resume exactly where the pass left off.
    pub fn flush_units(&mut self, budget: usize) -> Result<WorkStatus, ReconcileError> {
        let mut remaining = budget;
        while remaining > 0 {
            match self.step()? {
                Step::Idle => return Ok(WorkStatus::Done),
                Step::Working => remaining -= 1,
                // Committing is not render-phase work; it does not count
                // against the budget.
                Step::RenderComplete => self.commit()?,
            }
        }
        if self.next_unit.is_some() || self.wip_root.is_some() || self.pending.is_some() {
            Ok(WorkStatus::Yielded)
        } else {
            Ok(WorkStatus::Done)
        }
    }

    /// Complete a finished unit, bubbling its effect list upwards, and
    /// return the next unit (a sibling) or `None` when the root
    /// completed.
    fn complete_unit_of_work(&mut self, unit: FiberId) -> Option<FiberId> {
        let mut completed = unit;
        loop {
            self.complete_work(completed);

            if let Some(parent) = self.arena[completed].parent {
                self.bubble_effects(parent, completed);
                if let Some(sibling) = self.arena[completed].sibling {
                    return Some(sibling);
                }
                completed = parent;
            } else {
                return None;
            }
        }
    }

    /// Append `completed`'s effect list (and `completed` itself, if it
    /// carries commit-phase effects) onto `parent`'s list.
    fn bubble_effects(&mut self, parent: FiberId, completed: FiberId) {
        if let Some(first) = self.arena[completed].first_effect {
            let last = self.arena[completed]
                .last_effect
                .expect("effect list with a head has a tail");
            match self.arena[parent].last_effect {
                Some(parent_last) => self.arena[parent_last].next_effect = Some(first),
                None => self.arena[parent].first_effect = Some(first),
            }
            self.arena[parent].last_effect = Some(last);
        }

        if self.arena[completed].effect_tag.needs_commit() {
            match self.arena[parent].last_effect {
                Some(parent_last) => self.arena[parent_last].next_effect = Some(completed),
                None => self.arena[parent].first_effect = Some(completed),
            }
            self.arena[parent].last_effect = Some(completed);
        }
    }

    // =========================================================================
    // Error unwinding
    // =========================================================================

    /// A render function failed: mark the nearest boundary ancestor and
    /// abandon the subtree below the throw point. Siblings continue.
    fn unwind(
        &mut self,
        failed: FiberId,
        error: RenderError,
    ) -> Result<Option<FiberId>, ReconcileError> {
        let mut cursor = self.arena[failed].parent;
        let mut boundary = None;
        while let Some(fiber) = cursor {
            if self.arena[fiber].is_error_boundary() {
                boundary = Some(fiber);
                break;
            }
            cursor = self.arena[fiber].parent;
        }

        match boundary {
            Some(boundary) => {
                tracing::debug!(%failed, %boundary, "render error captured by boundary");
                self.arena[boundary].effect_tag |= EffectTag::ERR;
                self.arena[boundary].captured_error = Some(error);

                // Abandon the subtree below the throw point: the failed
                // fiber completes without re-rendered children.
                self.arena[failed].pending_children.clear();
                Ok(self.complete_unit_of_work(failed))
            }
            None => {
                tracing::debug!(%failed, "uncaught render error, discarding pass");
                self.cancel_work_in_progress();
                Err(ReconcileError::Uncaught(error))
            }
        }
    }

    // =========================================================================
    // Work-in-progress creation
    // =========================================================================

    /// Get or create the alternate of `current` for this pass.
    ///
    /// The pair is mutually referential: `alternate(alternate(f)) == f`,
    /// and pairs never chain. A reused alternate is reset; a fresh one
    /// is recorded so cancellation can free it.
    pub(crate) fn create_work_in_progress(&mut self, current: FiberId) -> FiberId {
        if let Some(existing) = self.arena[current].alternate {
            let (tag, ty, key, index, child, sibling, state_node, memoized_props, memoized_text) = {
                let fiber = &self.arena[current];
                (
                    fiber.tag,
                    fiber.ty.clone(),
                    fiber.key.clone(),
                    fiber.index,
                    fiber.child,
                    fiber.sibling,
                    fiber.state_node,
                    fiber.memoized_props.clone(),
                    fiber.memoized_text.clone(),
                )
            };
            let wip = &mut self.arena[existing];
            wip.reset_effects();
            wip.tag = tag;
            wip.ty = ty;
            wip.key = key;
            wip.index = index;
            wip.child = child;
            wip.sibling = sibling;
            wip.state_node = state_node;
            wip.memoized_props = memoized_props;
            wip.memoized_text = memoized_text;
            wip.pending_children = Vec::new();
            existing
        } else {
            let wip = {
                let fiber = &self.arena[current];
                let mut wip = Fiber::new(fiber.tag, fiber.ty.clone(), fiber.key.clone());
                wip.index = fiber.index;
                wip.child = fiber.child;
                wip.sibling = fiber.sibling;
                wip.state_node = fiber.state_node;
                wip.memoized_props = fiber.memoized_props.clone();
                wip.memoized_text = fiber.memoized_text.clone();
                wip.alternate = Some(current);
                wip
            };
            let wip_id = self.arena.insert(wip);
            self.arena[current].alternate = Some(wip_id);
            self.pass_allocations.push(wip_id);
            wip_id
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
