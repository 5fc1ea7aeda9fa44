//! Fiber tree inspection for debugging tools.
//!
//! [`Inspector::describe`] flattens both fiber trees (current and
//! work-in-progress) into a serializable snapshot: one record per
//! reachable fiber, linked by small stable ids. Ids are keyed by fiber
//! serial, so a fiber keeps its id across snapshots even when arena
//! slots get reused, and an id is never reassigned to a different
//! fiber.
//!
//! Tag and effect names come from closed lookup tables; a value outside
//! them is reported as an error rather than guessed at, so the
//! formatter fails loudly when the fiber model grows a case it does not
//! know.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use thiserror::Error;

use crate::fiber::{Fiber, FiberArena, FiberId, FiberTag};

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InspectError {
    #[error("unknown fiber tag: {0}")]
    UnknownTag(u8),
    #[error("unknown effect combination: {0}")]
    UnknownEffect(u8),
}

// =============================================================================
// Friendly names
// =============================================================================

/// Display label for a raw fiber tag.
pub fn friendly_tag(raw: u8) -> Result<&'static str, InspectError> {
    match FiberTag::from_raw(raw) {
        Some(FiberTag::Indeterminate) => Ok("[indeterminate]"),
        Some(FiberTag::FunctionComponent) => Ok("[fn]"),
        Some(FiberTag::ClassComponent) => Ok("[class]"),
        Some(FiberTag::HostRoot) => Ok("[root]"),
        Some(FiberTag::Portal) => Ok("[portal]"),
        Some(FiberTag::Host) => Ok("[host]"),
        Some(FiberTag::Text) => Ok("[text]"),
        Some(FiberTag::Coroutine) => Ok("[coroutine]"),
        Some(FiberTag::Handler) => Ok("[handler]"),
        Some(FiberTag::Yield) => Ok("[yield]"),
        Some(FiberTag::Fragment) => Ok("[frag]"),
        None => Err(InspectError::UnknownTag(raw)),
    }
}

/// Display label for an effect bitfield. No effect has no label.
///
/// Only the combinations the commit phase leaves behind are named;
/// anything else is an error.
pub fn friendly_effect(bits: u8) -> Result<Option<&'static str>, InspectError> {
    match bits {
        0 => Ok(None),
        1 => Ok(Some("Performed Work")),
        2 => Ok(Some("Placement")),
        4 => Ok(Some("Update")),
        6 => Ok(Some("Placement and Update")),
        8 => Ok(Some("Deletion")),
        16 => Ok(Some("Content reset")),
        32 => Ok(Some("Callback")),
        64 => Ok(Some("Err")),
        128 => Ok(Some("Ref")),
        other => Err(InspectError::UnknownEffect(other)),
    }
}

// =============================================================================
// Snapshot types
// =============================================================================

/// One fiber, flattened for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FiberView {
    pub id: u32,
    pub tag: &'static str,
    /// Type name: the host tag, or `<Name>` for composites.
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    /// Host identity never leaks into a snapshot; only whether an
    /// instance is attached.
    pub state_node: &'static str,
    pub effect: Option<&'static str>,
    pub key: Option<String>,
    pub parent: Option<u32>,
    pub child: Option<u32>,
    pub sibling: Option<u32>,
    pub alternate: Option<u32>,
    pub first_effect: Option<u32>,
    pub last_effect: Option<u32>,
    pub next_effect: Option<u32>,
}

/// Snapshot of both fiber trees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FiberSnapshot {
    pub descriptions: FxHashMap<u32, FiberView>,
    pub root_id: u32,
    /// Ids of the committed tree, in traversal order.
    pub current_ids: Vec<u32>,
    pub work_in_progress_id: Option<u32>,
}

// =============================================================================
// Inspector
// =============================================================================

/// Assigns and remembers stable display ids for fibers.
#[derive(Default)]
pub struct Inspector {
    ids: FxHashMap<u64, u32>,
    next_id: u32,
}

impl Inspector {
    pub fn new() -> Self {
        Self::default()
    }

    fn id_for(&mut self, fiber: &Fiber) -> u32 {
        *self.ids.entry(fiber.serial).or_insert_with(|| {
            self.next_id += 1;
            self.next_id
        })
    }

    /// Describe every fiber reachable from `root` (and `work_in_progress`,
    /// when a render pass is underway).
    ///
    /// Detached fibers - no parent link and not a root - are skipped
    /// rather than described.
    pub fn describe(
        &mut self,
        arena: &FiberArena,
        root: FiberId,
        work_in_progress: Option<FiberId>,
    ) -> Result<FiberSnapshot, InspectError> {
        let mut descriptions = FxHashMap::default();
        let mut visited = FxHashSet::default();
        let mut stack = vec![root];
        stack.extend(work_in_progress);

        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(fiber) = arena.get(id) else {
                continue;
            };
            if is_detached(fiber) {
                continue;
            }

            let view = self.view(arena, fiber)?;
            descriptions.insert(view.id, view);

            for link in [fiber.parent, fiber.child, fiber.sibling, fiber.alternate] {
                stack.extend(link);
            }
        }

        let mut current_ids = Vec::new();
        self.collect_tree_ids(arena, Some(root), &mut current_ids);

        let root_id = self.id_for(&arena[root]);
        let work_in_progress_id = work_in_progress
            .and_then(|id| arena.get(id))
            .filter(|fiber| !is_detached(fiber))
            .map(|fiber| self.id_for(fiber));

        Ok(FiberSnapshot {
            descriptions,
            root_id,
            current_ids,
            work_in_progress_id,
        })
    }

    /// Sibling-first walk of the committed tree. Detached fibers are
    /// not described, so the walk stops at them too.
    fn collect_tree_ids(&mut self, arena: &FiberArena, id: Option<FiberId>, out: &mut Vec<u32>) {
        let Some(fiber) = id.and_then(|id| arena.get(id)) else {
            return;
        };
        if is_detached(fiber) {
            return;
        }
        out.push(self.id_for(fiber));
        self.collect_tree_ids(arena, fiber.sibling, out);
        self.collect_tree_ids(arena, fiber.child, out);
    }

    fn view(&mut self, arena: &FiberArena, fiber: &Fiber) -> Result<FiberView, InspectError> {
        // Links to detached fibers become None so every id in a view
        // resolves to a description.
        let link = |this: &mut Self, link: Option<FiberId>| {
            link.and_then(|id| arena.get(id))
                .filter(|f| !is_detached(f))
                .map(|f| this.id_for(f))
        };

        Ok(FiberView {
            id: self.id_for(fiber),
            tag: friendly_tag(fiber.tag.raw())?,
            type_name: describe_type(fiber),
            state_node: if fiber.state_node.is_some() {
                "[instance]"
            } else {
                "[none]"
            },
            effect: friendly_effect(fiber.effect_tag.bits())?,
            key: fiber.key.as_ref().map(|key| key.as_str().to_string()),
            parent: link(self, fiber.parent),
            child: link(self, fiber.child),
            sibling: link(self, fiber.sibling),
            alternate: link(self, fiber.alternate),
            first_effect: link(self, fiber.first_effect),
            last_effect: link(self, fiber.last_effect),
            next_effect: link(self, fiber.next_effect),
        })
    }
}

/// No parent link and not a root: the fiber is unreachable from a tree
/// and is left out of snapshots entirely.
fn is_detached(fiber: &Fiber) -> bool {
    fiber.parent.is_none() && fiber.tag != FiberTag::HostRoot
}

fn describe_type(fiber: &Fiber) -> Option<String> {
    use crate::fiber::FiberType;
    match &fiber.ty {
        FiberType::None => None,
        FiberType::Host(ty) => Some(ty.clone()),
        FiberType::Composite(component) => Some(format!("<{}>", component.name)),
        FiberType::Fragment => Some("Fragment".to_string()),
    }
}

// =============================================================================
// Tests
// =============================================================================
