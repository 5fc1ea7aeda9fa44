//! Fiber arena - slot allocation for fiber records.
//!
//! Manages the lifecycle of fiber storage:
//! - Stable `FiberId` handles (indices into the slot vector)
//! - Free slot pool for O(1) reuse
//! - Monotonic serial numbers giving identity across slot reuse
//!
//! Cross-links between fibers (`parent`, `child`, `alternate`, effect
//! list pointers) are plain `FiberId` values: the arena is the single
//! owner and outlives every link within a render pass. Indexing with a
//! dangling id is a framework bug and panics with a descriptive message.

use std::fmt;
use std::ops::{Index, IndexMut};

use super::Fiber;

// =============================================================================
// Fiber Id
// =============================================================================

/// Stable handle to a fiber in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FiberId(u32);

impl FiberId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FiberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fiber#{}", self.0)
    }
}

// =============================================================================
// Arena
// =============================================================================

/// Slot arena holding every fiber of both trees (current and
/// work-in-progress).
#[derive(Default)]
pub struct FiberArena {
    slots: Vec<Option<Fiber>>,
    free: Vec<u32>,
    next_serial: u64,
    live: usize,
}

impl FiberArena {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            next_serial: 1,
            live: 0,
        }
    }

    /// Insert a fiber, assigning its serial. Reuses a freed slot when
    /// one is available.
    pub fn insert(&mut self, mut fiber: Fiber) -> FiberId {
        fiber.serial = self.next_serial;
        self.next_serial += 1;
        self.live += 1;

        if let Some(index) = self.free.pop() {
            self.slots[index as usize] = Some(fiber);
            FiberId(index)
        } else {
            self.slots.push(Some(fiber));
            FiberId((self.slots.len() - 1) as u32)
        }
    }

    /// Remove a fiber, returning its slot to the free pool.
    ///
    /// The caller is responsible for unlinking it from both trees first.
    pub fn remove(&mut self, id: FiberId) -> Fiber {
        let fiber = self.slots[id.index()]
            .take()
            .unwrap_or_else(|| panic!("{id} removed twice or never allocated"));
        self.free.push(id.0);
        self.live -= 1;
        fiber
    }

    /// Fallible lookup, for external inspection paths.
    pub fn get(&self, id: FiberId) -> Option<&Fiber> {
        self.slots.get(id.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: FiberId) -> Option<&mut Fiber> {
        self.slots.get_mut(id.index()).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: FiberId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live fibers.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Iterate live fibers with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (FiberId, &Fiber)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|f| (FiberId(i as u32), f)))
    }
}

impl Index<FiberId> for FiberArena {
    type Output = Fiber;

    fn index(&self, id: FiberId) -> &Fiber {
        self.get(id)
            .unwrap_or_else(|| panic!("{id} is not allocated (dangling fiber link)"))
    }
}

impl IndexMut<FiberId> for FiberArena {
    fn index_mut(&mut self, id: FiberId) -> &mut Fiber {
        self.get_mut(id)
            .unwrap_or_else(|| panic!("{id} is not allocated (dangling fiber link)"))
    }
}

// =============================================================================
// Tests
// =============================================================================
