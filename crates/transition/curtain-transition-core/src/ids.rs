//! Identifiers and simple allocators for arena entities.

use serde::{Deserialize, Serialize};

/// Stable handle of an item in the engine arena.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(pub u32);

/// Stable handle of a core (exclusive state selector) in the engine arena.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CoreId(pub u32);

impl ItemId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl CoreId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Monotonic allocator for ItemId and CoreId.
/// Ids double as arena slot indices and are never reused.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_item: u32,
    next_core: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_item(&mut self) -> ItemId {
        let id = ItemId(self.next_item);
        self.next_item = self.next_item.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_core(&mut self) -> CoreId {
        let id = CoreId(self.next_core);
        self.next_core = self.next_core.wrapping_add(1);
        id
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.alloc_item(), ItemId(0));
        assert_eq!(alloc.alloc_item(), ItemId(1));
        assert_eq!(alloc.alloc_core(), CoreId(0));
        assert_eq!(alloc.alloc_core(), CoreId(1));
        alloc.reset();
        assert_eq!(alloc.alloc_item(), ItemId(0));
    }
}
