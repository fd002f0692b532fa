//! Cell index allocation
//!
//! Cell indices bind columns to storage slots inside rows:
//! - Strictly increasing
//! - Never reused, even when the owning column is removed
//! - Owned by exactly one column model
//!
//! Historical row snapshots embed raw cell indices, so handing out an
//! index twice would silently corrupt old history.

use serde::{Deserialize, Serialize};

/// A stable storage slot identifier for a column's cells.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellIndex(usize);

impl CellIndex {
    /// Creates a cell index with the given raw value.
    ///
    /// Only the allocator and decoders should construct new indices.
    #[inline]
    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    /// Returns the raw slot position.
    #[inline]
    pub fn value(&self) -> usize {
        self.0
    }

    /// Returns the index `offset` slots after this one, saturating at
    /// the largest index.
    #[inline]
    pub fn offset(&self, offset: usize) -> Self {
        Self(self.0.saturating_add(offset))
    }
}

impl std::fmt::Display for CellIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic cell index allocator.
///
/// There is no way to move the high-water mark backwards. The mark
/// saturates at `usize::MAX`; decoders reject indices that close to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellIndexAllocator {
    /// Next index to hand out.
    next: usize,
}

impl CellIndexAllocator {
    /// Create an allocator that starts handing out indices at zero.
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Mint a fresh cell index.
    pub fn allocate(&mut self) -> CellIndex {
        let index = CellIndex::new(self.next);
        self.next = self.next.saturating_add(1);
        index
    }

    /// Record that `index` is in use, so it is never handed out again.
    ///
    /// Used when registering columns whose indices were minted elsewhere
    /// (loaded projects, replayed history).
    pub fn observe(&mut self, index: CellIndex) {
        if index.value() >= self.next {
            self.next = index.value().saturating_add(1);
        }
    }

    /// Peek at the index the next `allocate` will return.
    pub fn peek_next(&self) -> CellIndex {
        CellIndex::new(self.next)
    }

    /// Total number of indices minted or observed so far.
    pub fn high_water_mark(&self) -> usize {
        self.next
    }
}
