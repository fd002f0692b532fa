//! Change log
//!
//! Applied changes are kept as entries on an undo stack; undone entries
//! move to a redo stack until a new entry is added. Each entry owns its
//! change, and with it the cached before/after rows, so undo and redo
//! are snapshot swaps.
//!
//! # Invariants
//!
//! - Adding an entry clears the redo stack
//! - A failed undo/redo leaves stacks and project unchanged
//! - The cell-index allocator is never rewound by undo
//! - Persisted entries are checksummed; a mismatch fails the load

mod entry;
mod errors;
mod file;
mod stack;

pub use entry::{Change, HistoryEntry};
pub use errors::{HistoryError, HistoryResult};
pub use stack::History;
