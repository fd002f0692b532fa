//! Tabular value model
//!
//! The host table that data-extension changes operate on:
//! - `Cell` / `CellValue` - scalar values plus optional reconciliation
//! - `Row` - sparse, cell-index-addressed cell slots
//! - `ColumnModel` - ordered columns, key column, cell index allocator
//! - `Project` / `SharedProject` - rows + columns behind one lock

mod allocator;
mod cell;
mod column;
mod errors;
mod project;
mod row;

pub use allocator::{CellIndex, CellIndexAllocator};
pub use cell::{Cell, CellValue, Judgment, Recon, ReconCandidate};
pub use column::{Column, ColumnModel};
pub use errors::{ModelError, ModelResult};
pub use project::{Project, Record, SharedProject};
pub use row::Row;
