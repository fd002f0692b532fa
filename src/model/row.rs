//! Rows
//!
//! A row is a sparse, index-addressed sequence of optional cells. Slot
//! positions are cell indices, not column positions, so reordering or
//! removing columns never touches row storage.

use serde::{Deserialize, Serialize};

use super::allocator::CellIndex;
use super::cell::{Cell, CellValue};

/// A single physical row of the table.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub flagged: bool,
    #[serde(default)]
    pub starred: bool,
    #[serde(default)]
    cells: Vec<Option<Cell>>,
}

impl Row {
    /// An empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty row with room for `capacity` cell slots
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            flagged: false,
            starred: false,
            cells: Vec::with_capacity(capacity),
        }
    }

    /// A row whose cells fill slots `0..cells.len()` in order
    pub fn from_cells(cells: Vec<Option<Cell>>) -> Self {
        Self {
            flagged: false,
            starred: false,
            cells,
        }
    }

    /// A row of plain cells built from scalar values, one per slot
    pub fn from_values<V: Into<CellValue>>(values: impl IntoIterator<Item = Option<V>>) -> Self {
        Self::from_cells(
            values
                .into_iter()
                .map(|value| value.map(Cell::new))
                .collect(),
        )
    }

    /// Independent copy, safe to mutate without touching the original
    pub fn dup(&self) -> Self {
        self.clone()
    }

    /// Returns the cell at `index`, if one is present
    pub fn cell(&self, index: CellIndex) -> Option<&Cell> {
        self.cells.get(index.value()).and_then(Option::as_ref)
    }

    /// Returns the value at `index`, if a cell is present
    pub fn cell_value(&self, index: CellIndex) -> Option<&CellValue> {
        self.cell(index).map(|cell| &cell.value)
    }

    /// Absent cells and cells holding a blank value are both blank
    pub fn is_cell_blank(&self, index: CellIndex) -> bool {
        self.cell(index).map_or(true, Cell::is_blank)
    }

    /// Stores `cell` at `index`, growing the slot list as needed
    pub fn set_cell(&mut self, index: CellIndex, cell: Cell) {
        let slot = index.value();
        if slot >= self.cells.len() {
            self.cells.resize(slot + 1, None);
        }
        self.cells[slot] = Some(cell);
    }

    /// Number of slots, including trailing absent ones
    pub fn slot_count(&self) -> usize {
        self.cells.len()
    }

    /// True when no slot holds a non-blank cell
    pub fn is_empty(&self) -> bool {
        self.cells.iter().flatten().all(Cell::is_blank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(value: usize) -> CellIndex {
        CellIndex::new(value)
    }

    #[test]
    fn test_set_cell_grows_sparse() {
        let mut row = Row::new();
        row.set_cell(idx(3), Cell::new("x"));
        assert_eq!(row.slot_count(), 4);
        assert!(row.cell(idx(0)).is_none());
        assert_eq!(row.cell_value(idx(3)), Some(&CellValue::from("x")));
    }

    #[test]
    fn test_absent_and_empty_are_blank_but_distinct() {
        let row = Row::from_cells(vec![None, Some(Cell::new(""))]);
        assert!(row.is_cell_blank(idx(0)));
        assert!(row.is_cell_blank(idx(1)));
        assert!(row.cell(idx(0)).is_none());
        assert!(row.cell(idx(1)).is_some());
    }

    #[test]
    fn test_out_of_range_is_blank() {
        let row = Row::from_values(vec![Some("a")]);
        assert!(!row.is_cell_blank(idx(0)));
        assert!(row.is_cell_blank(idx(42)));
    }

    #[test]
    fn test_dup_is_independent() {
        let original = Row::from_values(vec![Some("a")]);
        let mut copy = original.dup();
        copy.set_cell(idx(1), Cell::new("b"));
        assert_eq!(original.slot_count(), 1);
        assert_eq!(copy.slot_count(), 2);
    }

    #[test]
    fn test_row_json_is_single_line() {
        let row = Row::from_values(vec![Some("multi\nline"), None]);
        let line = serde_json::to_string(&row).unwrap();
        assert!(!line.contains('\n'));
        let back: Row = serde_json::from_str(&line).unwrap();
        assert_eq!(back, row);
    }
}
