//! Columns and the column model
//!
//! The column model orders columns, designates the key column and owns
//! the cell index allocator. The key column is tracked by cell index so
//! inserting or removing other columns never moves the designation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::allocator::{CellIndex, CellIndexAllocator};
use super::errors::{ModelError, ModelResult};

/// A named column bound to a cell index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    cell_index: CellIndex,
    name: String,
}

impl Column {
    /// Create a column bound to `cell_index`
    pub fn new(cell_index: CellIndex, name: impl Into<String>) -> Self {
        Self {
            cell_index,
            name: name.into(),
        }
    }

    #[inline]
    pub fn cell_index(&self) -> CellIndex {
        self.cell_index
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Ordered columns plus the bookkeeping derived from them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnModel {
    columns: Vec<Column>,
    /// Key column designation; `None` means "first column"
    #[serde(default)]
    key_cell_index: Option<CellIndex>,
    #[serde(default)]
    allocator: CellIndexAllocator,
    /// Derived by `update`
    #[serde(skip)]
    name_to_position: HashMap<String, usize>,
}

impl ColumnModel {
    /// An empty column model
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column with a freshly minted cell index
    pub fn add_column(&mut self, name: impl Into<String>) -> ModelResult<CellIndex> {
        let name = name.into();
        if self.name_to_position.contains_key(&name) {
            return Err(ModelError::DuplicateColumn(name));
        }
        let cell_index = self.allocator.allocate();
        self.columns.push(Column::new(cell_index, name));
        self.update();
        Ok(cell_index)
    }

    /// Mint a new cell index. Indices are never handed out twice.
    pub fn allocate_cell_index(&mut self) -> CellIndex {
        self.allocator.allocate()
    }

    /// Read-only view of the allocator
    pub fn allocator(&self) -> &CellIndexAllocator {
        &self.allocator
    }

    /// Columns in display order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Looks up a column by name
    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.name_to_position
            .get(name)
            .and_then(|&position| self.columns.get(position))
    }

    /// Looks up a column by name, failing if absent
    pub fn require_column(&self, name: &str) -> ModelResult<&Column> {
        self.column_by_name(name)
            .ok_or_else(|| ModelError::ColumnNotFound(name.to_string()))
    }

    /// Position of the column bound to `cell_index`
    pub fn position_of(&self, cell_index: CellIndex) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.cell_index == cell_index)
    }

    /// Designate the key column by name
    pub fn set_key_column(&mut self, name: &str) -> ModelResult<()> {
        let cell_index = self.require_column(name)?.cell_index;
        self.key_cell_index = Some(cell_index);
        Ok(())
    }

    /// The key column; the first column unless another was designated
    pub fn key_column(&self) -> ModelResult<&Column> {
        self.key_cell_index
            .and_then(|cell_index| self.position_of(cell_index))
            .or(if self.columns.is_empty() { None } else { Some(0) })
            .map(|position| &self.columns[position])
            .ok_or(ModelError::NoKeyColumn)
    }

    /// Position of the key column
    pub fn key_column_index(&self) -> ModelResult<usize> {
        let cell_index = self.key_column()?.cell_index;
        self.position_of(cell_index).ok_or(ModelError::NoKeyColumn)
    }

    /// Insert `column` at `position`
    ///
    /// The column's cell index is observed by the allocator, so it can
    /// never be minted again. Call `update` once all structural edits are
    /// done.
    pub fn insert_column(&mut self, position: usize, column: Column) -> ModelResult<()> {
        if position > self.columns.len() {
            return Err(ModelError::ColumnPositionOutOfRange {
                position,
                len: self.columns.len(),
            });
        }
        self.allocator.observe(column.cell_index);
        self.columns.insert(position, column);
        Ok(())
    }

    /// Remove and return the column at `position`
    pub fn remove_column(&mut self, position: usize) -> ModelResult<Column> {
        if position >= self.columns.len() {
            return Err(ModelError::ColumnPositionOutOfRange {
                position,
                len: self.columns.len(),
            });
        }
        Ok(self.columns.remove(position))
    }

    /// Rebuild derived lookups after structural changes.
    ///
    /// Also re-observes every column's cell index, which keeps the
    /// allocator ahead of all indices in a freshly deserialized model.
    pub fn update(&mut self) {
        self.name_to_position = self
            .columns
            .iter()
            .enumerate()
            .map(|(position, column)| (column.name.clone(), position))
            .collect();
        for column in &self.columns {
            self.allocator.observe(column.cell_index);
        }
    }
}
