//! Extension payloads and value-to-cell conversion
//!
//! An extension payload is the data fetched for one base row: zero or
//! more extension rows, each holding one value per new column. A value is
//! either a plain scalar or a matched external entity.

use serde_json::Value;

use crate::model::{Cell, CellIndex, CellValue, ModelError, ModelResult, Recon, ReconCandidate, Row};

/// One value of an extension row.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtensionValue {
    /// Plain scalar, stored as-is
    Scalar(CellValue),
    /// External entity, stored as a matched reconciliation result
    Matched(ReconCandidate),
}

impl ExtensionValue {
    /// Convert into the cell placed in the extended row.
    ///
    /// Matched entities display their name and carry a recon fixed to
    /// `Matched` with the entity as the only candidate.
    pub fn to_cell(&self) -> Cell {
        match self {
            ExtensionValue::Scalar(value) => Cell::new(value.clone()),
            ExtensionValue::Matched(candidate) => {
                Cell::with_recon(candidate.name.as_str(), Recon::matched(candidate.clone()))
            }
        }
    }

    /// Encode as one line of JSON: a scalar, or a candidate object.
    pub fn to_json_line(&self) -> ModelResult<String> {
        let encoded = match self {
            ExtensionValue::Scalar(value) => serde_json::to_string(value),
            ExtensionValue::Matched(candidate) => serde_json::to_string(candidate),
        };
        encoded.map_err(|e| ModelError::UnsupportedValue(e.to_string()))
    }

    /// Decode one line of JSON. Objects are candidates, everything else
    /// must be a scalar.
    pub fn from_json_line(line: &str) -> ModelResult<Self> {
        let value: Value =
            serde_json::from_str(line).map_err(|e| ModelError::UnsupportedValue(e.to_string()))?;
        match value {
            Value::Object(_) => serde_json::from_value(value)
                .map(ExtensionValue::Matched)
                .map_err(|e| ModelError::UnsupportedValue(e.to_string())),
            scalar => CellValue::from_json(scalar).map(ExtensionValue::Scalar),
        }
    }
}

impl From<CellValue> for ExtensionValue {
    fn from(value: CellValue) -> Self {
        ExtensionValue::Scalar(value)
    }
}

impl From<ReconCandidate> for ExtensionValue {
    fn from(candidate: ReconCandidate) -> Self {
        ExtensionValue::Matched(candidate)
    }
}

impl From<&str> for ExtensionValue {
    fn from(value: &str) -> Self {
        ExtensionValue::Scalar(CellValue::from(value))
    }
}

/// Data fetched for one base row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DataExtension {
    pub rows: Vec<Vec<ExtensionValue>>,
}

impl DataExtension {
    pub fn new(rows: Vec<Vec<ExtensionValue>>) -> Self {
        Self { rows }
    }

    /// Number of extension rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first extension row whose width differs from `width`
    pub fn first_misaligned_row(&self, width: usize) -> Option<usize> {
        self.rows.iter().position(|values| values.len() != width)
    }
}

/// Write extension row `values` into `row`, starting at `first_cell_index`.
pub(crate) fn extend_row(row: &mut Row, values: &[ExtensionValue], first_cell_index: CellIndex) {
    for (c, value) in values.iter().enumerate() {
        row.set_cell(first_cell_index.offset(c), value.to_cell());
    }
}
