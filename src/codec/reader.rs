//! Change record decoder
//!
//! Decoding is all-or-nothing:
//! - Unknown or repeated keys fail
//! - Truncated streams fail (the end marker is mandatory)
//! - Count headers consume exactly `count` payload lines
//! - Snapshot fields must be all present or all absent
//!
//! Payload rows are as wide as the column name list, so
//! `columnNameCount` must precede `dataExtensionCount`.

use std::io::BufRead;

use crate::extension::{
    DataExtension, DataExtensionChange, ExtensionSnapshots, ExtensionValue, RowIndexPolicy,
};
use crate::model::{CellIndex, Row};

use super::errors::{CodecError, CodecResult};
use super::{
    BASE_COLUMN_NAME, COLUMN_INSERT_INDEX, COLUMN_NAME_COUNT, DATA_EXTENSION_COUNT, END_OF_CHANGE,
    FIRST_NEW_CELL_INDEX, NEW_ROW_COUNT, NO_PAYLOAD, OLD_ROW_COUNT, ROW_INDEX_COUNT,
};

/// Line source that tracks line numbers for error reporting.
pub struct LineReader<R> {
    inner: R,
    line_number: usize,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            line_number: 0,
        }
    }

    /// Underlying reader
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Number of the last line returned (1-based)
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Next line without its terminator, or `None` at end of stream
    pub fn next_line(&mut self) -> CodecResult<Option<String>> {
        let mut line = String::new();
        let read = self.inner.read_line(&mut line).map_err(|e| {
            CodecError::io_failed(format!("Failed to read line {}", self.line_number + 1), e)
        })?;
        if read == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }

    /// Next line; end of stream is a truncation error
    pub fn require_line(&mut self, expecting: &str) -> CodecResult<String> {
        self.next_line()?.ok_or_else(|| {
            CodecError::decode_failed_at_line(
                self.line_number + 1,
                format!("Truncated stream: expected {}", expecting),
            )
        })
    }

    /// Error positioned at the last line read
    pub fn error(&self, message: impl Into<String>) -> CodecError {
        CodecError::decode_failed_at_line(self.line_number, message)
    }

    /// Next line parsed as an unsigned integer
    pub fn require_usize(&mut self, expecting: &str) -> CodecResult<usize> {
        let line = self.require_line(expecting)?;
        self.parse_usize(expecting, &line)
    }

    /// Parse `text` as an unsigned integer, positioned at the last line
    pub fn parse_usize(&self, field: &str, text: &str) -> CodecResult<usize> {
        text.trim()
            .parse::<usize>()
            .map_err(|e| self.error(format!("Invalid integer for {}: {:?} ({})", field, text, e)))
    }
}

/// Fields collected while scanning a record.
#[derive(Default)]
struct Fields {
    base_column_name: Option<String>,
    column_insert_index: Option<usize>,
    column_names: Option<Vec<String>>,
    row_indices: Option<Vec<usize>>,
    extensions: Option<Vec<Option<DataExtension>>>,
    first_new_cell_index: Option<CellIndex>,
    new_rows: Option<Vec<Row>>,
    old_rows: Option<Vec<Row>>,
}

/// Decode one change record from a buffered reader.
pub fn decode_change<R: BufRead>(reader: R) -> CodecResult<DataExtensionChange> {
    decode_change_lines(&mut LineReader::new(reader))
}

/// Decode one change record from a string.
pub fn decode_change_from_str(text: &str) -> CodecResult<DataExtensionChange> {
    decode_change(text.as_bytes())
}

/// Decode one unapplied-or-applied record, normalizing out-of-order row
/// indices of an unapplied record when `policy` says so. Applied records
/// are always decoded strictly.
pub fn decode_change_with_policy<R: BufRead>(
    reader: R,
    policy: RowIndexPolicy,
) -> CodecResult<DataExtensionChange> {
    decode_record(&mut LineReader::new(reader), policy)
}

/// Decode one change record, consuming lines up to and including the
/// end marker.
pub fn decode_change_lines<R: BufRead>(lines: &mut LineReader<R>) -> CodecResult<DataExtensionChange> {
    decode_record(lines, RowIndexPolicy::Reject)
}

fn decode_record<R: BufRead>(
    lines: &mut LineReader<R>,
    policy: RowIndexPolicy,
) -> CodecResult<DataExtensionChange> {
    let mut fields = Fields::default();

    loop {
        let line = lines.require_line(END_OF_CHANGE)?;
        if line == END_OF_CHANGE {
            break;
        }
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| lines.error(format!("Expected key=value, found {:?}", line)))?;

        match key {
            BASE_COLUMN_NAME => {
                let name = value.to_string();
                set_once(lines, &mut fields.base_column_name, key, name)?;
            }
            COLUMN_INSERT_INDEX => {
                let index = lines.parse_usize(key, value)?;
                set_once(lines, &mut fields.column_insert_index, key, index)?;
            }
            FIRST_NEW_CELL_INDEX => {
                // -1 is how never-applied records were written historically
                if value.trim() == "-1" {
                    continue;
                }
                let index = CellIndex::new(lines.parse_usize(key, value)?);
                set_once(lines, &mut fields.first_new_cell_index, key, index)?;
            }
            COLUMN_NAME_COUNT => {
                let count = lines.parse_usize(key, value)?;
                let mut names = Vec::new();
                for _ in 0..count {
                    names.push(lines.require_line("column name")?);
                }
                set_once(lines, &mut fields.column_names, key, names)?;
            }
            ROW_INDEX_COUNT => {
                let count = lines.parse_usize(key, value)?;
                let mut row_indices = Vec::new();
                for _ in 0..count {
                    row_indices.push(lines.require_usize("row index")?);
                }
                set_once(lines, &mut fields.row_indices, key, row_indices)?;
            }
            DATA_EXTENSION_COUNT => {
                let width = fields
                    .column_names
                    .as_ref()
                    .map(Vec::len)
                    .ok_or_else(|| {
                        lines.error(format!("{} must precede {}", COLUMN_NAME_COUNT, DATA_EXTENSION_COUNT))
                    })?;
                let count = lines.parse_usize(key, value)?;
                let mut extensions = Vec::new();
                for _ in 0..count {
                    extensions.push(read_extension(lines, width)?);
                }
                set_once(lines, &mut fields.extensions, key, extensions)?;
            }
            NEW_ROW_COUNT => {
                let rows = read_rows(lines, key, value)?;
                set_once(lines, &mut fields.new_rows, key, rows)?;
            }
            OLD_ROW_COUNT => {
                let rows = read_rows(lines, key, value)?;
                set_once(lines, &mut fields.old_rows, key, rows)?;
            }
            other => return Err(lines.error(format!("Unknown field: {}", other))),
        }
    }

    let end_line = lines.line_number();
    let missing = |field: &str| {
        CodecError::decode_failed_at_line(end_line, format!("Missing required field: {}", field))
    };

    let snapshots = match (fields.first_new_cell_index, fields.new_rows, fields.old_rows) {
        (Some(first_new_cell_index), Some(after), Some(before)) => Some(ExtensionSnapshots {
            first_new_cell_index,
            before,
            after,
        }),
        (None, None, None) => None,
        _ => {
            return Err(CodecError::decode_failed_at_line(
                end_line,
                format!(
                    "{}, {} and {} must be all present or all absent",
                    FIRST_NEW_CELL_INDEX, NEW_ROW_COUNT, OLD_ROW_COUNT
                ),
            ))
        }
    };

    let base_column_name = fields.base_column_name.ok_or_else(|| missing(BASE_COLUMN_NAME))?;
    let column_insert_index = fields.column_insert_index.ok_or_else(|| missing(COLUMN_INSERT_INDEX))?;
    let column_names = fields.column_names.ok_or_else(|| missing(COLUMN_NAME_COUNT))?;
    let row_indices = fields.row_indices.ok_or_else(|| missing(ROW_INDEX_COUNT))?;
    let extensions = fields.extensions.ok_or_else(|| missing(DATA_EXTENSION_COUNT))?;

    if let Some(snapshots) = &snapshots {
        let first = snapshots.first_new_cell_index.value();
        // The allocator must still be able to step past the last new index
        let fits = first
            .checked_add(column_names.len())
            .is_some_and(|end| end < usize::MAX);
        if !fits {
            return Err(CodecError::decode_failed_at_line(
                end_line,
                format!(
                    "{}={} leaves no room for {} new columns",
                    FIRST_NEW_CELL_INDEX,
                    first,
                    column_names.len()
                ),
            ));
        }
    }

    let restored = if snapshots.is_none() && policy == RowIndexPolicy::Normalize {
        DataExtensionChange::with_policy(
            base_column_name,
            column_insert_index,
            column_names,
            row_indices,
            extensions,
            policy,
        )
    } else {
        DataExtensionChange::restore(
            base_column_name,
            column_insert_index,
            column_names,
            row_indices,
            extensions,
            snapshots,
        )
    };
    restored.map_err(|e| CodecError::decode_failed_at_line(end_line, format!("Inconsistent change record: {}", e)))
}

fn set_once<R: BufRead, T>(
    lines: &LineReader<R>,
    slot: &mut Option<T>,
    key: &str,
    value: T,
) -> CodecResult<()> {
    if slot.is_some() {
        return Err(lines.error(format!("Repeated field: {}", key)));
    }
    *slot = Some(value);
    Ok(())
}

fn read_extension<R: BufRead>(lines: &mut LineReader<R>, width: usize) -> CodecResult<Option<DataExtension>> {
    let header = lines.require_line("payload row count")?;
    if header.trim() == NO_PAYLOAD {
        return Ok(None);
    }
    let row_count = lines.parse_usize("payload row count", &header)?;

    let mut rows = Vec::new();
    for _ in 0..row_count {
        let mut values = Vec::with_capacity(width);
        for _ in 0..width {
            let line = lines.require_line("payload value")?;
            let value = ExtensionValue::from_json_line(&line)
                .map_err(|e| lines.error(format!("Invalid payload value: {}", e)))?;
            values.push(value);
        }
        rows.push(values);
    }
    Ok(Some(DataExtension::new(rows)))
}

fn read_rows<R: BufRead>(lines: &mut LineReader<R>, key: &str, count: &str) -> CodecResult<Vec<Row>> {
    let count = lines.parse_usize(key, count)?;
    let mut rows = Vec::new();
    for _ in 0..count {
        let line = lines.require_line("row")?;
        let row: Row = serde_json::from_str(&line)
            .map_err(|e| lines.error(format!("Invalid row for {}: {}", key, e)))?;
        rows.push(row);
    }
    Ok(rows)
}
