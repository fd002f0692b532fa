//! Change record encoder
//!
//! The record is rendered into memory first and written in one call, so
//! an encode failure never leaves a partial record behind.

use std::fmt::Display;
use std::io::Write;

use crate::extension::DataExtensionChange;
use crate::model::Row;

use super::errors::{CodecError, CodecResult};
use super::{
    BASE_COLUMN_NAME, COLUMN_INSERT_INDEX, COLUMN_NAME_COUNT, DATA_EXTENSION_COUNT, END_OF_CHANGE,
    FIRST_NEW_CELL_INDEX, NEW_ROW_COUNT, NO_PAYLOAD, OLD_ROW_COUNT, ROW_INDEX_COUNT,
};

/// Encode `change` and write it to `writer`.
pub fn encode_change<W: Write>(change: &DataExtensionChange, writer: &mut W) -> CodecResult<()> {
    let text = encode_change_to_string(change)?;
    writer
        .write_all(text.as_bytes())
        .map_err(|e| CodecError::io_failed("Failed to write change record", e))
}

/// Encode `change` into a string, including the end marker line.
pub fn encode_change_to_string(change: &DataExtensionChange) -> CodecResult<String> {
    let mut out = String::with_capacity(256);

    push_text_field(&mut out, BASE_COLUMN_NAME, change.base_column_name())?;
    push_field(&mut out, COLUMN_INSERT_INDEX, change.column_insert_index());

    push_field(&mut out, COLUMN_NAME_COUNT, change.column_names().len());
    for name in change.column_names() {
        check_single_line(COLUMN_NAME_COUNT, name)?;
        push_line(&mut out, name);
    }

    push_field(&mut out, ROW_INDEX_COUNT, change.row_indices().len());
    for row_index in change.row_indices() {
        push_line(&mut out, row_index);
    }

    push_field(&mut out, DATA_EXTENSION_COUNT, change.extensions().len());
    for (payload, extension) in change.extensions().iter().enumerate() {
        let Some(extension) = extension else {
            push_line(&mut out, NO_PAYLOAD);
            continue;
        };
        push_line(&mut out, extension.len());
        for (r, values) in extension.rows.iter().enumerate() {
            for (c, value) in values.iter().enumerate() {
                let line = value.to_json_line().map_err(|e| {
                    CodecError::encode_failed_for(
                        format!("{}[{}][{}][{}]", DATA_EXTENSION_COUNT, payload, r, c),
                        e.to_string(),
                    )
                })?;
                push_line(&mut out, line);
            }
        }
    }

    if let Some(snapshots) = change.snapshots() {
        push_field(&mut out, FIRST_NEW_CELL_INDEX, snapshots.first_new_cell_index);
        push_rows(&mut out, NEW_ROW_COUNT, &snapshots.after)?;
        push_rows(&mut out, OLD_ROW_COUNT, &snapshots.before)?;
    }

    push_line(&mut out, END_OF_CHANGE);
    Ok(out)
}

fn push_line(out: &mut String, line: impl Display) {
    out.push_str(&line.to_string());
    out.push('\n');
}

fn push_field(out: &mut String, key: &str, value: impl Display) {
    out.push_str(key);
    out.push('=');
    push_line(out, value);
}

fn push_text_field(out: &mut String, key: &str, value: &str) -> CodecResult<()> {
    check_single_line(key, value)?;
    push_field(out, key, value);
    Ok(())
}

fn push_rows(out: &mut String, key: &str, rows: &[Row]) -> CodecResult<()> {
    push_field(out, key, rows.len());
    for (r, row) in rows.iter().enumerate() {
        let line = serde_json::to_string(row)
            .map_err(|e| CodecError::encode_failed_for(format!("{}[{}]", key, r), e.to_string()))?;
        push_line(out, line);
    }
    Ok(())
}

/// Text fields are raw lines; a line break would shift every later field.
pub(crate) fn check_single_line(field: &str, text: &str) -> CodecResult<()> {
    if text.contains('\n') || text.contains('\r') {
        return Err(CodecError::encode_failed_for(
            field,
            format!("text contains a line break: {:?}", text),
        ));
    }
    Ok(())
}
