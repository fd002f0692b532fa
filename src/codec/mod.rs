//! Change record serialization
//!
//! Line-oriented text format, UTF-8, one record per stream:
//!
//! ```text
//! baseColumnName=<text>
//! columnInsertIndex=<int>
//! columnNameCount=<n>      + n raw column name lines
//! rowIndexCount=<n>        + n integer lines
//! dataExtensionCount=<n>   + per payload: `null` or <rows>, then
//!                            rows x columnNameCount JSON value lines
//! firstNewCellIndex=<int>  \
//! newRowCount=<n>           } only once applied; + n row JSON lines each
//! oldRowCount=<n>          /
//! /ec/
//! ```
//!
//! Count headers are followed by exactly `count` raw lines with no
//! key framing. There is no version field.

mod errors;
mod reader;
mod writer;

pub use errors::{CodecError, CodecErrorCode, CodecResult};
pub use reader::{
    decode_change, decode_change_from_str, decode_change_lines, decode_change_with_policy, LineReader,
};
pub use writer::{encode_change, encode_change_to_string};
pub(crate) use writer::check_single_line;

/// End-of-record marker line
pub const END_OF_CHANGE: &str = "/ec/";

/// Payload header for "no data found"
pub(crate) const NO_PAYLOAD: &str = "null";

pub(crate) const BASE_COLUMN_NAME: &str = "baseColumnName";
pub(crate) const COLUMN_INSERT_INDEX: &str = "columnInsertIndex";
pub(crate) const COLUMN_NAME_COUNT: &str = "columnNameCount";
pub(crate) const ROW_INDEX_COUNT: &str = "rowIndexCount";
pub(crate) const DATA_EXTENSION_COUNT: &str = "dataExtensionCount";
pub(crate) const FIRST_NEW_CELL_INDEX: &str = "firstNewCellIndex";
pub(crate) const NEW_ROW_COUNT: &str = "newRowCount";
pub(crate) const OLD_ROW_COUNT: &str = "oldRowCount";
