//! History file format
//!
//! ```text
//! pastEntryCount=<n>
//! futureEntryCount=<m>
//! n past entries (oldest first), then m future entries (next redo last):
//!   id=<uuid>
//!   description=<text>
//!   time=<RFC 3339>
//!   change=data-extension
//!   <change record, through /ec/>
//!   checksum=<crc32 of the entry lines above, 8 hex digits>
//! ```
//!
//! Every entry is verified on load; one bad checksum fails the whole load.

use std::io::{self, BufRead, Read};

use chrono::{DateTime, SecondsFormat, Utc};
use crc32fast::Hasher;
use uuid::Uuid;

use crate::codec::{check_single_line, decode_change_lines, encode_change_to_string, LineReader};

use super::entry::{Change, HistoryEntry};
use super::errors::{HistoryError, HistoryResult};

const PAST_ENTRY_COUNT: &str = "pastEntryCount";
const FUTURE_ENTRY_COUNT: &str = "futureEntryCount";
const ID: &str = "id";
const DESCRIPTION: &str = "description";
const TIME: &str = "time";
const CHANGE: &str = "change";
const CHECKSUM: &str = "checksum";

/// Render the whole log.
pub(crate) fn write_history(past: &[HistoryEntry], future: &[HistoryEntry]) -> HistoryResult<String> {
    let mut out = String::new();
    out.push_str(&format!("{}={}\n", PAST_ENTRY_COUNT, past.len()));
    out.push_str(&format!("{}={}\n", FUTURE_ENTRY_COUNT, future.len()));

    for entry in past.iter().chain(future) {
        let text = write_entry(entry)?;
        out.push_str(&text);
        out.push_str(&format!("{}={:08x}\n", CHECKSUM, crc32fast::hash(text.as_bytes())));
    }
    Ok(out)
}

fn write_entry(entry: &HistoryEntry) -> HistoryResult<String> {
    check_single_line(DESCRIPTION, &entry.description)?;

    let mut text = String::new();
    text.push_str(&format!("{}={}\n", ID, entry.id));
    text.push_str(&format!("{}={}\n", DESCRIPTION, entry.description));
    text.push_str(&format!(
        "{}={}\n",
        TIME,
        entry.time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    ));
    text.push_str(&format!("{}={}\n", CHANGE, entry.change.kind()));
    match &entry.change {
        Change::DataExtension(change) => text.push_str(&encode_change_to_string(change)?),
    }
    Ok(text)
}

/// Parse a whole log, returning `(past, future)`.
pub(crate) fn read_history<R: BufRead>(reader: R) -> HistoryResult<(Vec<HistoryEntry>, Vec<HistoryEntry>)> {
    let mut lines = LineReader::new(ChecksumReader::new(reader));

    let past_count = read_count(&mut lines, PAST_ENTRY_COUNT)?;
    let future_count = read_count(&mut lines, FUTURE_ENTRY_COUNT)?;

    let mut past = Vec::new();
    for _ in 0..past_count {
        past.push(read_entry(&mut lines)?);
    }

    let mut future = Vec::new();
    for _ in 0..future_count {
        let mut entry = read_entry(&mut lines)?;
        entry.change.mark_reverted();
        future.push(entry);
    }

    if let Some(line) = lines.next_line()? {
        return Err(lines.error(format!("Trailing data after last entry: {:?}", line)).into());
    }
    Ok((past, future))
}

fn read_entry<R: BufRead>(lines: &mut LineReader<ChecksumReader<R>>) -> HistoryResult<HistoryEntry> {
    lines.get_mut().restart();

    let id_text = read_field(lines, ID)?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|e| lines.error(format!("Invalid entry id {:?}: {}", id_text, e)))?;

    let description = read_field(lines, DESCRIPTION)?;

    let time_text = read_field(lines, TIME)?;
    let time = DateTime::parse_from_rfc3339(&time_text)
        .map_err(|e| lines.error(format!("Invalid entry time {:?}: {}", time_text, e)))?
        .with_timezone(&Utc);

    let kind = read_field(lines, CHANGE)?;
    let change = match kind.as_str() {
        Change::DATA_EXTENSION => Change::DataExtension(decode_change_lines(lines)?),
        other => return Err(lines.error(format!("Unknown change kind: {}", other)).into()),
    };

    let computed = lines.get_mut().checksum();
    let stored_text = read_field(lines, CHECKSUM)?;
    let stored = u32::from_str_radix(stored_text.trim(), 16)
        .map_err(|e| lines.error(format!("Invalid checksum {:?}: {}", stored_text, e)))?;
    if stored != computed {
        return Err(HistoryError::ChecksumMismatch {
            line: lines.line_number(),
            stored,
            computed,
        });
    }

    Ok(HistoryEntry {
        id,
        description,
        time,
        change,
    })
}

/// Next line, which must be `key=<value>`; returns the value.
fn read_field<R: BufRead>(lines: &mut LineReader<R>, key: &str) -> HistoryResult<String> {
    let line = lines.require_line(key)?;
    match line.split_once('=') {
        Some((found, value)) if found == key => Ok(value.to_string()),
        _ => Err(lines.error(format!("Expected {}=..., found {:?}", key, line)).into()),
    }
}

fn read_count<R: BufRead>(lines: &mut LineReader<R>, key: &str) -> HistoryResult<usize> {
    let value = read_field(lines, key)?;
    Ok(lines.parse_usize(key, &value)?)
}

/// Buffered reader that hashes every byte handed out since the last restart.
struct ChecksumReader<R> {
    inner: R,
    hasher: Hasher,
}

impl<R> ChecksumReader<R> {
    fn new(inner: R) -> Self {
        Self {
            inner,
            hasher: Hasher::new(),
        }
    }

    fn restart(&mut self) {
        self.hasher = Hasher::new();
    }

    fn checksum(&self) -> u32 {
        self.hasher.clone().finalize()
    }
}

impl<R: Read> Read for ChecksumReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.hasher.update(&buf[..read]);
        Ok(read)
    }
}

impl<R: BufRead> BufRead for ChecksumReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }

    fn consume(&mut self, amt: usize) {
        // Already buffered: fill_buf does no I/O here
        if let Ok(buf) = self.inner.fill_buf() {
            let hashed = amt.min(buf.len());
            self.hasher.update(&buf[..hashed]);
        }
        self.inner.consume(amt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::{DataExtension, DataExtensionChange, ExtensionValue};

    fn entry(name: &str) -> HistoryEntry {
        let change = DataExtensionChange::new(
            "Country",
            1,
            vec![name.to_string()],
            vec![0],
            vec![Some(DataExtension::new(vec![vec![ExtensionValue::from("x")]]))],
        )
        .unwrap();
        HistoryEntry::new(change.into())
    }

    #[test]
    fn test_read_back_written_log() {
        let past = vec![entry("ISO"), entry("Capital")];
        let future = vec![entry("Population")];

        let text = write_history(&past, &future).unwrap();
        let (read_past, read_future) = read_history(text.as_bytes()).unwrap();

        assert_eq!(read_past, past);
        assert_eq!(read_future.len(), 1);
        assert_eq!(read_future[0].id, future[0].id);
        assert_eq!(read_future[0].time, future[0].time);
    }

    #[test]
    fn test_empty_log() {
        let text = write_history(&[], &[]).unwrap();
        assert_eq!(text, "pastEntryCount=0\nfutureEntryCount=0\n");
        let (past, future) = read_history(text.as_bytes()).unwrap();
        assert!(past.is_empty() && future.is_empty());
    }

    #[test]
    fn test_checksum_detects_edit() {
        let text = write_history(&[entry("ISO")], &[]).unwrap();
        let tampered = text.replace("\"x\"", "\"y\"");

        let err = read_history(tampered.as_bytes()).unwrap_err();
        assert!(matches!(err, HistoryError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_checksum_line_format() {
        let text = write_history(&[entry("ISO")], &[]).unwrap();
        let last = text.lines().last().unwrap();
        let (key, value) = last.split_once('=').unwrap();
        assert_eq!(key, "checksum");
        assert_eq!(value.len(), 8);
    }

    #[test]
    fn test_unknown_change_kind() {
        let text = write_history(&[entry("ISO")], &[]).unwrap();
        let edited = text.replace("change=data-extension", "change=column-removal");
        let err = read_history(edited.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Unknown change kind"));
    }

    #[test]
    fn test_huge_entry_count_fails_cleanly() {
        let text = "pastEntryCount=99999999999999999\nfutureEntryCount=0\n";
        let err = read_history(text.as_bytes()).unwrap_err();
        assert!(matches!(err, HistoryError::Codec(_)));

        let text = "pastEntryCount=0\nfutureEntryCount=18446744073709551615\n";
        assert!(read_history(text.as_bytes()).is_err());
    }

    #[test]
    fn test_trailing_data_rejected() {
        let text = format!("{}extra\n", write_history(&[], &[]).unwrap());
        assert!(read_history(text.as_bytes()).is_err());
    }

    #[test]
    fn test_description_with_line_break_rejected() {
        let mut bad = entry("ISO");
        bad.description = "two\nlines".to_string();
        assert!(matches!(write_history(&[bad], &[]), Err(HistoryError::Codec(_))));
    }
}
