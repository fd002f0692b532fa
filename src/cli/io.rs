//! File and stdout handling for the CLI
//!
//! - Projects are JSON documents (rows + column model)
//! - Change records use the line format of `codec`
//! - Command output is a single JSON object on stdout

use std::ffi::OsString;
use std::fs;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::codec::{decode_change_with_policy, encode_change_to_string};
use crate::extension::{DataExtensionChange, RowIndexPolicy};
use crate::model::Project;
use crate::observability::{log_event_with_fields, Event};

use super::errors::{CliError, CliResult};

/// Read a project and rebuild its derived state
pub fn read_project(path: &Path) -> CliResult<Project> {
    let content = fs::read_to_string(path).map_err(|e| {
        CliError::io_error(format!("Failed to read project {}: {}", path.display(), e))
    })?;
    let mut project: Project = serde_json::from_str(&content).map_err(|e| {
        CliError::project_error(format!("Invalid project JSON in {}: {}", path.display(), e))
    })?;
    project.finalize();
    Ok(project)
}

/// Write a project as pretty JSON
pub fn write_project(path: &Path, project: &Project) -> CliResult<()> {
    let content = serde_json::to_string_pretty(project)?;
    fs::write(path, content).map_err(|e| {
        CliError::io_error(format!("Failed to write project {}: {}", path.display(), e))
    })
}

/// Decode a change record file
pub fn read_change(path: &Path, policy: RowIndexPolicy) -> CliResult<DataExtensionChange> {
    let path_text = path.display().to_string();
    let file = fs::File::open(path)
        .map_err(|e| CliError::io_error(format!("Failed to open change {}: {}", path_text, e)))?;

    match decode_change_with_policy(BufReader::new(file), policy) {
        Ok(change) => {
            log_event_with_fields(Event::ChangeDecoded, &[("path", path_text.as_str())]);
            Ok(change)
        }
        Err(e) => {
            let reason = e.to_string();
            log_event_with_fields(
                Event::ChangeDecodeFailed,
                &[("path", path_text.as_str()), ("reason", reason.as_str())],
            );
            Err(e.into())
        }
    }
}

/// Encode a change record to a file. Nothing is written if encoding fails.
pub fn write_change(path: &Path, change: &DataExtensionChange) -> CliResult<()> {
    let text = encode_change_to_string(change)?;
    fs::write(path, text).map_err(|e| {
        CliError::io_error(format!("Failed to write change {}: {}", path.display(), e))
    })?;

    let path_text = path.display().to_string();
    log_event_with_fields(Event::ChangeEncoded, &[("path", path_text.as_str())]);
    Ok(())
}

/// `<change>.applied`, next to the input record
pub fn applied_path(change_path: &Path) -> PathBuf {
    let mut name = OsString::from(change_path.as_os_str());
    name.push(".applied");
    PathBuf::from(name)
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}
