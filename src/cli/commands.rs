//! CLI command implementations
//!
//! Each command loads its inputs, runs one change operation under an
//! observation scope, writes its outputs, and prints one JSON response.
//! Inputs are fully validated before any output file is touched.

use std::path::Path;

use serde_json::{json, Value};

use crate::config::Config;
use crate::extension::{ApplyOutcome, ChangeState, DataExtensionChange};
use crate::model::SharedProject;
use crate::observability::{Logger, MetricsRegistry, ObservationScope};

use super::args::Command;
use super::errors::CliResult;
use super::io::{applied_path, read_change, read_project, write_change, write_project, write_response};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Inspect { config, change } => inspect(config.as_deref(), &change),
        Command::Apply {
            config,
            project,
            change,
            out,
        } => apply(config.as_deref(), &project, &change, out.as_deref()),
        Command::Revert {
            config,
            project,
            change,
            out,
        } => revert(config.as_deref(), &project, &change, out.as_deref()),
    }
}

/// Load the configuration and apply its log level
fn load_config(path: Option<&Path>) -> CliResult<Config> {
    let config = Config::load(path)?;
    Logger::set_min_severity(config.log_level);
    Ok(config)
}

/// Print a summary of a change record
pub fn inspect(config_path: Option<&Path>, change_path: &Path) -> CliResult<()> {
    let config = load_config(config_path)?;
    let change = read_change(change_path, config.row_index_policy)?;
    write_response(summarize(&change))
}

/// Apply a change record and write the project plus `<change>.applied`
pub fn apply(
    config_path: Option<&Path>,
    project_path: &Path,
    change_path: &Path,
    out_path: Option<&Path>,
) -> CliResult<()> {
    let change_text = change_path.display().to_string();
    let scope = ObservationScope::with_fields("APPLY", &[("change", change_text.as_str())]);

    match apply_inner(config_path, project_path, change_path, out_path) {
        Ok(response) => {
            let rows = response["rows"].to_string();
            scope.complete_with_fields(&[("rows", rows.as_str())]);
            write_response(response)
        }
        Err(e) => {
            scope.fail(&e.to_string());
            Err(e)
        }
    }
}

fn apply_inner(
    config_path: Option<&Path>,
    project_path: &Path,
    change_path: &Path,
    out_path: Option<&Path>,
) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let mut change = read_change(change_path, config.row_index_policy)?;
    let shared = SharedProject::new(read_project(project_path)?);
    let metrics = MetricsRegistry::new();

    let outcome = change.apply_shared(&shared)?;
    metrics.record_apply(&outcome);

    let project = shared.into_inner()?;
    let applied = applied_path(change_path);
    write_change(&applied, &change)?;
    metrics.add_records_encoded(1);
    write_project(out_path.unwrap_or(project_path), &project)?;

    Ok(json!({
        "change": summarize(&change),
        "outcome": outcome_json(&outcome),
        "rows": project.rows.len(),
        "columns": project.column_model.len(),
        "applied_change": applied.display().to_string(),
        "metrics": serde_json::to_value(metrics.snapshot())?,
    }))
}

/// Revert an applied change record and write the project
pub fn revert(
    config_path: Option<&Path>,
    project_path: &Path,
    change_path: &Path,
    out_path: Option<&Path>,
) -> CliResult<()> {
    let change_text = change_path.display().to_string();
    let scope = ObservationScope::with_fields("REVERT", &[("change", change_text.as_str())]);

    match revert_inner(config_path, project_path, change_path, out_path) {
        Ok(response) => {
            let rows = response["rows"].to_string();
            scope.complete_with_fields(&[("rows", rows.as_str())]);
            write_response(response)
        }
        Err(e) => {
            scope.fail(&e.to_string());
            Err(e)
        }
    }
}

fn revert_inner(
    config_path: Option<&Path>,
    project_path: &Path,
    change_path: &Path,
    out_path: Option<&Path>,
) -> CliResult<Value> {
    let config = load_config(config_path)?;
    let mut change = read_change(change_path, config.row_index_policy)?;
    let shared = SharedProject::new(read_project(project_path)?);
    let metrics = MetricsRegistry::new();

    change.revert_shared(&shared)?;
    metrics.increment_reverted();

    let project = shared.into_inner()?;
    write_project(out_path.unwrap_or(project_path), &project)?;

    Ok(json!({
        "change": summarize(&change),
        "rows": project.rows.len(),
        "columns": project.column_model.len(),
        "metrics": serde_json::to_value(metrics.snapshot())?,
    }))
}

fn summarize(change: &DataExtensionChange) -> Value {
    let payloads = change.extensions().iter().filter(|e| e.is_some()).count();
    let state = match change.state() {
        ChangeState::Unapplied => "unapplied",
        ChangeState::Applied => "applied",
        ChangeState::Reverted => "reverted",
    };
    let snapshots = change.snapshots().map(|s| {
        json!({
            "first_new_cell_index": s.first_new_cell_index.value(),
            "rows_before": s.before.len(),
            "rows_after": s.after.len(),
        })
    });

    json!({
        "description": change.describe(),
        "base_column": change.base_column_name(),
        "column_insert_index": change.column_insert_index(),
        "column_names": change.column_names(),
        "row_indices": change.row_indices(),
        "payloads": payloads,
        "state": state,
        "snapshots": snapshots,
    })
}

fn outcome_json(outcome: &ApplyOutcome) -> Value {
    json!({
        "replayed": outcome.replayed,
        "cell_indices_minted": outcome.cell_indices_minted,
        "filler_rows_reused": outcome.filler_rows_reused,
        "rows_synthesized": outcome.rows_synthesized,
        "columns_inserted": outcome.columns_inserted,
        "targets_skipped": outcome.targets_skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_change_from_str;
    use crate::extension::{DataExtension, ExtensionValue};
    use crate::model::{CellIndex, CellValue, Project, Row};
    use std::fs;

    fn write_inputs(dir: &Path) -> (std::path::PathBuf, std::path::PathBuf) {
        let mut project = Project::with_columns(&["Country"]).unwrap();
        project.push_row(Row::from_values([Some("USA")]));
        project.push_row(Row::from_values([Some("France")]));
        let project_path = dir.join("project.json");
        write_project(&project_path, &project).unwrap();

        let change = DataExtensionChange::new(
            "Country",
            1,
            vec!["Capital".to_string()],
            vec![0, 1],
            vec![
                Some(DataExtension::new(vec![vec![ExtensionValue::from("Washington")]])),
                Some(DataExtension::new(vec![vec![ExtensionValue::from("Paris")]])),
            ],
        )
        .unwrap();
        let change_path = dir.join("capital.change");
        write_change(&change_path, &change).unwrap();

        (project_path, change_path)
    }

    #[test]
    fn test_apply_then_revert_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let (project_path, change_path) = write_inputs(dir.path());
        let original = fs::read_to_string(&project_path).unwrap();

        let applied_project = dir.path().join("applied.json");
        apply(None, &project_path, &change_path, Some(&applied_project)).unwrap();

        let project = read_project(&applied_project).unwrap();
        assert_eq!(project.column_model.len(), 2);
        assert_eq!(
            project.rows[1].cell_value(CellIndex::new(1)),
            Some(&CellValue::from("Paris"))
        );

        let applied_change = applied_path(&change_path);
        let record = fs::read_to_string(&applied_change).unwrap();
        assert!(decode_change_from_str(&record).unwrap().snapshots().is_some());

        let reverted_project = dir.path().join("reverted.json");
        revert(None, &applied_project, &applied_change, Some(&reverted_project)).unwrap();

        let reverted = read_project(&reverted_project).unwrap();
        let before = read_project(&project_path).unwrap();
        assert_eq!(reverted.rows, before.rows);
        assert_eq!(reverted.column_model.len(), 1);
        assert_eq!(fs::read_to_string(&project_path).unwrap(), original);
    }

    #[test]
    fn test_revert_unapplied_record_fails() {
        let dir = tempfile::tempdir().unwrap();
        let (project_path, change_path) = write_inputs(dir.path());

        let err = revert(None, &project_path, &change_path, None).unwrap_err();
        assert_eq!(err.code_str(), "ROWSPLICE_CLI_CHANGE_ERROR");
        assert!(err.message().contains("ROWSPLICE_CHANGE_NOT_APPLIED"));
    }

    #[test]
    fn test_failed_apply_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (project_path, _) = write_inputs(dir.path());

        let change = DataExtensionChange::new(
            "Country",
            1,
            vec!["Capital".to_string()],
            vec![7],
            vec![None],
        )
        .unwrap();
        let change_path = dir.path().join("bad.change");
        write_change(&change_path, &change).unwrap();

        let out = dir.path().join("out.json");
        assert!(apply(None, &project_path, &change_path, Some(&out)).is_err());
        assert!(!out.exists());
        assert!(!applied_path(&change_path).exists());
    }

    #[test]
    fn test_config_sets_log_level() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rowsplice.json");
        fs::write(&path, r#"{"log_level": "error"}"#).unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.log_level, crate::observability::Severity::Error);
        Logger::set_min_severity(crate::observability::Severity::Info);
    }

    #[test]
    fn test_summary_fields() {
        let change = DataExtensionChange::new(
            "Country",
            1,
            vec!["Capital".to_string()],
            vec![0],
            vec![None],
        )
        .unwrap();
        let summary = summarize(&change);
        assert_eq!(summary["state"], "unapplied");
        assert_eq!(summary["payloads"], 0);
        assert!(summary["snapshots"].is_null());
    }
}
