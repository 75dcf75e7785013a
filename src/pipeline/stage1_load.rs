use std::path::Path;

use crate::input::results::{RawResultRow, load_results};
use crate::input::{InputError, find_result_file};

/// Loads `<dir>/<task>.csv` for every task and concatenates the rows in the
/// order given, each row labelled with its task.
pub fn run_stage1(dir: &Path, tasks: &[&str]) -> Result<Vec<RawResultRow>, InputError> {
    let mut rows = Vec::new();
    for &task in tasks {
        let path = find_result_file(dir, task)?;
        rows.extend(load_results(&path, task)?);
    }
    tracing::info!(tasks = tasks.len(), rows = rows.len(), "stage 1: results loaded");
    Ok(rows)
}

/// Keeps rows whose subtask contains `needle`.
pub fn filter_subtask(rows: &[RawResultRow], needle: &str) -> Vec<RawResultRow> {
    rows.iter()
        .filter(|row| row.subtask.contains(needle))
        .cloned()
        .collect()
}

pub fn missing_inputs(dir: &Path, tasks: &[&str]) -> Vec<String> {
    tasks
        .iter()
        .filter(|task| find_result_file(dir, task).is_err())
        .map(|task| task.to_string())
        .collect()
}
