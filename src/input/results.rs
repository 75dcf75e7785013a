use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::input::{InputError, csv_reader, data_row_number, require_columns};

pub const REQUIRED_RESULT_COLUMNS: &[&str] = &["model_name", "subtask", "score"];

/// One evaluation run as stored in a benchmark result file.
///
/// `task`, `source` and `row` are not file columns: they record which
/// dataset the row came from and where, so later stages can name the
/// offending row in their errors.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawResultRow {
    pub model_name: String,
    pub subtask: String,
    pub score: String,
    #[serde(default)]
    pub iterations: Option<u32>,
    #[serde(skip)]
    pub task: String,
    #[serde(skip)]
    pub source: String,
    #[serde(skip)]
    pub row: usize,
}

impl RawResultRow {
    pub fn location(&self) -> String {
        if self.source.is_empty() {
            format!("row {}", self.row)
        } else {
            format!("{} row {}", self.source, self.row)
        }
    }
}

pub fn load_results(path: &Path, task: &str) -> Result<Vec<RawResultRow>, InputError> {
    let mut reader = csv_reader(path)?;
    let headers = reader
        .headers()
        .map_err(|e| InputError::csv(path, e))?
        .clone();
    require_columns(path, &headers, REQUIRED_RESULT_COLUMNS)?;

    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let mut rows = Vec::new();
    for (idx, record) in reader.deserialize::<RawResultRow>().enumerate() {
        let mut row = record.map_err(|e| InputError::csv(path, e))?;
        row.task = task.to_string();
        row.source = source.clone();
        row.row = data_row_number(idx);
        rows.push(row);
    }

    tracing::debug!(
        path = %path.display(),
        task,
        rows = rows.len(),
        "loaded result rows"
    );
    Ok(rows)
}
