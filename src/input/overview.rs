use std::path::Path;

use crate::input::{InputError, csv_reader, data_row_number};
use crate::model::tables::{WideRow, WideTable};

/// Loads the benchmark overview: `id_columns` are kept as text, every other
/// column is a task whose cells hold an accuracy. Blank cells stay `None`.
pub fn load_overview(path: &Path, id_columns: &[String]) -> Result<WideTable, InputError> {
    let mut reader = csv_reader(path)?;
    let headers = reader
        .headers()
        .map_err(|e| InputError::csv(path, e))?
        .clone();

    let mut id_idx = Vec::with_capacity(id_columns.len());
    for column in id_columns {
        match headers.iter().position(|h| h == column) {
            Some(idx) => id_idx.push(idx),
            None => {
                return Err(InputError::MissingColumn {
                    path: path.display().to_string(),
                    column: column.clone(),
                });
            }
        }
    }

    let mut task_idx = Vec::new();
    let mut task_columns = Vec::new();
    for (idx, name) in headers.iter().enumerate() {
        if id_idx.contains(&idx) || name.is_empty() {
            continue;
        }
        task_idx.push(idx);
        task_columns.push(name.to_string());
    }

    let mut rows = Vec::new();
    for (record_index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| InputError::csv(path, e))?;
        let row_no = data_row_number(record_index);

        let ids = id_idx
            .iter()
            .map(|&i| record.get(i).unwrap_or("").to_string())
            .collect::<Vec<_>>();

        let mut values = Vec::with_capacity(task_idx.len());
        for (&i, column) in task_idx.iter().zip(&task_columns) {
            let cell = record.get(i).unwrap_or("");
            values.push(parse_accuracy_cell(path, row_no, column, cell)?);
        }
        rows.push(WideRow { ids, values });
    }

    tracing::debug!(
        path = %path.display(),
        rows = rows.len(),
        tasks = task_columns.len(),
        "loaded overview table"
    );

    Ok(WideTable {
        id_columns: id_columns.to_vec(),
        task_columns,
        rows,
    })
}

fn parse_accuracy_cell(
    path: &Path,
    row: usize,
    column: &str,
    cell: &str,
) -> Result<Option<f64>, InputError> {
    if cell.is_empty() {
        return Ok(None);
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(InputError::InvalidValue {
            path: path.display().to_string(),
            row,
            column: column.to_string(),
            value: cell.to_string(),
        }),
    }
}
