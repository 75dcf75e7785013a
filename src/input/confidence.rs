use std::path::Path;

use crate::input::{InputError, csv_reader, data_row_number, require_columns};

pub const CORRECT_COLUMN: &str = "correct_confidence";
pub const INCORRECT_COLUMN: &str = "incorrect_confidence";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfidenceValues {
    pub correct: Vec<u32>,
    pub incorrect: Vec<u32>,
}

/// Reads the answer-confidence file. Each cell holds zero or more
/// `;`-separated integer ratings; blank cells contribute nothing.
pub fn load_confidence(path: &Path) -> Result<ConfidenceValues, InputError> {
    let mut reader = csv_reader(path)?;
    let headers = reader
        .headers()
        .map_err(|e| InputError::csv(path, e))?
        .clone();
    require_columns(path, &headers, &[CORRECT_COLUMN, INCORRECT_COLUMN])?;
    let correct_idx = headers.iter().position(|h| h == CORRECT_COLUMN);
    let incorrect_idx = headers.iter().position(|h| h == INCORRECT_COLUMN);

    let mut correct_cells = Vec::new();
    let mut incorrect_cells = Vec::new();
    for (record_index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| InputError::csv(path, e))?;
        let row = data_row_number(record_index);
        let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).unwrap_or("").to_string();
        correct_cells.push((row, cell(correct_idx)));
        incorrect_cells.push((row, cell(incorrect_idx)));
    }

    Ok(ConfidenceValues {
        correct: flatten_ratings(path, CORRECT_COLUMN, &correct_cells)?,
        incorrect: flatten_ratings(path, INCORRECT_COLUMN, &incorrect_cells)?,
    })
}

/// Filters blank cells first, then validates every remaining token. The
/// result is a new collection; the input cells are never edited in place.
pub fn flatten_ratings(
    path: &Path,
    column: &str,
    cells: &[(usize, String)],
) -> Result<Vec<u32>, InputError> {
    let present = cells
        .iter()
        .filter(|(_, cell)| !is_blank(cell))
        .collect::<Vec<_>>();

    let mut out = Vec::new();
    for (row, cell) in present {
        for token in cell.split(';') {
            let token = token.trim();
            let value = token.parse::<u32>().map_err(|_| InputError::InvalidValue {
                path: path.display().to_string(),
                row: *row,
                column: column.to_string(),
                value: cell.clone(),
            })?;
            out.push(value);
        }
    }
    Ok(out)
}

fn is_blank(cell: &str) -> bool {
    let trimmed = cell.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan")
}
