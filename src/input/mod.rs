use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use thiserror::Error;

pub mod confidence;
pub mod overview;
pub mod results;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("missing input: {0}")]
    MissingInput(String),
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("{path}: missing required column '{column}'")]
    MissingColumn { path: String, column: String },
    #[error("{path} row {row}: column '{column}' has invalid value '{value}'")]
    InvalidValue {
        path: String,
        row: usize,
        column: String,
        value: String,
    },
}

impl InputError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        InputError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        InputError::Csv {
            path: path.display().to_string(),
            source,
        }
    }
}

pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn Read>, InputError> {
    let file = File::open(path).map_err(|e| InputError::io(path, e))?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(GzDecoder::new(BufReader::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Header-aware reader with all fields trimmed. Header names are the file
/// contract, so they are matched exactly after trimming.
pub fn csv_reader(path: &Path) -> Result<csv::Reader<Box<dyn Read>>, InputError> {
    let source = open_maybe_gz(path)?;
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(source))
}

pub fn require_columns(
    path: &Path,
    headers: &csv::StringRecord,
    required: &[&str],
) -> Result<(), InputError> {
    for &column in required {
        if !headers.iter().any(|h| h == column) {
            return Err(InputError::MissingColumn {
                path: path.display().to_string(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

/// Resolves `<stem>.csv` or `<stem>.csv.gz` inside `dir`.
pub fn find_result_file(dir: &Path, stem: &str) -> Result<PathBuf, InputError> {
    let candidates = [format!("{stem}.csv"), format!("{stem}.csv.gz")];
    for name in &candidates {
        let path = dir.join(name);
        if path.exists() {
            return Ok(path);
        }
    }
    Err(InputError::MissingInput(format!(
        "{stem}.csv(.gz) not found in {}",
        dir.display()
    )))
}

/// Data rows are numbered the way a spreadsheet shows them: header is row 1.
pub(crate) fn data_row_number(record_index: usize) -> usize {
    record_index + 2
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;
