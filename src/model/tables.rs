use std::collections::BTreeMap;

use crate::input::results::RawResultRow;
use crate::model::score::ScoreParts;

pub const TASK_COLUMN: &str = "Task";
pub const ACCURACY_COLUMN: &str = "Accuracy";
pub const MODEL_NAME_COLUMN: &str = "Model name";
pub const QUANTISATION_COLUMN: &str = "Quantisation";

/// Named-column access shared by every table stage, so grouping, ordering
/// and charting can be driven by column names.
pub trait Columnar {
    fn has_column(&self, column: &str) -> bool;
    fn label(&self, column: &str) -> Option<String>;
    fn number(&self, column: &str) -> Option<f64>;
}

/// A result row after score parsing and identifier derivation.
///
/// Derived `fields` shadow raw columns of the same name, so a dataset may
/// re-derive `task` or `subtask` from the raw identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedRow {
    pub raw: RawResultRow,
    pub score: ScoreParts,
    pub accuracy: f64,
    pub fields: BTreeMap<String, String>,
}

impl DerivedRow {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    fn raw_label(&self, column: &str) -> Option<String> {
        match column {
            "model_name" => Some(self.raw.model_name.clone()),
            "subtask" => Some(self.raw.subtask.clone()),
            "score" => Some(self.raw.score.clone()),
            "task" => Some(self.raw.task.clone()),
            "iterations" => self.raw.iterations.map(|v| v.to_string()),
            _ => None,
        }
    }
}

impl Columnar for DerivedRow {
    fn has_column(&self, column: &str) -> bool {
        self.fields.contains_key(column)
            || matches!(
                column,
                "model_name"
                    | "subtask"
                    | "score"
                    | "task"
                    | "iterations"
                    | "score_possible"
                    | "score_achieved"
                    | "score_sd"
                    | "accuracy"
            )
    }

    fn label(&self, column: &str) -> Option<String> {
        if let Some(v) = self.fields.get(column) {
            return Some(v.clone());
        }
        self.raw_label(column)
            .or_else(|| self.number(column).map(|v| v.to_string()))
    }

    fn number(&self, column: &str) -> Option<f64> {
        match column {
            "score_possible" => Some(self.score.score_possible),
            "score_achieved" => Some(self.score.score_achieved),
            "score_sd" => Some(self.score.score_sd),
            "accuracy" => Some(self.accuracy),
            "iterations" => self.raw.iterations.map(f64::from),
            other => self.fields.get(other).and_then(|v| v.parse().ok()),
        }
    }
}

/// One group of an aggregation, keyed by `(column, value)` pairs in
/// group-by order.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRow {
    pub keys: Vec<(String, String)>,
    pub score_possible: f64,
    pub score_achieved: f64,
    pub score_sd: f64,
    pub iterations: Option<f64>,
    pub accuracy: f64,
    pub n_rows: usize,
}

impl AggregatedRow {
    pub fn key(&self, column: &str) -> Option<&str> {
        self.keys
            .iter()
            .find(|(k, _)| k == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn key_values(&self) -> Vec<&str> {
        self.keys.iter().map(|(_, v)| v.as_str()).collect()
    }
}

impl Columnar for AggregatedRow {
    fn has_column(&self, column: &str) -> bool {
        self.key(column).is_some()
            || matches!(
                column,
                "score_possible"
                    | "score_achieved"
                    | "score_sd"
                    | "iterations"
                    | "accuracy"
                    | "n_rows"
            )
    }

    fn label(&self, column: &str) -> Option<String> {
        self.key(column)
            .map(str::to_string)
            .or_else(|| self.number(column).map(|v| v.to_string()))
    }

    fn number(&self, column: &str) -> Option<f64> {
        match column {
            "score_possible" => Some(self.score_possible),
            "score_achieved" => Some(self.score_achieved),
            "score_sd" => Some(self.score_sd),
            "iterations" => self.iterations,
            "accuracy" => Some(self.accuracy),
            "n_rows" => Some(self.n_rows as f64),
            other => self.key(other).and_then(|v| v.parse().ok()),
        }
    }
}

/// Wide layout: one row per entity, one accuracy column per task.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    pub id_columns: Vec<String>,
    pub task_columns: Vec<String>,
    pub rows: Vec<WideRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub ids: Vec<String>,
    pub values: Vec<Option<f64>>,
}

impl WideTable {
    pub fn cell_count(&self) -> usize {
        self.rows.len() * self.task_columns.len()
    }
}

/// Long layout: one row per (entity, task) observation.
#[derive(Debug, Clone, PartialEq)]
pub struct LongTable {
    pub id_columns: Vec<String>,
    /// Task labels in wide column order, kept so an empty table re-widens
    /// to the same columns.
    pub task_columns: Vec<String>,
    pub rows: Vec<LongFormRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LongFormRow {
    pub ids: BTreeMap<String, String>,
    pub task: String,
    pub accuracy: Option<f64>,
}

impl LongFormRow {
    pub fn id(&self, column: &str) -> Option<&str> {
        self.ids.get(column).map(String::as_str)
    }
}

impl Columnar for LongFormRow {
    fn has_column(&self, column: &str) -> bool {
        column == TASK_COLUMN || column == ACCURACY_COLUMN || self.ids.contains_key(column)
    }

    fn label(&self, column: &str) -> Option<String> {
        match column {
            TASK_COLUMN => Some(self.task.clone()),
            ACCURACY_COLUMN => self.accuracy.map(|v| v.to_string()),
            other => self.ids.get(other).cloned(),
        }
    }

    fn number(&self, column: &str) -> Option<f64> {
        match column {
            ACCURACY_COLUMN => self.accuracy,
            TASK_COLUMN => None,
            other => self
                .ids
                .get(other)
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.is_finite()),
        }
    }
}
