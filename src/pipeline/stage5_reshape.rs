use std::collections::BTreeMap;

use crate::model::profile::PlotProfile;
use crate::model::tables::{
    LongFormRow, LongTable, MODEL_NAME_COLUMN, QUANTISATION_COLUMN, WideRow, WideTable,
};
use crate::pipeline::PipelineError;

/// Wide to long: every (row, task column) cell becomes one observation.
/// `rows * tasks` observations come out, blank cells included as `None`.
pub fn melt(wide: &WideTable) -> LongTable {
    let mut rows = Vec::with_capacity(wide.cell_count());
    for row in &wide.rows {
        let ids = wide
            .id_columns
            .iter()
            .cloned()
            .zip(row.ids.iter().cloned())
            .collect::<BTreeMap<_, _>>();
        for (task, value) in wide.task_columns.iter().zip(&row.values) {
            rows.push(LongFormRow {
                ids: ids.clone(),
                task: normalize_task_label(task),
                accuracy: *value,
            });
        }
    }
    LongTable {
        id_columns: wide.id_columns.clone(),
        task_columns: wide.task_columns.iter().map(|t| normalize_task_label(t)).collect(),
        rows,
    }
}

/// Long to wide on the table's id columns. Tasks follow the table's own
/// column list, then any others by first appearance; entities keep their
/// first-appearance order; combinations never observed become `None`.
pub fn widen(long: &LongTable) -> Result<WideTable, PipelineError> {
    let mut task_columns = long.task_columns.clone();
    let mut entity_order: Vec<Vec<String>> = Vec::new();
    let mut cells: BTreeMap<(Vec<String>, String), Option<f64>> = BTreeMap::new();

    for (idx, row) in long.rows.iter().enumerate() {
        let mut ids = Vec::with_capacity(long.id_columns.len());
        for column in &long.id_columns {
            let value = row.id(column).ok_or_else(|| PipelineError::UnknownColumn {
                location: format!("long row {}", idx + 1),
                column: column.clone(),
            })?;
            ids.push(value.to_string());
        }
        if !task_columns.contains(&row.task) {
            task_columns.push(row.task.clone());
        }
        if !entity_order.contains(&ids) {
            entity_order.push(ids.clone());
        }
        let key = (ids, row.task.clone());
        if cells.contains_key(&key) {
            return Err(PipelineError::DuplicateObservation {
                key: format!("[{}] task '{}'", key.0.join(", "), key.1),
            });
        }
        cells.insert(key, row.accuracy);
    }

    let rows = entity_order
        .into_iter()
        .map(|ids| {
            let values = task_columns
                .iter()
                .map(|task| {
                    cells
                        .get(&(ids.clone(), task.clone()))
                        .copied()
                        .flatten()
                })
                .collect();
            WideRow { ids, values }
        })
        .collect();

    Ok(WideTable {
        id_columns: long.id_columns.clone(),
        task_columns,
        rows,
    })
}

pub fn normalize_task_label(label: &str) -> String {
    label.trim().to_string()
}

/// Buckets a raw quantisation string: first digit run as `"<n>-bit"`,
/// `"None"` when blank, the profile's closed-model label for reference
/// models that publish no quantisation.
pub fn normalize_quantisation(
    raw: &str,
    model_name: &str,
    profile: &PlotProfile,
) -> Result<String, PipelineError> {
    if profile.is_closed_model(model_name) {
        return Ok(profile.closed_model_quantisation.clone());
    }
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok("None".to_string());
    }
    let digits = raw
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>();
    if digits.is_empty() {
        return Err(PipelineError::MalformedIdentifier {
            location: format!("model '{model_name}'"),
            column: QUANTISATION_COLUMN.to_string(),
            value: raw.to_string(),
            delimiter: "digits".to_string(),
            expected: 1,
            found: 0,
        });
    }
    Ok(format!("{digits}-bit"))
}

/// Melts the overview and normalises its quantisation labels.
pub fn run_stage5(wide: &WideTable, profile: &PlotProfile) -> Result<LongTable, PipelineError> {
    let mut long = melt(wide);
    let has_quantisation = long.id_columns.iter().any(|c| c == QUANTISATION_COLUMN);
    if has_quantisation {
        for row in &mut long.rows {
            let model = row.id(MODEL_NAME_COLUMN).unwrap_or("").to_string();
            let raw = row.id(QUANTISATION_COLUMN).unwrap_or("").to_string();
            let bucket = normalize_quantisation(&raw, &model, profile)?;
            row.ids.insert(QUANTISATION_COLUMN.to_string(), bucket);
        }
    }
    debug_assert_eq!(long.rows.len(), wide.cell_count());
    tracing::debug!(
        entities = wide.rows.len(),
        tasks = wide.task_columns.len(),
        observations = long.rows.len(),
        "stage 5: overview reshaped"
    );
    Ok(long)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_reshape.rs"]
mod tests;
