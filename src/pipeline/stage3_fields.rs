use crate::model::identifiers::IdentifierSplit;
use crate::model::policy::MalformedPolicy;
use crate::model::profile::{DatasetProfile, PlotProfile};
use crate::model::tables::{Columnar, DerivedRow};
use crate::pipeline::PipelineError;

pub const MODEL_FIELD: &str = "model";
pub const MODEL_FAMILY_FIELD: &str = "model_family";

/// Component `index` of `identifier` split on `delimiter`, provided the
/// split yields at least `expected` components.
pub fn extract_component(
    identifier: &str,
    delimiter: &str,
    expected: usize,
    index: usize,
) -> Result<String, PipelineError> {
    let parts = identifier.split(delimiter).collect::<Vec<_>>();
    if parts.len() < expected || index >= parts.len() {
        return Err(PipelineError::MalformedIdentifier {
            location: String::new(),
            column: String::new(),
            value: identifier.to_string(),
            delimiter: delimiter.to_string(),
            expected: expected.max(index + 1),
            found: parts.len(),
        });
    }
    Ok(parts[index].trim().to_string())
}

/// Applies the dataset's identifier splits and the model-family rules.
///
/// Rows with malformed identifiers abort the whole table under
/// [`MalformedPolicy::Abort`]; under [`MalformedPolicy::Skip`] they are
/// dropped with a warning.
pub fn run_stage3(
    rows: Vec<DerivedRow>,
    dataset: &DatasetProfile,
    profile: &PlotProfile,
) -> Result<Vec<DerivedRow>, PipelineError> {
    let mut out = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;

    for row in rows {
        match derive_fields(row, &dataset.splits, profile) {
            Ok(row) => out.push(row),
            Err(err @ PipelineError::MalformedIdentifier { .. })
                if dataset.on_malformed == MalformedPolicy::Skip =>
            {
                tracing::warn!(dataset = %dataset.name, "skipping row: {err}");
                skipped += 1;
            }
            Err(err) => return Err(err),
        }
    }

    if skipped > 0 {
        tracing::warn!(
            dataset = %dataset.name,
            skipped,
            kept = out.len(),
            "rows with malformed identifiers were skipped"
        );
    }
    Ok(out)
}

fn derive_fields(
    mut row: DerivedRow,
    splits: &[IdentifierSplit],
    profile: &PlotProfile,
) -> Result<DerivedRow, PipelineError> {
    let location = row.raw.location();
    for split in splits {
        let Some(source) = row.label(&split.column) else {
            return Err(PipelineError::UnknownColumn {
                location,
                column: split.column.clone(),
            });
        };
        let mut derived = Vec::with_capacity(split.targets.len());
        for target in &split.targets {
            let value = extract_component(&source, &split.delimiter, split.expected, target.index)
                .map_err(|e| e.at(&location).in_column(&split.column))?;
            derived.push((target.name.clone(), value));
        }
        row.fields.extend(derived);
    }

    let family = row.field(MODEL_FIELD).map(|model| profile.model_family(model));
    if let Some(family) = family {
        row.fields.insert(MODEL_FAMILY_FIELD.to_string(), family);
    }
    Ok(row)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_fields.rs"]
mod tests;
