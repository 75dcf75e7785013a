use std::collections::BTreeMap;

use crate::input::results::RawResultRow;
use crate::model::score::ScoreParts;
use crate::model::tables::DerivedRow;
use crate::pipeline::PipelineError;
use crate::report::{mean, sample_sd};

const SCORE_COLUMN: &str = "score";

pub fn run_stage2(rows: &[RawResultRow]) -> Result<Vec<DerivedRow>, PipelineError> {
    let derived = rows
        .iter()
        .map(derive_row)
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(rows = derived.len(), "stage 2: scores parsed");
    Ok(derived)
}

pub fn derive_row(raw: &RawResultRow) -> Result<DerivedRow, PipelineError> {
    let location = raw.location();
    let score = parse_score(&raw.score).map_err(|e| e.at(&location))?;
    let accuracy = compute_accuracy(&score, &raw.score).map_err(|e| e.at(&location))?;
    Ok(DerivedRow {
        raw: raw.clone(),
        score,
        accuracy,
        fields: BTreeMap::new(),
    })
}

/// Parses `"A/B"` where `A` is one or more `;`-separated values.
///
/// A single value is taken as is with a zero SD; several values give their
/// mean and sample SD. `B` may be zero here; the division is refused by
/// [`compute_accuracy`].
pub fn parse_score(score: &str) -> Result<ScoreParts, PipelineError> {
    let Some((numerator, denominator)) = score.split_once('/') else {
        return Err(parse_error(score, "expected '<achieved>/<possible>'"));
    };
    if denominator.contains('/') {
        return Err(parse_error(score, "more than one '/'"));
    }

    let score_possible = parse_value(score, denominator)?;

    let (score_achieved, score_sd) = if numerator.contains(';') {
        let values = numerator
            .split(';')
            .map(|token| parse_value(score, token))
            .collect::<Result<Vec<_>, _>>()?;
        let sd = sample_sd(&values).unwrap_or(0.0);
        (mean(&values), sd)
    } else {
        (parse_value(score, numerator)?, 0.0)
    };

    Ok(ScoreParts {
        score_possible,
        score_achieved,
        score_sd,
    })
}

/// `achieved / possible`, refusing a zero denominator. Values above 1 are
/// kept: they flag a malformed entry downstream rather than being clipped.
pub fn compute_accuracy(parts: &ScoreParts, raw: &str) -> Result<f64, PipelineError> {
    if parts.score_possible == 0.0 {
        return Err(PipelineError::DivisionByZero {
            location: String::new(),
            value: raw.to_string(),
        });
    }
    Ok(parts.score_achieved / parts.score_possible)
}

fn parse_value(score: &str, token: &str) -> Result<f64, PipelineError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(parse_error(score, "empty value"));
    }
    match token.parse::<f64>() {
        Ok(v) if !v.is_finite() => Err(parse_error(score, &format!("'{token}' is not finite"))),
        Ok(v) if v < 0.0 => Err(parse_error(score, &format!("'{token}' is negative"))),
        Ok(v) => Ok(v),
        Err(_) => Err(parse_error(score, &format!("'{token}' is not a number"))),
    }
}

fn parse_error(score: &str, reason: &str) -> PipelineError {
    PipelineError::Parse {
        location: "score field".to_string(),
        column: SCORE_COLUMN.to_string(),
        value: score.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_scores.rs"]
mod tests;
