use std::collections::BTreeMap;

use crate::model::policy::{AccuracyPolicy, Reduction};
use crate::model::tables::{AggregatedRow, Columnar, DerivedRow};
use crate::pipeline::PipelineError;
use crate::report::{mean, median};

/// Group keys plus the reduction applied to each numeric column.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationSpec {
    pub group_by: Vec<String>,
    pub score_possible: Reduction,
    pub score_achieved: Reduction,
    pub score_sd: Reduction,
    pub iterations: Reduction,
    pub accuracy: AccuracyPolicy,
    pub required_groups: Vec<Vec<String>>,
}

impl AggregationSpec {
    /// Point-based tasks: scores add up, accuracy is recomputed from sums.
    pub fn summed_scores(group_by: &[&str]) -> Self {
        Self {
            group_by: group_by.iter().map(|s| s.to_string()).collect(),
            score_possible: Reduction::Sum,
            score_achieved: Reduction::Sum,
            score_sd: Reduction::First,
            iterations: Reduction::First,
            accuracy: AccuracyPolicy::SummedScores,
            required_groups: Vec::new(),
        }
    }

    /// Independent ratios: accuracy and SD are averaged.
    pub fn mean_of_ratios(group_by: &[&str]) -> Self {
        Self {
            group_by: group_by.iter().map(|s| s.to_string()).collect(),
            score_possible: Reduction::Mean,
            score_achieved: Reduction::Mean,
            score_sd: Reduction::Mean,
            iterations: Reduction::First,
            accuracy: AccuracyPolicy::MeanOfRatios,
            required_groups: Vec::new(),
        }
    }

    pub fn for_policy(policy: AccuracyPolicy, group_by: &[&str]) -> Self {
        match policy {
            AccuracyPolicy::SummedScores => Self::summed_scores(group_by),
            AccuracyPolicy::MeanOfRatios => Self::mean_of_ratios(group_by),
        }
    }

    /// Fails the aggregation with `EmptyGroup` unless `key` has rows.
    pub fn require(mut self, key: &[&str]) -> Self {
        self.required_groups
            .push(key.iter().map(|s| s.to_string()).collect());
        self
    }
}

/// Groups `rows` and reduces each group. Output is sorted ascending by the
/// group-key tuple, independent of input order.
pub fn run_stage4(
    rows: &[DerivedRow],
    spec: &AggregationSpec,
) -> Result<Vec<AggregatedRow>, PipelineError> {
    if rows.is_empty() {
        return Err(PipelineError::EmptyGroup {
            key: format!("any group of [{}] (input table is empty)", spec.group_by.join(", ")),
        });
    }

    let mut groups: BTreeMap<Vec<String>, Vec<&DerivedRow>> = BTreeMap::new();
    for row in rows {
        let key = group_key(row, &spec.group_by, &row.raw.location())?;
        groups.entry(key).or_default().push(row);
    }

    for required in &spec.required_groups {
        if !groups.contains_key(required) {
            return Err(PipelineError::EmptyGroup {
                key: describe_key(&spec.group_by, required),
            });
        }
    }

    let out = groups
        .into_iter()
        .map(|(key, members)| reduce_group(spec, key, &members))
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(
        group_by = %spec.group_by.join(","),
        groups = out.len(),
        "stage 4: aggregated"
    );
    Ok(out)
}

fn reduce_group(
    spec: &AggregationSpec,
    key: Vec<String>,
    members: &[&DerivedRow],
) -> Result<AggregatedRow, PipelineError> {
    let possible = members
        .iter()
        .map(|r| r.score.score_possible)
        .collect::<Vec<_>>();
    let achieved = members
        .iter()
        .map(|r| r.score.score_achieved)
        .collect::<Vec<_>>();
    let sd = members.iter().map(|r| r.score.score_sd).collect::<Vec<_>>();
    let iterations = members
        .iter()
        .map(|r| r.raw.iterations.map(f64::from))
        .collect::<Vec<_>>();

    let accuracy = match spec.accuracy {
        AccuracyPolicy::SummedScores => {
            let total_possible = possible.iter().sum::<f64>();
            let total_achieved = achieved.iter().sum::<f64>();
            if total_possible == 0.0 {
                return Err(PipelineError::DivisionByZero {
                    location: format!("group {}", describe_key(&spec.group_by, &key)),
                    value: format!("{total_achieved}/{total_possible}"),
                });
            }
            total_achieved / total_possible
        }
        AccuracyPolicy::MeanOfRatios => {
            let ratios = members.iter().map(|r| r.accuracy).collect::<Vec<_>>();
            mean(&ratios)
        }
    };

    Ok(AggregatedRow {
        keys: spec.group_by.iter().cloned().zip(key).collect(),
        score_possible: spec.score_possible.apply(&possible),
        score_achieved: spec.score_achieved.apply(&achieved),
        score_sd: spec.score_sd.apply(&sd),
        iterations: spec.iterations.apply_optional(&iterations),
        accuracy,
        n_rows: members.len(),
    })
}

fn group_key<R: Columnar>(
    row: &R,
    columns: &[String],
    location: &str,
) -> Result<Vec<String>, PipelineError> {
    columns
        .iter()
        .map(|column| {
            row.label(column)
                .ok_or_else(|| PipelineError::UnknownColumn {
                    location: location.to_string(),
                    column: column.clone(),
                })
        })
        .collect()
}

pub fn describe_key(columns: &[String], values: &[String]) -> String {
    columns
        .iter()
        .zip(values.iter().map(Some).chain(std::iter::repeat(None)))
        .map(|(c, v)| format!("{c}={}", v.map(String::as_str).unwrap_or("?")))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStat {
    Mean,
    Median,
}

/// Distinct key tuples ordered by a statistic of `value` within each tuple.
/// Ties fall back to the key tuple itself, so the order is total.
pub fn category_order<R: Columnar>(
    rows: &[R],
    keys: &[&str],
    value: &str,
    stat: OrderStat,
    descending: bool,
) -> Result<Vec<Vec<String>>, PipelineError> {
    let keys = keys.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    let mut groups: BTreeMap<Vec<String>, Vec<f64>> = BTreeMap::new();
    for (idx, row) in rows.iter().enumerate() {
        if !row.has_column(value) {
            return Err(PipelineError::UnknownColumn {
                location: format!("row {}", idx + 1),
                column: value.to_string(),
            });
        }
        let key = group_key(row, &keys, &format!("row {}", idx + 1))?;
        let entry = groups.entry(key).or_default();
        if let Some(v) = row.number(value) {
            entry.push(v);
        }
    }

    let mut scored = groups
        .into_iter()
        .map(|(key, values)| {
            let s = match stat {
                OrderStat::Mean => mean(&values),
                OrderStat::Median => median(&values),
            };
            (key, s)
        })
        .collect::<Vec<_>>();
    scored.sort_by(|(ka, a), (kb, b)| {
        let ord = if descending { b.total_cmp(a) } else { a.total_cmp(b) };
        ord.then_with(|| ka.cmp(kb))
    });
    Ok(scored.into_iter().map(|(key, _)| key).collect())
}

/// Single-column convenience over [`category_order`].
pub fn order_by<R: Columnar>(
    rows: &[R],
    key: &str,
    value: &str,
    stat: OrderStat,
    descending: bool,
) -> Result<Vec<String>, PipelineError> {
    Ok(category_order(rows, &[key], value, stat, descending)?
        .into_iter()
        .filter_map(|mut k| k.pop())
        .collect())
}

/// Rows whose `column` is one of `wanted`. Every wanted value must match at
/// least one row.
pub fn select_categories<R: Columnar + Clone>(
    rows: &[R],
    column: &str,
    wanted: &[&str],
) -> Result<Vec<R>, PipelineError> {
    for value in wanted {
        let hit = rows
            .iter()
            .any(|row| row.label(column).as_deref() == Some(*value));
        if !hit {
            return Err(PipelineError::EmptyGroup {
                key: format!("{column}={value}"),
            });
        }
    }
    Ok(rows
        .iter()
        .filter(|row| {
            row.label(column)
                .is_some_and(|v| wanted.contains(&v.as_str()))
        })
        .cloned()
        .collect())
}

/// First-appearance order of distinct values.
pub fn unique_in_order<I: IntoIterator<Item = String>>(values: I) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for v in values {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_aggregate.rs"]
mod tests;
