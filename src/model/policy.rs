use serde::{Deserialize, Serialize};

/// What to do with a row whose identifier lacks an expected component.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum MalformedPolicy {
    #[default]
    Abort,
    Skip,
}

/// How a group's accuracy is formed.
///
/// `SummedScores` suits point-based tasks where every row contributes
/// points to a shared total: `sum(achieved) / sum(possible)`.
/// `MeanOfRatios` suits rows that are independent ratios (per-language
/// averages and similar): `mean(accuracy)`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum AccuracyPolicy {
    #[default]
    SummedScores,
    MeanOfRatios,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Reduction {
    Sum,
    Mean,
    First,
}

impl Reduction {
    /// `values` must be non-empty; groups never are.
    pub fn apply(self, values: &[f64]) -> f64 {
        match self {
            Reduction::Sum => values.iter().sum(),
            Reduction::Mean => crate::report::mean(values),
            Reduction::First => values.first().copied().unwrap_or(0.0),
        }
    }

    /// Like [`Reduction::apply`] over a column with blanks. `First` takes the
    /// first row's value, blank or not; `Sum` and `Mean` skip blanks and give
    /// `None` when nothing is left.
    pub fn apply_optional(self, values: &[Option<f64>]) -> Option<f64> {
        if self == Reduction::First {
            return values.first().copied().flatten();
        }
        let present = values.iter().flatten().copied().collect::<Vec<_>>();
        if present.is_empty() {
            None
        } else {
            Some(self.apply(&present))
        }
    }
}
