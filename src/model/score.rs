/// The numeric content of a composite `"<achieved>/<possible>"` score field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreParts {
    pub score_possible: f64,
    pub score_achieved: f64,
    pub score_sd: f64,
}
