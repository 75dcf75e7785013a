use thiserror::Error;

pub mod stage1_load;
pub mod stage2_scores;
pub mod stage3_fields;
pub mod stage4_aggregate;
pub mod stage5_reshape;

/// Data-quality failures. Each one aborts the dataset it occurs in.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("parse error at {location}: column '{column}' value '{value}': {reason}")]
    Parse {
        location: String,
        column: String,
        value: String,
        reason: String,
    },
    #[error("division by zero at {location}: '{value}' has a possible score of 0")]
    DivisionByZero { location: String, value: String },
    #[error(
        "malformed identifier at {location}: column '{column}' value '{value}' has {found} '{delimiter}'-separated component(s), expected {expected}"
    )]
    MalformedIdentifier {
        location: String,
        column: String,
        value: String,
        delimiter: String,
        expected: usize,
        found: usize,
    },
    #[error("empty group: no rows match {key}")]
    EmptyGroup { key: String },
    #[error("unknown column '{column}' at {location}")]
    UnknownColumn { location: String, column: String },
    #[error("duplicate observation for {key}")]
    DuplicateObservation { key: String },
}

impl PipelineError {
    /// Attaches a row location to errors raised by the context-free parsers.
    pub fn at(self, location: &str) -> Self {
        match self {
            PipelineError::Parse {
                column,
                value,
                reason,
                ..
            } => PipelineError::Parse {
                location: location.to_string(),
                column,
                value,
                reason,
            },
            PipelineError::DivisionByZero { value, .. } => PipelineError::DivisionByZero {
                location: location.to_string(),
                value,
            },
            PipelineError::MalformedIdentifier {
                column,
                value,
                delimiter,
                expected,
                found,
                ..
            } => PipelineError::MalformedIdentifier {
                location: location.to_string(),
                column,
                value,
                delimiter,
                expected,
                found,
            },
            other => other,
        }
    }

    pub fn in_column(self, name: &str) -> Self {
        match self {
            PipelineError::Parse {
                location,
                value,
                reason,
                ..
            } => PipelineError::Parse {
                location,
                column: name.to_string(),
                value,
                reason,
            },
            PipelineError::MalformedIdentifier {
                location,
                value,
                delimiter,
                expected,
                found,
                ..
            } => PipelineError::MalformedIdentifier {
                location,
                column: name.to_string(),
                value,
                delimiter,
                expected,
                found,
            },
            other => other,
        }
    }
}
