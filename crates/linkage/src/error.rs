use thiserror::Error;

use crate::model::Side;

/// A problem with the match specification, detected before any row pair is
/// compared.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// TOML parse / deserialization error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// A field or output column does not exist in its table.
    #[error("{side} table: missing column '{column}'")]
    UnknownColumn { side: Side, column: String },
    /// A table declares the same column name twice.
    #[error("{side} table: duplicate column '{column}'")]
    DuplicateColumn { side: Side, column: String },
    #[error("threshold {value} for field {field} is outside [0, 1]")]
    ThresholdOutOfRange { field: usize, value: f64 },
    #[error("unknown method '{0}' (expected exact, levenshtein, jaro, metaphone or bilenko)")]
    UnknownAlgorithm(String),
    #[error("unknown join '{0}' (expected inner, left-outer, right-outer or full-outer)")]
    UnknownJoinMode(String),
    /// A per-field list does not line up with the field list.
    #[error("{what}: got {given} value(s) for {fields} field(s)")]
    LengthMismatch {
        what: &'static str,
        given: usize,
        fields: usize,
    },
    #[error("no fields to compare (set `on`, or `left_on` and `right_on`)")]
    NoFields,
    #[error("`{0}` must not be empty")]
    EmptyList(&'static str),
    /// A `bilenko` field was configured but no operator is attached.
    #[error("field {field} uses bilenko but no reviewer is attached")]
    ReviewerRequired { field: usize },
    #[error("invalid output column '{0}' (expected '1.<column>' or '2.<column>')")]
    InvalidOutputColumn(String),
    #[error("config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),
    /// The interactive review session was aborted; no partial result exists.
    #[error("match interrupted: {reason}")]
    Interrupted { reason: String },
    /// Malformed input table (ragged rows etc.).
    #[error("invalid table: {0}")]
    Table(String),
    #[error("IO error: {0}")]
    Io(String),
}

impl LinkError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }
}

impl From<csv::Error> for LinkError {
    fn from(e: csv::Error) -> Self {
        Self::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_column_message_names_side() {
        let err: LinkError = ConfigError::UnknownColumn {
            side: Side::Right,
            column: "surname".into(),
        }
        .into();
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "configuration error: right table: missing column 'surname'"
        );
    }

    #[test]
    fn length_mismatch_message() {
        let err = ConfigError::LengthMismatch {
            what: "method",
            given: 3,
            fields: 2,
        };
        assert_eq!(err.to_string(), "method: got 3 value(s) for 2 field(s)");
    }
}
