use crate::error::{ConfigError, LinkError};
use crate::model::{FieldSpec, Side};
use crate::normalize::{normalize, NormalizeOptions};
use crate::review::{ReviewRequest, ReviewSession, Reviewer};
use crate::scorer::{Registry, Scorer, ScoreResult};
use crate::table::{Cell, Table};

/// Outcome of comparing one field of one row pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub accepted: bool,
    pub score: f64,
}

/// A [`FieldSpec`] bound to column positions in a concrete pair of tables.
#[derive(Debug, Clone)]
pub struct FieldComparator {
    pub index: usize,
    pub left_col: usize,
    pub right_col: usize,
    pub spec: FieldSpec,
}

impl FieldComparator {
    /// Resolve column names and check the threshold range.
    pub fn bind(index: usize, spec: &FieldSpec, left: &Table, right: &Table) -> Result<Self, ConfigError> {
        let left_col = left.column_index(&spec.left).ok_or_else(|| ConfigError::UnknownColumn {
            side: Side::Left,
            column: spec.left.clone(),
        })?;
        let right_col = right.column_index(&spec.right).ok_or_else(|| ConfigError::UnknownColumn {
            side: Side::Right,
            column: spec.right.clone(),
        })?;
        if !(0.0..=1.0).contains(&spec.threshold) {
            return Err(ConfigError::ThresholdOutOfRange {
                field: index,
                value: spec.threshold,
            });
        }
        Ok(Self {
            index,
            left_col,
            right_col,
            spec: spec.clone(),
        })
    }

    /// Compare two already-normalized values.
    ///
    /// `bilenko` asks the operator only inside the ambiguous band: a
    /// preliminary score below the threshold rejects and an identical pair
    /// accepts without a prompt.
    pub(crate) fn evaluate<S: Scorer>(
        &self,
        left_value: &str,
        right_value: &str,
        rows: (usize, usize),
        scorer: &S,
        review: Option<&ReviewSession<'_>>,
    ) -> Result<Verdict, LinkError> {
        let result = scorer.score(left_value, right_value, self.spec.algorithm);
        let accepted = result.accepts(self.spec.threshold);

        if !self.spec.algorithm.is_interactive() || !accepted || result.value() >= 1.0 {
            return Ok(Verdict {
                accepted,
                score: result.value(),
            });
        }

        let session = review.ok_or(ConfigError::ReviewerRequired { field: self.index })?;
        let request = ReviewRequest {
            left_row: rows.0,
            right_row: rows.1,
            field: self.index,
            left_column: self.spec.left.clone(),
            right_column: self.spec.right.clone(),
            left_value: left_value.to_string(),
            right_value: right_value.to_string(),
            score: result.value(),
        };
        let accepted = session.ask(&request)?;
        Ok(Verdict {
            accepted,
            score: ScoreResult::Binary(accepted).value(),
        })
    }
}

/// Compare two raw cells under one field spec.
///
/// Follows the same rules as a full run: an interactive field needs a
/// `reviewer` even when the pair would be decided without a prompt, and an
/// aborted review is [`LinkError::Interrupted`].
pub fn compare(
    left: &Cell,
    right: &Cell,
    field: &FieldSpec,
    options: &NormalizeOptions,
    reviewer: Option<&dyn Reviewer>,
) -> Result<bool, LinkError> {
    if !(0.0..=1.0).contains(&field.threshold) {
        return Err(ConfigError::ThresholdOutOfRange {
            field: 0,
            value: field.threshold,
        }
        .into());
    }
    if field.algorithm.is_interactive() && reviewer.is_none() {
        return Err(ConfigError::ReviewerRequired { field: 0 }.into());
    }
    let comparator = FieldComparator {
        index: 0,
        left_col: 0,
        right_col: 0,
        spec: field.clone(),
    };
    let session = reviewer.map(ReviewSession::new);
    let l = normalize(&left.to_text(), options);
    let r = normalize(&right.to_text(), options);
    let verdict = comparator.evaluate(&l, &r, (0, 0), &Registry, session.as_ref())?;
    Ok(verdict.accepted)
}
