use std::collections::HashMap;

use rayon::prelude::*;

use crate::comparator::FieldComparator;
use crate::error::LinkError;
use crate::model::PairMatch;
use crate::normalize::{normalize, NormalizeOptions};
use crate::review::ReviewSession;
use crate::scorer::{Algorithm, Scorer};
use crate::table::Table;

#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    /// Accepted pairs, left-row major, right rows ascending within a left row.
    pub pairs: Vec<PairMatch>,
    /// Row pairs evaluated after blocking.
    pub candidates: usize,
}

/// Normalized values of every compared column, one vector per field.
struct NormalizedFields {
    left: Vec<Vec<String>>,
    right: Vec<Vec<String>>,
}

impl NormalizedFields {
    fn build(left: &Table, right: &Table, fields: &[FieldComparator], opts: &NormalizeOptions) -> Self {
        let column = |table: &Table, col: usize| -> Vec<String> {
            table
                .rows()
                .par_iter()
                .map(|row| normalize(&row[col].to_text(), opts))
                .collect()
        };
        Self {
            left: fields.iter().map(|f| column(left, f.left_col)).collect(),
            right: fields.iter().map(|f| column(right, f.right_col)).collect(),
        }
    }
}

/// Right rows grouped by normalized key of one exact field. Only a field
/// with a positive threshold can block: at 0.0 every pair passes it.
struct Blocking<'a> {
    field: usize,
    buckets: HashMap<&'a str, Vec<usize>>,
}

impl<'a> Blocking<'a> {
    fn build(fields: &[FieldComparator], norm: &'a NormalizedFields) -> Option<Self> {
        let field = fields
            .iter()
            .position(|f| f.spec.algorithm == Algorithm::Exact && f.spec.threshold > 0.0)?;
        let mut buckets: HashMap<&'a str, Vec<usize>> = HashMap::new();
        for (ri, key) in norm.right[field].iter().enumerate() {
            buckets.entry(key.as_str()).or_default().push(ri);
        }
        log::debug!(
            "blocking on field {field}: {} key(s) over {} right row(s)",
            buckets.len(),
            norm.right[field].len()
        );
        Some(Self { field, buckets })
    }

    fn candidates(&self, norm: &NormalizedFields, left_row: usize) -> &[usize] {
        self.buckets
            .get(norm.left[self.field][left_row].as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Compare every candidate row pair on every field and keep the pairs all
/// fields accept. Many-to-many: no best-match reduction is applied.
///
/// Left rows are evaluated in parallel; per-row results are concatenated in
/// left order so the output does not depend on scheduling. An aborted
/// review fails the whole call.
pub(crate) fn match_pairs<S: Scorer>(
    left: &Table,
    right: &Table,
    fields: &[FieldComparator],
    opts: &NormalizeOptions,
    scorer: &S,
    review: Option<&ReviewSession<'_>>,
) -> Result<MatchOutcome, LinkError> {
    let norm = NormalizedFields::build(left, right, fields, opts);
    let blocking = Blocking::build(fields, &norm);
    let all_right: Vec<usize> = if blocking.is_none() {
        (0..right.len()).collect()
    } else {
        Vec::new()
    };

    // Automatic fields first so operators are only asked about pairs that
    // pass everything else.
    let mut order: Vec<&FieldComparator> = fields.iter().collect();
    order.sort_by_key(|f| f.spec.algorithm.is_interactive());

    let per_row: Vec<(Vec<PairMatch>, usize)> = (0..left.len())
        .into_par_iter()
        .map(|li| -> Result<(Vec<PairMatch>, usize), LinkError> {
            let candidates = match &blocking {
                Some(b) => b.candidates(&norm, li),
                None => all_right.as_slice(),
            };
            let mut found = Vec::new();
            'pairs: for &ri in candidates {
                let mut weakest = 1.0_f64;
                for f in &order {
                    let verdict = f.evaluate(
                        &norm.left[f.index][li],
                        &norm.right[f.index][ri],
                        (li, ri),
                        scorer,
                        review,
                    )?;
                    if !verdict.accepted {
                        continue 'pairs;
                    }
                    weakest = weakest.min(verdict.score);
                }
                found.push(PairMatch {
                    left: li,
                    right: ri,
                    score: weakest,
                });
            }
            Ok((found, candidates.len()))
        })
        .collect::<Result<_, LinkError>>()?;

    let candidates = per_row.iter().map(|(_, n)| n).sum();
    let pairs = per_row.into_iter().flat_map(|(found, _)| found).collect();
    Ok(MatchOutcome { pairs, candidates })
}
