use crate::comparator::FieldComparator;
use crate::error::{ConfigError, LinkError};
use crate::join;
use crate::matcher::match_pairs;
use crate::model::{LinkMeta, LinkResult, LinkSummary, MatchSpec, Side};
use crate::options::MatchOptions;
use crate::project::Projection;
use crate::review::{ReviewSession, Reviewer};
use crate::scorer::{Registry, Scorer};
use crate::table::Table;

/// Link two tables under a resolved `MatchSpec`.
///
/// Everything that can be wrong with a `MatchSpec` is reported before the first
/// row pair is scored. `reviewer` is required only when a field uses
/// `bilenko`.
pub fn run(
    left: &Table,
    right: &Table,
    spec: &MatchSpec,
    reviewer: Option<&dyn Reviewer>,
) -> Result<LinkResult, LinkError> {
    run_with_scorer(left, right, spec, &Registry, reviewer)
}

/// Resolve caller-facing options against the tables, then [`run`].
pub fn fuzzy_merge(
    left: &Table,
    right: &Table,
    options: &MatchOptions,
    reviewer: Option<&dyn Reviewer>,
) -> Result<LinkResult, LinkError> {
    let spec = options.resolve(left, right)?;
    run(left, right, &spec, reviewer)
}

/// [`run`] with a caller-supplied scorer.
pub fn run_with_scorer<S: Scorer>(
    left: &Table,
    right: &Table,
    spec: &MatchSpec,
    scorer: &S,
    reviewer: Option<&dyn Reviewer>,
) -> Result<LinkResult, LinkError> {
    let fields = bind_fields(spec, left, right, reviewer.is_some())?;
    let projection = Projection::bind(&spec.output, left, right, &spec.left_prefix, &spec.right_prefix)?;

    log::debug!(
        "linking {} left row(s) against {} right row(s) on {} field(s)",
        left.len(),
        right.len(),
        fields.len()
    );

    let session = reviewer.map(ReviewSession::new);
    let outcome = match_pairs(left, right, &fields, &spec.normalize, scorer, session.as_ref())?;
    let matches = join::select(&outcome.pairs, left.len(), right.len(), spec.join);
    let table = projection.to_table(&matches, left, right)?;

    let summary = LinkSummary {
        left_rows: left.len(),
        right_rows: right.len(),
        candidates: outcome.candidates,
        matched_pairs: outcome.pairs.len(),
        unmatched_left: join::unmatched_rows(&outcome.pairs, left.len(), Side::Left).len(),
        unmatched_right: join::unmatched_rows(&outcome.pairs, right.len(), Side::Right).len(),
        output_rows: matches.len(),
    };
    log::info!(
        "{} matched pair(s) from {} candidate(s); {} left and {} right row(s) unmatched; {} output row(s)",
        summary.matched_pairs,
        summary.candidates,
        summary.unmatched_left,
        summary.unmatched_right,
        summary.output_rows
    );

    Ok(LinkResult {
        meta: LinkMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            join: spec.join,
        },
        summary,
        matches,
        table,
    })
}

fn bind_fields(
    spec: &MatchSpec,
    left: &Table,
    right: &Table,
    has_reviewer: bool,
) -> Result<Vec<FieldComparator>, ConfigError> {
    if spec.fields.is_empty() {
        return Err(ConfigError::NoFields);
    }
    let fields = spec
        .fields
        .iter()
        .enumerate()
        .map(|(i, f)| FieldComparator::bind(i, f, left, right))
        .collect::<Result<Vec<_>, _>>()?;
    if !has_reviewer {
        if let Some(f) = fields.iter().find(|f| f.spec.algorithm.is_interactive()) {
            return Err(ConfigError::ReviewerRequired { field: f.index });
        }
    }
    Ok(fields)
}
