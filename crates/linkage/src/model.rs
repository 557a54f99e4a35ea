use serde::Serialize;

use crate::join::JoinMode;
use crate::normalize::NormalizeOptions;
use crate::scorer::Algorithm;
use crate::table::Table;

pub const DEFAULT_LEFT_PREFIX: &str = "1.";
pub const DEFAULT_RIGHT_PREFIX: &str = "2.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolved specification
// ---------------------------------------------------------------------------

/// One compared column pair with its algorithm and acceptance threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    pub left: String,
    pub right: String,
    pub algorithm: Algorithm,
    /// Inclusive lower bound on the similarity. Ignored by binary algorithms.
    pub threshold: f64,
}

impl FieldSpec {
    pub fn new(left: impl Into<String>, right: impl Into<String>, algorithm: Algorithm, threshold: f64) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
            algorithm,
            threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputColumn {
    pub side: Side,
    pub column: String,
}

impl OutputColumn {
    pub fn left(column: impl Into<String>) -> Self {
        Self { side: Side::Left, column: column.into() }
    }

    pub fn right(column: impl Into<String>) -> Self {
        Self { side: Side::Right, column: column.into() }
    }
}

/// Fully resolved match specification. Every field must pass (logical AND)
/// for a row pair to match.
///
/// An empty `output` list projects every column of both tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchSpec {
    pub fields: Vec<FieldSpec>,
    pub normalize: NormalizeOptions,
    pub join: JoinMode,
    pub output: Vec<OutputColumn>,
    pub left_prefix: String,
    pub right_prefix: String,
}

impl MatchSpec {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self {
            fields,
            normalize: NormalizeOptions::default(),
            join: JoinMode::Inner,
            output: Vec::new(),
            left_prefix: DEFAULT_LEFT_PREFIX.into(),
            right_prefix: DEFAULT_RIGHT_PREFIX.into(),
        }
    }

    pub fn with_join(mut self, join: JoinMode) -> Self {
        self.join = join;
        self
    }

    pub fn with_normalize(mut self, normalize: NormalizeOptions) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn with_output(mut self, output: Vec<OutputColumn>) -> Self {
        self.output = output;
        self
    }

    pub fn uses_review(&self) -> bool {
        self.fields.iter().any(|f| f.algorithm.is_interactive())
    }
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// A row pair accepted by every field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairMatch {
    pub left: usize,
    pub right: usize,
    /// Weakest field score of the pair.
    pub score: f64,
}

/// A selected output row: a matched pair, or an unmatched row from one side
/// surfaced by an outer join.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchResult {
    pub left: Option<usize>,
    pub right: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl MatchResult {
    pub fn is_matched(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }
}

impl From<PairMatch> for MatchResult {
    fn from(m: PairMatch) -> Self {
        Self {
            left: Some(m.left),
            right: Some(m.right),
            score: Some(m.score),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkSummary {
    pub left_rows: usize,
    pub right_rows: usize,
    /// Row pairs actually evaluated (after blocking).
    pub candidates: usize,
    pub matched_pairs: usize,
    pub unmatched_left: usize,
    pub unmatched_right: usize,
    pub output_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkMeta {
    pub engine_version: String,
    pub run_at: String,
    pub join: JoinMode,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkResult {
    pub meta: LinkMeta,
    pub summary: LinkSummary,
    pub matches: Vec<MatchResult>,
    pub table: Table,
}
