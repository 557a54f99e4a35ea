//! `fuzzylink-linkage` - Fuzzy record linkage between two tables.
//!
//! Pure engine crate: receives two in-memory tables and a match spec,
//! returns matched pairs, the joined selection, and a projected table.
//! Interactive review goes through the [`review::Reviewer`] seam; the crate
//! never touches a terminal.

pub mod comparator;
pub mod config;
pub mod engine;
pub mod error;
pub mod join;
mod matcher;
pub mod model;
pub mod normalize;
pub mod options;
pub mod project;
pub mod review;
pub mod scorer;
pub mod table;

pub use config::LinkConfig;
pub use engine::{fuzzy_merge, run, run_with_scorer};
pub use error::{ConfigError, LinkError};
pub use join::JoinMode;
pub use model::{FieldSpec, LinkResult, LinkSummary, MatchResult, MatchSpec, OutputColumn, PairMatch, Side};
pub use normalize::NormalizeOptions;
pub use options::MatchOptions;
pub use review::{Decision, ReviewRequest, Reviewer};
pub use scorer::{Algorithm, ScoreResult, Scorer};
pub use table::{Cell, Table};
