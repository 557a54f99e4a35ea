use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::{MatchResult, PairMatch, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JoinMode {
    #[default]
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
}

impl JoinMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "inner",
            Self::LeftOuter => "left-outer",
            Self::RightOuter => "right-outer",
            Self::FullOuter => "full-outer",
        }
    }

    pub fn keeps_left(&self) -> bool {
        matches!(self, Self::LeftOuter | Self::FullOuter)
    }

    pub fn keeps_right(&self) -> bool {
        matches!(self, Self::RightOuter | Self::FullOuter)
    }
}

impl FromStr for JoinMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "inner" => Ok(Self::Inner),
            "left-outer" => Ok(Self::LeftOuter),
            "right-outer" => Ok(Self::RightOuter),
            "full-outer" => Ok(Self::FullOuter),
            _ => Err(ConfigError::UnknownJoinMode(s.to_string())),
        }
    }
}

impl std::fmt::Display for JoinMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rows of one side that appear in no matched pair, in table order.
pub fn unmatched_rows(matched: &[PairMatch], len: usize, side: Side) -> Vec<usize> {
    let mut seen = vec![false; len];
    for m in matched {
        seen[match side {
            Side::Left => m.left,
            Side::Right => m.right,
        }] = true;
    }
    seen.iter().enumerate().filter(|(_, s)| !**s).map(|(i, _)| i).collect()
}

/// Apply the join mode to the matched pairs.
///
/// Order: matched pairs as given, then unmatched left rows in table order,
/// then unmatched right rows in table order.
pub fn select(matched: &[PairMatch], left_len: usize, right_len: usize, mode: JoinMode) -> Vec<MatchResult> {
    let mut out: Vec<MatchResult> = matched.iter().copied().map(MatchResult::from).collect();

    if mode.keeps_left() {
        out.extend(unmatched_rows(matched, left_len, Side::Left).into_iter().map(|i| MatchResult {
            left: Some(i),
            right: None,
            score: None,
        }));
    }

    if mode.keeps_right() {
        out.extend(unmatched_rows(matched, right_len, Side::Right).into_iter().map(|i| MatchResult {
            left: None,
            right: Some(i),
            score: None,
        }));
    }

    out
}
