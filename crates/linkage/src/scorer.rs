//! The closed set of similarity algorithms.
//!
//! Every automatic algorithm is a pure function of two normalized strings.
//! `bilenko` scores like `levenshtein` here; the operator review it adds on
//! top lives in the comparator.

use std::str::FromStr;

use rphonetic::{DoubleMetaphone, Encoder};
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    Exact,
    Levenshtein,
    Jaro,
    Metaphone,
    Bilenko,
}

impl Algorithm {
    pub const ALL: [Algorithm; 5] = [
        Self::Exact,
        Self::Levenshtein,
        Self::Jaro,
        Self::Metaphone,
        Self::Bilenko,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Levenshtein => "levenshtein",
            Self::Jaro => "jaro",
            Self::Metaphone => "metaphone",
            Self::Bilenko => "bilenko",
        }
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Bilenko)
    }
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownAlgorithm(s.to_string()))
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Scores
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreResult {
    /// Similarity in [0, 1].
    Graded(f64),
    /// Terminal verdict of an inherently binary algorithm.
    Binary(bool),
}

impl ScoreResult {
    /// Numeric form; binary verdicts map to 1.0 / 0.0.
    pub fn value(&self) -> f64 {
        match *self {
            Self::Graded(v) => v,
            Self::Binary(true) => 1.0,
            Self::Binary(false) => 0.0,
        }
    }

    /// Inclusive threshold check for graded scores; binary verdicts stand.
    pub fn accepts(&self, threshold: f64) -> bool {
        match *self {
            Self::Graded(v) => v >= threshold,
            Self::Binary(b) => b,
        }
    }
}

/// Scoring seam used by the matcher. [`Registry`] is the only production
/// implementation.
pub trait Scorer: Sync {
    fn score(&self, a: &str, b: &str, algorithm: Algorithm) -> ScoreResult;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Registry;

impl Scorer for Registry {
    fn score(&self, a: &str, b: &str, algorithm: Algorithm) -> ScoreResult {
        score(a, b, algorithm)
    }
}

pub fn score(a: &str, b: &str, algorithm: Algorithm) -> ScoreResult {
    match algorithm {
        Algorithm::Exact => ScoreResult::Graded(if a == b { 1.0 } else { 0.0 }),
        Algorithm::Levenshtein | Algorithm::Bilenko => {
            ScoreResult::Graded(levenshtein_similarity(a, b))
        }
        Algorithm::Jaro => ScoreResult::Graded(jaro_similarity(a, b)),
        Algorithm::Metaphone => ScoreResult::Binary(metaphone_match(a, b)),
    }
}

/// `1 - distance / max(len)` over chars; two empty strings are identical.
pub fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let dist = strsim::levenshtein(a, b);
    1.0 - dist as f64 / max_len as f64
}

/// Standard Jaro similarity. Arguments are put in a canonical order first
/// because greedy character matching is not symmetric for every input.
pub fn jaro_similarity(a: &str, b: &str) -> f64 {
    if a <= b {
        strsim::jaro(a, b)
    } else {
        strsim::jaro(b, a)
    }
}

// ---------------------------------------------------------------------------
// Phonetic
// ---------------------------------------------------------------------------

/// Lowercase, strip diacritics, keep ASCII letters and single spaces.
fn phonetic_letters(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.trim().nfd() {
        for lc in ch.to_lowercase() {
            if lc.is_ascii_alphabetic() {
                out.push(lc);
            } else if lc.is_whitespace() {
                if !out.is_empty() && !out.ends_with(' ') {
                    out.push(' ');
                }
            } else {
                match lc {
                    'ß' => out.push_str("ss"),
                    'æ' => out.push_str("ae"),
                    'ø' => out.push('o'),
                    'đ' => out.push('d'),
                    'ł' => out.push('l'),
                    _ => {}
                }
            }
        }
    }
    let len = out.trim_end().len();
    out.truncate(len);
    out
}

/// Double Metaphone primary code per word, space separated. `None` if the
/// encoder panics.
pub fn metaphone_code(s: &str) -> Option<String> {
    let letters = phonetic_letters(s);
    let encoded = std::panic::catch_unwind(|| {
        let encoder = DoubleMetaphone::default();
        letters
            .split(' ')
            .filter(|w| !w.is_empty())
            .map(|w| encoder.encode(w))
            .collect::<Vec<_>>()
            .join(" ")
    });
    match encoded {
        Ok(code) => Some(code),
        Err(_) => {
            log::warn!("DoubleMetaphone panicked on input: {s:?}");
            None
        }
    }
}

/// Codes must be equal. Inputs without any encodable letters only match
/// when the strings themselves are equal.
pub fn metaphone_match(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    match (metaphone_code(a), metaphone_code(b)) {
        (Some(ca), Some(cb)) => !ca.is_empty() && ca == cb,
        _ => false,
    }
}
