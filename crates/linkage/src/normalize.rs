//! Text normalization applied to every cell before scoring.
//!
//! Transforms run in a fixed order regardless of which are enabled:
//! case fold, strip non-alphanumerics, fold to Latin, strip titles, sort
//! words, sort letters. The result is idempotent for every option set.

use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Honorifics removed by `ignore_titles`, compared case-insensitively with
/// trailing dots ignored.
pub const TITLES: &[&str] = &[
    "dame", "dr", "fr", "lady", "lord", "madam", "master", "miss", "mr", "mrs", "ms", "mx",
    "prof", "rev", "sir", "sr",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    #[serde(default)]
    pub ignore_case: bool,
    #[serde(default)]
    pub ignore_nonalpha: bool,
    #[serde(default)]
    pub ignore_nonlatin: bool,
    #[serde(default)]
    pub ignore_titles: bool,
    #[serde(default)]
    pub ignore_order_words: bool,
    #[serde(default)]
    pub ignore_order_letters: bool,
}

impl NormalizeOptions {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

pub fn normalize(value: &str, opts: &NormalizeOptions) -> String {
    let mut s = if opts.ignore_case {
        value.to_lowercase()
    } else {
        value.to_string()
    };

    if opts.ignore_nonalpha {
        s.retain(|c| c.is_alphanumeric() || c.is_whitespace());
    }
    if opts.ignore_nonlatin {
        s = fold_latin(&s, opts);
    }
    if opts.ignore_titles {
        s = strip_titles(&s);
    }
    if opts.ignore_order_words {
        s = sort_words(&s);
    }
    if opts.ignore_order_letters {
        s = sort_letters(&s);
        // Sorting can spell a title ("rm" -> "mr").
        if opts.ignore_titles && is_title(&s) {
            s.clear();
        }
    }
    s
}

/// Decompose, drop combining marks, map a few Latin ligatures and strokes,
/// and drop everything else outside ASCII. Output respects the case and
/// alphanumeric options so later passes leave it unchanged.
fn fold_latin(s: &str, opts: &NormalizeOptions) -> String {
    let mut out = String::with_capacity(s.len());
    let mut push = |c: char| {
        if opts.ignore_nonalpha && !(c.is_ascii_alphanumeric() || c.is_ascii_whitespace()) {
            return;
        }
        out.push(if opts.ignore_case { c.to_ascii_lowercase() } else { c });
    };

    for ch in s.nfkd() {
        if ch.is_ascii() {
            push(ch);
            continue;
        }
        if is_combining_mark(ch) {
            continue;
        }
        let mapped: &str = match ch {
            'ß' => "ss",
            'ẞ' => "SS",
            'æ' => "ae",
            'Æ' => "AE",
            'œ' => "oe",
            'Œ' => "OE",
            'ø' => "o",
            'Ø' => "O",
            'đ' | 'ð' => "d",
            'Đ' | 'Ð' => "D",
            'ł' => "l",
            'Ł' => "L",
            'þ' => "th",
            'Þ' => "TH",
            'ı' => "i",
            c if c.is_whitespace() => " ",
            _ => "",
        };
        mapped.chars().for_each(&mut push);
    }
    out
}

fn is_title(word: &str) -> bool {
    let bare = word.trim_end_matches('.').to_lowercase();
    TITLES.contains(&bare.as_str())
}

fn strip_titles(s: &str) -> String {
    s.split_whitespace()
        .filter(|w| !is_title(w))
        .collect::<Vec<_>>()
        .join(" ")
}

fn sort_words(s: &str) -> String {
    let mut words: Vec<&str> = s.split_whitespace().collect();
    words.sort_unstable();
    words.join(" ")
}

fn sort_letters(s: &str) -> String {
    let mut chars: Vec<char> = s.chars().filter(|c| !c.is_whitespace()).collect();
    chars.sort_unstable();
    chars.into_iter().collect()
}
