//! Caller-facing match options and their resolution into a [`MatchSpec`].
//!
//! Every key accepts a single value or a list. Resolution runs once, before
//! any row is compared, and checks every column name against the tables.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::join::JoinMode;
use crate::model::{FieldSpec, MatchSpec, OutputColumn, Side};
use crate::normalize::NormalizeOptions;
use crate::scorer::Algorithm;
use crate::table::Table;

pub const DEFAULT_THRESHOLD: f64 = 0.6;

const KEEP_ALL: &str = "all";
const KEEP_MATCH: &str = "match";

const NORMALIZE_KEYS: [&str; 6] = [
    "ignore_case",
    "ignore_nonalpha",
    "ignore_nonlatin",
    "ignore_titles",
    "ignore_order_words",
    "ignore_order_letters",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            Self::One(v) => std::slice::from_ref(v),
            Self::Many(v) => v,
        }
    }
}

impl From<String> for OneOrMany<String> {
    fn from(v: String) -> Self {
        Self::One(v)
    }
}

impl From<&str> for OneOrMany<String> {
    fn from(v: &str) -> Self {
        Self::One(v.to_string())
    }
}

impl From<f64> for OneOrMany<f64> {
    fn from(v: f64) -> Self {
        Self::One(v)
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(v: Vec<T>) -> Self {
        Self::Many(v)
    }
}

/// Options as written by a caller or in a job file's `[match]` table.
///
/// Defaults: `keep_left = keep_right = "all"`, `method = "exact"`,
/// `threshold = 0.6`, `join = "inner"`. Keys not listed here are kept in
/// `passthrough` and otherwise ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    /// Column name(s) present in both tables; overrides `left_on`/`right_on`.
    pub on: Option<OneOrMany<String>>,
    pub left_on: Option<OneOrMany<String>>,
    pub right_on: Option<OneOrMany<String>>,
    /// Overrides `keep_left` and `keep_right`.
    pub keep: Option<OneOrMany<String>>,
    pub keep_left: Option<OneOrMany<String>>,
    pub keep_right: Option<OneOrMany<String>>,
    pub method: Option<OneOrMany<String>>,
    pub threshold: Option<OneOrMany<f64>>,
    #[serde(flatten)]
    pub normalize: NormalizeOptions,
    pub join: Option<String>,
    /// Explicit side-tagged output columns (`"1.name"`, `"2.id"`, or `"1*"`
    /// for every column of a side). Overrides the keep selections. Left
    /// columns are emitted before right columns whatever the list order.
    pub output: Option<Vec<String>>,
    #[serde(flatten)]
    pub passthrough: BTreeMap<String, serde_json::Value>,
}

impl MatchOptions {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn on(columns: impl Into<OneOrMany<String>>) -> Self {
        Self {
            on: Some(columns.into()),
            ..Self::default()
        }
    }

    pub fn left_right(left_on: impl Into<OneOrMany<String>>, right_on: impl Into<OneOrMany<String>>) -> Self {
        Self {
            left_on: Some(left_on.into()),
            right_on: Some(right_on.into()),
            ..Self::default()
        }
    }

    pub fn method(mut self, method: impl Into<OneOrMany<String>>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn threshold(mut self, threshold: impl Into<OneOrMany<f64>>) -> Self {
        self.threshold = Some(threshold.into());
        self
    }

    pub fn join(mut self, join: JoinMode) -> Self {
        self.join = Some(join.as_str().to_string());
        self
    }

    pub fn keep(mut self, keep: impl Into<OneOrMany<String>>) -> Self {
        self.keep = Some(keep.into());
        self
    }

    pub fn keep_left(mut self, keep: impl Into<OneOrMany<String>>) -> Self {
        self.keep_left = Some(keep.into());
        self
    }

    pub fn keep_right(mut self, keep: impl Into<OneOrMany<String>>) -> Self {
        self.keep_right = Some(keep.into());
        self
    }

    pub fn normalize(mut self, normalize: NormalizeOptions) -> Self {
        self.normalize = normalize;
        self
    }

    pub fn output(mut self, output: Vec<String>) -> Self {
        self.output = Some(output);
        self
    }

    /// Unrecognized keys. Flattened sections may surface the normalization
    /// keys here too; those are filtered out.
    pub fn unrecognized(&self) -> impl Iterator<Item = &str> {
        self.passthrough
            .keys()
            .map(String::as_str)
            .filter(|k| !NORMALIZE_KEYS.contains(k))
    }

    /// Checks that need no table: field lists, algorithm and join names,
    /// thresholds, and output entry syntax.
    pub fn check(&self) -> Result<(), ConfigError> {
        let n = self.field_columns()?.0.len();
        self.algorithms(n)?;
        for (i, t) in per_field("threshold", self.thresholds(), n)?.into_iter().enumerate() {
            check_threshold(i, *t)?;
        }
        if let Some(j) = &self.join {
            j.parse::<JoinMode>()?;
        }
        for entry in self.output.iter().flatten() {
            parse_output_entry(entry)?;
        }
        Ok(())
    }

    /// Resolve shorthand against the two tables into a validated spec.
    pub fn resolve(&self, left: &Table, right: &Table) -> Result<MatchSpec, ConfigError> {
        for key in self.unrecognized() {
            log::warn!("ignoring unrecognized match option '{key}'");
        }

        let fields = self.resolve_fields(left, right)?;
        let join = match &self.join {
            Some(j) => j.parse()?,
            None => JoinMode::Inner,
        };

        let output = match &self.output {
            Some(list) => resolve_output_override(list, left, right)?,
            None => {
                let keep_left = self.keep.as_ref().or(self.keep_left.as_ref());
                let keep_right = self.keep.as_ref().or(self.keep_right.as_ref());
                let left_fields: Vec<&str> = fields.iter().map(|f| f.left.as_str()).collect();
                let right_fields: Vec<&str> = fields.iter().map(|f| f.right.as_str()).collect();
                resolve_keep(keep_left, Side::Left, left, &left_fields)?
                    .into_iter()
                    .map(OutputColumn::left)
                    .chain(
                        resolve_keep(keep_right, Side::Right, right, &right_fields)?
                            .into_iter()
                            .map(OutputColumn::right),
                    )
                    .collect()
            }
        };

        let spec = MatchSpec::new(fields)
            .with_normalize(self.normalize)
            .with_join(join)
            .with_output(output);
        log::debug!(
            "resolved {} field(s), join={}, {} output column(s)",
            spec.fields.len(),
            spec.join,
            spec.output.len()
        );
        Ok(spec)
    }

    fn field_columns(&self) -> Result<(&[String], &[String]), ConfigError> {
        let (left_on, right_on) = match (&self.on, &self.left_on, &self.right_on) {
            (Some(on), _, _) => (on.as_slice(), on.as_slice()),
            (None, Some(l), Some(r)) => (l.as_slice(), r.as_slice()),
            (None, Some(l), None) => (l.as_slice(), l.as_slice()),
            (None, None, Some(r)) => (r.as_slice(), r.as_slice()),
            (None, None, None) => return Err(ConfigError::NoFields),
        };
        if left_on.is_empty() || right_on.is_empty() {
            return Err(ConfigError::EmptyList(if self.on.is_some() { "on" } else { "left_on/right_on" }));
        }
        if left_on.len() != right_on.len() {
            return Err(ConfigError::LengthMismatch {
                what: "right_on",
                given: right_on.len(),
                fields: left_on.len(),
            });
        }
        Ok((left_on, right_on))
    }

    fn algorithms(&self, n: usize) -> Result<Vec<Algorithm>, ConfigError> {
        match &self.method {
            None => Ok(vec![Algorithm::Exact; n]),
            Some(m) => per_field("method", m.as_slice(), n)?
                .into_iter()
                .map(|m| m.parse::<Algorithm>())
                .collect(),
        }
    }

    fn thresholds(&self) -> &[f64] {
        match &self.threshold {
            Some(t) => t.as_slice(),
            None => &[DEFAULT_THRESHOLD],
        }
    }

    fn resolve_fields(&self, left: &Table, right: &Table) -> Result<Vec<FieldSpec>, ConfigError> {
        let (left_on, right_on) = self.field_columns()?;
        let n = left_on.len();

        let methods = self.algorithms(n)?;
        let thresholds = per_field("threshold", self.thresholds(), n)?;

        let mut fields = Vec::with_capacity(n);
        for (i, (l, r)) in left_on.iter().zip(right_on).enumerate() {
            require_column(left, Side::Left, l)?;
            require_column(right, Side::Right, r)?;
            let threshold = *thresholds[i];
            check_threshold(i, threshold)?;
            fields.push(FieldSpec::new(l.clone(), r.clone(), methods[i], threshold));
        }
        Ok(fields)
    }
}

fn check_threshold(field: usize, value: f64) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::ThresholdOutOfRange { field, value });
    }
    Ok(())
}

/// Align a per-field list with `n` fields: longer is an error, shorter
/// repeats its last value.
fn per_field<'a, T>(what: &'static str, values: &'a [T], n: usize) -> Result<Vec<&'a T>, ConfigError> {
    let Some(last) = values.last() else {
        return Err(ConfigError::EmptyList(what));
    };
    if values.len() > n {
        return Err(ConfigError::LengthMismatch {
            what,
            given: values.len(),
            fields: n,
        });
    }
    Ok(values.iter().chain(std::iter::repeat(last)).take(n).collect())
}

fn require_column(table: &Table, side: Side, column: &str) -> Result<(), ConfigError> {
    if table.column_index(column).is_none() {
        return Err(ConfigError::UnknownColumn {
            side,
            column: column.to_string(),
        });
    }
    Ok(())
}

/// `"all"` → every column, `"match"` or an empty list → the field columns,
/// any other name → that column, a list → those columns.
fn resolve_keep(
    keep: Option<&OneOrMany<String>>,
    side: Side,
    table: &Table,
    field_columns: &[&str],
) -> Result<Vec<String>, ConfigError> {
    let field_list = || {
        let mut cols: Vec<String> = Vec::with_capacity(field_columns.len());
        for c in field_columns {
            if !cols.iter().any(|x| x == c) {
                cols.push(c.to_string());
            }
        }
        cols
    };
    let columns = match keep {
        None => table.columns().to_vec(),
        Some(OneOrMany::One(k)) if k == KEEP_ALL => table.columns().to_vec(),
        Some(OneOrMany::One(k)) if k == KEEP_MATCH => field_list(),
        Some(OneOrMany::One(k)) => vec![k.clone()],
        Some(OneOrMany::Many(list)) if list.is_empty() => field_list(),
        Some(OneOrMany::Many(list)) => list.clone(),
    };
    for c in &columns {
        require_column(table, side, c)?;
    }
    Ok(columns)
}

/// A parsed `output` entry: a side and a column, or `None` for every column.
fn parse_output_entry(entry: &str) -> Result<(Side, Option<&str>), ConfigError> {
    let invalid = || ConfigError::InvalidOutputColumn(entry.to_string());
    let side = match entry.as_bytes().first() {
        Some(b'1') => Side::Left,
        Some(b'2') => Side::Right,
        _ => return Err(invalid()),
    };
    match &entry[1..] {
        "*" => Ok((side, None)),
        rest => match rest.strip_prefix('.') {
            Some(column) if !column.is_empty() => Ok((side, Some(column))),
            _ => Err(invalid()),
        },
    }
}

fn resolve_output_override(list: &[String], left: &Table, right: &Table) -> Result<Vec<OutputColumn>, ConfigError> {
    let mut out = Vec::new();
    for entry in list {
        let (side, column) = parse_output_entry(entry)?;
        let table = match side {
            Side::Left => left,
            Side::Right => right,
        };
        match column {
            None => out.extend(table.columns().iter().map(|c| OutputColumn { side, column: c.clone() })),
            Some(column) => {
                require_column(table, side, column)?;
                out.push(OutputColumn { side, column: column.to_string() });
            }
        }
    }
    // Left columns always precede right columns; order within a side is kept.
    out.sort_by_key(|o| o.side == Side::Right);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Cell;

    fn left() -> Table {
        Table::from_rows(["id", "name", "city"], vec![vec![Cell::from(1), Cell::from("Jon"), Cell::from("Oslo")]]).unwrap()
    }

    fn right() -> Table {
        Table::from_rows(["id", "name", "full_name"], vec![vec![Cell::from(1), Cell::from("Jon"), Cell::from("Jon S")]]).unwrap()
    }

    fn names(output: &[OutputColumn]) -> Vec<String> {
        output
            .iter()
            .map(|o| format!("{}:{}", o.side, o.column))
            .collect()
    }

    #[test]
    fn defaults_follow_fuzzy_merge() {
        let spec = MatchOptions::on("name").resolve(&left(), &right()).unwrap();
        assert_eq!(spec.fields, vec![FieldSpec::new("name", "name", Algorithm::Exact, 0.6)]);
        assert_eq!(spec.join, JoinMode::Inner);
        assert_eq!(
            names(&spec.output),
            vec!["left:id", "left:name", "left:city", "right:id", "right:name", "right:full_name"]
        );
    }

    #[test]
    fn last_method_and_threshold_are_reused() {
        let spec = MatchOptions::on(vec!["id".to_string(), "name".to_string()])
            .method("levenshtein")
            .threshold(vec![0.9])
            .resolve(&left(), &right())
            .unwrap();
        assert_eq!(spec.fields[1].algorithm, Algorithm::Levenshtein);
        assert_eq!(spec.fields[1].threshold, 0.9);
    }

    #[test]
    fn too_many_methods_is_an_error() {
        let err = MatchOptions::on("name")
            .method(vec!["exact".to_string(), "jaro".to_string()])
            .resolve(&left(), &right())
            .unwrap_err();
        assert_eq!(err, ConfigError::LengthMismatch { what: "method", given: 2, fields: 1 });
    }

    #[test]
    fn unknown_method_and_join() {
        let err = MatchOptions::on("name").method("soundex").resolve(&left(), &right()).unwrap_err();
        assert_eq!(err, ConfigError::UnknownAlgorithm("soundex".into()));

        let mut opts = MatchOptions::on("name");
        opts.join = Some("outer".into());
        assert_eq!(
            opts.resolve(&left(), &right()).unwrap_err(),
            ConfigError::UnknownJoinMode("outer".into())
        );
    }

    #[test]
    fn threshold_out_of_range() {
        let err = MatchOptions::on("name").threshold(1.2).resolve(&left(), &right()).unwrap_err();
        assert_eq!(err, ConfigError::ThresholdOutOfRange { field: 0, value: 1.2 });
    }

    #[test]
    fn missing_column_names_its_side() {
        let err = MatchOptions::left_right("name", "surname").resolve(&left(), &right()).unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownColumn { side: Side::Right, column: "surname".into() }
        );
    }

    #[test]
    fn no_fields() {
        assert_eq!(
            MatchOptions::default().resolve(&left(), &right()).unwrap_err(),
            ConfigError::NoFields
        );
    }

    #[test]
    fn mismatched_left_right_lengths() {
        let err = MatchOptions::left_right(vec!["id".to_string(), "name".to_string()], "name")
            .resolve(&left(), &right())
            .unwrap_err();
        assert!(matches!(err, ConfigError::LengthMismatch { what: "right_on", .. }));
    }

    #[test]
    fn keep_match_and_single_column() {
        let spec = MatchOptions::left_right("name", "full_name")
            .keep_left("match")
            .keep_right("id")
            .resolve(&left(), &right())
            .unwrap();
        assert_eq!(names(&spec.output), vec!["left:name", "right:id"]);
    }

    #[test]
    fn keep_overrides_both_sides() {
        let spec = MatchOptions::on("name")
            .keep("match")
            .keep_left("all")
            .resolve(&left(), &right())
            .unwrap();
        assert_eq!(names(&spec.output), vec!["left:name", "right:name"]);
    }

    #[test]
    fn empty_keep_list_falls_back_to_fields() {
        let spec = MatchOptions::on("name")
            .keep_left(Vec::<String>::new())
            .keep_right(vec!["id".to_string(), "full_name".to_string()])
            .resolve(&left(), &right())
            .unwrap();
        assert_eq!(names(&spec.output), vec!["left:name", "right:id", "right:full_name"]);
    }

    #[test]
    fn output_override() {
        let spec = MatchOptions::on("name")
            .output(vec!["2.full_name".into(), "1*".into()])
            .resolve(&left(), &right())
            .unwrap();
        assert_eq!(
            names(&spec.output),
            vec!["left:id", "left:name", "left:city", "right:full_name"]
        );

        let err = MatchOptions::on("name")
            .output(vec!["3.name".into()])
            .resolve(&left(), &right())
            .unwrap_err();
        assert_eq!(err, ConfigError::InvalidOutputColumn("3.name".into()));

        let err = MatchOptions::on("name")
            .output(vec!["1.zip".into()])
            .resolve(&left(), &right())
            .unwrap_err();
        assert_eq!(err, ConfigError::UnknownColumn { side: Side::Left, column: "zip".into() });
    }

    #[test]
    fn parse_toml_with_lists_and_passthrough() {
        let opts = MatchOptions::from_toml(
            r#"
left_on = ["name", "city"]
right_on = ["full_name", "name"]
method = ["levenshtein", "exact"]
threshold = 0.8
join = "left-outer"
ignore_case = true
ignore_titles = true
keep_right = "match"
fuzzy_engine = "csvmatch"
"#,
        )
        .unwrap();
        assert!(opts.normalize.ignore_case);
        assert!(opts.normalize.ignore_titles);
        assert!(!opts.normalize.ignore_nonalpha);
        assert_eq!(opts.unrecognized().collect::<Vec<_>>(), vec!["fuzzy_engine"]);

        let spec = opts.resolve(&left(), &right()).unwrap();
        assert_eq!(spec.join, JoinMode::LeftOuter);
        assert_eq!(spec.fields[0], FieldSpec::new("name", "full_name", Algorithm::Levenshtein, 0.8));
        assert_eq!(spec.fields[1], FieldSpec::new("city", "name", Algorithm::Exact, 0.8));
        assert_eq!(names(&spec.output)[3..], ["right:full_name", "right:name"]);
    }

    #[test]
    fn integer_threshold_in_toml() {
        let opts = MatchOptions::from_toml("on = \"name\"\nthreshold = 1").unwrap();
        assert_eq!(opts.threshold, Some(OneOrMany::One(1.0)));
    }

    #[test]
    fn check_needs_no_tables() {
        assert!(MatchOptions::on("anything").method("jaro").check().is_ok());
        assert_eq!(
            MatchOptions::on("name").method("fuzzy").check().unwrap_err(),
            ConfigError::UnknownAlgorithm("fuzzy".into())
        );
        assert_eq!(
            MatchOptions::on("name").threshold(Vec::<f64>::new()).check().unwrap_err(),
            ConfigError::EmptyList("threshold")
        );
        assert_eq!(
            MatchOptions::on("name").output(vec!["left.name".into()]).check().unwrap_err(),
            ConfigError::InvalidOutputColumn("left.name".into())
        );
    }
}
