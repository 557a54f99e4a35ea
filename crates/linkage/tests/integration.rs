use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use fuzzylink_linkage::{
    fuzzy_merge, run, run_with_scorer, Algorithm, Cell, ConfigError, Decision, FieldSpec, JoinMode, LinkConfig, LinkError,
    MatchOptions, MatchSpec, NormalizeOptions, ScoreResult, Scorer, Side, Table,
};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load(file: &str, delimiter: u8) -> Table {
    let path = fixtures_dir().join(file);
    let data = std::fs::read(&path).unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    Table::from_csv_reader(data.as_slice(), delimiter).unwrap()
}

fn single(column: &str, value: &str) -> Table {
    Table::from_rows([column], vec![vec![value]]).unwrap()
}

/// Counts every scoring call and defers to the real scorers.
#[derive(Default)]
struct CountingScorer(AtomicUsize);

impl Scorer for CountingScorer {
    fn score(&self, a: &str, b: &str, algorithm: Algorithm) -> ScoreResult {
        self.0.fetch_add(1, Ordering::SeqCst);
        fuzzylink_linkage::scorer::score(a, b, algorithm)
    }
}

// -------------------------------------------------------------------------
// Single-pair scenarios
// -------------------------------------------------------------------------

#[test]
fn levenshtein_accepts_jon_and_jonathan() {
    let left = single("name", "Jon Smith");
    let right = single("full_name", "Jonathan Smith");
    let opts = MatchOptions::left_right("name", "full_name")
        .method("levenshtein")
        .threshold(0.6);
    let result = fuzzy_merge(&left, &right, &opts, None).unwrap();

    assert_eq!(result.summary.matched_pairs, 1);
    assert_eq!(result.table.columns(), &["1.name", "2.full_name"]);
    assert_eq!(
        result.table.rows(),
        &[vec![Cell::from("Jon Smith"), Cell::from("Jonathan Smith")]]
    );
    let score = result.matches[0].score.unwrap();
    assert!((score - (1.0 - 5.0 / 14.0)).abs() < 1e-9);
}

#[test]
fn strict_threshold_inner_is_empty() {
    let left = single("name", "Jon Smith");
    let right = single("full_name", "Jonathan Smith");
    let opts = MatchOptions::left_right("name", "full_name")
        .method("levenshtein")
        .threshold(0.95);
    let result = fuzzy_merge(&left, &right, &opts, None).unwrap();

    assert!(result.matches.is_empty());
    assert!(result.table.is_empty());
    assert_eq!(result.table.columns(), &["1.name", "2.full_name"]);
}

#[test]
fn strict_threshold_left_outer_keeps_left_row() {
    let left = single("name", "Jon Smith");
    let right = single("full_name", "Jonathan Smith");
    let opts = MatchOptions::left_right("name", "full_name")
        .method("levenshtein")
        .threshold(0.95)
        .join(JoinMode::LeftOuter);
    let result = fuzzy_merge(&left, &right, &opts, None).unwrap();

    assert_eq!(result.table.len(), 1);
    assert_eq!(result.table.rows()[0], vec![Cell::from("Jon Smith"), Cell::Missing]);
    assert_eq!(result.matches[0].score, None);
    assert_eq!(result.summary.unmatched_left, 1);
}

#[test]
fn missing_right_column_fails_before_any_comparison() {
    let left = single("name", "Jon Smith");
    let right = single("full_name", "Jonathan Smith");
    let spec = MatchSpec::new(vec![FieldSpec::new("name", "name", Algorithm::Levenshtein, 0.6)]);
    let scorer = CountingScorer::default();

    let err = run_with_scorer(&left, &right, &spec, &scorer, None).unwrap_err();
    assert!(err.is_configuration());
    assert!(matches!(
        err,
        LinkError::Configuration(ConfigError::UnknownColumn { side: Side::Right, ref column }) if column == "name"
    ));
    assert_eq!(scorer.0.load(Ordering::SeqCst), 0);
}

#[test]
fn out_of_range_threshold_fails_before_any_comparison() {
    let left = single("name", "a");
    let right = single("name", "a");
    let spec = MatchSpec::new(vec![FieldSpec::new("name", "name", Algorithm::Jaro, 1.01)]);
    let scorer = CountingScorer::default();

    let err = run_with_scorer(&left, &right, &spec, &scorer, None).unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(scorer.0.load(Ordering::SeqCst), 0);
}

// -------------------------------------------------------------------------
// Join behavior
// -------------------------------------------------------------------------

#[test]
fn identical_tables_match_on_the_diagonal() {
    let rows: Vec<Vec<Cell>> = (0..25)
        .map(|i| vec![Cell::from(i as i64), Cell::from(format!("person {i}"))])
        .collect();
    let table = Table::from_rows(["id", "name"], rows).unwrap();
    let spec = MatchSpec::new(vec![FieldSpec::new("id", "id", Algorithm::Exact, 1.0)]);

    let result = run(&table, &table, &spec, None).unwrap();
    let pairs: Vec<_> = result.matches.iter().map(|m| (m.left, m.right)).collect();
    let diagonal: Vec<_> = (0..25).map(|i| (Some(i), Some(i))).collect();
    assert_eq!(pairs, diagonal);
    assert_eq!(result.summary.candidates, 25);
}

#[test]
fn full_outer_contains_inner() {
    let left = load("customers.csv", b',');
    let right = load("crm.tsv", b'\t');
    let base = MatchOptions::left_right("name", "full_name")
        .method("jaro")
        .threshold(0.7);

    let inner = fuzzy_merge(&left, &right, &base.clone().join(JoinMode::Inner), None).unwrap();
    let full = fuzzy_merge(&left, &right, &base.join(JoinMode::FullOuter), None).unwrap();

    for m in &inner.matches {
        assert!(full.matches.contains(m), "{m:?} missing from full-outer");
    }
    assert_eq!(
        full.table.len(),
        inner.table.len() + full.summary.unmatched_left + full.summary.unmatched_right
    );
}

#[test]
fn multi_field_on_fixtures() {
    let left = load("customers.csv", b',');
    let right = load("crm.tsv", b'\t');
    let opts = MatchOptions::left_right(
        vec!["name".to_string(), "city".to_string()],
        vec!["full_name".to_string(), "town".to_string()],
    )
    .method(vec!["levenshtein".to_string(), "exact".to_string()])
    .threshold(vec![0.6, 1.0])
    .normalize(NormalizeOptions {
        ignore_case: true,
        ..NormalizeOptions::default()
    });

    let result = fuzzy_merge(&left, &right, &opts, None).unwrap();
    let pairs: Vec<_> = result.matches.iter().map(|m| (m.left, m.right)).collect();
    // "dr. maria garcia" vs "maria garcía": 5 edits over 16 chars
    assert_eq!(pairs, vec![(Some(0), Some(0)), (Some(2), Some(1))]);
    // exact city field blocks: only same-city pairs are scored
    assert_eq!(result.summary.candidates, 2);
}

// -------------------------------------------------------------------------
// Job file
// -------------------------------------------------------------------------

#[test]
fn job_file_end_to_end() {
    let input = std::fs::read_to_string(fixtures_dir().join("customers-crm.link.toml")).unwrap();
    let config = LinkConfig::from_toml(&input).unwrap();
    let left = load(&config.left.file, config.left.delimiter_byte().unwrap());
    let right = load(&config.right.file, config.right.delimiter_byte().unwrap());

    let result = fuzzy_merge(&left, &right, &config.matching, None).unwrap();

    assert_eq!(result.meta.join, JoinMode::LeftOuter);
    assert_eq!(result.table.columns(), &["1.id", "1.name", "2.full_name"]);
    assert_eq!(
        result.table.rows(),
        &[
            vec![Cell::from("1"), Cell::from("Jon Smith"), Cell::from("Jonathan Smith")],
            vec![Cell::from("3"), Cell::from("Dr. Maria Garcia"), Cell::from("MARIA GARCÍA")],
            vec![Cell::from("2"), Cell::from("Ann Lee"), Cell::Missing],
            vec![Cell::from("4"), Cell::from("Peter Parker"), Cell::Missing],
        ]
    );
    assert_eq!(result.matches[1].score, Some(1.0));
    assert_eq!(result.summary.unmatched_right, 1);

    let mut csv = Vec::new();
    result.table.write_csv(&mut csv).unwrap();
    let csv = String::from_utf8(csv).unwrap();
    assert!(csv.starts_with("1.id,1.name,2.full_name\n1,Jon Smith,Jonathan Smith\n"));
    assert!(csv.ends_with("4,Peter Parker,\n"));
}

#[test]
fn result_serializes_missing_as_null() {
    let left = single("name", "Jon Smith");
    let right = single("full_name", "Zed");
    let opts = MatchOptions::left_right("name", "full_name").join(JoinMode::FullOuter);
    let result = fuzzy_merge(&left, &right, &opts, None).unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["meta"]["join"], "full-outer");
    assert_eq!(json["summary"]["output_rows"], 2);
    assert_eq!(json["table"]["rows"][0], serde_json::json!(["Jon Smith", null]));
    assert_eq!(json["table"]["rows"][1], serde_json::json!([null, "Zed"]));
    assert!(json["matches"][0].get("score").is_none());
}

// -------------------------------------------------------------------------
// Operator channel
// -------------------------------------------------------------------------

#[test]
fn bilenko_through_operator_channel() {
    let left = load("customers.csv", b',');
    let right = load("crm.tsv", b'\t');
    let opts = MatchOptions::left_right("name", "full_name")
        .method("bilenko")
        .threshold(0.6)
        .keep("match")
        .normalize(NormalizeOptions {
            ignore_case: true,
            ..NormalizeOptions::default()
        });

    let (reviewer, operator) = fuzzylink_linkage::review::channel();
    let asked = std::thread::spawn(move || {
        let mut asked = Vec::new();
        operator.serve(|req| {
            asked.push((req.left_value.clone(), req.right_value.clone()));
            if req.right_value == "jonathan smith" {
                Decision::Accept
            } else {
                Decision::Reject
            }
        });
        asked
    });

    let result = fuzzy_merge(&left, &right, &opts, Some(&reviewer)).unwrap();
    drop(reviewer);
    let mut asked = asked.join().unwrap();
    asked.sort();

    assert_eq!(
        asked,
        vec![
            ("dr. maria garcia".to_string(), "maria garcía".to_string()),
            ("jon smith".to_string(), "jonathan smith".to_string()),
        ]
    );
    assert_eq!(
        result.table.rows(),
        &[vec![Cell::from("Jon Smith"), Cell::from("Jonathan Smith")]]
    );
}

#[test]
fn operator_abort_interrupts_run() {
    let left = single("name", "Jon");
    let right = single("name", "John");
    let opts = MatchOptions::on("name").method("bilenko").threshold(0.5);

    let (reviewer, operator) = fuzzylink_linkage::review::channel();
    let handle = std::thread::spawn(move || operator.serve(|_| Decision::Abort));

    let err = fuzzy_merge(&left, &right, &opts, Some(&reviewer)).unwrap_err();
    drop(reviewer);
    handle.join().unwrap();
    assert!(err.is_interrupted());
    assert!(!err.is_configuration());
}
