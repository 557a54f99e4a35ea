//! `fuzzylink match`, `run`, and `validate`.

use std::path::{Path, PathBuf};

use clap::Args;
use fuzzylink_linkage::options::OneOrMany;
use fuzzylink_linkage::{LinkConfig, LinkResult, MatchOptions, MatchSpec, NormalizeOptions, Reviewer, Table};

use crate::exit_codes::{link_exit_code, EXIT_CONFIG, EXIT_ERROR, EXIT_INPUT, EXIT_USAGE};
use crate::operator::ConsoleReviewer;
use crate::CliError;

/// Match options as command-line flags. List flags take comma-separated
/// values or can be repeated.
#[derive(Args, Debug, Default)]
pub struct MatchArgs {
    /// Column(s) present in both files to compare
    #[arg(long, value_delimiter = ',')]
    on: Vec<String>,

    /// Column(s) of the left file to compare
    #[arg(long, value_delimiter = ',')]
    left_on: Vec<String>,

    /// Column(s) of the right file to compare, paired with --left-on
    #[arg(long, value_delimiter = ',')]
    right_on: Vec<String>,

    /// Algorithm per field: exact, levenshtein, jaro, metaphone, bilenko
    #[arg(long, value_delimiter = ',')]
    method: Vec<String>,

    /// Acceptance threshold per field, in [0, 1]
    #[arg(long, value_delimiter = ',')]
    threshold: Vec<f64>,

    /// Columns to keep from both files: all, match, or column names
    #[arg(long, value_delimiter = ',')]
    keep: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    keep_left: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    keep_right: Vec<String>,

    /// Explicit output columns, e.g. 1.name,2.id or 1* for a whole side
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,

    /// inner, left-outer, right-outer, or full-outer
    #[arg(long)]
    join: Option<String>,

    #[arg(long)]
    ignore_case: bool,

    #[arg(long)]
    ignore_nonalpha: bool,

    #[arg(long)]
    ignore_nonlatin: bool,

    #[arg(long)]
    ignore_titles: bool,

    #[arg(long)]
    ignore_order_words: bool,

    #[arg(long)]
    ignore_order_letters: bool,
}

fn one_or_many<T>(mut values: Vec<T>) -> Option<OneOrMany<T>> {
    match values.len() {
        0 => None,
        1 => values.pop().map(OneOrMany::One),
        _ => Some(OneOrMany::Many(values)),
    }
}

impl From<MatchArgs> for MatchOptions {
    fn from(a: MatchArgs) -> Self {
        MatchOptions {
            on: one_or_many(a.on),
            left_on: one_or_many(a.left_on),
            right_on: one_or_many(a.right_on),
            keep: one_or_many(a.keep),
            keep_left: one_or_many(a.keep_left),
            keep_right: one_or_many(a.keep_right),
            method: one_or_many(a.method),
            threshold: one_or_many(a.threshold),
            normalize: NormalizeOptions {
                ignore_case: a.ignore_case,
                ignore_nonalpha: a.ignore_nonalpha,
                ignore_nonlatin: a.ignore_nonlatin,
                ignore_titles: a.ignore_titles,
                ignore_order_words: a.ignore_order_words,
                ignore_order_letters: a.ignore_order_letters,
            },
            join: a.join,
            output: (!a.columns.is_empty()).then_some(a.columns),
            ..MatchOptions::default()
        }
    }
}

fn link_err(err: fuzzylink_linkage::LinkError) -> CliError {
    let hint = err
        .is_interrupted()
        .then(|| "no output was written".to_string());
    CliError {
        code: link_exit_code(&err),
        message: err.to_string(),
        hint,
    }
}

fn config_err(err: fuzzylink_linkage::ConfigError) -> CliError {
    CliError {
        code: EXIT_CONFIG,
        message: err.to_string(),
        hint: None,
    }
}

fn load_table(path: &Path, delimiter: u8) -> Result<Table, CliError> {
    let file = std::fs::File::open(path).map_err(|e| CliError {
        code: EXIT_INPUT,
        message: format!("cannot read {}: {e}", path.display()),
        hint: None,
    })?;
    let table = Table::from_csv_reader(std::io::BufReader::new(file), delimiter).map_err(|e| CliError {
        code: EXIT_INPUT,
        message: format!("{}: {e}", path.display()),
        hint: None,
    })?;
    log::debug!("loaded {}: {} row(s), {} column(s)", path.display(), table.len(), table.columns().len());
    Ok(table)
}

/// Run a resolved spec, attaching the console operator only when a field
/// needs one.
fn link(left: &Table, right: &Table, spec: &MatchSpec) -> Result<LinkResult, CliError> {
    let console = spec.uses_review().then(ConsoleReviewer::stdio);
    let reviewer = console.as_ref().map(|c| c as &dyn Reviewer);
    fuzzylink_linkage::run(left, right, spec, reviewer).map_err(link_err)
}

fn write_csv(result: &LinkResult, path: Option<&Path>) -> Result<(), CliError> {
    let write_err = |e: fuzzylink_linkage::LinkError| CliError {
        code: EXIT_ERROR,
        message: format!("cannot write CSV: {e}"),
        hint: None,
    };
    match path {
        Some(path) => {
            let file = std::fs::File::create(path).map_err(|e| CliError {
                code: EXIT_ERROR,
                message: format!("cannot write {}: {e}", path.display()),
                hint: None,
            })?;
            result.table.write_csv(file).map_err(write_err)?;
            eprintln!("wrote {}", path.display());
        }
        None => result.table.write_csv(std::io::stdout().lock()).map_err(write_err)?,
    }
    Ok(())
}

fn to_json(result: &LinkResult) -> Result<String, CliError> {
    serde_json::to_string_pretty(result).map_err(|e| CliError {
        code: EXIT_ERROR,
        message: format!("JSON serialization error: {e}"),
        hint: None,
    })
}

fn delimiter_byte(delimiter: char) -> Result<u8, CliError> {
    if delimiter.is_ascii() {
        Ok(delimiter as u8)
    } else {
        Err(CliError {
            code: EXIT_USAGE,
            message: format!("--delimiter must be a single ASCII character, got '{delimiter}'"),
            hint: Some("use --delimiter $'\\t' for tab-separated files".into()),
        })
    }
}

// ---------------------------------------------------------------------------
// match
// ---------------------------------------------------------------------------

pub fn cmd_match(
    left_path: PathBuf,
    right_path: PathBuf,
    args: MatchArgs,
    delimiter: char,
    output: Option<PathBuf>,
    json: bool,
) -> Result<(), CliError> {
    let delimiter = delimiter_byte(delimiter)?;
    let options = MatchOptions::from(args);
    options.check().map_err(config_err)?;

    let left = load_table(&left_path, delimiter)?;
    let right = load_table(&right_path, delimiter)?;
    let spec = options.resolve(&left, &right).map_err(config_err)?;
    let result = link(&left, &right, &spec)?;

    if json {
        if let Some(path) = output.as_deref() {
            write_csv(&result, Some(path))?;
        }
        println!("{}", to_json(&result)?);
    } else {
        write_csv(&result, output.as_deref())?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// run / validate
// ---------------------------------------------------------------------------

/// Parse a job file and load both sources relative to its directory.
fn load_job(config_path: &Path) -> Result<(LinkConfig, Table, Table), CliError> {
    let config_str = std::fs::read_to_string(config_path).map_err(|e| CliError {
        code: EXIT_INPUT,
        message: format!("cannot read config: {e}"),
        hint: None,
    })?;
    let config = LinkConfig::from_toml(&config_str).map_err(config_err)?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let left = load_table(&base_dir.join(&config.left.file), config.left.delimiter_byte().map_err(config_err)?)?;
    let right = load_table(&base_dir.join(&config.right.file), config.right.delimiter_byte().map_err(config_err)?)?;
    Ok((config, left, right))
}

pub fn cmd_run(config_path: PathBuf, json: bool) -> Result<(), CliError> {
    let (config, left, right) = load_job(&config_path)?;
    let spec = config.matching.resolve(&left, &right).map_err(config_err)?;
    let result = link(&left, &right, &spec)?;

    let base_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
    let csv_path = config.output.csv.as_ref().map(|p| base_dir.join(p));
    let json_path = config.output.json.as_ref().map(|p| base_dir.join(p));

    if let Some(path) = &csv_path {
        write_csv(&result, Some(path))?;
    }
    if json || json_path.is_some() {
        let json_str = to_json(&result)?;
        if let Some(path) = &json_path {
            std::fs::write(path, &json_str).map_err(|e| CliError {
                code: EXIT_ERROR,
                message: format!("cannot write {}: {e}", path.display()),
                hint: None,
            })?;
            eprintln!("wrote {}", path.display());
        }
        if json {
            println!("{json_str}");
        }
    }
    if !json && csv_path.is_none() && json_path.is_none() {
        write_csv(&result, None)?;
    }

    let s = &result.summary;
    eprintln!(
        "{}: {} matched pair(s), {} unmatched left, {} unmatched right, {} row(s) out ({})",
        config.name, s.matched_pairs, s.unmatched_left, s.unmatched_right, s.output_rows, result.meta.join,
    );
    Ok(())
}

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let (config, left, right) = load_job(&config_path)?;
    let spec = config.matching.resolve(&left, &right).map_err(config_err)?;
    eprintln!(
        "valid: job '{}' with {} field(s), {} join, {} output column(s)",
        config.name,
        spec.fields.len(),
        spec.join,
        if spec.output.is_empty() {
            left.columns().len() + right.columns().len()
        } else {
            spec.output.len()
        },
    );
    if spec.uses_review() {
        eprintln!("note: bilenko field(s) will prompt on this terminal");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_become_options() {
        let args = MatchArgs {
            left_on: vec!["name".into()],
            right_on: vec!["full_name".into()],
            method: vec!["levenshtein".into(), "exact".into()],
            ignore_case: true,
            ..MatchArgs::default()
        };
        let opts = MatchOptions::from(args);
        assert_eq!(opts.left_on, Some(OneOrMany::One("name".into())));
        assert_eq!(
            opts.method,
            Some(OneOrMany::Many(vec!["levenshtein".into(), "exact".into()]))
        );
        assert!(opts.on.is_none());
        assert!(opts.output.is_none());
        assert!(opts.normalize.ignore_case);
    }

    #[test]
    fn non_ascii_delimiter_is_usage_error() {
        assert_eq!(delimiter_byte(';').unwrap(), b';');
        assert_eq!(delimiter_byte('§').unwrap_err().code, EXIT_USAGE);
    }
}
