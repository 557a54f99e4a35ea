// fuzzylink - fuzzy record linkage between two CSV files

mod exit_codes;
mod link;
mod operator;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::EXIT_SUCCESS;
use link::MatchArgs;

#[derive(Parser)]
#[command(name = "fuzzylink")]
#[command(about = "Fuzzy record linkage between two CSV files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Link two CSV files using command-line match options
    #[command(after_help = "\
Examples:
  fuzzylink match people.csv crm.csv --on name
  fuzzylink match a.csv b.csv --left-on name --right-on full_name --method levenshtein --threshold 0.8
  fuzzylink match a.csv b.csv --on name,city --method jaro,exact --ignore-case --join left-outer
  fuzzylink match a.csv b.csv --on name --keep match --columns 1.id,2.id --output linked.csv
  fuzzylink match a.csv b.csv --on name --method bilenko --threshold 0.5")]
    Match {
        /// Left CSV file
        left: PathBuf,

        /// Right CSV file
        right: PathBuf,

        #[command(flatten)]
        options: MatchArgs,

        /// Field delimiter for both files
        #[arg(long, short = 'd', default_value = ",")]
        delimiter: char,

        /// Write the linked table to a CSV file instead of stdout
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Print the full result (meta, summary, matches, table) as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a linkage job from a TOML file
    #[command(after_help = "\
Examples:
  fuzzylink run customers.link.toml
  fuzzylink run customers.link.toml --json")]
    Run {
        /// Path to the .link.toml job file
        config: PathBuf,

        /// Print the full result as JSON to stdout
        #[arg(long)]
        json: bool,
    },

    /// Check a job file and both sources without matching
    #[command(after_help = "\
Examples:
  fuzzylink validate customers.link.toml")]
    Validate {
        /// Path to the .link.toml job file
        config: PathBuf,
    },
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Match {
            left,
            right,
            options,
            delimiter,
            output,
            json,
        } => link::cmd_match(left, right, options, delimiter, output, json),
        Commands::Run { config, json } => link::cmd_run(config, json),
        Commands::Validate { config } => link::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}
