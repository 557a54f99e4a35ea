//! Console operator for interactive (`bilenko`) review.

use std::io::{self, BufRead, BufReader, Stderr, Stdin, Write};
use std::sync::Mutex;

use fuzzylink_linkage::{Decision, ReviewRequest, Reviewer};

/// Prompts on `out`, reads answers from `input`. `y` accepts, `n` rejects,
/// `q` or end of input aborts the run. Anything else re-prompts.
pub struct ConsoleReviewer<R, W> {
    io: Mutex<(R, W)>,
}

impl ConsoleReviewer<BufReader<Stdin>, Stderr> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stderr())
    }
}

impl<R: BufRead + Send, W: Write + Send> ConsoleReviewer<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self {
            io: Mutex::new((input, out)),
        }
    }

    fn ask(input: &mut R, out: &mut W, request: &ReviewRequest) -> io::Result<Decision> {
        writeln!(
            out,
            "\nreview: {} ~ {} (left row {}, right row {}, score {:.3})",
            request.left_column, request.right_column, request.left_row, request.right_row, request.score
        )?;
        writeln!(out, "  1: {}", request.left_value)?;
        writeln!(out, "  2: {}", request.right_value)?;

        let mut line = String::new();
        loop {
            write!(out, "same? [y/n/q] ")?;
            out.flush()?;
            line.clear();
            if input.read_line(&mut line)? == 0 {
                return Ok(Decision::Abort);
            }
            match line.trim().to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(Decision::Accept),
                "n" | "no" => return Ok(Decision::Reject),
                "q" | "quit" => return Ok(Decision::Abort),
                _ => {}
            }
        }
    }
}

impl<R: BufRead + Send, W: Write + Send> Reviewer for ConsoleReviewer<R, W> {
    fn review(&self, request: &ReviewRequest) -> Decision {
        let Ok(mut guard) = self.io.lock() else {
            return Decision::Abort;
        };
        let (input, out) = &mut *guard;
        Self::ask(input, out, request).unwrap_or_else(|e| {
            log::warn!("operator console failed: {e}");
            Decision::Abort
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ReviewRequest {
        ReviewRequest {
            left_row: 0,
            right_row: 2,
            field: 0,
            left_column: "name".into(),
            right_column: "full_name".into(),
            left_value: "jon smith".into(),
            right_value: "john smith".into(),
            score: 0.9,
        }
    }

    fn decide(input: &str) -> (Decision, String) {
        let reviewer = ConsoleReviewer::new(input.as_bytes(), Vec::new());
        let decision = reviewer.review(&request());
        let (_, out) = reviewer.io.into_inner().unwrap();
        (decision, String::from_utf8(out).unwrap())
    }

    #[test]
    fn answers() {
        assert_eq!(decide("y\n").0, Decision::Accept);
        assert_eq!(decide("No\n").0, Decision::Reject);
        assert_eq!(decide("q\n").0, Decision::Abort);
    }

    #[test]
    fn end_of_input_aborts() {
        assert_eq!(decide("").0, Decision::Abort);
    }

    #[test]
    fn reprompts_on_garbage() {
        let (decision, out) = decide("maybe\n\ny\n");
        assert_eq!(decision, Decision::Accept);
        assert_eq!(out.matches("same? [y/n/q]").count(), 3);
        assert!(out.contains("  1: jon smith\n  2: john smith\n"));
        assert!(out.contains("score 0.900"));
    }
}
