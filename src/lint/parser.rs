//! Checker output parser
//!
//! `lll` reports one over-long line per output line:
//!
//! ```text
//! /proj/a.go:12: line is 95 characters
//! ```
//!
//! Anything else on stdout is ignored.

use std::sync::LazyLock;

use regex::Regex;

/// `<path>:<line>: <message>`, where the path has no whitespace
static PROBLEM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+):([0-9]+): (.*)$").expect("problem line pattern is valid")
});

/// One line reported by the checker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    /// Zero-based line index
    pub line: u32,
    pub message: String,
}

/// Parses raw checker output into problems, in output order.
///
/// Stops once `max_problems` problems have been collected. Lines that do not
/// look like a problem, or whose line number is 0 or does not fit in a `u32`,
/// are skipped.
pub fn parse_output(output: &str, max_problems: usize) -> Vec<Problem> {
    output
        .lines()
        .filter_map(parse_line)
        .take(max_problems)
        .collect()
}

fn parse_line(line: &str) -> Option<Problem> {
    let captures = PROBLEM_LINE.captures(line)?;
    let line_number: u32 = captures[2].parse().ok()?;

    Some(Problem {
        line: line_number.checked_sub(1)?,
        message: captures[3].to_string(),
    })
}
