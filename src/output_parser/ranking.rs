//! Candidate index extraction for Rank and Vote.
//!
//! Judges are shown candidates numbered from 1 and asked to answer with
//! those numbers. Replies in the wild look like `"3, 1, 2"`, `"[2, 4]"`,
//! `"Response 2 is best, then 1"`, a numbered list of picks, or carry a
//! think block first. Every parser here returns zero-based indices.
//!
//! List markers (`1.`, `2)`, `-`) are stripped before numbers are read.
//! When any number is labeled (`Response 2`, `#3`, `number 1`), only
//! labeled numbers count, so counts in prose are not mistaken for picks.

use crate::output_parser::error::{truncate, ParseError};
use crate::output_parser::extract::preprocess;

/// Parse an ordering over `count` candidates, best first.
///
/// Numbers outside `1..=count` are ignored, as are repeats. The result may
/// mention fewer than `count` candidates.
///
/// # Examples
///
/// ```
/// use mixture_pipeline::output_parser::parse_ranking;
///
/// assert_eq!(parse_ranking("3, 1", 3).unwrap(), vec![2, 0]);
/// assert_eq!(parse_ranking("<think>hmm 7</think>[2, 2, 1]", 3).unwrap(), vec![1, 0]);
/// assert!(parse_ranking("all equally good", 3).is_err());
/// ```
pub fn parse_ranking(response: &str, count: usize) -> Result<Vec<usize>, ParseError> {
    let cleaned = preprocess(response);

    if cleaned.is_empty() {
        return Err(ParseError::EmptyResponse);
    }

    let mut order = Vec::new();
    for number in candidate_numbers(&cleaned) {
        if (1..=count).contains(&number) && !order.contains(&(number - 1)) {
            order.push(number - 1);
        }
    }

    if order.is_empty() {
        return Err(ParseError::NoCandidateIndex {
            count,
            text: truncate(&cleaned, 200),
        });
    }

    Ok(order)
}

/// Parse a single chosen candidate: the first valid number in the reply,
/// preferring labeled numbers.
///
/// # Examples
///
/// ```
/// use mixture_pipeline::output_parser::parse_choice_index;
///
/// assert_eq!(parse_choice_index("Response 2", 3).unwrap(), 1);
/// assert_eq!(parse_choice_index("Of the 3 responses, #2 wins.", 3).unwrap(), 1);
/// ```
pub fn parse_choice_index(response: &str, count: usize) -> Result<usize, ParseError> {
    parse_ranking(response, count).map(|order| order[0])
}

const LABELS: [&str; 5] = ["response", "candidate", "answer", "option", "number"];

/// Numbers the judge meant as candidate references, in order.
fn candidate_numbers(text: &str) -> Vec<usize> {
    let body: Vec<&str> = text.lines().map(strip_list_marker).collect();
    let body = body.join("\n");

    let labeled = labeled_integers(&body);
    if labeled.is_empty() {
        find_integers(&body)
    } else {
        labeled
    }
}

/// Drop a leading `"1."`, `"2)"`, `"-"`, `"*"` or bullet marker. A line
/// that is nothing but a number (`"2."`) is left alone.
fn strip_list_marker(line: &str) -> &str {
    let trimmed = line.trim_start();

    let digits = trimmed.len() - trimmed.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    let rest = if digits > 0 {
        let after = &trimmed[digits..];
        after.strip_prefix('.').or_else(|| after.strip_prefix(')'))
    } else {
        ["-", "*", "\u{2022}"]
            .iter()
            .find_map(|prefix| trimmed.strip_prefix(*prefix))
    };

    match rest {
        Some(rest) if rest.starts_with(char::is_whitespace) && !rest.trim().is_empty() => {
            rest.trim()
        }
        _ => line,
    }
}

/// Numbers written as `#N` or right after a label word (`Response N`).
fn labeled_integers(text: &str) -> Vec<usize> {
    let lower = text.to_lowercase();
    let tokens: Vec<&str> = lower
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '#'))
        .filter(|t| !t.is_empty())
        .collect();

    let mut numbers = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        if let Some(digits) = token.strip_prefix('#') {
            if let Ok(n) = digits.parse() {
                numbers.push(n);
            }
        } else if LABELS.contains(token) {
            if let Some(Ok(n)) = tokens.get(i + 1).map(|next| next.parse::<usize>()) {
                numbers.push(n);
            }
        }
    }
    numbers
}

/// Every run of ASCII digits in `text`, in order. Runs too large for
/// `usize` are skipped.
fn find_integers(text: &str) -> Vec<usize> {
    let mut numbers = Vec::new();
    let mut current = String::new();

    for c in text.chars().chain(std::iter::once(' ')) {
        if c.is_ascii_digit() {
            current.push(c);
        } else if !current.is_empty() {
            if let Ok(n) = current.parse::<usize>() {
                numbers.push(n);
            }
            current.clear();
        }
    }

    numbers
}
