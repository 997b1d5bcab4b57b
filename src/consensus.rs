//! Similarity voting over candidate texts.
//!
//! Used by [`Vote`](crate::step::Vote) when no judge model is configured.
//! Each candidate is reduced to its set of lowercase alphanumeric words and
//! scored by the sum of its Jaccard similarity to every other candidate.
//! The highest score wins; ties go to the earliest candidate.

use std::collections::HashSet;

/// Lowercase alphanumeric word set of `text`.
pub fn word_set(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Jaccard similarity of two word sets. Two empty sets are identical.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let shared = a.intersection(b).count();
    let total = a.union(b).count();
    shared as f64 / total as f64
}

/// Index of the candidate most similar to all the others, or `None` for an
/// empty list.
///
/// # Example
///
/// ```
/// use mixture_pipeline::consensus::consensus_index;
///
/// let candidates = vec![
///     "Paris is the capital".to_string(),
///     "Lyon".to_string(),
///     "The capital is Paris".to_string(),
/// ];
/// assert_eq!(consensus_index(&candidates), Some(0));
/// ```
pub fn consensus_index(candidates: &[String]) -> Option<usize> {
    let sets: Vec<HashSet<String>> = candidates.iter().map(|c| word_set(c)).collect();

    let mut best: Option<(usize, f64)> = None;
    for (i, set) in sets.iter().enumerate() {
        let score: f64 = sets
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, other)| jaccard(set, other))
            .sum();
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((i, score));
        }
    }

    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_and_single() {
        assert_eq!(consensus_index(&[]), None);
        assert_eq!(consensus_index(&list(&["only"])), Some(0));
    }

    #[test]
    fn test_duplicates_beat_outlier() {
        let c = list(&["something else entirely", "the answer is 42", "The answer is 42."]);
        assert_eq!(consensus_index(&c), Some(1));
    }

    #[test]
    fn test_tie_goes_to_earliest() {
        assert_eq!(consensus_index(&list(&["same", "same"])), Some(0));
        assert_eq!(consensus_index(&list(&["a", "b", "c"])), Some(0));
    }

    #[test]
    fn test_word_set_normalizes() {
        let set = word_set("Hello, WORLD! hello");
        assert_eq!(set.len(), 2);
        assert!(set.contains("hello"));
        assert!(set.contains("world"));
    }

    #[test]
    fn test_jaccard() {
        let a = word_set("a b c");
        let b = word_set("b c d");
        assert!((jaccard(&a, &b) - 0.5).abs() < f64::EPSILON);
        assert_eq!(jaccard(&word_set(""), &word_set("")), 1.0);
        assert_eq!(jaccard(&word_set("x"), &word_set("")), 0.0);
    }
}
