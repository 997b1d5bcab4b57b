//! Error types for judge output parsers.

/// Errors returned by output parsers.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseError {
    /// The judge response was empty or whitespace-only.
    #[error("empty judge response")]
    EmptyResponse,

    /// No number in the response referred to one of the candidates.
    #[error("no candidate number between 1 and {count} found in response: {text}")]
    NoCandidateIndex {
        /// Number of candidates the judge was shown.
        count: usize,
        /// A truncated copy of the cleaned response (max 200 chars).
        text: String,
    },
}

/// Truncate a string to at most `max_len` characters, appending "..." if truncated.
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    match s.char_indices().nth(max_len) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}...", &s[..cut]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
        assert_eq!(truncate("héllo wörld", 4), "héll...");
    }
}
