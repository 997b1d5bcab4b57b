//! Shared preprocessing for judge replies.

const REASONING_TAGS: [(&str, &str); 2] = [("<think>", "</think>"), ("<thinking>", "</thinking>")];

/// Remove reasoning blocks and surrounding whitespace from a judge reply.
pub fn preprocess(text: &str) -> String {
    strip_think_tags(text).trim().to_string()
}

/// Remove every `<think>` / `<thinking>` block from `text`.
///
/// An unclosed block swallows the rest of the text.
///
/// # Examples
///
/// ```
/// use mixture_pipeline::output_parser::strip_think_tags;
///
/// assert_eq!(strip_think_tags("<think>reasoning</think>2, 1"), "2, 1");
/// assert_eq!(strip_think_tags("<think>no closing tag"), "");
/// assert_eq!(strip_think_tags("<thinking>also works</thinking>3"), "3");
/// ```
pub fn strip_think_tags(text: &str) -> String {
    REASONING_TAGS
        .iter()
        .fold(text.to_string(), |acc, (open, close)| remove_blocks(&acc, open, close))
}

fn remove_blocks(text: &str, open: &str, close: &str) -> String {
    let mut kept = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(open) {
        kept.push_str(&rest[..start]);
        let inner = &rest[start + open.len()..];
        match inner.find(close) {
            Some(end) => rest = &inner[end + close.len()..],
            None => return kept,
        }
    }
    kept.push_str(rest);
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_multiple_blocks() {
        assert_eq!(
            strip_think_tags("<think>a</think>1<think>b</think>2"),
            "12"
        );
    }

    #[test]
    fn test_preprocess_trims() {
        assert_eq!(preprocess("  <think>hmm</think>\n 3 \n"), "3");
    }

    #[test]
    fn test_no_tags_unchanged() {
        assert_eq!(strip_think_tags("plain"), "plain");
    }

    #[test]
    fn test_unclosed_keeps_prefix() {
        assert_eq!(strip_think_tags("1, 2<thinking>hmm"), "1, 2");
    }
}
