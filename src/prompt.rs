//! Default instructions and message builders for agent steps.

use crate::client::ChatMessage;

/// Instruction shared by Synthesize and Aggregate: merge peer responses
/// into one answer.
pub const AGGREGATE_PROMPT: &str = "You have been provided with a set of responses from various models to the latest user query. Your task is to synthesize these responses into a single, high-quality response. Critically evaluate the information provided in these responses, recognizing that some of it may be biased or incorrect. Do not simply replicate the given answers; offer a refined, accurate, and comprehensive reply to the query. Make sure the response is well-structured and coherent.";

/// Instruction for Refine.
pub const REFINE_PROMPT: &str = "Improve the response below so it answers the query better. Fix mistakes, fill gaps, and tighten the wording. Reply with the improved response only.";

/// Instruction for Rank. `{n}` is substituted.
pub const RANK_PROMPT: &str = "Rank the responses below by how well they answer the query. Reply with the numbers of the best {n} responses, best first, separated by commas. Do not explain.";

/// Instruction for Vote with a judge model.
pub const VOTE_PROMPT: &str = "Several responses to the same query are listed below. Which one best represents the consensus among them? Reply with its number only.";

/// Sentinel that should never appear in real templates.
const ESCAPE_SENTINEL: &str = "\x00LBRACE\x00";
/// Sentinel for escaped closing brace.
const ESCAPE_SENTINEL_CLOSE: &str = "\x00RBRACE\x00";

/// Replace `{key}` placeholders with the given values.
///
/// Use `{{` to insert a literal `{` and `}}` to insert a literal `}`.
///
/// # Example
///
/// ```
/// use mixture_pipeline::prompt::render;
///
/// let result = render("Keep the top {n}, as {{\"ids\": []}}", &[("n", "2")]);
/// assert_eq!(result, r#"Keep the top 2, as {"ids": []}"#);
/// ```
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut rendered = template.replace("{{", ESCAPE_SENTINEL);
    rendered = rendered.replace("}}", ESCAPE_SENTINEL_CLOSE);

    for (key, value) in vars {
        let placeholder = format!("{{{}}}", key);
        rendered = rendered.replace(&placeholder, value);
    }

    rendered = rendered.replace(ESCAPE_SENTINEL, "{");
    rendered = rendered.replace(ESCAPE_SENTINEL_CLOSE, "}");
    rendered
}

/// Create a numbered list from items (1-indexed).
pub fn numbered_list(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Wrap text in a labeled section for structured prompts.
pub fn section(label: &str, content: &str) -> String {
    format!("## {}\n{}", label, content)
}

/// Messages for Synthesize and Aggregate: the instruction and the peer
/// responses as the system message, the original query as the user message.
pub fn peer_messages(instruction: &str, candidates: &[String], query: &str) -> Vec<ChatMessage> {
    let system = if candidates.is_empty() {
        instruction.to_string()
    } else {
        format!(
            "{}\n\n{}",
            instruction,
            section("Responses", &numbered_list(candidates))
        )
    };
    vec![ChatMessage::system(system), ChatMessage::user(query)]
}

/// Messages for Refine: one candidate with the query it answers.
pub fn refine_messages(instruction: &str, query: &str, candidate: &str) -> Vec<ChatMessage> {
    let content = format!(
        "{}\n\n{}\n\n{}",
        instruction,
        section("Query", query),
        section("Response", candidate)
    );
    vec![ChatMessage::user(content)]
}

/// Messages for judge calls (Rank, Vote).
pub fn judge_messages(instruction: &str, query: &str, candidates: &[String]) -> Vec<ChatMessage> {
    let content = format!(
        "{}\n\n{}\n\n{}",
        instruction,
        section("Query", query),
        section("Responses", &numbered_list(candidates))
    );
    vec![ChatMessage::user(content)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Role;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_render_basic() {
        let result = render("Keep {n} of {total}", &[("n", "2"), ("total", "5")]);
        assert_eq!(result, "Keep 2 of 5");
    }

    #[test]
    fn test_render_escaped_braces() {
        let result = render("Output format: {{\"value\": {n} }}", &[("n", "42")]);
        assert_eq!(result, r#"Output format: {"value": 42 }"#);
    }

    #[test]
    fn test_numbered_list() {
        assert_eq!(numbered_list(&list(&["First", "Second"])), "1. First\n2. Second");
        assert_eq!(numbered_list(&[]), "");
    }

    #[test]
    fn test_section() {
        assert_eq!(section("Context", "Some knowledge"), "## Context\nSome knowledge");
    }

    #[test]
    fn test_peer_messages_layout() {
        let msgs = peer_messages("Merge.", &list(&["X", "Y"]), "What?");
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, Role::System);
        assert_eq!(msgs[0].content, "Merge.\n\n## Responses\n1. X\n2. Y");
        assert_eq!(msgs[1], ChatMessage::user("What?"));
    }

    #[test]
    fn test_peer_messages_without_candidates() {
        let msgs = peer_messages("Merge.", &[], "What?");
        assert_eq!(msgs[0].content, "Merge.");
    }

    #[test]
    fn test_judge_messages_contain_numbered_candidates() {
        let msgs = judge_messages("Pick.", "Q", &list(&["a", "b", "c"]));
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].content.contains("## Query\nQ"));
        assert!(msgs[0].content.contains("3. c"));
    }

    #[test]
    fn test_refine_messages() {
        let msgs = refine_messages(REFINE_PROMPT, "Q", "draft");
        assert!(msgs[0].content.starts_with(REFINE_PROMPT));
        assert!(msgs[0].content.ends_with("## Response\ndraft"));
    }
}
