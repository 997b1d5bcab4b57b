//! Model-invoking steps.
//!
//! Every call is wrapped by [`record_call`], so a failing backend only costs
//! its own candidate. Calls within a step are all created up front and driven
//! together by [`join_all`], which waits for every call and keeps dispatch
//! order in its output.

use super::StepOutput;
use crate::client::{ChatMessage, LlmClient};
use crate::config::LlmConfig;
use crate::consensus::consensus_index;
use crate::output_parser::{parse_choice_index, parse_ranking};
use crate::prompt;
use crate::recorder::record_call;
use futures::future::join_all;

/// Dispatch one call per `(model, messages)` pair and join on all of them.
async fn fan_out(
    client: &dyn LlmClient,
    calls: Vec<(&str, Vec<ChatMessage>)>,
    config: &LlmConfig,
) -> StepOutput {
    let pending = calls
        .into_iter()
        .map(|(model, messages)| record_call(client, model, messages, config));
    let results = join_all(pending).await;

    let mut output = StepOutput::default();
    for (text, record) in results {
        if let Some(text) = text {
            output.candidates.push(text);
        }
        output.calls.push(record);
    }
    output
}

/// Ask every agent the original query. Ignores incoming candidates.
///
/// Repeating a model samples it several times (self-ensemble).
///
/// # Example
///
/// ```
/// use mixture_pipeline::step::Propose;
///
/// let propose = Propose::new(vec!["llama-3.3-70b-versatile"; 4])
///     .with_temperature(0.7)
///     .with_max_tokens(512);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Propose {
    pub agents: Vec<String>,
    pub config: LlmConfig,
}

impl Propose {
    pub fn new<I, S>(agents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            agents: agents.into_iter().map(Into::into).collect(),
            config: LlmConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LlmConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.config.temperature = temp;
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = tokens;
        self
    }

    pub(super) async fn execute(&self, query: &str, client: &dyn LlmClient) -> StepOutput {
        let calls = self
            .agents
            .iter()
            .map(|agent| (agent.as_str(), vec![ChatMessage::user(query)]))
            .collect();
        fan_out(client, calls, &self.config).await
    }
}

/// Every agent answers the query with all current candidates as peer
/// material. Output size follows the agent count, not the input.
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesize {
    pub agents: Vec<String>,
    pub config: LlmConfig,
    /// Replaces [`prompt::AGGREGATE_PROMPT`] when set.
    pub prompt: Option<String>,
}

impl Synthesize {
    pub fn new<I, S>(agents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            agents: agents.into_iter().map(Into::into).collect(),
            config: LlmConfig::default(),
            prompt: None,
        }
    }

    pub fn with_config(mut self, config: LlmConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.config.temperature = temp;
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = tokens;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub(super) async fn execute(
        &self,
        candidates: &[String],
        query: &str,
        client: &dyn LlmClient,
    ) -> StepOutput {
        let instruction = self.prompt.as_deref().unwrap_or(prompt::AGGREGATE_PROMPT);
        let messages = prompt::peer_messages(instruction, candidates, query);
        let calls = self
            .agents
            .iter()
            .map(|agent| (agent.as_str(), messages.clone()))
            .collect();
        fan_out(client, calls, &self.config).await
    }
}

/// One call that merges all candidates into a single answer.
///
/// On failure the output is empty and the run result falls back to `""`.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub model: String,
    pub config: LlmConfig,
    /// Replaces [`prompt::AGGREGATE_PROMPT`] when set.
    pub prompt: Option<String>,
}

impl Aggregate {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            config: LlmConfig::default(),
            prompt: None,
        }
    }

    pub fn with_config(mut self, config: LlmConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.config.temperature = temp;
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = tokens;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub(super) async fn execute(
        &self,
        candidates: &[String],
        query: &str,
        client: &dyn LlmClient,
    ) -> StepOutput {
        let instruction = self.prompt.as_deref().unwrap_or(prompt::AGGREGATE_PROMPT);
        let messages = prompt::peer_messages(instruction, candidates, query);
        fan_out(client, vec![(self.model.as_str(), messages)], &self.config).await
    }
}

/// Improve each candidate individually. One call per candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Refine {
    pub model: String,
    pub config: LlmConfig,
    /// Replaces [`prompt::REFINE_PROMPT`] when set.
    pub prompt: Option<String>,
}

impl Refine {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            config: LlmConfig::default(),
            prompt: None,
        }
    }

    pub fn with_config(mut self, config: LlmConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.config.temperature = temp;
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = tokens;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub(super) async fn execute(
        &self,
        candidates: Vec<String>,
        query: &str,
        client: &dyn LlmClient,
    ) -> StepOutput {
        let instruction = self.prompt.as_deref().unwrap_or(prompt::REFINE_PROMPT);
        let calls = candidates
            .iter()
            .map(|c| {
                (
                    self.model.as_str(),
                    prompt::refine_messages(instruction, query, c),
                )
            })
            .collect();
        fan_out(client, calls, &self.config).await
    }
}

/// Ask a judge to order the candidates and keep the top `n`.
///
/// Unparsable or failed judge replies fall back to the incoming order.
/// Candidates the judge leaves out are appended in incoming order, so the
/// output always holds `min(n, len)` candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct Rank {
    pub model: String,
    pub n: usize,
    pub config: LlmConfig,
}

impl Rank {
    pub fn new(model: impl Into<String>, n: usize) -> Self {
        Self {
            model: model.into(),
            n,
            config: LlmConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LlmConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.config.temperature = temp;
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = tokens;
        self
    }

    pub(super) async fn execute(
        &self,
        candidates: Vec<String>,
        query: &str,
        client: &dyn LlmClient,
    ) -> StepOutput {
        if candidates.is_empty() {
            return StepOutput::default();
        }

        let n = self.n.to_string();
        let instruction = prompt::render(prompt::RANK_PROMPT, &[("n", &n)]);
        let messages = prompt::judge_messages(&instruction, query, &candidates);
        let (reply, record) = record_call(client, &self.model, messages, &self.config).await;

        let ranking = match reply.as_deref().map(|r| parse_ranking(r, candidates.len())) {
            Some(Ok(order)) => order,
            Some(Err(e)) => {
                tracing::warn!(model = %self.model, error = %e, "unparsable ranking, keeping incoming order");
                Vec::new()
            }
            None => Vec::new(),
        };

        StepOutput {
            candidates: apply_ranking(candidates, &ranking, self.n),
            calls: vec![record],
        }
    }
}

/// Reorder by `ranking` (zero-based, best first), append anything it left
/// out in incoming order, and keep the first `n`.
fn apply_ranking(candidates: Vec<String>, ranking: &[usize], n: usize) -> Vec<String> {
    let len = candidates.len();
    let mut order: Vec<usize> = Vec::with_capacity(len);
    for &i in ranking {
        if i < len && !order.contains(&i) {
            order.push(i);
        }
    }
    for i in 0..len {
        if !order.contains(&i) {
            order.push(i);
        }
    }
    order.truncate(n);

    let mut slots: Vec<Option<String>> = candidates.into_iter().map(Some).collect();
    order.into_iter().filter_map(|i| slots[i].take()).collect()
}

/// Collapse the candidates to a single winner.
///
/// Without a model, the candidate most similar to the others wins (see
/// [`consensus`](crate::consensus)). With a model, a judge picks the most
/// representative candidate; if its reply fails or cannot be parsed, the
/// first candidate wins. A single candidate wins without a call.
#[derive(Debug, Clone, PartialEq)]
pub struct Vote {
    pub model: Option<String>,
    pub config: LlmConfig,
}

impl Vote {
    /// Similarity voting, no model calls.
    pub fn consensus() -> Self {
        Self {
            model: None,
            config: LlmConfig::default(),
        }
    }

    /// Let a judge model pick the winner.
    pub fn judge(model: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            config: LlmConfig::default(),
        }
    }

    pub fn with_config(mut self, config: LlmConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.config.temperature = temp;
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = tokens;
        self
    }

    pub(super) async fn execute(
        &self,
        mut candidates: Vec<String>,
        query: &str,
        client: &dyn LlmClient,
    ) -> StepOutput {
        if candidates.len() <= 1 {
            return StepOutput::transformed(candidates);
        }

        let Some(model) = self.model.as_deref() else {
            let winner = consensus_index(&candidates).unwrap_or(0);
            return StepOutput::transformed(vec![candidates.swap_remove(winner)]);
        };

        let messages = prompt::judge_messages(prompt::VOTE_PROMPT, query, &candidates);
        let (reply, record) = record_call(client, model, messages, &self.config).await;

        let winner = match reply.as_deref().map(|r| parse_choice_index(r, candidates.len())) {
            Some(Ok(i)) => i,
            Some(Err(e)) => {
                tracing::warn!(model, error = %e, "unparsable vote, picking first candidate");
                0
            }
            None => 0,
        };

        StepOutput {
            candidates: vec![candidates.swap_remove(winner)],
            calls: vec![record],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MockClient;
    use crate::client::Role;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_propose_one_call_per_agent() {
        let mock = MockClient::new()
            .with_response("a", "X")
            .with_response("b", "Y");
        let out = Propose::new(["a", "b", "a"])
            .execute("question", &mock)
            .await;
        assert_eq!(out.candidates, list(&["X", "Y", "X"]));
        assert_eq!(out.calls.len(), 3);
        assert!(mock
            .requests()
            .iter()
            .all(|r| r.messages == vec![ChatMessage::user("question")]));
    }

    #[tokio::test]
    async fn test_propose_keeps_dispatch_order_despite_latency() {
        let mock = MockClient::new()
            .with_response("slow", "first")
            .with_response("fast", "second")
            .with_delay("slow", std::time::Duration::from_millis(30));
        let out = Propose::new(["slow", "fast"]).execute("q", &mock).await;
        assert_eq!(out.candidates, list(&["first", "second"]));
        assert_eq!(out.calls[0].model, "slow");
        assert_eq!(out.calls[1].model, "fast");
    }

    #[tokio::test]
    async fn test_fan_out_runs_calls_concurrently() {
        let delay = std::time::Duration::from_millis(100);
        let mock = MockClient::fixed("ok")
            .with_delay("a", delay)
            .with_delay("b", delay)
            .with_delay("c", delay);
        let started = std::time::Instant::now();
        let out = Propose::new(["a", "b", "c"]).execute("q", &mock).await;
        let elapsed = started.elapsed();
        assert_eq!(out.candidates.len(), 3);
        assert!(
            elapsed < std::time::Duration::from_millis(250),
            "calls ran sequentially: {:?}",
            elapsed
        );
    }

    #[tokio::test]
    async fn test_propose_failed_call_drops_candidate_keeps_record() {
        let mock = MockClient::fixed("ok").failing_model("bad");
        let out = Propose::new(["good", "bad", "good"])
            .execute("q", &mock)
            .await;
        assert_eq!(out.candidates.len(), 2);
        assert_eq!(out.calls.len(), 3);
        assert!(out.calls[0].ok());
        assert!(!out.calls[1].ok());
        assert!(out.calls[2].ok());
    }

    #[tokio::test]
    async fn test_synthesize_sees_all_candidates() {
        let mock = MockClient::fixed("synth");
        let out = Synthesize::new(["a", "b"])
            .with_prompt("Combine.")
            .execute(&list(&["p1", "p2", "p3"]), "q", &mock)
            .await;
        assert_eq!(out.candidates, list(&["synth", "synth"]));
        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        let system = &requests[0].messages[0];
        assert_eq!(system.role, Role::System);
        assert!(system.content.starts_with("Combine."));
        assert!(system.content.contains("3. p3"));
        assert_eq!(requests[0].messages[1], ChatMessage::user("q"));
    }

    #[tokio::test]
    async fn test_aggregate_single_call() {
        let mock = MockClient::new().with_response("agg", "merged");
        let out = Aggregate::new("agg")
            .execute(&list(&["x", "y"]), "q", &mock)
            .await;
        assert_eq!(out.candidates, list(&["merged"]));
        assert_eq!(out.calls.len(), 1);
        assert!(mock.requests()[0].messages[0]
            .content
            .starts_with(prompt::AGGREGATE_PROMPT));
    }

    #[tokio::test]
    async fn test_aggregate_failure_yields_empty() {
        let mock = MockClient::new().failing_model("agg");
        let out = Aggregate::new("agg")
            .execute(&list(&["x"]), "q", &mock)
            .await;
        assert!(out.candidates.is_empty());
        assert_eq!(out.calls.len(), 1);
        assert!(out.calls[0].error.is_some());
    }

    #[tokio::test]
    async fn test_refine_one_call_per_candidate() {
        let mock = MockClient::fixed("better").failing_call(1);
        let out = Refine::new("r")
            .execute(list(&["d1", "d2", "d3"]), "q", &mock)
            .await;
        assert_eq!(out.candidates, list(&["better", "better"]));
        assert_eq!(out.calls.len(), 3);
        let requests = mock.requests();
        assert!(requests[0].messages[0].content.contains("## Response\nd1"));
        assert!(requests[2].messages[0].content.contains("## Query\nq"));
    }

    #[tokio::test]
    async fn test_refine_empty_input_makes_no_calls() {
        let mock = MockClient::fixed("x");
        let out = Refine::new("r").execute(Vec::new(), "q", &mock).await;
        assert!(out.candidates.is_empty());
        assert!(out.calls.is_empty());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_rank_reorders_and_truncates() {
        let mock = MockClient::new().with_response("judge", "3, 1, 2");
        let out = Rank::new("judge", 2)
            .execute(list(&["a", "b", "c"]), "q", &mock)
            .await;
        assert_eq!(out.candidates, list(&["c", "a"]));
        assert_eq!(out.calls.len(), 1);
        assert!(mock.requests()[0].messages[0]
            .content
            .contains("numbers of the best 2 responses"));
    }

    #[tokio::test]
    async fn test_rank_fills_unmentioned_in_order() {
        let mock = MockClient::new().with_response("judge", "4");
        let out = Rank::new("judge", 3)
            .execute(list(&["a", "b", "c", "d"]), "q", &mock)
            .await;
        assert_eq!(out.candidates, list(&["d", "a", "b"]));
    }

    #[tokio::test]
    async fn test_rank_reads_numbered_list_reply() {
        let mock = MockClient::new().with_response("judge", "1. Response 3\n2. Response 1");
        let out = Rank::new("judge", 2)
            .execute(list(&["a", "b", "c"]), "q", &mock)
            .await;
        assert_eq!(out.candidates, list(&["c", "a"]));
    }

    #[tokio::test]
    async fn test_rank_unparsable_falls_back() {
        let mock = MockClient::new().with_response("judge", "they are all great");
        let out = Rank::new("judge", 2)
            .execute(list(&["a", "b", "c"]), "q", &mock)
            .await;
        assert_eq!(out.candidates, list(&["a", "b"]));
        assert!(out.calls[0].ok());
    }

    #[tokio::test]
    async fn test_rank_judge_failure_falls_back() {
        let mock = MockClient::new().failing_model("judge");
        let out = Rank::new("judge", 5)
            .execute(list(&["a", "b"]), "q", &mock)
            .await;
        assert_eq!(out.candidates, list(&["a", "b"]));
        assert!(!out.calls[0].ok());
    }

    #[tokio::test]
    async fn test_rank_empty_input() {
        let mock = MockClient::fixed("1");
        let out = Rank::new("judge", 2).execute(Vec::new(), "q", &mock).await;
        assert!(out.candidates.is_empty());
        assert!(out.calls.is_empty());
    }

    #[test]
    fn test_apply_ranking_ignores_bad_indices() {
        let out = apply_ranking(list(&["a", "b", "c"]), &[7, 1, 1], 3);
        assert_eq!(out, list(&["b", "a", "c"]));
    }

    #[tokio::test]
    async fn test_vote_consensus_without_model() {
        let mock = MockClient::new();
        let out = Vote::consensus()
            .execute(list(&["blue", "red", "Red."]), "q", &mock)
            .await;
        assert_eq!(out.candidates, list(&["red"]));
        assert!(out.calls.is_empty());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_vote_judge_picks() {
        let mock = MockClient::new().with_response("judge", "Response 2");
        let out = Vote::judge("judge")
            .execute(list(&["a", "b", "c"]), "q", &mock)
            .await;
        assert_eq!(out.candidates, list(&["b"]));
        assert_eq!(out.calls.len(), 1);
    }

    #[tokio::test]
    async fn test_vote_judge_ignores_counts_in_prose() {
        let mock = MockClient::new().with_response(
            "judge",
            "Of the 3 responses, number 2 is most representative.",
        );
        let out = Vote::judge("judge")
            .execute(list(&["a", "b", "c"]), "q", &mock)
            .await;
        assert_eq!(out.candidates, list(&["b"]));
    }

    #[tokio::test]
    async fn test_vote_judge_fallback_first() {
        let mock = MockClient::new().with_response("judge", "no idea");
        let out = Vote::judge("judge")
            .execute(list(&["a", "b"]), "q", &mock)
            .await;
        assert_eq!(out.candidates, list(&["a"]));
    }

    #[tokio::test]
    async fn test_vote_single_and_empty_make_no_calls() {
        let mock = MockClient::fixed("1");
        let single = Vote::judge("judge").execute(list(&["only"]), "q", &mock).await;
        assert_eq!(single.candidates, list(&["only"]));
        let empty = Vote::judge("judge").execute(Vec::new(), "q", &mock).await;
        assert!(empty.candidates.is_empty());
        assert_eq!(mock.call_count(), 0);
    }
}
