//! The audit trail of one pipeline run.

use crate::error::Result;
use crate::recorder::{secs, CallRecord};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Execution record for one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step type name (e.g. `"Propose"`, `"Shuffle"`).
    pub step: String,
    /// Candidate list after this step executed.
    pub outputs: Vec<String>,
    /// Time spent inside the step.
    #[serde(with = "secs")]
    pub step_time: Duration,
    /// Model calls in dispatch order. Always empty for transform steps.
    pub llm_calls: Vec<CallRecord>,
}

/// One [`StepRecord`] per pipeline step, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    steps: Vec<StepRecord>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            steps: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, record: StepRecord) {
        self.steps.push(record);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StepRecord> {
        self.steps.iter()
    }

    /// Every call record across all steps, in order.
    pub fn calls(&self) -> impl Iterator<Item = &CallRecord> {
        self.steps.iter().flat_map(|s| s.llm_calls.iter())
    }

    pub fn total_in_tokens(&self) -> u64 {
        self.calls().map(|c| c.in_tokens).sum()
    }

    pub fn total_out_tokens(&self) -> u64 {
        self.calls().map(|c| c.out_tokens).sum()
    }

    /// Sum of step times.
    pub fn total_time(&self) -> Duration {
        self.steps.iter().map(|s| s.step_time).sum()
    }

    /// Calls that ended in an error.
    pub fn failed_calls(&self) -> impl Iterator<Item = &CallRecord> {
        self.calls().filter(|c| !c.ok())
    }

    /// Render as line-delimited JSON, one step per line.
    pub fn to_json_lines(&self) -> Result<String> {
        let mut out = String::new();
        for step in &self.steps {
            out.push_str(&serde_json::to_string(step)?);
            out.push('\n');
        }
        Ok(out)
    }
}

impl std::ops::Index<usize> for History {
    type Output = StepRecord;

    fn index(&self, index: usize) -> &StepRecord {
        &self.steps[index]
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a StepRecord;
    type IntoIter = std::slice::Iter<'a, StepRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

impl IntoIterator for History {
    type Item = StepRecord;
    type IntoIter = std::vec::IntoIter<StepRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}
