use crate::{
    client::LlmClient,
    error::Result,
    events::{emit, Event},
    exec_ctx::ExecCtx,
    history::{History, StepRecord},
    step::{Step, StepCtx},
    PipelineError,
};
use std::sync::Arc;
use std::time::Instant;

/// An ordered, validated sequence of steps.
///
/// Built once and run any number of times. Each run seeds the candidate
/// list with the query, feeds it through every step in order, and returns
/// the first surviving candidate with the full [`History`].
///
/// Runs never fail on backend errors: failed calls show up in the history
/// and the worst outcome is an empty result.
#[derive(Debug, Clone)]
pub struct Pipeline {
    steps: Vec<Step>,
}

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// First element of the final candidate list, or `""` if it is empty.
    pub result: String,
    /// One record per step, in execution order.
    pub history: History,
}

impl RunOutput {
    /// Split into `(result, history)`.
    pub fn into_parts(self) -> (String, History) {
        (self.result, self.history)
    }
}

impl Pipeline {
    /// Validate and build a pipeline from steps.
    pub fn new(steps: Vec<Step>) -> Result<Self> {
        if steps.is_empty() {
            return Err(PipelineError::InvalidConfig(
                "Pipeline must have at least one step".to_string(),
            ));
        }
        for (idx, step) in steps.iter().enumerate() {
            step.validate().map_err(|e| match e {
                PipelineError::InvalidConfig(msg) => {
                    PipelineError::InvalidConfig(format!("step {}: {}", idx + 1, msg))
                }
                other => other,
            })?;
        }
        Ok(Self { steps })
    }

    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Get a reference to the pipeline's steps.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run the pipeline on `query`.
    pub async fn run(&self, ctx: &ExecCtx, query: &str) -> RunOutput {
        let mut rng = ctx.rng();
        let mut step_ctx = StepCtx {
            query,
            client: ctx.client.as_ref(),
            rng: &mut rng,
        };

        emit(
            &ctx.event_handler,
            Event::RunStart {
                steps: self.steps.len(),
            },
        );

        let mut candidates = vec![query.to_string()];
        let mut history = History::with_capacity(self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            let name = step.name();
            emit(
                &ctx.event_handler,
                Event::StepStart {
                    index,
                    step: name,
                    inputs: candidates.len(),
                },
            );

            let started = Instant::now();
            let output = step.execute(candidates, &mut step_ctx).await;
            let elapsed = started.elapsed();

            let failed = output.calls.iter().filter(|c| !c.ok()).count();
            tracing::info!(
                step = name,
                index,
                outputs = output.candidates.len(),
                calls = output.calls.len(),
                failed,
                elapsed_ms = elapsed.as_millis() as u64,
                "step finished"
            );

            for record in &output.calls {
                emit(
                    &ctx.event_handler,
                    Event::CallEnd {
                        index,
                        record: record.clone(),
                    },
                );
            }
            emit(
                &ctx.event_handler,
                Event::StepEnd {
                    index,
                    step: name,
                    outputs: output.candidates.len(),
                    elapsed,
                },
            );

            history.push(StepRecord {
                step: name.to_string(),
                outputs: output.candidates.clone(),
                step_time: elapsed,
                llm_calls: output.calls,
            });
            candidates = output.candidates;
        }

        let result = candidates.into_iter().next().unwrap_or_default();
        emit(
            &ctx.event_handler,
            Event::RunEnd {
                has_result: !result.is_empty(),
            },
        );

        RunOutput { result, history }
    }
}

/// Run `pipeline` on `query` with a default context around `client`.
///
/// Returns `(result, history)`.
pub async fn run(pipeline: &Pipeline, query: &str, client: Arc<dyn LlmClient>) -> (String, History) {
    pipeline.run(&ExecCtx::new(client), query).await.into_parts()
}

/// Builder for creating pipelines.
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    steps: Vec<Step>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step.
    pub fn step(mut self, step: impl Into<Step>) -> Self {
        self.steps.push(step.into());
        self
    }

    /// Append a Shuffle step.
    pub fn shuffle(self) -> Self {
        self.step(Step::Shuffle)
    }

    /// Build the pipeline, validating configuration.
    pub fn build(self) -> Result<Pipeline> {
        Pipeline::new(self.steps)
    }
}
