//! The step catalog.
//!
//! A [`Step`] is one stage of a pipeline. It consumes the current candidate
//! list and produces a new one. Steps come in two families:
//!
//! | Family | Steps | Model calls |
//! |--------|-------|-------------|
//! | Transform | [`Shuffle`](Step::Shuffle), [`Dropout`], [`Sample`], [`Take`], [`Filter`], [`Map`] | none |
//! | Agent | [`Propose`], [`Synthesize`], [`Aggregate`], [`Refine`], [`Rank`], [`Vote`] | concurrent fan-out |
//!
//! Agent steps launch every call before awaiting any of them and join on all
//! of them. Outputs are assembled in dispatch order.

mod agent;
mod transform;

pub use agent::{Aggregate, Propose, Rank, Refine, Synthesize, Vote};
pub use transform::{Dropout, Filter, Map, MapFn, PredicateFn, Sample, Take};

use crate::client::LlmClient;
use crate::error::Result;
use crate::recorder::CallRecord;
use crate::PipelineError;

/// One stage of a pipeline.
#[derive(Debug, Clone)]
pub enum Step {
    /// Randomly permute candidate order.
    Shuffle,
    Dropout(Dropout),
    Sample(Sample),
    Take(Take),
    Filter(Filter),
    Map(Map),
    Propose(Propose),
    Synthesize(Synthesize),
    Aggregate(Aggregate),
    Refine(Refine),
    Rank(Rank),
    Vote(Vote),
}

/// What a step hands back to the engine.
#[derive(Debug, Clone, Default)]
pub struct StepOutput {
    /// The new candidate list.
    pub candidates: Vec<String>,
    /// Model calls made by the step, in dispatch order.
    pub calls: Vec<CallRecord>,
}

impl StepOutput {
    pub(crate) fn transformed(candidates: Vec<String>) -> Self {
        Self {
            candidates,
            calls: Vec::new(),
        }
    }
}

/// Everything a step may read while executing.
pub(crate) struct StepCtx<'a> {
    /// The query the run was seeded with.
    pub query: &'a str,
    pub client: &'a dyn LlmClient,
    /// Random source for transform steps.
    pub rng: &'a mut fastrand::Rng,
}

impl Step {
    /// Step type name, as recorded in the history.
    pub fn name(&self) -> &'static str {
        match self {
            Step::Shuffle => "Shuffle",
            Step::Dropout(_) => "Dropout",
            Step::Sample(_) => "Sample",
            Step::Take(_) => "Take",
            Step::Filter(_) => "Filter",
            Step::Map(_) => "Map",
            Step::Propose(_) => "Propose",
            Step::Synthesize(_) => "Synthesize",
            Step::Aggregate(_) => "Aggregate",
            Step::Refine(_) => "Refine",
            Step::Rank(_) => "Rank",
            Step::Vote(_) => "Vote",
        }
    }

    /// Whether this step is a pure transform (never calls a model).
    pub fn is_transform(&self) -> bool {
        matches!(
            self,
            Step::Shuffle
                | Step::Dropout(_)
                | Step::Sample(_)
                | Step::Take(_)
                | Step::Filter(_)
                | Step::Map(_)
        )
    }

    /// Models this step may call, in dispatch order.
    pub fn models(&self) -> Vec<&str> {
        match self {
            Step::Propose(s) => s.agents.iter().map(String::as_str).collect(),
            Step::Synthesize(s) => s.agents.iter().map(String::as_str).collect(),
            Step::Aggregate(s) => vec![s.model.as_str()],
            Step::Refine(s) => vec![s.model.as_str()],
            Step::Rank(s) => vec![s.model.as_str()],
            Step::Vote(s) => s.model.as_deref().into_iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Check the step's configuration.
    pub fn validate(&self) -> Result<()> {
        let name = self.name();
        match self {
            Step::Shuffle | Step::Filter(_) | Step::Map(_) => Ok(()),
            Step::Dropout(s) => {
                if !(0.0..=1.0).contains(&s.rate) {
                    return Err(PipelineError::InvalidConfig(format!(
                        "Dropout: rate must be within [0, 1], got {}",
                        s.rate
                    )));
                }
                Ok(())
            }
            Step::Sample(Sample { n }) | Step::Take(Take { n }) => require_positive(name, "n", *n),
            Step::Propose(Propose { agents, config }) => {
                require_agents(name, agents)?;
                config.validate(name)
            }
            Step::Synthesize(s) => {
                require_agents(name, &s.agents)?;
                s.config.validate(name)
            }
            Step::Aggregate(s) => {
                require_model(name, &s.model)?;
                s.config.validate(name)
            }
            Step::Refine(s) => {
                require_model(name, &s.model)?;
                s.config.validate(name)
            }
            Step::Rank(s) => {
                require_model(name, &s.model)?;
                require_positive(name, "n", s.n)?;
                s.config.validate(name)
            }
            Step::Vote(s) => {
                if let Some(model) = &s.model {
                    require_model(name, model)?;
                }
                s.config.validate(name)
            }
        }
    }

    /// Run the step over `candidates`.
    pub(crate) async fn execute(&self, candidates: Vec<String>, ctx: &mut StepCtx<'_>) -> StepOutput {
        match self {
            Step::Shuffle => StepOutput::transformed(transform::shuffle(candidates, ctx.rng)),
            Step::Dropout(s) => StepOutput::transformed(s.apply(candidates, ctx.rng)),
            Step::Sample(s) => StepOutput::transformed(s.apply(candidates, ctx.rng)),
            Step::Take(s) => StepOutput::transformed(s.apply(candidates)),
            Step::Filter(s) => StepOutput::transformed(s.apply(candidates)),
            Step::Map(s) => StepOutput::transformed(s.apply(candidates)),
            Step::Propose(s) => s.execute(ctx.query, ctx.client).await,
            Step::Synthesize(s) => s.execute(&candidates, ctx.query, ctx.client).await,
            Step::Aggregate(s) => s.execute(&candidates, ctx.query, ctx.client).await,
            Step::Refine(s) => s.execute(candidates, ctx.query, ctx.client).await,
            Step::Rank(s) => s.execute(candidates, ctx.query, ctx.client).await,
            Step::Vote(s) => s.execute(candidates, ctx.query, ctx.client).await,
        }
    }
}

fn require_positive(step: &str, field: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(PipelineError::InvalidConfig(format!(
            "{}: {} must be greater than zero",
            step, field
        )));
    }
    Ok(())
}

fn require_model(step: &str, model: &str) -> Result<()> {
    if model.trim().is_empty() {
        return Err(PipelineError::InvalidConfig(format!(
            "{}: model name must not be empty",
            step
        )));
    }
    Ok(())
}

fn require_agents(step: &str, agents: &[String]) -> Result<()> {
    if agents.is_empty() {
        return Err(PipelineError::InvalidConfig(format!(
            "{}: at least one agent is required",
            step
        )));
    }
    agents.iter().try_for_each(|a| require_model(step, a))
}

macro_rules! impl_from_step {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Step {
                fn from(step: $variant) -> Self {
                    Step::$variant(step)
                }
            }
        )*
    };
}

impl_from_step!(
    Dropout, Sample, Take, Filter, Map, Propose, Synthesize, Aggregate, Refine, Rank, Vote,
);
