//! Sampling configuration and declarative pipeline definitions.
//!
//! [`LlmConfig`] carries the per-call sampling knobs every agent step owns.
//! [`PipelineConfig`] describes a pipeline as data (JSON, or YAML with the
//! `yaml` feature) so it can live in a file next to the code that runs it.
//! Filter and Map take closures and can only be added in code.

use crate::error::Result;
use crate::pipeline::Pipeline;
use crate::step::{Aggregate, Dropout, Propose, Rank, Refine, Sample, Step, Synthesize, Take, Vote};
use crate::PipelineError;
use serde::{Deserialize, Serialize};

/// Sampling configuration for model calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Temperature (0.0 = deterministic, 1.0 = creative).
    #[serde(alias = "temp")]
    pub temperature: f64,

    /// Maximum tokens to generate.
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2048,
        }
    }
}

impl LlmConfig {
    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.temperature = temp;
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub(crate) fn validate(&self, step: &str) -> Result<()> {
        if !self.temperature.is_finite() || self.temperature < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "{}: temperature must be a non-negative number, got {}",
                step, self.temperature
            )));
        }
        if self.max_tokens == 0 {
            return Err(PipelineError::InvalidConfig(format!(
                "{}: max_tokens must be greater than zero",
                step
            )));
        }
        Ok(())
    }
}

/// One step of a declarative pipeline, tagged by `"step"`.
///
/// ```json
/// {"step": "propose", "agents": ["a", "b"], "temp": 0.7, "max_tokens": 512}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepConfig {
    Shuffle,
    Dropout {
        rate: f64,
    },
    Sample {
        n: usize,
    },
    Take {
        n: usize,
    },
    Propose {
        agents: Vec<String>,
        #[serde(flatten)]
        llm: LlmConfig,
    },
    Synthesize {
        agents: Vec<String>,
        #[serde(flatten)]
        llm: LlmConfig,
        #[serde(default)]
        prompt: Option<String>,
    },
    Aggregate {
        model: String,
        #[serde(flatten)]
        llm: LlmConfig,
        #[serde(default)]
        prompt: Option<String>,
    },
    Refine {
        model: String,
        #[serde(flatten)]
        llm: LlmConfig,
        #[serde(default)]
        prompt: Option<String>,
    },
    Rank {
        model: String,
        n: usize,
        #[serde(flatten)]
        llm: LlmConfig,
    },
    Vote {
        #[serde(default)]
        model: Option<String>,
        #[serde(flatten)]
        llm: LlmConfig,
    },
}

impl From<StepConfig> for Step {
    fn from(config: StepConfig) -> Self {
        match config {
            StepConfig::Shuffle => Step::Shuffle,
            StepConfig::Dropout { rate } => Dropout::new(rate).into(),
            StepConfig::Sample { n } => Sample::new(n).into(),
            StepConfig::Take { n } => Take::new(n).into(),
            StepConfig::Propose { agents, llm } => Propose::new(agents).with_config(llm).into(),
            StepConfig::Synthesize { agents, llm, prompt } => Synthesize {
                agents,
                config: llm,
                prompt,
            }
            .into(),
            StepConfig::Aggregate { model, llm, prompt } => Aggregate {
                model,
                config: llm,
                prompt,
            }
            .into(),
            StepConfig::Refine { model, llm, prompt } => Refine {
                model,
                config: llm,
                prompt,
            }
            .into(),
            StepConfig::Rank { model, n, llm } => Rank::new(model, n).with_config(llm).into(),
            StepConfig::Vote { model, llm } => Vote { model, config: llm }.into(),
        }
    }
}

/// A pipeline described as data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub steps: Vec<StepConfig>,
}

impl PipelineConfig {
    /// Parse from JSON, either `{"steps": [...]}` or a bare array of steps.
    pub fn from_json(text: &str) -> Result<Self> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Shape {
            Wrapped(PipelineConfig),
            Bare(Vec<StepConfig>),
        }

        match serde_json::from_str::<Shape>(text)? {
            Shape::Wrapped(config) => Ok(config),
            Shape::Bare(steps) => Ok(Self { steps }),
        }
    }

    /// Parse from YAML with a top-level `steps:` list.
    ///
    /// Requires the `yaml` feature flag.
    #[cfg(feature = "yaml")]
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| PipelineError::InvalidConfig(e.to_string()))
    }

    /// Convert into a validated [`Pipeline`].
    pub fn into_pipeline(self) -> Result<Pipeline> {
        Pipeline::new(self.steps.into_iter().map(Step::from).collect())
    }
}
