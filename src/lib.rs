//! # Mixture Pipeline
//!
//! Composable mixture-of-agents workflows over any LLM backend.
//!
//! A query flows through an ordered list of **steps**. Agent steps fan out
//! concurrent model calls (propose, synthesize, aggregate, refine, rank,
//! vote); transform steps reshape the candidate list locally (shuffle,
//! dropout, sample, take, filter, map). Every run returns the final answer
//! together with a [`History`] of outputs, timings and per-call token usage.
//!
//! The crate does not talk to any provider itself. You supply an
//! [`LlmClient`] that performs one model call; failures are recorded per
//! call and never abort a run.
//!
//! ## Core Concepts
//!
//! - **[`Step`]**: one stage; a closed set of variants.
//! - **[`Pipeline`]**: validated, ordered steps, built once and run many times.
//! - **[`LlmClient`]**: the one-call contract (`FnClient` adapts a closure).
//! - **[`ExecCtx`]**: client, optional seed, optional event handler.
//! - **[`History`]**: one [`StepRecord`] per step, with [`CallRecord`]s.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mixture_pipeline::{run, Aggregate, Completion, FnClient, LlmRequest, Pipeline, Propose};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Arc::new(FnClient(|req: LlmRequest| async move {
//!         // Call your provider here.
//!         Ok(Completion::new(format!("answer from {}", req.model), 12, 34))
//!     }));
//!
//!     let pipeline = Pipeline::builder()
//!         .step(Propose::new(vec!["llama-3.3-70b-versatile"; 3]).with_temperature(0.7))
//!         .shuffle()
//!         .step(Aggregate::new("llama-3.3-70b-versatile").with_max_tokens(1024))
//!         .build()?;
//!
//!     let (result, history) = run(&pipeline, "What makes a good API design?", client).await;
//!     println!("{}", result);
//!     println!(
//!         "{} in / {} out tokens",
//!         history.total_in_tokens(),
//!         history.total_out_tokens()
//!     );
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod consensus;
pub mod error;
pub mod events;
pub mod exec_ctx;
pub mod history;
pub mod output_parser;
pub mod pipeline;
pub mod prompt;
pub mod recorder;
pub mod step;

pub use client::{ChatMessage, Completion, FnClient, LlmClient, LlmRequest, MockClient, Role};
#[cfg(feature = "openai")]
pub use client::OpenAiClient;
pub use config::{LlmConfig, PipelineConfig, StepConfig};
pub use error::{PipelineError, Result};
pub use exec_ctx::{ExecCtx, ExecCtxBuilder};
pub use history::{History, StepRecord};
pub use pipeline::{run, Pipeline, PipelineBuilder, RunOutput};
pub use recorder::{record_call, CallRecord};
pub use step::{
    Aggregate, Dropout, Filter, Map, Propose, Rank, Refine, Sample, Step, StepOutput, Synthesize,
    Take, Vote,
};
