//! Example: a pipeline loaded from JSON.
//!
//! Run with: `cargo run --example declarative`

use mixture_pipeline::{run, MockClient, PipelineConfig};
use std::sync::Arc;

const PIPELINE: &str = r#"{
  "steps": [
    {"step": "propose", "agents": ["llama", "kimi", "gpt-oss-20b", "qwen"], "temp": 0.4, "max_tokens": 128},
    {"step": "shuffle"},
    {"step": "dropout", "rate": 0.15},
    {"step": "aggregate", "model": "gpt-oss-120b", "temp": 0.2, "max_tokens": 128,
     "prompt": "Pick/merge the best candidate. Must be faithful to the source. One sentence."}
  ]
}"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = PipelineConfig::from_json(PIPELINE)?.into_pipeline()?;

    let mock = MockClient::fixed("A storm closed the harbour for two days.")
        .with_response("gpt-oss-120b", "A two-day storm closed the harbour.");

    let (result, history) = run(
        &pipeline,
        "Summarize in ONE sentence:\n\nHigh winds forced the harbour to close on Monday and Tuesday...",
        Arc::new(mock),
    )
    .await;

    for step in &history {
        println!("{:<10} -> {} candidates", step.step, step.outputs.len());
    }
    println!("\n{}", result);
    Ok(())
}
