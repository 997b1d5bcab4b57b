//! Example: 3-layer MoA through an OpenAI-compatible API.
//!
//! Layer 1 proposes, layer 2 synthesizes with all proposals visible, layer 3
//! aggregates into the final answer.
//!
//! Run with:
//! `OPENAI_BASE_URL=https://openrouter.ai/api/v1 OPENAI_API_KEY=sk-or-... cargo run --example openai_moa --features openai`

use mixture_pipeline::{run, Aggregate, OpenAiClient, Pipeline, Propose, Synthesize};
use std::sync::Arc;

const PROPOSERS: [&str; 4] = [
    "qwen/qwen-2.5-72b-instruct",
    "meta-llama/llama-3.3-70b-instruct",
    "mistralai/mixtral-8x22b-instruct",
    "databricks/dbrx-instruct",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let base_url =
        std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let api_key = std::env::var("OPENAI_API_KEY")?;
    let client = OpenAiClient::new(base_url).with_api_key(api_key);

    let pipeline = Pipeline::builder()
        .step(Propose::new(PROPOSERS).with_temperature(0.7).with_max_tokens(512))
        .step(Synthesize::new(PROPOSERS).with_temperature(0.7).with_max_tokens(512))
        .step(Aggregate::new("qwen/qwen-2.5-72b-instruct").with_max_tokens(1024))
        .build()?;

    let (result, history) = run(
        &pipeline,
        "Compare and contrast the economic policies of keynesianism and monetarism",
        Arc::new(client),
    )
    .await;

    println!("{}\n", result);
    for call in history.failed_calls() {
        eprintln!("{} failed: {}", call.model, call.error.as_deref().unwrap_or(""));
    }
    println!(
        "{:.2}s, {} in / {} out tokens",
        history.total_time().as_secs_f64(),
        history.total_in_tokens(),
        history.total_out_tokens()
    );
    Ok(())
}
