//! Example: inspecting the execution history of a run.
//!
//! Prints every model call with latency and token usage, the totals, and the
//! history as line-delimited JSON. One proposer is scripted to fail so the
//! error path shows up too.
//!
//! Run with: `RUST_LOG=mixture_pipeline=debug cargo run --example with_history`

use mixture_pipeline::{
    Aggregate, ExecCtx, History, MockClient, Pipeline, Propose, Rank, Step,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

fn print_history(history: &History) {
    println!("LLM CALLS:");
    for step in history {
        if step.llm_calls.is_empty() {
            continue;
        }
        println!("\n  {}:", step.step);
        for call in &step.llm_calls {
            let status = match &call.error {
                None => "ok".to_string(),
                Some(e) => format!("FAILED {}", e),
            };
            println!(
                "    {}: {:.2}s | {} in / {} out | {}",
                call.model,
                call.time.as_secs_f64(),
                call.in_tokens,
                call.out_tokens,
                status
            );
        }
    }

    println!("\nTOTALS:");
    println!("  Time: {:.2}s", history.total_time().as_secs_f64());
    println!(
        "  Tokens: {} in / {} out",
        history.total_in_tokens(),
        history.total_out_tokens()
    );
    println!("  Failed calls: {}", history.failed_calls().count());
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mock = MockClient::new()
        .with_response("llama", "Consistent naming and predictable errors.")
        .with_response("qwen", "Small surface area, versioning, good docs.")
        .with_response("kimi", "Make the common case easy and the rare case possible.")
        .with_response("judge", "3, 2, 1")
        .with_response("agg", "Good APIs are small, consistent, documented, and versioned.")
        .with_delay("qwen", Duration::from_millis(40))
        .failing_model("mixtral");

    let pipeline = Pipeline::builder()
        .step(Propose::new(["llama", "qwen", "kimi", "mixtral"]).with_max_tokens(256))
        .step(Step::Shuffle)
        .step(Rank::new("judge", 2))
        .step(Aggregate::new("agg").with_max_tokens(512))
        .build()?;

    let ctx = ExecCtx::builder(Arc::new(mock)).seed(7).build();
    let output = pipeline.run(&ctx, "What makes a good API design?").await;

    println!("OUTPUT:\n{}\n", output.result);
    print_history(&output.history);
    println!("\nJSONL:\n{}", output.history.to_json_lines()?);
    Ok(())
}
