//! Example: Self-MoA against MockClient, no network needed.
//!
//! One model is sampled four times, then merges its own drafts.
//!
//! Run with: `cargo run --example self_moa`

use mixture_pipeline::{run, Aggregate, MockClient, Pipeline, Propose};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let model = "llama-3.3-70b-versatile";

    let mock = MockClient::new()
        .with_response(model, "Technical debt is the cost of shortcuts taken today.")
        .with_response(model, "It is future rework caused by quick-and-dirty choices.")
        .with_response(model, "Like financial debt, it accrues interest as code changes.")
        .with_response(model, "It slows teams down until it is paid back by refactoring.")
        .with_response(
            "aggregator",
            "Technical debt is the future rework caused by shortcuts; it accrues interest until refactored away.",
        );

    let pipeline = Pipeline::builder()
        .step(Propose::new(vec![model; 4]).with_temperature(0.7).with_max_tokens(512))
        .step(Aggregate::new("aggregator").with_max_tokens(1024))
        .build()?;

    let (result, history) = run(
        &pipeline,
        "Explain the concept of technical debt in software engineering",
        Arc::new(mock),
    )
    .await;

    println!("OUTPUT:\n{}\n", result);
    println!("PROPOSALS:");
    for (i, proposal) in history[0].outputs.iter().enumerate() {
        println!("  {}. {}", i + 1, proposal);
    }
    Ok(())
}
