//! Event system for run lifecycle hooks.
//!
//! Provides an optional, non-intrusive way to observe a pipeline run.
//! The engine emits events as steps start and finish and as model calls are
//! recorded. Users can implement [`EventHandler`] to receive them for
//! progress bars, live cost tracking, or streaming UIs.

use crate::recorder::CallRecord;
use std::sync::Arc;
use std::time::Duration;

/// Events emitted during a pipeline run.
#[derive(Debug, Clone)]
pub enum Event {
    /// A run has started.
    RunStart {
        /// Number of steps in the pipeline.
        steps: usize,
    },
    /// A step has started executing.
    StepStart {
        /// Zero-based step position.
        index: usize,
        /// Step type name (e.g. `"Propose"`).
        step: &'static str,
        /// Candidates going into the step.
        inputs: usize,
    },
    /// A model call made by the current step has been recorded.
    ///
    /// Emitted once the step's join completes, in dispatch order.
    CallEnd {
        /// Zero-based step position.
        index: usize,
        /// The call record.
        record: CallRecord,
    },
    /// A step has finished.
    StepEnd {
        /// Zero-based step position.
        index: usize,
        /// Step type name.
        step: &'static str,
        /// Candidates coming out of the step.
        outputs: usize,
        /// Time spent in the step.
        elapsed: Duration,
    },
    /// The run has finished.
    RunEnd {
        /// Whether the run produced a non-empty result.
        has_result: bool,
    },
}

/// Handler for run lifecycle events.
///
/// This is entirely optional -- runs work without an event handler.
///
/// # Example
///
/// ```
/// use mixture_pipeline::events::{Event, EventHandler};
///
/// struct PrintHandler;
///
/// impl EventHandler for PrintHandler {
///     fn on_event(&self, event: Event) {
///         match event {
///             Event::StepStart { step, .. } => println!("[start] {}", step),
///             Event::StepEnd { step, elapsed, .. } => println!("[end] {} in {:?}", step, elapsed),
///             _ => {} // RunStart, CallEnd, RunEnd
///         }
///     }
/// }
/// ```
pub trait EventHandler: Send + Sync {
    /// Called when the engine emits an event.
    fn on_event(&self, event: Event);
}

/// Emit an event if a handler is present. No-op otherwise.
pub(crate) fn emit(handler: &Option<Arc<dyn EventHandler>>, event: Event) {
    if let Some(ref h) = handler {
        h.on_event(event);
    }
}

/// An [`EventHandler`] backed by a closure.
///
/// # Example
///
/// ```
/// use mixture_pipeline::events::{Event, FnEventHandler};
/// use std::sync::Arc;
///
/// let handler = Arc::new(FnEventHandler(|event: Event| {
///     if let Event::CallEnd { record, .. } = event {
///         println!("{}: {} tokens out", record.model, record.out_tokens);
///     }
/// }));
/// ```
pub struct FnEventHandler<F: Fn(Event) + Send + Sync>(pub F);

impl<F: Fn(Event) + Send + Sync> EventHandler for FnEventHandler<F> {
    fn on_event(&self, event: Event) {
        (self.0)(event);
    }
}
