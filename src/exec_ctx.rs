//! Execution context shared across pipeline runs.
//!
//! [`ExecCtx`] carries the model client, an optional random seed for the
//! random transforms, and an optional event handler. It is designed to be
//! constructed once and reused for many runs.

use crate::client::LlmClient;
use crate::events::EventHandler;
use std::sync::Arc;

/// Shared execution context for pipeline runs.
///
/// # Example
///
/// ```
/// use mixture_pipeline::{ExecCtx, MockClient};
/// use std::sync::Arc;
///
/// let ctx = ExecCtx::builder(Arc::new(MockClient::fixed("hi")))
///     .seed(42)
///     .build();
/// ```
#[derive(Clone)]
pub struct ExecCtx {
    /// Performs every model call.
    pub client: Arc<dyn LlmClient>,
    /// Seed for Shuffle, Dropout and Sample. `None` draws fresh randomness
    /// for every run.
    pub seed: Option<u64>,
    /// Optional event handler for lifecycle events.
    pub event_handler: Option<Arc<dyn EventHandler>>,
}

impl ExecCtx {
    /// Context with defaults: unseeded, no event handler.
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self::builder(client).build()
    }

    /// Create a new builder.
    pub fn builder(client: Arc<dyn LlmClient>) -> ExecCtxBuilder {
        ExecCtxBuilder {
            client,
            seed: None,
            event_handler: None,
        }
    }

    /// Random source for one run.
    pub(crate) fn rng(&self) -> fastrand::Rng {
        match self.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        }
    }
}

impl std::fmt::Debug for ExecCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecCtx")
            .field("client", &self.client.name())
            .field("seed", &self.seed)
            .field("has_event_handler", &self.event_handler.is_some())
            .finish()
    }
}

/// Builder for [`ExecCtx`].
pub struct ExecCtxBuilder {
    client: Arc<dyn LlmClient>,
    seed: Option<u64>,
    event_handler: Option<Arc<dyn EventHandler>>,
}

impl ExecCtxBuilder {
    /// Seed the random transforms for reproducible runs.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the event handler.
    pub fn event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.event_handler = Some(handler);
        self
    }

    /// Build the execution context.
    pub fn build(self) -> ExecCtx {
        ExecCtx {
            client: self.client,
            seed: self.seed,
            event_handler: self.event_handler,
        }
    }
}
