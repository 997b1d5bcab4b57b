//! Pure candidate transforms. No model calls, no suspension.

use fastrand::Rng;
use std::sync::Arc;

/// Predicate used by [`Filter`].
pub type PredicateFn = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Text transformation used by [`Map`].
pub type MapFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

pub(super) fn shuffle(mut candidates: Vec<String>, rng: &mut Rng) -> Vec<String> {
    rng.shuffle(&mut candidates);
    candidates
}

/// Drop each candidate independently with probability `rate`.
///
/// There is no minimum survivor count: `Dropout::new(1.0)` removes
/// everything, and the next step sees an empty list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dropout {
    pub rate: f64,
}

impl Dropout {
    pub fn new(rate: f64) -> Self {
        Self { rate }
    }

    pub(super) fn apply(&self, candidates: Vec<String>, rng: &mut Rng) -> Vec<String> {
        candidates
            .into_iter()
            .filter(|_| rng.f64() >= self.rate)
            .collect()
    }
}

/// Uniform random subset of `n` candidates, without replacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub n: usize,
}

impl Sample {
    pub fn new(n: usize) -> Self {
        Self { n }
    }

    pub(super) fn apply(&self, mut candidates: Vec<String>, rng: &mut Rng) -> Vec<String> {
        rng.shuffle(&mut candidates);
        candidates.truncate(self.n);
        candidates
    }
}

/// The first `n` candidates, in current order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Take {
    pub n: usize,
}

impl Take {
    pub fn new(n: usize) -> Self {
        Self { n }
    }

    pub(super) fn apply(&self, mut candidates: Vec<String>) -> Vec<String> {
        candidates.truncate(self.n);
        candidates
    }
}

/// Keep candidates for which the predicate holds.
///
/// # Example
///
/// ```
/// use mixture_pipeline::step::Filter;
///
/// let non_empty = Filter::new(|text| !text.trim().is_empty());
/// ```
#[derive(Clone)]
pub struct Filter {
    predicate: PredicateFn,
}

impl Filter {
    pub fn new(predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    pub(super) fn apply(&self, candidates: Vec<String>) -> Vec<String> {
        candidates
            .into_iter()
            .filter(|c| (self.predicate)(c))
            .collect()
    }
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filter").finish_non_exhaustive()
    }
}

/// Apply a text transformation to every candidate.
#[derive(Clone)]
pub struct Map {
    transform: MapFn,
}

impl Map {
    pub fn new(transform: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self {
            transform: Arc::new(transform),
        }
    }

    pub(super) fn apply(&self, candidates: Vec<String>) -> Vec<String> {
        candidates.iter().map(|c| (self.transform)(c)).collect()
    }
}

impl std::fmt::Debug for Map {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Map").finish_non_exhaustive()
    }
}
