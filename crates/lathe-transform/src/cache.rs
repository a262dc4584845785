//! Invocation caching for transformation steps.
//!
//! Step outcomes are recorded once per input and replayed on later
//! invocations, so a chain whose every step has already run can be answered
//! without scheduling any work. Failures are cached too and replayed as-is.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use crate::error::TransformError;

/// Recorded outcome of one step: its output files or the failure it raised.
pub type CachedOutcome = Result<Vec<PathBuf>, Arc<TransformError>>;

/// Cache key for step outcomes.
///
/// Inputs are identified by path only.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct InvocationKey {
  pub step: String,
  pub inputs: Vec<PathBuf>,
}

impl InvocationKey {
  pub fn new(step: impl Into<String>, inputs: &[PathBuf]) -> Self {
    Self {
      step: step.into(),
      inputs: inputs.to_vec(),
    }
  }
}

/// Caches step outcomes across invocations.
#[derive(Clone, Default)]
pub struct InvocationCache {
  cache: Arc<RwLock<HashMap<InvocationKey, CachedOutcome>>>,
}

impl InvocationCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Get a recorded outcome.
  pub fn get(&self, key: &InvocationKey) -> Option<CachedOutcome> {
    let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
    cache.get(key).cloned()
  }

  /// Record an outcome. The first outcome recorded for a key wins.
  pub fn record(&self, key: InvocationKey, outcome: CachedOutcome) {
    let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
    cache.entry(key).or_insert(outcome);
  }

  pub fn len(&self) -> usize {
    self.cache.read().unwrap_or_else(|e| e.into_inner()).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Clear the cache.
  pub fn clear(&self) {
    let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
    cache.clear();
  }
}
