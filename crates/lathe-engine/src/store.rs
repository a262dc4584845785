//! The per-pass result store.
//!
//! Every artifact dispatched in a pass gets exactly one entry. Entries are
//! written from the dispatching thread or from operation completions, in any
//! order, and read only after the operation queue has drained.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use lathe_artifact::ArtifactId;

use crate::result::TransformationResult;

/// Returned when a second result is offered for an artifact.
#[derive(Debug, thiserror::Error)]
#[error("a transformation result for {artifact} was already recorded")]
pub struct DuplicateResultError {
  pub artifact: ArtifactId,
}

/// Write-once map from artifact identity to its transformation result.
#[derive(Debug, Default)]
pub struct ResultStore {
  results: DashMap<ArtifactId, TransformationResult>,
}

impl ResultStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record the result for an artifact.
  ///
  /// # Panics
  ///
  /// Panics if a result was already recorded for `artifact`. Each artifact is
  /// dispatched once per pass, so a second write means the dispatch logic is
  /// broken and the store can no longer be trusted.
  pub fn put(&self, artifact: ArtifactId, result: TransformationResult) {
    if let Err(e) = self.try_put(artifact, result) {
      panic!("{e}");
    }
  }

  /// Record the result for an artifact unless one is already present.
  pub fn try_put(
    &self,
    artifact: ArtifactId,
    result: TransformationResult,
  ) -> Result<(), DuplicateResultError> {
    match self.results.entry(artifact) {
      Entry::Occupied(entry) => Err(DuplicateResultError {
        artifact: entry.key().clone(),
      }),
      Entry::Vacant(entry) => {
        entry.insert(result);
        Ok(())
      }
    }
  }

  pub fn get(&self, artifact: &ArtifactId) -> Option<TransformationResult> {
    self.results.get(artifact).map(|entry| entry.value().clone())
  }

  pub fn contains(&self, artifact: &ArtifactId) -> bool {
    self.results.contains_key(artifact)
  }

  pub fn len(&self) -> usize {
    self.results.len()
  }

  pub fn is_empty(&self) -> bool {
    self.results.is_empty()
  }
}
