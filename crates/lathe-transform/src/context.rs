//! What a step can see beyond its input subject.

use std::path::PathBuf;
use std::sync::Arc;

use lathe_artifact::{ArtifactResolveError, ResolvableArtifact};

use crate::step::TransformationStep;

/// Context of the build node a transformation runs on behalf of.
///
/// Transformations invoked outside a scheduled node run without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeExecutionContext {
  pub execution_id: String,
}

impl NodeExecutionContext {
  pub fn new(execution_id: impl Into<String>) -> Self {
    Self {
      execution_id: execution_id.into(),
    }
  }

  /// A context with a freshly generated execution ID.
  pub fn generate() -> Self {
    Self::new(uuid::Uuid::new_v4().to_string())
  }
}

/// Supplies the upstream dependency files of the artifact being transformed.
pub trait DependenciesResolver: Send + Sync {
  fn dependencies_for(&self, step: &TransformationStep) -> Result<Vec<PathBuf>, ArtifactResolveError>;
}

/// Resolver for artifacts without upstream dependencies.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDependencies;

impl DependenciesResolver for NoDependencies {
  fn dependencies_for(&self, _step: &TransformationStep) -> Result<Vec<PathBuf>, ArtifactResolveError> {
    Ok(Vec::new())
  }
}

/// Resolves dependencies from a fixed list of artifacts.
///
/// Files are resolved on every request; the first failure is returned.
#[derive(Clone, Default)]
pub struct ArtifactDependencies {
  artifacts: Vec<Arc<dyn ResolvableArtifact>>,
}

impl ArtifactDependencies {
  pub fn new(artifacts: Vec<Arc<dyn ResolvableArtifact>>) -> Self {
    Self { artifacts }
  }
}

impl DependenciesResolver for ArtifactDependencies {
  fn dependencies_for(&self, _step: &TransformationStep) -> Result<Vec<PathBuf>, ArtifactResolveError> {
    self
      .artifacts
      .iter()
      .map(|artifact| artifact.resolve_file())
      .collect()
  }
}
