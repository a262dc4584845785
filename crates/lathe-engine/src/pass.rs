//! A complete dispatch pass over one artifact set.

use std::path::PathBuf;
use std::sync::Arc;

use lathe_artifact::{ArtifactId, ArtifactSet};
use lathe_transform::{DependenciesResolver, NoDependencies, NodeExecutionContext, Transformation};
use tracing::{Span, info, instrument};

use crate::error::{ArtifactFailure, EngineError};
use crate::events::{NoopNotifier, TransformNotifier};
use crate::listener::TransformingArtifactListener;
use crate::queue::OperationQueue;
use crate::registry::{InMemoryNodeRegistry, TransformationNodeRegistry};
use crate::result::TransformationResult;
use crate::store::ResultStore;

/// Configuration for a dispatch pass.
#[derive(Debug, Clone)]
pub struct EngineConfig {
  /// Maximum number of transform operations running at once.
  pub max_parallelism: usize,
  /// Number of threads announcing artifacts to the dispatcher.
  pub visit_threads: usize,
}

impl Default for EngineConfig {
  fn default() -> Self {
    let parallelism = std::thread::available_parallelism()
      .map(|n| n.get())
      .unwrap_or(1);
    Self {
      max_parallelism: parallelism,
      visit_threads: 1,
    }
  }
}

/// Applies one transformation to every artifact of a set.
///
/// Each call to [`run`](Self::run) uses a fresh result store and operation
/// queue. The registry, dependencies resolver and notifier are shared across
/// runs.
pub struct TransformPass {
  transformation: Arc<Transformation>,
  registry: Arc<dyn TransformationNodeRegistry>,
  dependencies: Arc<dyn DependenciesResolver>,
  notifier: Arc<dyn TransformNotifier>,
  config: EngineConfig,
}

impl TransformPass {
  pub fn new(transformation: Arc<Transformation>, config: EngineConfig) -> Self {
    Self {
      transformation,
      registry: Arc::new(InMemoryNodeRegistry::new()),
      dependencies: Arc::new(NoDependencies),
      notifier: Arc::new(NoopNotifier),
      config,
    }
  }

  pub fn with_registry(mut self, registry: Arc<dyn TransformationNodeRegistry>) -> Self {
    self.registry = registry;
    self
  }

  pub fn with_dependencies(mut self, dependencies: Arc<dyn DependenciesResolver>) -> Self {
    self.dependencies = dependencies;
    self
  }

  pub fn with_notifier(mut self, notifier: Arc<dyn TransformNotifier>) -> Self {
    self.notifier = notifier;
    self
  }

  pub fn transformation(&self) -> &Transformation {
    &self.transformation
  }

  /// Dispatch every artifact, wait for scheduled operations, and collect results.
  ///
  /// Must be called from within a tokio runtime. Artifacts are announced on
  /// the blocking pool, since resolving them touches the filesystem.
  #[instrument(
    name = "transform_pass",
    skip(self, artifacts, execution),
    fields(
      transformation = %self.transformation,
      source = %artifacts.source(),
      artifacts = artifacts.len(),
    )
  )]
  pub async fn run(
    &self,
    artifacts: &ArtifactSet,
    execution: Option<&NodeExecutionContext>,
  ) -> Result<PassResult, EngineError> {
    let results = Arc::new(ResultStore::new());
    let queue = Arc::new(OperationQueue::current(self.config.max_parallelism)?);

    let listener = TransformingArtifactListener::new(
      self.transformation.clone(),
      queue.clone(),
      results.clone(),
      self.dependencies.clone(),
      self.registry.clone(),
      execution.cloned(),
      self.notifier.clone(),
    );

    let set = artifacts.clone();
    let visit_threads = self.config.visit_threads;
    let span = Span::current();
    let visited = tokio::task::spawn_blocking(move || {
      let _entered = span.enter();
      if visit_threads > 1 {
        set.visit_concurrently(&listener, visit_threads)
      } else {
        set.visit(&listener)
      }
    })
    .await;
    let announced = match visited {
      Ok(announced) => announced,
      Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
      Err(e) => {
        return Err(EngineError::VisitAborted {
          message: e.to_string(),
        });
      }
    };
    let scheduled = queue.pending();

    let completed = queue.drain().await?;

    info!(announced, scheduled, completed, "transform pass drained");

    collect_results(artifacts, &results)
  }
}

fn collect_results(artifacts: &ArtifactSet, results: &ResultStore) -> Result<PassResult, EngineError> {
  let collected = artifacts
    .artifacts()
    .iter()
    .map(|artifact| {
      let id = artifact.id();
      results
        .get(id)
        .map(|result| (id.clone(), result))
        .ok_or_else(|| EngineError::MissingResult {
          artifact: id.clone(),
        })
    })
    .collect::<Result<Vec<_>, _>>()?;

  Ok(PassResult { results: collected })
}

/// Results of a dispatch pass, in artifact set order.
#[derive(Debug, Clone)]
pub struct PassResult {
  results: Vec<(ArtifactId, TransformationResult)>,
}

impl PassResult {
  pub fn results(&self) -> &[(ArtifactId, TransformationResult)] {
    &self.results
  }

  pub fn get(&self, artifact: &ArtifactId) -> Option<&TransformationResult> {
    self
      .results
      .iter()
      .find(|(id, _)| id == artifact)
      .map(|(_, result)| result)
  }

  pub fn len(&self) -> usize {
    self.results.len()
  }

  pub fn is_empty(&self) -> bool {
    self.results.is_empty()
  }

  pub fn failures(&self) -> Vec<ArtifactFailure> {
    self
      .results
      .iter()
      .filter_map(|(artifact, result)| {
        result.error().map(|error| ArtifactFailure {
          artifact: artifact.clone(),
          error: error.clone(),
        })
      })
      .collect()
  }

  /// Every transformed file, in order, or all failures at once.
  pub fn files(&self) -> Result<Vec<PathBuf>, EngineError> {
    let failures = self.failures();
    if !failures.is_empty() {
      return Err(EngineError::TransformFailures { failures });
    }
    Ok(
      self
        .results
        .iter()
        .flat_map(|(_, result)| result.files().iter().cloned())
        .collect(),
    )
  }
}
