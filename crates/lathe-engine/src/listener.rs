//! Dispatch of artifacts to their transformation result.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::Arc;

use lathe_artifact::{
  ArtifactId, ArtifactListener, ArtifactResolveError, FileCollectionSource, ResolvableArtifact,
  VisitType,
};
use lathe_transform::{
  DependenciesResolver, Invocation, NodeExecutionContext, TransformError, Transformation,
  TransformationSubject, panic_message,
};
use tracing::{debug, warn};

use crate::events::{TransformEvent, TransformNotifier};
use crate::operation::TransformationOperation;
use crate::queue::AsyncExecutor;
use crate::registry::TransformationNodeRegistry;
use crate::result::TransformationResult;
use crate::store::ResultStore;

/// Decides, for each available artifact, how its transformed result is produced.
///
/// Each artifact ends in exactly one of four ways:
///
/// ```text
/// registry has an executed node      -> node's outcome written now
/// file resolution fails              -> failure written now
/// invocation answered from cache     -> cached outcome written now
/// otherwise                          -> operation submitted, writes on completion
/// ```
///
/// The listener never waits for submitted operations. Read the result store
/// only after the executor has drained.
pub struct TransformingArtifactListener {
  transformation: Arc<Transformation>,
  actions: Arc<dyn AsyncExecutor>,
  results: Arc<ResultStore>,
  dependencies: Arc<dyn DependenciesResolver>,
  registry: Arc<dyn TransformationNodeRegistry>,
  execution: Option<NodeExecutionContext>,
  notifier: Arc<dyn TransformNotifier>,
}

impl TransformingArtifactListener {
  #[allow(clippy::too_many_arguments)]
  pub fn new(
    transformation: Arc<Transformation>,
    actions: Arc<dyn AsyncExecutor>,
    results: Arc<ResultStore>,
    dependencies: Arc<dyn DependenciesResolver>,
    registry: Arc<dyn TransformationNodeRegistry>,
    execution: Option<NodeExecutionContext>,
    notifier: Arc<dyn TransformNotifier>,
  ) -> Self {
    Self {
      transformation,
      actions,
      results,
      dependencies,
      registry,
      execution,
      notifier,
    }
  }

  fn transformation_name(&self) -> String {
    self.transformation.display_name().to_string()
  }

  fn create_transformation_result(&self, artifact_id: &ArtifactId, initial: TransformationSubject) {
    let display_name = format!(
      "Transform {} with {}",
      initial.display_name(),
      self.transformation.display_name()
    );
    let invocation =
      self
        .transformation
        .create_invocation(initial, &self.dependencies, self.execution.as_ref());

    match invocation {
      Invocation::Cached(outcome) => {
        debug!(artifact = %artifact_id, transformation = %self.transformation, "transform result cached");
        self.notifier.notify(TransformEvent::CacheHit {
          artifact: artifact_id.clone(),
          transformation: self.transformation_name(),
          success: outcome.is_ok(),
        });
        self
          .results
          .put(artifact_id.clone(), TransformationResult::from(outcome));
      }
      Invocation::Deferred(deferred) => {
        debug!(artifact = %artifact_id, operation = %display_name, "scheduling transform");
        self.notifier.notify(TransformEvent::Scheduled {
          artifact: artifact_id.clone(),
          operation: display_name.clone(),
        });
        self.actions.submit(TransformationOperation::new(
          deferred,
          display_name,
          artifact_id.clone(),
          self.results.clone(),
          self.notifier.clone(),
        ));
      }
    }
  }
}

impl ArtifactListener for TransformingArtifactListener {
  fn prepare_for_visit(&self, _source: &FileCollectionSource) -> VisitType {
    // Visit everything
    VisitType::Visit
  }

  fn require_artifact_files(&self) -> bool {
    // A transform cannot run without the artifact's bytes.
    true
  }

  fn artifact_available(&self, artifact: &dyn ResolvableArtifact) {
    let artifact_id = artifact.id();

    if let Some(node) = self
      .registry
      .lookup_executed(artifact_id, &self.transformation)
    {
      debug!(artifact = %artifact_id, transformation = %self.transformation, "reusing executed transformation node");
      self.notifier.notify(TransformEvent::DedupHit {
        artifact: artifact_id.clone(),
        transformation: self.transformation_name(),
      });
      self.results.put(
        artifact_id.clone(),
        TransformationResult::from(node.transformed_subject().clone()),
      );
      return;
    }

    let file = match resolve_file(artifact) {
      Ok(file) => file,
      Err(source) => {
        let error = TransformError::artifact_resolution(self.transformation.display_name(), source);
        warn!(artifact = %artifact_id, error = %error, "artifact resolution failed");
        self.notifier.notify(TransformEvent::ResolutionFailed {
          artifact: artifact_id.clone(),
          transformation: self.transformation_name(),
          error: error.to_string(),
        });
        self
          .results
          .put(artifact_id.clone(), TransformationResult::failure(error));
        return;
      }
    };

    let initial = TransformationSubject::initial(artifact_id.clone(), file);
    self.create_transformation_result(artifact_id, initial);
  }
}

/// Resolve the artifact's file, turning a panic into a resolution fault.
fn resolve_file(artifact: &dyn ResolvableArtifact) -> Result<PathBuf, ArtifactResolveError> {
  catch_unwind(AssertUnwindSafe(|| artifact.resolve_file())).unwrap_or_else(|payload| {
    Err(ArtifactResolveError::fault(
      artifact.id(),
      panic_message(payload.as_ref()),
    ))
  })
}
