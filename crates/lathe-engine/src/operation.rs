//! The unit of work that runs a deferred invocation.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use lathe_artifact::ArtifactId;
use lathe_transform::{DeferredInvocation, TransformError, panic_message};
use tracing::{error, info, instrument};

use crate::events::{TransformEvent, TransformNotifier};
use crate::result::TransformationResult;
use crate::store::ResultStore;

/// Runs the remaining steps of one artifact's invocation and records the result.
///
/// The operation is the only writer of its artifact's entry in the result
/// store. Whatever happens while the steps run ends up in the store as a
/// result; nothing propagates to the executor running the operation.
pub struct TransformationOperation {
  invocation: DeferredInvocation,
  display_name: String,
  artifact_id: ArtifactId,
  results: Arc<ResultStore>,
  notifier: Arc<dyn TransformNotifier>,
}

impl TransformationOperation {
  pub fn new(
    invocation: DeferredInvocation,
    display_name: impl Into<String>,
    artifact_id: ArtifactId,
    results: Arc<ResultStore>,
    notifier: Arc<dyn TransformNotifier>,
  ) -> Self {
    Self {
      invocation,
      display_name: display_name.into(),
      artifact_id,
      results,
      notifier,
    }
  }

  pub fn display_name(&self) -> &str {
    &self.display_name
  }

  pub fn artifact_id(&self) -> &ArtifactId {
    &self.artifact_id
  }

  /// Run the invocation to completion and record its result.
  #[instrument(
    name = "transform_operation",
    skip(self),
    fields(artifact = %self.artifact_id, operation = %self.display_name)
  )]
  pub fn run(self) {
    let transformation = self.invocation.transformation().display_name().to_string();
    let subject = self.invocation.subject().display_name();
    let invocation = self.invocation;

    let outcome = catch_unwind(AssertUnwindSafe(move || invocation.invoke())).unwrap_or_else(|payload| {
      Err(Arc::new(TransformError::Panicked {
        step: transformation,
        subject,
        message: panic_message(payload.as_ref()),
      }))
    });
    let result = TransformationResult::from(outcome);

    match &result {
      TransformationResult::Success(subject) => {
        info!(files = ?subject.files(), "transform completed");
        self.notifier.notify(TransformEvent::Completed {
          artifact: self.artifact_id.clone(),
          operation: self.display_name.clone(),
          files: subject.files().to_vec(),
        });
      }
      TransformationResult::Failure(e) => {
        error!(error = %e, "transform failed");
        self.notifier.notify(TransformEvent::Failed {
          artifact: self.artifact_id.clone(),
          operation: self.display_name.clone(),
          error: e.to_string(),
        });
      }
    }

    self.results.put(self.artifact_id, result);
  }
}

impl std::fmt::Debug for TransformationOperation {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TransformationOperation")
      .field("display_name", &self.display_name)
      .field("artifact_id", &self.artifact_id)
      .finish()
  }
}
