//! Engine errors.

use std::fmt::Write;
use std::sync::Arc;

use lathe_artifact::ArtifactId;
use lathe_transform::TransformError;

/// A failed artifact, as reported to the consumer of a pass.
#[derive(Debug, Clone)]
pub struct ArtifactFailure {
  pub artifact: ArtifactId,
  pub error: Arc<TransformError>,
}

/// Errors that can occur while running a dispatch pass.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
  /// No tokio runtime to schedule operations on.
  #[error("no tokio runtime available to run transform operations")]
  NoRuntime,

  /// The artifact visit was cancelled before every artifact was announced.
  #[error("artifact visit aborted: {message}")]
  VisitAborted { message: String },

  /// An operation was dropped before it recorded a result.
  #[error("transform operation aborted: {message}")]
  OperationAborted { message: String },

  /// A dispatched artifact has no entry in the result store.
  #[error("no transformation result was recorded for {artifact}")]
  MissingResult { artifact: ArtifactId },

  /// One or more artifacts failed to transform.
  #[error("{}", describe_failures(.failures))]
  TransformFailures { failures: Vec<ArtifactFailure> },
}

fn describe_failures(failures: &[ArtifactFailure]) -> String {
  let mut message = match failures.len() {
    1 => "failed to transform 1 artifact:".to_string(),
    n => format!("failed to transform {} artifacts:", n),
  };
  for failure in failures {
    let _ = write!(message, "\n  - {}: {}", failure.artifact, failure.error);
  }
  message
}
