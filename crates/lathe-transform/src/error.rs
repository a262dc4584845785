//! Transformation errors.

use std::any::Any;

use lathe_artifact::ArtifactResolveError;

/// Context recorded on resolution failures raised while preparing a transform.
pub const ARTIFACT_TRANSFORM_CONTEXT: &str = "artifact transform";

/// Errors reported by a [`TransformAction`](crate::TransformAction).
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("{0}")]
  Failed(String),
}

impl ActionError {
  pub fn failed(message: impl Into<String>) -> Self {
    Self::Failed(message.into())
  }
}

/// Errors recorded as the failure outcome of a transformation.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
  /// The artifact's file could not be obtained, so nothing was transformed.
  #[error("could not resolve files for {transformation} ({context}): {source}")]
  ArtifactResolution {
    transformation: String,
    context: &'static str,
    #[source]
    source: ArtifactResolveError,
  },

  /// A step's action failed.
  #[error("execution failed for {step} on {subject}: {source}")]
  Execution {
    step: String,
    subject: String,
    #[source]
    source: ActionError,
  },

  /// A step completed without producing any file.
  #[error("{step} produced no output for {subject}")]
  NoOutput { step: String, subject: String },

  /// A step panicked.
  #[error("{step} panicked while transforming {subject}: {message}")]
  Panicked {
    step: String,
    subject: String,
    message: String,
  },

  /// Upstream dependencies required by a step could not be resolved.
  #[error("could not resolve dependencies of {step} for {subject}: {source}")]
  Dependencies {
    step: String,
    subject: String,
    #[source]
    source: ArtifactResolveError,
  },
}

impl TransformError {
  pub fn artifact_resolution(transformation: impl Into<String>, source: ArtifactResolveError) -> Self {
    Self::ArtifactResolution {
      transformation: transformation.into(),
      context: ARTIFACT_TRANSFORM_CONTEXT,
      source,
    }
  }
}

/// Extract a readable message from a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(message) = payload.downcast_ref::<&str>() {
    message.to_string()
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else {
    "unknown panic".to_string()
  }
}
