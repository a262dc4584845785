//! Artifact resolution errors.

use crate::ArtifactId;

/// Errors raised while locating an artifact's backing file.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactResolveError {
  /// The artifact could not be located or downloaded.
  #[error("could not resolve {artifact}: {message}")]
  NotFound { artifact: ArtifactId, message: String },

  /// Reading the artifact's file failed.
  #[error("failed to read {artifact}")]
  Io {
    artifact: ArtifactId,
    #[source]
    source: std::io::Error,
  },

  /// Resolution aborted with an unexpected fault.
  #[error("unexpected fault resolving {artifact}: {message}")]
  Fault { artifact: ArtifactId, message: String },
}

impl ArtifactResolveError {
  pub fn not_found(artifact: &ArtifactId, message: impl Into<String>) -> Self {
    Self::NotFound {
      artifact: artifact.clone(),
      message: message.into(),
    }
  }

  pub fn fault(artifact: &ArtifactId, message: impl Into<String>) -> Self {
    Self::Fault {
      artifact: artifact.clone(),
      message: message.into(),
    }
  }

  /// The artifact the error is attributed to.
  pub fn artifact(&self) -> &ArtifactId {
    match self {
      Self::NotFound { artifact, .. } => artifact,
      Self::Io { artifact, .. } => artifact,
      Self::Fault { artifact, .. } => artifact,
    }
  }
}
