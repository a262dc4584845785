//! Transformation results.

use std::path::PathBuf;
use std::sync::Arc;

use lathe_transform::{TransformError, TransformOutcome, TransformationSubject};

/// Terminal outcome of transforming one artifact.
#[derive(Debug, Clone)]
pub enum TransformationResult {
  /// The chain completed and produced this subject.
  Success(TransformationSubject),
  /// Resolving the artifact or running the chain failed.
  Failure(Arc<TransformError>),
}

impl TransformationResult {
  pub fn failure(error: TransformError) -> Self {
    Self::Failure(Arc::new(error))
  }

  pub fn is_success(&self) -> bool {
    matches!(self, Self::Success(_))
  }

  pub fn subject(&self) -> Option<&TransformationSubject> {
    match self {
      Self::Success(subject) => Some(subject),
      Self::Failure(_) => None,
    }
  }

  pub fn error(&self) -> Option<&Arc<TransformError>> {
    match self {
      Self::Success(_) => None,
      Self::Failure(error) => Some(error),
    }
  }

  /// Output files, empty on failure.
  pub fn files(&self) -> &[PathBuf] {
    match self {
      Self::Success(subject) => subject.files(),
      Self::Failure(_) => &[],
    }
  }
}

impl From<TransformOutcome> for TransformationResult {
  fn from(outcome: TransformOutcome) -> Self {
    match outcome {
      Ok(subject) => Self::Success(subject),
      Err(error) => Self::Failure(error),
    }
  }
}
