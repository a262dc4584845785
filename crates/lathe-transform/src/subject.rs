use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use lathe_artifact::ArtifactId;

/// The files flowing through a transformation chain, plus where they came from.
///
/// Subjects are immutable. Each completed step produces a new subject via
/// [`derive`](Self::derive); the original is left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformationSubject {
  initial_artifact: ArtifactId,
  files: Arc<[PathBuf]>,
  producer_steps: Arc<[String]>,
}

impl TransformationSubject {
  /// The raw file of an artifact, before any step has run.
  pub fn initial(artifact: ArtifactId, file: impl Into<PathBuf>) -> Self {
    Self {
      initial_artifact: artifact,
      files: Arc::from(vec![file.into()]),
      producer_steps: Arc::from(Vec::new()),
    }
  }

  /// A new subject holding the output of `step`.
  pub fn derive(&self, step: impl Into<String>, files: Vec<PathBuf>) -> Self {
    let mut producer_steps = self.producer_steps.to_vec();
    producer_steps.push(step.into());
    Self {
      initial_artifact: self.initial_artifact.clone(),
      files: Arc::from(files),
      producer_steps: Arc::from(producer_steps),
    }
  }

  pub fn initial_artifact(&self) -> &ArtifactId {
    &self.initial_artifact
  }

  pub fn files(&self) -> &[PathBuf] {
    &self.files
  }

  /// Steps that produced this subject, oldest first.
  pub fn producer_steps(&self) -> &[String] {
    &self.producer_steps
  }

  pub fn is_initial(&self) -> bool {
    self.producer_steps.is_empty()
  }

  pub fn contains(&self, file: &Path) -> bool {
    self.files.iter().any(|f| f == file)
  }

  pub fn display_name(&self) -> String {
    self.to_string()
  }
}

impl fmt::Display for TransformationSubject {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.producer_steps.is_empty() {
      write!(f, "{}", self.initial_artifact)
    } else {
      write!(
        f,
        "{} transformed by {}",
        self.initial_artifact,
        self.producer_steps.join(", ")
      )
    }
  }
}
