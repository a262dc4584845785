use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Identity of a resolved artifact: the owning component plus the file coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactId {
  pub component: String,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub classifier: Option<String>,
  pub extension: String,
}

impl ArtifactId {
  pub fn new(
    component: impl Into<String>,
    name: impl Into<String>,
    extension: impl Into<String>,
  ) -> Self {
    Self {
      component: component.into(),
      name: name.into(),
      classifier: None,
      extension: extension.into(),
    }
  }

  pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
    self.classifier = Some(classifier.into());
    self
  }

  /// File name the artifact is published under, e.g. `lib-sources.jar`.
  pub fn file_name(&self) -> String {
    match &self.classifier {
      Some(classifier) => format!("{}-{}.{}", self.name, classifier, self.extension),
      None => format!("{}.{}", self.name, self.extension),
    }
  }

  /// Relative directory unique to this artifact, for laying out its outputs.
  ///
  /// Each `:`-separated part of the component becomes a directory, followed
  /// by the file name, e.g. `org.example/lib/1.0/lib-sources.jar`.
  pub fn output_path(&self) -> PathBuf {
    self
      .component
      .split(':')
      .chain(std::iter::once(self.file_name().as_str()))
      .map(path_segment)
      .collect()
  }
}

/// A single path component; separators and dot-only names are replaced.
fn path_segment(raw: &str) -> String {
  let segment: String = raw
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '+') {
        c
      } else {
        '_'
      }
    })
    .collect();
  if segment.is_empty() || segment.chars().all(|c| c == '.') {
    segment.replace('.', "_") + "_"
  } else {
    segment
  }
}

impl fmt::Display for ArtifactId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({})", self.file_name(), self.component)
  }
}
