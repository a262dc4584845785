use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::step::StepDef;

/// A pipeline: the artifacts to transform and the transformations available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDef {
  pub name: String,
  /// Maximum number of transform operations running at once.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_parallelism: Option<usize>,
  #[serde(default)]
  pub artifacts: Vec<ArtifactDef>,
  pub transformations: Vec<TransformationDef>,
}

/// An artifact backed by a local file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDef {
  /// Component the artifact belongs to, e.g. "org.example:lib:1.0"
  pub component: String,
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub classifier: Option<String>,
  pub extension: String,
  pub path: PathBuf,
}

/// A named chain of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformationDef {
  pub name: String,
  pub steps: Vec<StepDef>,
}

impl PipelineDef {
  /// Parse and validate a pipeline. Paths are left as written.
  pub fn from_json(json: &str) -> Result<Self, ConfigError> {
    let pipeline: PipelineDef = serde_json::from_str(json)?;
    pipeline.validate()?;
    Ok(pipeline)
  }

  /// Load a pipeline file, resolving relative paths against its directory.
  pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let mut pipeline = Self::from_json(&json)?;
    let base = path.parent().unwrap_or_else(|| Path::new(""));
    pipeline.resolve_paths(base);
    Ok(pipeline)
  }

  /// Make every relative path absolute with respect to `base`.
  pub fn resolve_paths(&mut self, base: &Path) {
    for artifact in &mut self.artifacts {
      if artifact.path.is_relative() {
        artifact.path = base.join(&artifact.path);
      }
    }
    for transformation in &mut self.transformations {
      for step in &mut transformation.steps {
        step.resolve_paths(base);
      }
    }
  }

  /// The named transformation, or the first one declared.
  pub fn transformation(&self, name: Option<&str>) -> Result<&TransformationDef, ConfigError> {
    match name {
      Some(name) => self
        .transformations
        .iter()
        .find(|t| t.name == name)
        .ok_or_else(|| ConfigError::UnknownTransformation {
          name: name.to_string(),
        }),
      None => self
        .transformations
        .first()
        .ok_or_else(|| ConfigError::NoTransformations {
          pipeline: self.name.clone(),
        }),
    }
  }

  fn validate(&self) -> Result<(), ConfigError> {
    if self.transformations.is_empty() {
      return Err(ConfigError::NoTransformations {
        pipeline: self.name.clone(),
      });
    }

    let mut seen = HashSet::new();
    for transformation in &self.transformations {
      if transformation.steps.is_empty() {
        return Err(ConfigError::EmptyTransformation {
          name: transformation.name.clone(),
        });
      }
      if !seen.insert(transformation.name.as_str()) {
        return Err(ConfigError::DuplicateTransformation {
          name: transformation.name.clone(),
        });
      }
    }

    Ok(())
  }
}
