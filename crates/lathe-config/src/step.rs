use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A step of a transformation chain.
///
/// `output_dir` may be omitted, in which case the consumer picks a location
/// for the step's outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepDef {
  /// Copy each input file into `output_dir`.
  Copy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output_dir: Option<PathBuf>,
  },
  /// Copy each input file into `output_dir` under a new extension.
  ChangeExtension {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output_dir: Option<PathBuf>,
    extension: String,
  },
}

impl StepDef {
  pub fn name(&self) -> Option<&str> {
    match self {
      Self::Copy { name, .. } | Self::ChangeExtension { name, .. } => name.as_deref(),
    }
  }

  pub fn output_dir(&self) -> Option<&Path> {
    match self {
      Self::Copy { output_dir, .. } | Self::ChangeExtension { output_dir, .. } => {
        output_dir.as_deref()
      }
    }
  }

  pub(crate) fn resolve_paths(&mut self, base: &Path) {
    match self {
      Self::Copy { output_dir, .. } | Self::ChangeExtension { output_dir, .. } => {
        if let Some(dir) = output_dir
          && dir.is_relative()
        {
          *dir = base.join(&*dir);
        }
      }
    }
  }
}
