//! Transform actions and the built-in file actions.

use std::path::{Path, PathBuf};

use lathe_artifact::ArtifactId;

use crate::context::NodeExecutionContext;
use crate::error::ActionError;

/// Inputs available to an action beyond the file it transforms.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
  /// The artifact whose subject is being transformed.
  pub artifact: &'a ArtifactId,
  /// Upstream dependency files. Empty unless the action requires dependencies.
  pub dependencies: &'a [PathBuf],
  /// The node the transformation runs for, if any.
  pub execution: Option<&'a NodeExecutionContext>,
}

/// The work done by one step of a transformation.
///
/// An action is called once per input file and returns the files it produced.
/// Actions may be called concurrently for different inputs.
pub trait TransformAction: Send + Sync {
  /// Name used in diagnostics and as the step's cache identity.
  fn display_name(&self) -> &str;

  /// Whether the action needs the artifact's upstream dependency files.
  fn requires_dependencies(&self) -> bool {
    false
  }

  fn transform(&self, input: &Path, ctx: &ActionContext<'_>) -> Result<Vec<PathBuf>, ActionError>;
}

/// Copies each input file into an output directory.
///
/// Outputs are laid out per artifact, under
/// [`ArtifactId::output_path`], so artifacts sharing a file name do not
/// overwrite each other.
#[derive(Debug, Clone)]
pub struct CopyAction {
  name: String,
  output_dir: PathBuf,
}

impl CopyAction {
  pub fn new(output_dir: impl Into<PathBuf>) -> Self {
    let output_dir = output_dir.into();
    Self {
      name: format!("copy to {}", output_dir.display()),
      output_dir,
    }
  }

  pub fn named(mut self, name: impl Into<String>) -> Self {
    self.name = name.into();
    self
  }
}

impl TransformAction for CopyAction {
  fn display_name(&self) -> &str {
    &self.name
  }

  fn transform(&self, input: &Path, ctx: &ActionContext<'_>) -> Result<Vec<PathBuf>, ActionError> {
    let file_name = input
      .file_name()
      .ok_or_else(|| ActionError::failed(format!("{} has no file name", input.display())))?;
    let output = self
      .output_dir
      .join(ctx.artifact.output_path())
      .join(file_name);
    copy_file(input, &output)?;
    Ok(vec![output])
  }
}

/// Copies each input file into an output directory under a new extension.
///
/// Only the last extension is replaced: `lib-1.0.jar` becomes `lib-1.0.cls`.
/// Outputs are laid out per artifact, like [`CopyAction`].
#[derive(Debug, Clone)]
pub struct ChangeExtensionAction {
  name: String,
  output_dir: PathBuf,
  extension: String,
}

impl ChangeExtensionAction {
  pub fn new(output_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
    let output_dir = output_dir.into();
    let extension = extension.into();
    Self {
      name: format!("change extension to .{} in {}", extension, output_dir.display()),
      output_dir,
      extension,
    }
  }

  pub fn named(mut self, name: impl Into<String>) -> Self {
    self.name = name.into();
    self
  }
}

impl TransformAction for ChangeExtensionAction {
  fn display_name(&self) -> &str {
    &self.name
  }

  fn transform(&self, input: &Path, ctx: &ActionContext<'_>) -> Result<Vec<PathBuf>, ActionError> {
    let stem = input
      .file_stem()
      .ok_or_else(|| ActionError::failed(format!("{} has no file name", input.display())))?;
    let output = self
      .output_dir
      .join(ctx.artifact.output_path())
      .join(format!("{}.{}", stem.to_string_lossy(), self.extension));
    copy_file(input, &output)?;
    Ok(vec![output])
  }
}

fn copy_file(input: &Path, output: &Path) -> Result<(), ActionError> {
  if let Some(parent) = output.parent() {
    std::fs::create_dir_all(parent)?;
  }
  std::fs::copy(input, output)?;
  Ok(())
}
