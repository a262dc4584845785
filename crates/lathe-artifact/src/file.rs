use std::path::{Path, PathBuf};

use crate::{ArtifactId, ArtifactResolveError, ResolvableArtifact};

/// An artifact backed by a file on the local filesystem.
///
/// Resolution only checks that the file exists and is a regular file; nothing
/// is downloaded or copied.
#[derive(Debug, Clone)]
pub struct FileArtifact {
  id: ArtifactId,
  path: PathBuf,
}

impl FileArtifact {
  pub fn new(id: ArtifactId, path: impl Into<PathBuf>) -> Self {
    Self {
      id,
      path: path.into(),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

impl ResolvableArtifact for FileArtifact {
  fn id(&self) -> &ArtifactId {
    &self.id
  }

  fn resolve_file(&self) -> Result<PathBuf, ArtifactResolveError> {
    let metadata = std::fs::metadata(&self.path).map_err(|e| {
      if e.kind() == std::io::ErrorKind::NotFound {
        ArtifactResolveError::not_found(&self.id, format!("{} not found", self.path.display()))
      } else {
        ArtifactResolveError::Io {
          artifact: self.id.clone(),
          source: e,
        }
      }
    })?;

    if !metadata.is_file() {
      return Err(ArtifactResolveError::not_found(
        &self.id,
        format!("{} is not a file", self.path.display()),
      ));
    }

    Ok(self.path.clone())
  }

  fn is_file_available(&self) -> bool {
    self.path.is_file()
  }
}
