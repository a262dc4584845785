//! Lathe Artifact
//!
//! This crate provides the artifact side of the transform engine: the identity
//! assigned to every resolved artifact, the [`ResolvableArtifact`] trait used to
//! obtain an artifact's backing file, and the visitor protocol through which an
//! [`ArtifactSet`] announces artifacts to an [`ArtifactListener`].
//!
//! Dependency resolution itself happens elsewhere. By the time an artifact
//! reaches this crate it already has a stable [`ArtifactId`]; only its file may
//! still need to be located.

mod error;
mod file;
mod id;
mod set;

pub use error::ArtifactResolveError;
pub use file::FileArtifact;
pub use id::ArtifactId;
pub use set::{ArtifactListener, ArtifactSet, FileCollectionSource, VisitType};

use std::path::PathBuf;

/// An artifact produced by dependency resolution whose file can be obtained on demand.
///
/// Resolving the file may be expensive (a download, an extraction), so callers
/// only do it when they actually need the bytes.
pub trait ResolvableArtifact: Send + Sync {
  /// The identity assigned by the resolution graph.
  fn id(&self) -> &ArtifactId;

  /// Locate the artifact's backing file.
  fn resolve_file(&self) -> Result<PathBuf, ArtifactResolveError>;

  /// Whether the file is already available without further resolution work.
  fn is_file_available(&self) -> bool {
    true
  }
}
