//! The artifact visitor protocol.
//!
//! An [`ArtifactSet`] is the output of dependency resolution for one file
//! collection. Consumers do not iterate it directly; they hand it an
//! [`ArtifactListener`] which is first asked how the set should be visited and
//! then told about each artifact as it becomes available.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::ResolvableArtifact;

/// Describes the file collection an artifact set was resolved for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCollectionSource {
  pub display_name: String,
}

impl FileCollectionSource {
  pub fn new(display_name: impl Into<String>) -> Self {
    Self {
      display_name: display_name.into(),
    }
  }
}

impl fmt::Display for FileCollectionSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.display_name)
  }
}

/// How a listener wants a file collection to be visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitType {
  /// Announce every artifact in the collection.
  Visit,
  /// Only the collection's description is needed; skip its artifacts.
  DescriptionOnly,
  /// Skip the collection entirely.
  NoContents,
}

/// Receives artifacts from an [`ArtifactSet`].
///
/// `artifact_available` may be called from several threads at once when the
/// set is visited concurrently.
pub trait ArtifactListener: Send + Sync {
  /// Called once per visit, before any artifact is announced.
  fn prepare_for_visit(&self, source: &FileCollectionSource) -> VisitType;

  /// Whether artifacts must have their files available to be announced.
  ///
  /// Listeners that answer `false` are only told about artifacts whose file
  /// is already local.
  fn require_artifact_files(&self) -> bool;

  /// Called for each artifact in the set.
  fn artifact_available(&self, artifact: &dyn ResolvableArtifact);
}

/// An ordered set of resolved artifacts.
#[derive(Clone)]
pub struct ArtifactSet {
  source: FileCollectionSource,
  artifacts: Vec<Arc<dyn ResolvableArtifact>>,
}

impl ArtifactSet {
  /// Create a set. Each identity appears once; later duplicates are dropped.
  pub fn new(source: FileCollectionSource, artifacts: Vec<Arc<dyn ResolvableArtifact>>) -> Self {
    let mut seen = HashSet::with_capacity(artifacts.len());
    let artifacts = artifacts
      .into_iter()
      .filter(|artifact| {
        let first = seen.insert(artifact.id().clone());
        if !first {
          debug!(source = %source, artifact = %artifact.id(), "dropping duplicate artifact");
        }
        first
      })
      .collect();
    Self { source, artifacts }
  }

  pub fn source(&self) -> &FileCollectionSource {
    &self.source
  }

  pub fn artifacts(&self) -> &[Arc<dyn ResolvableArtifact>] {
    &self.artifacts
  }

  pub fn len(&self) -> usize {
    self.artifacts.len()
  }

  pub fn is_empty(&self) -> bool {
    self.artifacts.is_empty()
  }

  /// Announce artifacts to the listener in order.
  ///
  /// Returns the number of artifacts announced.
  pub fn visit(&self, listener: &dyn ArtifactListener) -> usize {
    let Some(require_files) = self.begin_visit(listener) else {
      return 0;
    };

    let mut announced = 0;
    for artifact in &self.artifacts {
      if announce(artifact.as_ref(), listener, require_files) {
        announced += 1;
      }
    }
    announced
  }

  /// Announce artifacts to the listener from up to `threads` threads.
  ///
  /// Artifacts are split into contiguous chunks, one per thread. Returns once
  /// every artifact has been announced.
  pub fn visit_concurrently(&self, listener: &dyn ArtifactListener, threads: usize) -> usize {
    let Some(require_files) = self.begin_visit(listener) else {
      return 0;
    };
    if self.artifacts.is_empty() {
      return 0;
    }

    let threads = threads.clamp(1, self.artifacts.len());
    let chunk_size = self.artifacts.len().div_ceil(threads);

    std::thread::scope(|scope| {
      let handles: Vec<_> = self
        .artifacts
        .chunks(chunk_size)
        .map(|chunk| {
          scope.spawn(move || {
            chunk
              .iter()
              .filter(|&artifact| announce(artifact.as_ref(), listener, require_files))
              .count()
          })
        })
        .collect();

      handles
        .into_iter()
        .map(|handle| handle.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
        .sum()
    })
  }

  /// Returns whether artifact files are required, or `None` when the
  /// listener skipped the collection.
  fn begin_visit(&self, listener: &dyn ArtifactListener) -> Option<bool> {
    match listener.prepare_for_visit(&self.source) {
      VisitType::Visit => Some(listener.require_artifact_files()),
      visit_type => {
        debug!(source = %self.source, ?visit_type, "skipping artifact contents");
        None
      }
    }
  }
}

impl fmt::Debug for ArtifactSet {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ArtifactSet")
      .field("source", &self.source)
      .field(
        "artifacts",
        &self.artifacts.iter().map(|a| a.id()).collect::<Vec<_>>(),
      )
      .finish()
  }
}

fn announce(
  artifact: &dyn ResolvableArtifact,
  listener: &dyn ArtifactListener,
  require_files: bool,
) -> bool {
  if !require_files && !artifact.is_file_available() {
    debug!(artifact = %artifact.id(), "artifact file not available, skipping");
    return false;
  }
  listener.artifact_available(artifact);
  true
}
