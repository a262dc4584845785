//! Dispatch events and notifiers for observability.
//!
//! Events are emitted as artifacts reach their terminal state so consumers
//! can report progress, persist outcomes, stream them to a UI, etc.

use std::path::PathBuf;

use lathe_artifact::ArtifactId;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted while dispatching and running transformations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransformEvent {
  /// The result was taken from a node that already ran the transformation.
  DedupHit {
    artifact: ArtifactId,
    transformation: String,
  },

  /// The artifact's file could not be resolved.
  ResolutionFailed {
    artifact: ArtifactId,
    transformation: String,
    error: String,
  },

  /// The invocation was answered from the cache.
  CacheHit {
    artifact: ArtifactId,
    transformation: String,
    success: bool,
  },

  /// A transform operation was submitted for the artifact.
  Scheduled { artifact: ArtifactId, operation: String },

  /// A transform operation completed successfully.
  Completed {
    artifact: ArtifactId,
    operation: String,
    files: Vec<PathBuf>,
  },

  /// A transform operation failed.
  Failed {
    artifact: ArtifactId,
    operation: String,
    error: String,
  },
}

impl TransformEvent {
  pub fn artifact(&self) -> &ArtifactId {
    match self {
      Self::DedupHit { artifact, .. }
      | Self::ResolutionFailed { artifact, .. }
      | Self::CacheHit { artifact, .. }
      | Self::Scheduled { artifact, .. }
      | Self::Completed { artifact, .. }
      | Self::Failed { artifact, .. } => artifact,
    }
  }

  /// Whether this event records the artifact's final result.
  pub fn is_terminal(&self) -> bool {
    !matches!(self, Self::Scheduled { .. })
  }
}

/// Trait for receiving transform events.
///
/// Called from the dispatching thread and from operation worker threads.
pub trait TransformNotifier: Send + Sync {
  fn notify(&self, event: TransformEvent);
}

/// A no-op notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl TransformNotifier for NoopNotifier {
  fn notify(&self, _event: TransformEvent) {}
}

/// A notifier that sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded so a slow consumer never stalls dispatch; one or two events per artifact.
  sender: mpsc::UnboundedSender<TransformEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<TransformEvent>) -> Self {
    Self { sender }
  }
}

impl TransformNotifier for ChannelNotifier {
  fn notify(&self, event: TransformEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
