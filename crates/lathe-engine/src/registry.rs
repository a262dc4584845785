//! Lookup of transformations already executed elsewhere in the build graph.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use lathe_artifact::ArtifactId;
use lathe_transform::{TransformOutcome, Transformation, TransformationId};

/// A build graph node that already applied a transformation to an artifact.
#[derive(Debug)]
pub struct TransformationNode {
  artifact: ArtifactId,
  transformation_id: TransformationId,
  transformation: String,
  transformed_subject: TransformOutcome,
}

impl TransformationNode {
  pub fn executed(
    artifact: ArtifactId,
    transformation: &Transformation,
    transformed_subject: TransformOutcome,
  ) -> Self {
    Self {
      artifact,
      transformation_id: transformation.id(),
      transformation: transformation.display_name().to_string(),
      transformed_subject,
    }
  }

  pub fn artifact(&self) -> &ArtifactId {
    &self.artifact
  }

  pub fn transformation_id(&self) -> TransformationId {
    self.transformation_id
  }

  /// Display name of the transformation the node applied.
  pub fn transformation(&self) -> &str {
    &self.transformation
  }

  /// What the node produced: the transformed subject or the failure it recorded.
  pub fn transformed_subject(&self) -> &TransformOutcome {
    &self.transformed_subject
  }
}

/// Answers whether a (artifact, transformation) pair already ran in this execution.
pub trait TransformationNodeRegistry: Send + Sync {
  fn lookup_executed(
    &self,
    artifact: &ArtifactId,
    transformation: &Transformation,
  ) -> Option<Arc<TransformationNode>>;
}

/// Registry backed by an in-memory map, keyed by artifact and transformation identity.
#[derive(Default)]
pub struct InMemoryNodeRegistry {
  nodes: RwLock<HashMap<(ArtifactId, TransformationId), Arc<TransformationNode>>>,
}

impl InMemoryNodeRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record a node as executed. A later node for the same pair replaces it.
  pub fn register_executed(&self, node: TransformationNode) -> Arc<TransformationNode> {
    let node = Arc::new(node);
    let key = (node.artifact.clone(), node.transformation_id);
    let mut nodes = self.nodes.write().unwrap_or_else(|e| e.into_inner());
    nodes.insert(key, node.clone());
    node
  }

  pub fn len(&self) -> usize {
    self.nodes.read().unwrap_or_else(|e| e.into_inner()).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

impl TransformationNodeRegistry for InMemoryNodeRegistry {
  fn lookup_executed(
    &self,
    artifact: &ArtifactId,
    transformation: &Transformation,
  ) -> Option<Arc<TransformationNode>> {
    let nodes = self.nodes.read().unwrap_or_else(|e| e.into_inner());
    nodes
      .get(&(artifact.clone(), transformation.id()))
      .cloned()
  }
}
