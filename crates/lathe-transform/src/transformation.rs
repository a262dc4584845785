use std::fmt;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::context::{DependenciesResolver, NodeExecutionContext};
use crate::invocation::{DeferredInvocation, Invocation};
use crate::step::TransformationStep;
use crate::subject::TransformationSubject;

/// Identity of a [`Transformation`], assigned when the chain is created.
///
/// Two chains with the same display name are still different transformations.
/// Clones share the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransformationId(Uuid);

impl fmt::Display for TransformationId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

/// A named chain of steps converting an artifact into its transformed form.
///
/// Transformations are immutable and shared between every artifact of a
/// dispatch pass.
#[derive(Debug, Clone)]
pub struct Transformation {
  id: TransformationId,
  display_name: String,
  steps: Vec<TransformationStep>,
}

impl Transformation {
  /// Start a chain with its first step.
  pub fn new(display_name: impl Into<String>, first: TransformationStep) -> Self {
    Self {
      id: TransformationId(Uuid::new_v4()),
      display_name: display_name.into(),
      steps: vec![first],
    }
  }

  /// Append a step to the chain.
  pub fn then(mut self, step: TransformationStep) -> Self {
    self.steps.push(step);
    self
  }

  pub fn id(&self) -> TransformationId {
    self.id
  }

  pub fn display_name(&self) -> &str {
    &self.display_name
  }

  pub fn steps(&self) -> &[TransformationStep] {
    &self.steps
  }

  /// Prepare to run the chain on a subject.
  ///
  /// Leading steps whose outcome is already cached are replayed here. If the
  /// whole chain is cached, or a cached step failed, the invocation carries
  /// its result and needs no execution. Otherwise it defers the remaining
  /// steps until [`DeferredInvocation::invoke`] is called. No step runs here.
  pub fn create_invocation(
    self: &Arc<Self>,
    subject: TransformationSubject,
    dependencies: &Arc<dyn DependenciesResolver>,
    execution: Option<&NodeExecutionContext>,
  ) -> Invocation {
    let mut current = subject;
    for (index, step) in self.steps.iter().enumerate() {
      match step.cached(&current) {
        Some(Ok(next)) => current = next,
        Some(Err(failure)) => return Invocation::Cached(Err(failure)),
        None => {
          debug!(
            transformation = %self.display_name,
            subject = %current,
            remaining_steps = self.steps.len() - index,
            "invocation requires execution"
          );
          return Invocation::Deferred(DeferredInvocation::new(
            self.clone(),
            index,
            current,
            dependencies.clone(),
            execution.cloned(),
          ));
        }
      }
    }
    Invocation::Cached(Ok(current))
  }
}

impl fmt::Display for Transformation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.display_name)
  }
}
