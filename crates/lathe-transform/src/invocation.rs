//! Invocations of a transformation on one subject.

use std::sync::Arc;

use crate::context::{DependenciesResolver, NodeExecutionContext};
use crate::step::TransformOutcome;
use crate::subject::TransformationSubject;
use crate::transformation::Transformation;

/// Running one transformation on one subject.
///
/// Created by [`Transformation::create_invocation`]. Either the outcome is
/// already known from the invocation cache, or the remaining steps still have
/// to be executed.
pub enum Invocation {
  /// Every step was answered from the cache, or a cached step failed.
  Cached(TransformOutcome),
  /// At least one step has to run.
  Deferred(DeferredInvocation),
}

impl Invocation {
  /// The already-known outcome, if no execution is needed.
  pub fn cached_result(&self) -> Option<&TransformOutcome> {
    match self {
      Self::Cached(outcome) => Some(outcome),
      Self::Deferred(_) => None,
    }
  }

  /// Produce the outcome, running any remaining steps on the calling thread.
  pub fn invoke(self) -> TransformOutcome {
    match self {
      Self::Cached(outcome) => outcome,
      Self::Deferred(deferred) => deferred.invoke(),
    }
  }
}

/// The steps of a transformation that still have to run on a subject.
pub struct DeferredInvocation {
  transformation: Arc<Transformation>,
  next_step: usize,
  subject: TransformationSubject,
  dependencies: Arc<dyn DependenciesResolver>,
  execution: Option<NodeExecutionContext>,
}

impl DeferredInvocation {
  pub(crate) fn new(
    transformation: Arc<Transformation>,
    next_step: usize,
    subject: TransformationSubject,
    dependencies: Arc<dyn DependenciesResolver>,
    execution: Option<NodeExecutionContext>,
  ) -> Self {
    Self {
      transformation,
      next_step,
      subject,
      dependencies,
      execution,
    }
  }

  pub fn transformation(&self) -> &Transformation {
    &self.transformation
  }

  /// The subject the first remaining step will receive.
  pub fn subject(&self) -> &TransformationSubject {
    &self.subject
  }

  pub fn remaining_steps(&self) -> usize {
    self.transformation.steps().len() - self.next_step
  }

  /// Run the remaining steps in order, stopping at the first failure.
  pub fn invoke(self) -> TransformOutcome {
    let mut current = self.subject;
    for step in &self.transformation.steps()[self.next_step..] {
      current = step.transform(&current, self.dependencies.as_ref(), self.execution.as_ref())?;
    }
    Ok(current)
  }
}

impl std::fmt::Debug for Invocation {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Cached(outcome) => f.debug_tuple("Cached").field(outcome).finish(),
      Self::Deferred(deferred) => f
        .debug_struct("Deferred")
        .field("transformation", &deferred.transformation.display_name())
        .field("subject", &deferred.subject)
        .field("remaining_steps", &deferred.remaining_steps())
        .finish(),
    }
  }
}
