//! A single step of a transformation chain.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::action::{ActionContext, TransformAction};
use crate::cache::{CachedOutcome, InvocationCache, InvocationKey};
use crate::context::{DependenciesResolver, NodeExecutionContext};
use crate::error::{TransformError, panic_message};
use crate::subject::TransformationSubject;

/// Outcome of running a transformation, or part of one, on a subject.
pub type TransformOutcome = Result<TransformationSubject, Arc<TransformError>>;

/// One step of a [`Transformation`](crate::Transformation): an action plus an
/// optional cache of its previous outcomes.
#[derive(Clone)]
pub struct TransformationStep {
  action: Arc<dyn TransformAction>,
  cache: Option<InvocationCache>,
}

impl TransformationStep {
  pub fn new(action: impl TransformAction + 'static) -> Self {
    Self::from_arc(Arc::new(action))
  }

  pub fn from_arc(action: Arc<dyn TransformAction>) -> Self {
    Self {
      action,
      cache: None,
    }
  }

  /// Record outcomes in, and replay them from, the given cache.
  pub fn with_cache(mut self, cache: InvocationCache) -> Self {
    self.cache = Some(cache);
    self
  }

  pub fn display_name(&self) -> &str {
    self.action.display_name()
  }

  pub fn requires_dependencies(&self) -> bool {
    self.action.requires_dependencies()
  }

  /// A previously recorded outcome for this subject, if the step is cached.
  pub fn cached(&self, subject: &TransformationSubject) -> Option<TransformOutcome> {
    let cache = self.cache.as_ref()?;
    let outcome = cache.get(&self.key(subject))?;
    debug!(step = %self.display_name(), subject = %subject, "step outcome cached");
    Some(outcome.map(|files| subject.derive(self.display_name(), files)))
  }

  /// Run the action over every file of the subject.
  #[instrument(
    name = "transform_step",
    skip_all,
    fields(step = %self.display_name(), subject = %subject)
  )]
  pub fn transform(
    &self,
    subject: &TransformationSubject,
    dependencies: &dyn DependenciesResolver,
    execution: Option<&NodeExecutionContext>,
  ) -> TransformOutcome {
    let outcome = self.run_action(subject, dependencies, execution);
    if let Some(cache) = &self.cache {
      cache.record(self.key(subject), outcome.clone());
    }
    outcome.map(|files| subject.derive(self.display_name(), files))
  }

  fn run_action(
    &self,
    subject: &TransformationSubject,
    dependencies: &dyn DependenciesResolver,
    execution: Option<&NodeExecutionContext>,
  ) -> CachedOutcome {
    let dependency_files = if self.requires_dependencies() {
      dependencies.dependencies_for(self).map_err(|source| {
        Arc::new(TransformError::Dependencies {
          step: self.display_name().to_string(),
          subject: subject.display_name(),
          source,
        })
      })?
    } else {
      Vec::new()
    };

    let ctx = ActionContext {
      artifact: subject.initial_artifact(),
      dependencies: &dependency_files,
      execution,
    };

    let mut outputs = Vec::new();
    for input in subject.files() {
      let result = catch_unwind(AssertUnwindSafe(|| self.action.transform(input, &ctx)))
        .map_err(|payload| TransformError::Panicked {
          step: self.display_name().to_string(),
          subject: subject.display_name(),
          message: panic_message(payload.as_ref()),
        })?
        .map_err(|source| TransformError::Execution {
          step: self.display_name().to_string(),
          subject: subject.display_name(),
          source,
        })?;
      outputs.extend(result);
    }

    if outputs.is_empty() {
      return Err(Arc::new(TransformError::NoOutput {
        step: self.display_name().to_string(),
        subject: subject.display_name(),
      }));
    }

    Ok(outputs)
  }

  fn key(&self, subject: &TransformationSubject) -> InvocationKey {
    InvocationKey::new(self.display_name(), subject.files())
  }
}

impl std::fmt::Debug for TransformationStep {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TransformationStep")
      .field("action", &self.display_name())
      .field("cached", &self.cache.is_some())
      .finish()
  }
}
