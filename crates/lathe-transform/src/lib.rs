//! Transformation chains for lathe.
//!
//! A [`Transformation`] is a named chain of [`TransformationStep`]s, each
//! wrapping a [`TransformAction`]. Applying a transformation to an artifact
//! goes through an [`Invocation`]:
//!
//! ```text
//! Transformation::create_invocation(subject, dependencies, execution)
//! ├── Invocation::Cached(outcome)      every step answered by the InvocationCache
//! └── Invocation::Deferred(deferred)   remaining steps run by deferred.invoke()
//! ```
//!
//! Creating an invocation never runs a step, so callers can decide where the
//! work happens.
//!
//! # Usage
//!
//! ```ignore
//! let cache = InvocationCache::new();
//! let transformation = Arc::new(
//!   Transformation::new("classes", TransformationStep::new(CopyAction::new("out/classes")).with_cache(cache.clone()))
//!     .then(TransformationStep::new(ChangeExtensionAction::new("out/instrumented", "cls"))),
//! );
//!
//! let subject = TransformationSubject::initial(artifact_id, "/tmp/a1.jar");
//! let dependencies: Arc<dyn DependenciesResolver> = Arc::new(NoDependencies);
//! let outcome = transformation.create_invocation(subject, &dependencies, None).invoke();
//! ```

mod action;
mod cache;
mod context;
mod error;
mod invocation;
mod step;
mod subject;
mod transformation;

pub use action::{ActionContext, ChangeExtensionAction, CopyAction, TransformAction};
pub use cache::{CachedOutcome, InvocationCache, InvocationKey};
pub use context::{ArtifactDependencies, DependenciesResolver, NoDependencies, NodeExecutionContext};
pub use error::{ARTIFACT_TRANSFORM_CONTEXT, ActionError, TransformError, panic_message};
pub use invocation::{DeferredInvocation, Invocation};
pub use step::{TransformOutcome, TransformationStep};
pub use subject::TransformationSubject;
pub use transformation::{Transformation, TransformationId};
