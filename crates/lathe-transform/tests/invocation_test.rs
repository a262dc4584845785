//! Integration tests for transformation chains and invocations.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use lathe_artifact::{ArtifactId, FileArtifact, ResolvableArtifact};
use lathe_transform::{
  ActionContext, ActionError, ArtifactDependencies, CopyAction, DependenciesResolver, Invocation,
  InvocationCache, NoDependencies, NodeExecutionContext, TransformAction, TransformError,
  Transformation, TransformationStep, TransformationSubject,
};

/// Maps `x` to `<prefix>/<file name of x>` without touching the filesystem.
struct RenameAction {
  name: String,
  prefix: PathBuf,
  calls: Arc<AtomicUsize>,
}

impl RenameAction {
  fn new(name: &str, prefix: &str) -> (Self, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    (
      Self {
        name: name.to_string(),
        prefix: PathBuf::from(prefix),
        calls: calls.clone(),
      },
      calls,
    )
  }
}

impl TransformAction for RenameAction {
  fn display_name(&self) -> &str {
    &self.name
  }

  fn transform(&self, input: &Path, _ctx: &ActionContext<'_>) -> Result<Vec<PathBuf>, ActionError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    Ok(vec![self.prefix.join(input.file_stem().unwrap())])
  }
}

struct FailingAction;

impl TransformAction for FailingAction {
  fn display_name(&self) -> &str {
    "explode"
  }

  fn transform(&self, _input: &Path, _ctx: &ActionContext<'_>) -> Result<Vec<PathBuf>, ActionError> {
    Err(ActionError::failed("corrupt archive"))
  }
}

struct PanickingAction;

impl TransformAction for PanickingAction {
  fn display_name(&self) -> &str {
    "panic"
  }

  fn transform(&self, _input: &Path, _ctx: &ActionContext<'_>) -> Result<Vec<PathBuf>, ActionError> {
    panic!("index out of bounds");
  }
}

struct EmptyAction;

impl TransformAction for EmptyAction {
  fn display_name(&self) -> &str {
    "filter"
  }

  fn transform(&self, _input: &Path, _ctx: &ActionContext<'_>) -> Result<Vec<PathBuf>, ActionError> {
    Ok(Vec::new())
  }
}

/// Emits the dependency files it was given, plus the execution id if any.
struct DependencyEchoAction;

impl TransformAction for DependencyEchoAction {
  fn display_name(&self) -> &str {
    "link"
  }

  fn requires_dependencies(&self) -> bool {
    true
  }

  fn transform(&self, _input: &Path, ctx: &ActionContext<'_>) -> Result<Vec<PathBuf>, ActionError> {
    let mut outputs = ctx.dependencies.to_vec();
    if let Some(execution) = ctx.execution {
      outputs.push(PathBuf::from(&execution.execution_id));
    }
    Ok(outputs)
  }
}

fn a1() -> ArtifactId {
  ArtifactId::new("org.example:a1:1.0", "a1", "jar")
}

fn subject() -> TransformationSubject {
  TransformationSubject::initial(a1(), "/tmp/a1.jar")
}

fn no_dependencies() -> Arc<dyn DependenciesResolver> {
  Arc::new(NoDependencies)
}

#[test]
fn test_uncached_invocation_is_deferred() {
  let (unzip, calls) = RenameAction::new("unzip", "classes");
  let transformation = Arc::new(Transformation::new("T", TransformationStep::new(unzip)));

  let invocation = transformation.create_invocation(subject(), &no_dependencies(), None);

  assert!(invocation.cached_result().is_none());
  assert_eq!(calls.load(Ordering::SeqCst), 0, "creating an invocation must not run steps");

  let result = invocation.invoke().unwrap();
  assert_eq!(result.files(), &[PathBuf::from("classes/a1")]);
  assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_chain_runs_steps_in_order() {
  let (unzip, _) = RenameAction::new("unzip", "classes");
  let (instrument, _) = RenameAction::new("instrument", "instrumented");
  let transformation = Arc::new(
    Transformation::new("T", TransformationStep::new(unzip)).then(TransformationStep::new(instrument)),
  );

  let result = transformation
    .create_invocation(subject(), &no_dependencies(), None)
    .invoke()
    .unwrap();

  assert_eq!(result.files(), &[PathBuf::from("instrumented/a1")]);
  assert_eq!(result.producer_steps(), &["unzip", "instrument"]);
}

#[test]
fn test_fully_cached_chain_short_circuits() {
  let cache = InvocationCache::new();
  let (unzip, calls) = RenameAction::new("unzip", "classes");
  let transformation = Arc::new(Transformation::new(
    "T",
    TransformationStep::new(unzip).with_cache(cache.clone()),
  ));

  transformation
    .create_invocation(subject(), &no_dependencies(), None)
    .invoke()
    .unwrap();

  let second = transformation.create_invocation(subject(), &no_dependencies(), None);
  let cached = second.cached_result().expect("chain should be cached");
  assert_eq!(cached.as_ref().unwrap().files(), &[PathBuf::from("classes/a1")]);
  assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_partially_cached_chain_resumes_after_cached_steps() {
  let cache = InvocationCache::new();
  let (unzip, unzip_calls) = RenameAction::new("unzip", "classes");
  let (instrument, instrument_calls) = RenameAction::new("instrument", "instrumented");
  let transformation = Arc::new(
    Transformation::new("T", TransformationStep::new(unzip).with_cache(cache.clone()))
      .then(TransformationStep::new(instrument)),
  );

  transformation
    .create_invocation(subject(), &no_dependencies(), None)
    .invoke()
    .unwrap();

  let Invocation::Deferred(deferred) =
    transformation.create_invocation(subject(), &no_dependencies(), None)
  else {
    panic!("second step is not cached");
  };
  assert_eq!(deferred.remaining_steps(), 1);
  assert_eq!(deferred.subject().files(), &[PathBuf::from("classes/a1")]);

  deferred.invoke().unwrap();
  assert_eq!(unzip_calls.load(Ordering::SeqCst), 1);
  assert_eq!(instrument_calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_cached_failure_is_replayed() {
  let cache = InvocationCache::new();
  let transformation = Arc::new(Transformation::new(
    "T",
    TransformationStep::new(FailingAction).with_cache(cache.clone()),
  ));

  let first = transformation
    .create_invocation(subject(), &no_dependencies(), None)
    .invoke()
    .unwrap_err();

  let second = transformation.create_invocation(subject(), &no_dependencies(), None);
  let replayed = second.cached_result().unwrap().as_ref().unwrap_err();
  assert!(Arc::ptr_eq(&first, replayed));
}

#[test]
fn test_action_failure_is_execution_error() {
  let transformation = Arc::new(Transformation::new("T", TransformationStep::new(FailingAction)));

  let err = transformation
    .create_invocation(subject(), &no_dependencies(), None)
    .invoke()
    .unwrap_err();

  match err.as_ref() {
    TransformError::Execution { step, source, .. } => {
      assert_eq!(step, "explode");
      assert_eq!(source.to_string(), "corrupt archive");
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn test_failure_stops_the_chain() {
  let (instrument, calls) = RenameAction::new("instrument", "instrumented");
  let transformation = Arc::new(
    Transformation::new("T", TransformationStep::new(FailingAction))
      .then(TransformationStep::new(instrument)),
  );

  assert!(
    transformation
      .create_invocation(subject(), &no_dependencies(), None)
      .invoke()
      .is_err()
  );
  assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_panicking_action_becomes_failure() {
  let transformation = Arc::new(Transformation::new("T", TransformationStep::new(PanickingAction)));

  let err = transformation
    .create_invocation(subject(), &no_dependencies(), None)
    .invoke()
    .unwrap_err();

  match err.as_ref() {
    TransformError::Panicked { message, .. } => assert_eq!(message, "index out of bounds"),
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn test_empty_output_is_failure() {
  let transformation = Arc::new(Transformation::new("T", TransformationStep::new(EmptyAction)));

  let err = transformation
    .create_invocation(subject(), &no_dependencies(), None)
    .invoke()
    .unwrap_err();

  assert!(matches!(err.as_ref(), TransformError::NoOutput { .. }));
}

#[test]
fn test_dependencies_and_execution_context_reach_the_action() {
  let dir = tempfile::tempdir().unwrap();
  let dep_path = dir.path().join("dep.jar");
  std::fs::write(&dep_path, b"dep").unwrap();

  let dependency: Arc<dyn ResolvableArtifact> = Arc::new(FileArtifact::new(
    ArtifactId::new("org.example:dep:1.0", "dep", "jar"),
    &dep_path,
  ));
  let dependencies: Arc<dyn DependenciesResolver> =
    Arc::new(ArtifactDependencies::new(vec![dependency]));
  let execution = NodeExecutionContext::new("exec-1");

  let transformation = Arc::new(Transformation::new(
    "T",
    TransformationStep::new(DependencyEchoAction),
  ));
  let result = transformation
    .create_invocation(subject(), &dependencies, Some(&execution))
    .invoke()
    .unwrap();

  assert_eq!(result.files(), &[dep_path, PathBuf::from("exec-1")]);
}

#[test]
fn test_unresolvable_dependency_is_failure() {
  let dir = tempfile::tempdir().unwrap();
  let dependency: Arc<dyn ResolvableArtifact> = Arc::new(FileArtifact::new(
    ArtifactId::new("org.example:dep:1.0", "dep", "jar"),
    dir.path().join("missing.jar"),
  ));
  let dependencies: Arc<dyn DependenciesResolver> =
    Arc::new(ArtifactDependencies::new(vec![dependency]));

  let transformation = Arc::new(Transformation::new(
    "T",
    TransformationStep::new(DependencyEchoAction),
  ));
  let err = transformation
    .create_invocation(subject(), &dependencies, None)
    .invoke()
    .unwrap_err();

  assert!(matches!(err.as_ref(), TransformError::Dependencies { .. }));
}

#[test]
fn test_copy_chain_on_real_files() {
  let dir = tempfile::tempdir().unwrap();
  let input = dir.path().join("a1.jar");
  std::fs::write(&input, b"jar").unwrap();

  let transformation = Arc::new(Transformation::new(
    "classes",
    TransformationStep::new(CopyAction::new(dir.path().join("classes"))),
  ));
  let subject = TransformationSubject::initial(a1(), &input);
  let result = transformation
    .create_invocation(subject, &no_dependencies(), None)
    .invoke()
    .unwrap();

  assert_eq!(
    result.files(),
    &[dir.path().join("classes").join(a1().output_path()).join("a1.jar")]
  );
  assert!(result.files()[0].is_file());
}
