//! End-to-end transform passes over files on disk.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lathe_artifact::{
  ArtifactId, ArtifactResolveError, ArtifactSet, FileArtifact, FileCollectionSource,
  ResolvableArtifact,
};
use lathe_engine::{
  ChannelNotifier, EngineConfig, EngineError, InMemoryNodeRegistry, TransformEvent, TransformPass,
  TransformationNode,
};
use lathe_transform::{
  ChangeExtensionAction, CopyAction, InvocationCache, NodeExecutionContext, TransformError,
  Transformation, TransformationStep, TransformationSubject,
};
use tempfile::TempDir;
use tokio::sync::mpsc;

fn id(name: &str) -> ArtifactId {
  ArtifactId::new(format!("org.example:{name}:1.0"), name, "jar")
}

/// Where the rename step leaves an artifact's classes.
fn classes_of(out: &Path, name: &str) -> PathBuf {
  out
    .join("classes")
    .join(id(name).output_path())
    .join(format!("{name}.classes"))
}

fn write_jar(dir: &Path, name: &str) -> PathBuf {
  let path = dir.join(format!("{name}.jar"));
  std::fs::write(&path, format!("contents of {name}")).unwrap();
  path
}

fn artifact_set(artifacts: Vec<FileArtifact>) -> ArtifactSet {
  let artifacts = artifacts
    .into_iter()
    .map(|artifact| Arc::new(artifact) as Arc<dyn ResolvableArtifact>)
    .collect();
  ArtifactSet::new(FileCollectionSource::new("runtimeClasspath"), artifacts)
}

fn unzip_then_rename(out: &Path, cache: &InvocationCache) -> Arc<Transformation> {
  Arc::new(
    Transformation::new(
      "unzip and rename",
      TransformationStep::new(CopyAction::new(out.join("unzipped")).named("unzip"))
        .with_cache(cache.clone()),
    )
    .then(
      TransformationStep::new(ChangeExtensionAction::new(out.join("classes"), "classes").named("rename"))
        .with_cache(cache.clone()),
    ),
  )
}

fn config(max_parallelism: usize, visit_threads: usize) -> EngineConfig {
  EngineConfig {
    max_parallelism,
    visit_threads,
  }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_pass_transforms_files_in_set_order() {
  let input = TempDir::new().unwrap();
  let out = TempDir::new().unwrap();
  let cache = InvocationCache::new();
  let set = artifact_set(vec![
    FileArtifact::new(id("a"), write_jar(input.path(), "a")),
    FileArtifact::new(id("b"), write_jar(input.path(), "b")),
  ]);

  let pass = TransformPass::new(unzip_then_rename(out.path(), &cache), config(2, 1));
  let result = pass.run(&set, None).await.unwrap();

  let files = result.files().unwrap();
  assert_eq!(
    files,
    vec![classes_of(out.path(), "a"), classes_of(out.path(), "b")]
  );
  assert_eq!(std::fs::read_to_string(&files[0]).unwrap(), "contents of a");

  let subject = result.get(&id("b")).unwrap().subject().unwrap();
  assert_eq!(subject.producer_steps(), ["unzip", "rename"]);
  assert_eq!(cache.len(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_second_pass_is_served_from_cache() {
  let input = TempDir::new().unwrap();
  let out = TempDir::new().unwrap();
  let cache = InvocationCache::new();
  let set = artifact_set(vec![FileArtifact::new(id("a"), write_jar(input.path(), "a"))]);
  let transformation = unzip_then_rename(out.path(), &cache);

  TransformPass::new(transformation.clone(), config(1, 1))
    .run(&set, None)
    .await
    .unwrap();
  std::fs::remove_dir_all(out.path().join("classes")).unwrap();

  let (sender, mut receiver) = mpsc::unbounded_channel();
  let result = TransformPass::new(transformation, config(1, 1))
    .with_notifier(Arc::new(ChannelNotifier::new(sender)))
    .run(&set, None)
    .await
    .unwrap();

  assert_eq!(result.files().unwrap(), vec![classes_of(out.path(), "a")]);
  assert!(!out.path().join("classes").exists(), "no step should have run");
  assert!(matches!(
    receiver.try_recv().unwrap(),
    TransformEvent::CacheHit { success: true, .. }
  ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_artifacts_with_same_file_name_keep_their_own_outputs() {
  let input = TempDir::new().unwrap();
  let out = TempDir::new().unwrap();
  let mut artifacts = Vec::new();
  for (group, contents) in [("org.a", "FROM-A"), ("org.b", "FROM-B")] {
    let dir = input.path().join(group);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("util-1.0.jar");
    std::fs::write(&path, contents).unwrap();
    artifacts.push(FileArtifact::new(
      ArtifactId::new(format!("{group}:util:1.0"), "util-1.0", "jar"),
      path,
    ));
  }
  let set = artifact_set(artifacts);

  let result = TransformPass::new(
    unzip_then_rename(out.path(), &InvocationCache::new()),
    config(2, 1),
  )
  .run(&set, None)
  .await
  .unwrap();

  let files = result.files().unwrap();
  assert_eq!(files.len(), 2);
  assert_ne!(files[0], files[1]);
  assert_eq!(files[0].file_name().unwrap(), "util-1.0.classes");
  assert_eq!(std::fs::read_to_string(&files[0]).unwrap(), "FROM-A");
  assert_eq!(std::fs::read_to_string(&files[1]).unwrap(), "FROM-B");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failures_are_aggregated() {
  let input = TempDir::new().unwrap();
  let out = TempDir::new().unwrap();
  let set = artifact_set(vec![
    FileArtifact::new(id("present"), write_jar(input.path(), "present")),
    FileArtifact::new(id("gone"), input.path().join("gone.jar")),
    FileArtifact::new(id("lost"), input.path().join("lost.jar")),
  ]);

  let pass = TransformPass::new(
    unzip_then_rename(out.path(), &InvocationCache::new()),
    config(2, 1),
  );
  let result = pass.run(&set, None).await.unwrap();

  assert!(result.get(&id("present")).unwrap().is_success());
  let failures = result.failures();
  assert_eq!(failures.len(), 2);
  assert!(matches!(
    failures[0].error.as_ref(),
    TransformError::ArtifactResolution { .. }
  ));

  let err = result.files().unwrap_err();
  assert!(matches!(&err, EngineError::TransformFailures { failures } if failures.len() == 2));
  let message = err.to_string();
  assert!(message.starts_with("failed to transform 2 artifacts:"));
  assert!(message.contains("gone.jar (org.example:gone:1.0)"));
  assert!(message.contains("lost.jar (org.example:lost:1.0)"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_registry_nodes_take_precedence() {
  let input = TempDir::new().unwrap();
  let out = TempDir::new().unwrap();
  let transformation = unzip_then_rename(out.path(), &InvocationCache::new());
  let registry = Arc::new(InMemoryNodeRegistry::new());
  registry.register_executed(TransformationNode::executed(
    id("shared"),
    &transformation,
    Ok(TransformationSubject::initial(id("shared"), "/elsewhere/shared.classes")),
  ));
  let set = artifact_set(vec![
    FileArtifact::new(id("shared"), input.path().join("never-written.jar")),
    FileArtifact::new(id("own"), write_jar(input.path(), "own")),
  ]);

  let result = TransformPass::new(transformation, config(2, 1))
    .with_registry(registry)
    .run(&set, Some(&NodeExecutionContext::generate()))
    .await
    .unwrap();

  assert_eq!(
    result.files().unwrap(),
    vec![
      PathBuf::from("/elsewhere/shared.classes"),
      classes_of(out.path(), "own"),
    ]
  );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_visit_records_every_artifact_once() {
  let input = TempDir::new().unwrap();
  let out = TempDir::new().unwrap();
  let artifacts = (0..40)
    .map(|i| {
      let name = format!("lib{i}");
      let path = if i % 5 == 0 {
        input.path().join(format!("{name}.jar"))
      } else {
        write_jar(input.path(), &name)
      };
      FileArtifact::new(id(&name), path)
    })
    .collect();
  let set = artifact_set(artifacts);

  let (sender, mut receiver) = mpsc::unbounded_channel();
  let result = TransformPass::new(
    unzip_then_rename(out.path(), &InvocationCache::new()),
    config(3, 4),
  )
  .with_notifier(Arc::new(ChannelNotifier::new(sender)))
  .run(&set, None)
  .await
  .unwrap();

  assert_eq!(result.len(), 40);
  assert_eq!(result.failures().len(), 8);

  let mut terminal = Vec::new();
  while let Ok(event) = receiver.try_recv() {
    if event.is_terminal() {
      terminal.push(event.artifact().clone());
    }
  }
  terminal.sort();
  terminal.dedup();
  assert_eq!(terminal.len(), 40);
}

#[tokio::test]
async fn test_empty_set_produces_empty_result() {
  let out = TempDir::new().unwrap();
  let set = artifact_set(Vec::new());

  let result = TransformPass::new(unzip_then_rename(out.path(), &InvocationCache::new()), config(1, 1))
    .run(&set, None)
    .await
    .unwrap();

  assert!(result.is_empty());
  assert!(result.files().unwrap().is_empty());
}

/// Artifact whose file only resolves once another task on the runtime has run.
struct HandshakeArtifact {
  id: ArtifactId,
  path: PathBuf,
  ready: Mutex<std::sync::mpsc::Receiver<()>>,
}

impl ResolvableArtifact for HandshakeArtifact {
  fn id(&self) -> &ArtifactId {
    &self.id
  }

  fn resolve_file(&self) -> Result<PathBuf, ArtifactResolveError> {
    self
      .ready
      .lock()
      .unwrap()
      .recv_timeout(Duration::from_secs(5))
      .map_err(|_| ArtifactResolveError::not_found(&self.id, "runtime stalled during visit"))?;
    Ok(self.path.clone())
  }
}

#[tokio::test]
async fn test_visit_leaves_the_runtime_free() {
  let input = TempDir::new().unwrap();
  let out = TempDir::new().unwrap();
  let (ready, waiting) = std::sync::mpsc::channel();
  let artifact: Arc<dyn ResolvableArtifact> = Arc::new(HandshakeArtifact {
    id: id("a"),
    path: write_jar(input.path(), "a"),
    ready: Mutex::new(waiting),
  });
  let set = ArtifactSet::new(FileCollectionSource::new("runtimeClasspath"), vec![artifact]);

  // Only runs if the single runtime thread is not blocked by the visit.
  tokio::spawn(async move {
    ready.send(()).unwrap();
  });

  let result = TransformPass::new(unzip_then_rename(out.path(), &InvocationCache::new()), config(1, 1))
    .run(&set, None)
    .await
    .unwrap();

  assert_eq!(result.files().unwrap(), vec![classes_of(out.path(), "a")]);
}
