use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use lathe_artifact::{ArtifactId, ArtifactSet, FileArtifact, FileCollectionSource, ResolvableArtifact};
use lathe_config::{ArtifactDef, PipelineDef, StepDef, TransformationDef};
use lathe_engine::{EngineConfig, PassResult, TransformPass, TransformationResult};
use lathe_transform::{
  ChangeExtensionAction, CopyAction, InvocationCache, NodeExecutionContext, Transformation,
  TransformationStep,
};

/// Lathe - applies transformation chains to dependency artifacts
#[derive(Parser)]
#[command(name = "lathe")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.lathe)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a transformation over every artifact of a pipeline
  Run {
    /// Path to the pipeline file (JSON)
    pipeline_file: PathBuf,

    /// Transformation to apply (default: the first one declared)
    #[arg(long)]
    transformation: Option<String>,

    /// Maximum number of transforms running at once
    #[arg(long)]
    max_parallelism: Option<usize>,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing()?;

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".lathe"),
  };

  match cli.command {
    Some(Commands::Run {
      pipeline_file,
      transformation,
      max_parallelism,
    }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(run_pipeline(
        pipeline_file,
        transformation,
        max_parallelism,
        data_dir,
      ))?;
    }
    None => {
      println!("lathe - use --help to see available commands");
    }
  }

  Ok(())
}

fn init_tracing() -> Result<()> {
  let env_filter = EnvFilter::try_from_default_env()
    .or_else(|_| EnvFilter::try_new("info"))
    .map_err(|e| anyhow::anyhow!("failed to create env filter: {e}"))?;

  tracing_subscriber::registry()
    .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
    .with(env_filter)
    .try_init()
    .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))
}

async fn run_pipeline(
  pipeline_file: PathBuf,
  transformation: Option<String>,
  max_parallelism: Option<usize>,
  data_dir: PathBuf,
) -> Result<()> {
  let pipeline = PipelineDef::from_path(&pipeline_file)
    .with_context(|| format!("failed to load pipeline file: {}", pipeline_file.display()))?;

  let transformation_def = pipeline.transformation(transformation.as_deref())?;
  info!(
    pipeline = %pipeline.name,
    transformation = %transformation_def.name,
    artifacts = pipeline.artifacts.len(),
    "loaded pipeline"
  );

  let outputs_dir = data_dir.join("outputs").join(&transformation_def.name);
  let transformation = build_transformation(transformation_def, &outputs_dir)?;

  let artifacts = pipeline.artifacts.iter().map(build_artifact).collect();
  let set = ArtifactSet::new(FileCollectionSource::new(pipeline.name.clone()), artifacts);

  let mut config = EngineConfig::default();
  if let Some(max) = max_parallelism.or(pipeline.max_parallelism) {
    config.max_parallelism = max.max(1);
  }

  let execution = NodeExecutionContext::generate();
  let result = TransformPass::new(transformation, config)
    .run(&set, Some(&execution))
    .await
    .context("transform pass failed")?;

  info!(
    execution_id = %execution.execution_id,
    results = result.len(),
    failures = result.failures().len(),
    "pipeline completed"
  );

  println!("{}", serde_json::to_string_pretty(&report(&result))?);

  result.files()?;
  Ok(())
}

fn build_transformation(def: &TransformationDef, outputs_dir: &Path) -> Result<Arc<Transformation>> {
  let cache = InvocationCache::new();
  let mut steps = def.steps.iter().enumerate().map(|(index, step)| {
    let default_dir = || outputs_dir.join(format!("step-{index}"));
    let output_dir = step.output_dir().map(Path::to_path_buf).unwrap_or_else(default_dir);
    let step = match step {
      StepDef::Copy { name, .. } => {
        let action = CopyAction::new(output_dir);
        match name {
          Some(name) => TransformationStep::new(action.named(name.clone())),
          None => TransformationStep::new(action),
        }
      }
      StepDef::ChangeExtension {
        name, extension, ..
      } => {
        let action = ChangeExtensionAction::new(output_dir, extension.clone());
        match name {
          Some(name) => TransformationStep::new(action.named(name.clone())),
          None => TransformationStep::new(action),
        }
      }
    };
    step.with_cache(cache.clone())
  });

  let first = steps
    .next()
    .with_context(|| format!("transformation '{}' has no steps", def.name))?;
  let transformation = steps.fold(Transformation::new(def.name.clone(), first), Transformation::then);
  Ok(Arc::new(transformation))
}

fn build_artifact(def: &ArtifactDef) -> Arc<dyn ResolvableArtifact> {
  let mut id = ArtifactId::new(def.component.clone(), def.name.clone(), def.extension.clone());
  if let Some(classifier) = &def.classifier {
    id = id.with_classifier(classifier.clone());
  }
  Arc::new(FileArtifact::new(id, def.path.clone()))
}

fn report(result: &PassResult) -> serde_json::Value {
  let entries = result
    .results()
    .iter()
    .map(|(artifact, outcome)| {
      let value = match outcome {
        TransformationResult::Success(subject) => json!({
          "status": "success",
          "files": subject
            .files()
            .iter()
            .map(|file| file.display().to_string())
            .collect::<Vec<_>>(),
        }),
        TransformationResult::Failure(error) => json!({
          "status": "failure",
          "error": error.to_string(),
        }),
      };
      (artifact.to_string(), value)
    })
    .collect::<serde_json::Map<_, _>>();

  serde_json::Value::Object(entries)
}
