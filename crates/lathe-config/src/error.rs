use std::path::PathBuf;

/// Errors raised while loading or validating a pipeline definition.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("failed to read pipeline file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse pipeline: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("pipeline '{pipeline}' declares no transformations")]
  NoTransformations { pipeline: String },

  #[error("transformation '{name}' has no steps")]
  EmptyTransformation { name: String },

  #[error("transformation '{name}' is declared more than once")]
  DuplicateTransformation { name: String },

  #[error("transformation '{name}' not found in pipeline")]
  UnknownTransformation { name: String },
}
