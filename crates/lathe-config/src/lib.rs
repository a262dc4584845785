//! Lathe Config
//!
//! This crate contains the serializable pipeline configuration types for lathe.
//! These types describe the artifacts to transform and the transformation
//! chains to apply, before they are turned into engine structures by the CLI.
//!
//! Configuration is loaded from JSON files (via CLI with `lathe run pipeline.json`).
//! Relative paths are resolved against the directory containing the file.

mod error;
mod pipeline;
mod step;

pub use error::ConfigError;
pub use pipeline::{ArtifactDef, PipelineDef, TransformationDef};
pub use step::StepDef;
