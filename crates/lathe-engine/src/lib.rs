//! Lathe transform engine.
//!
//! This crate resolves artifacts to their transformed files. For every
//! artifact announced by an [`ArtifactSet`](lathe_artifact::ArtifactSet), the
//! [`TransformingArtifactListener`] decides how the result is produced and
//! records it in a shared [`ResultStore`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TransformPass                          │
//! │  - owns a fresh ResultStore + OperationQueue per run        │
//! │  - visits the artifact set, drains the queue, collects      │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │               TransformingArtifactListener                  │
//! │  - registry dedup → file resolution → invocation cache      │
//! │  - writes terminal results or submits an operation          │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │            TransformationOperation (AsyncExecutor)          │
//! │  - runs the deferred steps, records success or failure      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use lathe_engine::{EngineConfig, TransformPass};
//!
//! let pass = TransformPass::new(transformation, EngineConfig::default())
//!   .with_registry(registry);
//!
//! let result = pass.run(&artifacts, None).await?;
//! let files = result.files()?;
//! ```

mod error;
mod events;
mod listener;
mod operation;
mod pass;
mod queue;
mod registry;
mod result;
mod store;

pub use error::{ArtifactFailure, EngineError};
pub use events::{ChannelNotifier, NoopNotifier, TransformEvent, TransformNotifier};
pub use listener::TransformingArtifactListener;
pub use operation::TransformationOperation;
pub use pass::{EngineConfig, PassResult, TransformPass};
pub use queue::{AsyncExecutor, OperationQueue};
pub use registry::{InMemoryNodeRegistry, TransformationNode, TransformationNodeRegistry};
pub use result::TransformationResult;
pub use store::{DuplicateResultError, ResultStore};
