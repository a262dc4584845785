//! Asynchronous execution of transform operations.
//!
//! The dispatcher hands operations to an [`AsyncExecutor`] and moves on. The
//! caller that owns the executor decides when to wait for them; with the
//! [`OperationQueue`] that is [`OperationQueue::drain`].

use std::sync::{Arc, Mutex};

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::EngineError;
use crate::operation::TransformationOperation;

/// Accepts transform operations and runs them to completion.
///
/// Submission is fire-and-forget: nothing is returned to the submitter.
pub trait AsyncExecutor: Send + Sync {
  fn submit(&self, operation: TransformationOperation);
}

/// Runs operations on a tokio runtime, at most `max_parallelism` at a time.
///
/// Operations do blocking file work, so each one runs on the blocking pool.
pub struct OperationQueue {
  handle: Handle,
  permits: Arc<Semaphore>,
  pending: Mutex<Vec<JoinHandle<()>>>,
}

impl OperationQueue {
  /// Create a queue that spawns onto the given runtime.
  pub fn new(handle: Handle, max_parallelism: usize) -> Self {
    Self {
      handle,
      permits: Arc::new(Semaphore::new(max_parallelism.max(1))),
      pending: Mutex::new(Vec::new()),
    }
  }

  /// Create a queue on the runtime of the calling task.
  pub fn current(max_parallelism: usize) -> Result<Self, EngineError> {
    let handle = Handle::try_current().map_err(|_| EngineError::NoRuntime)?;
    Ok(Self::new(handle, max_parallelism))
  }

  /// Number of submitted operations not yet collected by `drain`.
  pub fn pending(&self) -> usize {
    self.lock_pending().len()
  }

  /// Wait until every submitted operation has finished.
  ///
  /// Operations submitted while draining are waited for too. Returns the
  /// number of operations that ran.
  ///
  /// A panic that escapes an operation is a broken invariant (operations
  /// record their own failures) and is resumed on the caller.
  pub async fn drain(&self) -> Result<usize, EngineError> {
    let mut completed = 0;
    loop {
      let handles = std::mem::take(&mut *self.lock_pending());
      if handles.is_empty() {
        break;
      }

      debug!(operations = handles.len(), "waiting for transform operations");
      for joined in futures::future::join_all(handles).await {
        if let Err(e) = joined {
          if e.is_panic() {
            std::panic::resume_unwind(e.into_panic());
          }
          return Err(EngineError::OperationAborted {
            message: e.to_string(),
          });
        }
        completed += 1;
      }
    }
    Ok(completed)
  }

  fn lock_pending(&self) -> std::sync::MutexGuard<'_, Vec<JoinHandle<()>>> {
    self.pending.lock().unwrap_or_else(|e| e.into_inner())
  }
}

impl AsyncExecutor for OperationQueue {
  fn submit(&self, operation: TransformationOperation) {
    let permits = self.permits.clone();
    let handle = self.handle.spawn(async move {
      // The semaphore is never closed, so acquiring only waits for capacity.
      let _permit = permits.acquire_owned().await;
      let joined = tokio::task::spawn_blocking(move || operation.run()).await;
      if let Err(e) = joined
        && e.is_panic()
      {
        std::panic::resume_unwind(e.into_panic());
      }
    });
    self.lock_pending().push(handle);
  }
}
