use std::future::Future;

use thiserror::Error;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::oneshot;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("Failed to build execution runtime: {0}")]
    Build(String),

    #[error("Execution runtime has shut down")]
    ShutDown,

    #[error("Operation was cancelled before completing")]
    Cancelled,
}

/// Runs asynchronous operations to completion for synchronous callers
///
/// Owns a fixed-size multi-thread runtime. Every `run` call is an independent
/// task on that pool, so concurrent callers on different OS threads never
/// share scheduler state with each other.
///
/// `run` blocks the calling thread and must not be called from inside an
/// async task; use it from plain threads, the job worker or tokio's blocking
/// pool.
pub struct ExecutionBridge {
    runtime: Option<Runtime>,
    handle: Handle,
}

impl ExecutionBridge {
    pub fn new(worker_threads: usize) -> Result<Self, BridgeError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(worker_threads.max(1))
            .thread_name("bridge-worker")
            .enable_all()
            .build()
            .map_err(|e| BridgeError::Build(e.to_string()))?;

        let handle = runtime.handle().clone();
        tracing::debug!(worker_threads, "Execution bridge started");

        Ok(Self {
            runtime: Some(runtime),
            handle,
        })
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Executes `future` on the pool and waits for its output
    ///
    /// A panic inside the operation resumes on the caller unchanged. Errors
    /// returned by the operation are part of `F::Output` and pass through
    /// untouched; the bridge adds no retry.
    pub fn run<F>(&self, future: F) -> Result<F::Output, BridgeError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let task = self.handle.spawn(future);
        self.handle.spawn(async move {
            let _ = tx.send(task.await);
        });

        match rx.blocking_recv() {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(join_error)) if join_error.is_panic() => {
                std::panic::resume_unwind(join_error.into_panic())
            }
            Ok(Err(_)) => Err(BridgeError::Cancelled),
            Err(_) => Err(BridgeError::ShutDown),
        }
    }
}

impl Drop for ExecutionBridge {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}
