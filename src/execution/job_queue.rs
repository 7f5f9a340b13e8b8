use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::bridge::ExecutionBridge;
use crate::agents::errors::{AgentError, AgentResult};

pub type JobOutput = Result<Value, String>;
pub type JobFuture = Pin<Box<dyn Future<Output = JobOutput> + Send>>;
pub type JobCallback = Box<dyn FnOnce(&JobStatus) + Send>;

/// Work submitted to the queue
pub enum JobOperation {
    /// Runs directly on the worker thread
    Blocking(Box<dyn FnOnce() -> JobOutput + Send>),
    /// Runs through the execution bridge
    Async(JobFuture),
}

impl JobOperation {
    pub fn blocking(f: impl FnOnce() -> JobOutput + Send + 'static) -> Self {
        JobOperation::Blocking(Box::new(f))
    }

    pub fn future(f: impl Future<Output = JobOutput> + Send + 'static) -> Self {
        JobOperation::Async(Box::pin(f))
    }
}

/// Recorded state of one job id
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Completed { result: Value },
    Failed { error: String },
    NotFound { error: String },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed { .. } | JobStatus::Failed { .. })
    }
}

struct Job {
    id: String,
    operation: JobOperation,
    callback: Option<JobCallback>,
}

#[derive(Default)]
struct JobTable {
    entries: Mutex<HashMap<String, JobStatus>>,
    changed: Condvar,
}

impl JobTable {
    fn lock(&self) -> MutexGuard<'_, HashMap<String, JobStatus>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn record(&self, id: &str, status: JobStatus) {
        self.lock().insert(id.to_string(), status);
        self.changed.notify_all();
    }
}

struct Worker {
    sender: mpsc::Sender<Job>,
    running: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

/// Single-worker FIFO background processor
///
/// One dedicated thread drains the queue; jobs never run in parallel with
/// each other. A panic inside a job is recorded as that job's failure and
/// the worker keeps going.
pub struct JobQueue {
    bridge: Arc<ExecutionBridge>,
    poll_interval: Duration,
    table: Arc<JobTable>,
    worker: Mutex<Option<Worker>>,
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "job panicked".to_string()
    }
}

impl JobQueue {
    pub fn new(bridge: Arc<ExecutionBridge>, poll_interval: Duration) -> Self {
        Self {
            bridge,
            poll_interval,
            table: Arc::new(JobTable::default()),
            worker: Mutex::new(None),
        }
    }

    fn worker_slot(&self) -> MutexGuard<'_, Option<Worker>> {
        match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Starts the worker thread; no-op if it is already running
    pub fn start(&self) -> AgentResult<()> {
        let mut slot = self.worker_slot();
        if slot.is_some() {
            return Ok(());
        }

        let (sender, receiver) = mpsc::channel::<Job>();
        let running = Arc::new(AtomicBool::new(true));

        let bridge = self.bridge.clone();
        let table = self.table.clone();
        let poll = self.poll_interval;
        let flag = running.clone();

        let thread = std::thread::Builder::new()
            .name("job-queue-worker".to_string())
            .spawn(move || {
                while flag.load(Ordering::SeqCst) {
                    match receiver.recv_timeout(poll) {
                        Ok(job) => process(&bridge, &table, job),
                        Err(RecvTimeoutError::Timeout) => continue,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }

                let mut dropped = 0;
                while let Ok(job) = receiver.try_recv() {
                    finish(
                        &table,
                        job.id.as_str(),
                        job.callback,
                        JobStatus::Failed {
                            error: "Job queue stopped before the job ran".to_string(),
                        },
                    );
                    dropped += 1;
                }
                if dropped > 0 {
                    tracing::warn!(dropped, "Job queue stopped with queued jobs");
                }
            })
            .map_err(|e| AgentError::ConfigError(format!("Failed to spawn job worker: {}", e)))?;

        *slot = Some(Worker {
            sender,
            running,
            thread,
        });

        tracing::info!("Job queue started");
        Ok(())
    }

    /// Stops the worker after its current job
    ///
    /// Jobs still queued are recorded as failed.
    pub fn stop(&self) {
        let Some(worker) = self.worker_slot().take() else {
            return;
        };

        worker.running.store(false, Ordering::SeqCst);
        drop(worker.sender);
        if worker.thread.join().is_err() {
            tracing::error!("Job queue worker panicked");
        }

        tracing::info!("Job queue stopped");
    }

    pub fn is_running(&self) -> bool {
        self.worker_slot()
            .as_ref()
            .map(|w| w.running.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// Enqueues a job under `job_id` and records it as pending
    pub fn submit(
        &self,
        job_id: impl Into<String>,
        operation: JobOperation,
        callback: Option<JobCallback>,
    ) -> AgentResult<String> {
        let job_id = job_id.into();
        let slot = self.worker_slot();
        let worker = slot.as_ref().ok_or(AgentError::QueueNotRunning)?;

        self.table.record(&job_id, JobStatus::Pending);

        let job = Job {
            id: job_id.clone(),
            operation,
            callback,
        };
        if worker.sender.send(job).is_err() {
            self.table.lock().remove(&job_id);
            return Err(AgentError::QueueNotRunning);
        }

        tracing::debug!(job_id = %job_id, "Job submitted");
        Ok(job_id)
    }

    /// Enqueues a job under a fresh UUID
    pub fn submit_new(&self, operation: JobOperation) -> AgentResult<String> {
        self.submit(Uuid::new_v4().to_string(), operation, None)
    }

    pub fn status(&self, job_id: &str) -> JobStatus {
        self.table
            .lock()
            .get(job_id)
            .cloned()
            .unwrap_or_else(|| JobStatus::NotFound {
                error: "Job not found".to_string(),
            })
    }

    /// Blocks until the job reaches a terminal state or `timeout` elapses
    ///
    /// Returns the status at that point.
    pub fn wait(&self, job_id: &str, timeout: Duration) -> JobStatus {
        let deadline = Instant::now() + timeout;
        let mut entries = self.table.lock();

        loop {
            match entries.get(job_id) {
                None => {
                    return JobStatus::NotFound {
                        error: "Job not found".to_string(),
                    }
                }
                Some(status) if status.is_terminal() => return status.clone(),
                Some(status) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return status.clone();
                    }
                    entries = match self.table.changed.wait_timeout(entries, deadline - now) {
                        Ok((guard, _)) => guard,
                        Err(poisoned) => poisoned.into_inner().0,
                    };
                }
            }
        }
    }

    /// Evicts every completed or failed entry, returning how many went
    pub fn clear_completed(&self) -> usize {
        let mut entries = self.table.lock();
        let before = entries.len();
        entries.retain(|_, status| !status.is_terminal());
        before - entries.len()
    }
}

impl Drop for JobQueue {
    fn drop(&mut self) {
        self.stop();
    }
}

fn process(bridge: &ExecutionBridge, table: &JobTable, job: Job) {
    tracing::info!(job_id = %job.id, "Processing job");

    let operation = job.operation;
    let outcome = catch_unwind(AssertUnwindSafe(move || match operation {
        JobOperation::Blocking(f) => f(),
        JobOperation::Async(future) => bridge.run(future).unwrap_or_else(|e| Err(e.to_string())),
    }));

    let status = match outcome {
        Ok(Ok(result)) => {
            tracing::info!(job_id = %job.id, "Job completed");
            JobStatus::Completed { result }
        }
        Ok(Err(error)) => {
            tracing::warn!(job_id = %job.id, error = %error, "Job failed");
            JobStatus::Failed { error }
        }
        Err(payload) => {
            let error = panic_message(payload);
            tracing::error!(job_id = %job.id, error = %error, "Job panicked");
            JobStatus::Failed { error }
        }
    };

    finish(table, &job.id, job.callback, status);
}

fn finish(table: &JobTable, id: &str, callback: Option<JobCallback>, status: JobStatus) {
    table.record(id, status.clone());

    if let Some(callback) = callback {
        if catch_unwind(AssertUnwindSafe(move || callback(&status))).is_err() {
            tracing::error!(job_id = %id, "Job callback panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn queue() -> JobQueue {
        let bridge = Arc::new(ExecutionBridge::new(1).unwrap());
        JobQueue::new(bridge, Duration::from_millis(10))
    }

    #[test]
    fn submit_requires_running_worker() {
        let queue = queue();
        let result = queue.submit("a", JobOperation::blocking(|| Ok(json!(1))), None);
        assert!(matches!(result, Err(AgentError::QueueNotRunning)));
    }

    #[test]
    fn blocking_and_async_jobs_complete() {
        let queue = queue();
        queue.start().unwrap();

        queue
            .submit("sync", JobOperation::blocking(|| Ok(json!("done"))), None)
            .unwrap();
        queue
            .submit("async", JobOperation::future(async { Ok(json!(7)) }), None)
            .unwrap();

        assert_eq!(
            queue.wait("sync", Duration::from_secs(5)),
            JobStatus::Completed { result: json!("done") }
        );
        assert_eq!(
            queue.wait("async", Duration::from_secs(5)),
            JobStatus::Completed { result: json!(7) }
        );
    }

    #[test]
    fn panicking_job_fails_without_stopping_worker() {
        let queue = queue();
        queue.start().unwrap();

        queue
            .submit("bad", JobOperation::blocking(|| panic!("exploded")), None)
            .unwrap();
        queue
            .submit("good", JobOperation::blocking(|| Ok(json!(true))), None)
            .unwrap();

        assert_eq!(
            queue.wait("bad", Duration::from_secs(5)),
            JobStatus::Failed {
                error: "exploded".to_string()
            }
        );
        assert!(queue.wait("good", Duration::from_secs(5)).is_terminal());
        assert!(queue.is_running());
    }

    #[test]
    fn unknown_job_is_not_found() {
        let queue = queue();
        assert!(matches!(queue.status("missing"), JobStatus::NotFound { .. }));
    }

    #[test]
    fn callback_receives_terminal_status() {
        let queue = queue();
        queue.start().unwrap();

        let (tx, rx) = mpsc::channel();
        let callback: JobCallback = Box::new(move |status| {
            let _ = tx.send(status.clone());
        });
        queue
            .submit("cb", JobOperation::blocking(|| Err("nope".to_string())), Some(callback))
            .unwrap();

        let status = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(status, JobStatus::Failed { error: "nope".to_string() });
    }

    #[test]
    fn clear_completed_keeps_pending() {
        let queue = queue();
        queue.start().unwrap();

        queue
            .submit("fast", JobOperation::blocking(|| Ok(json!(1))), None)
            .unwrap();
        queue.wait("fast", Duration::from_secs(5));

        assert_eq!(queue.clear_completed(), 1);
        assert!(matches!(queue.status("fast"), JobStatus::NotFound { .. }));
    }

    #[test]
    fn stop_rejects_new_jobs() {
        let queue = queue();
        queue.start().unwrap();
        queue.stop();

        assert!(!queue.is_running());
        let result = queue.submit("late", JobOperation::blocking(|| Ok(json!(1))), None);
        assert!(matches!(result, Err(AgentError::QueueNotRunning)));
    }
}
