//! Integration tests for the background job queue
//!
//! These tests verify the single-worker guarantees:
//! - Jobs finish in submission order
//! - Agent work submitted as a job runs through the execution bridge

mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use agent_orchestra::execution::{ExecutionBridge, JobOperation, JobQueue, JobStatus};
use agent_orchestra::infrastructure::llm::ScriptedCompletionClient;
use serde_json::json;

use common::initialized_context;

#[test]
fn test_jobs_complete_in_submission_order() {
    let bridge = Arc::new(ExecutionBridge::new(2).unwrap());
    let queue = JobQueue::new(bridge, Duration::from_millis(10));
    queue.start().unwrap();

    let order = Arc::new(Mutex::new(Vec::new()));
    let mut ids = Vec::new();
    for i in 0..3u64 {
        let order = order.clone();
        let operation = JobOperation::future(async move {
            // Earlier jobs sleep longer; only serial execution keeps FIFO order
            tokio::time::sleep(Duration::from_millis(30 - i * 10)).await;
            order.lock().unwrap().push(i);
            if i == 1 {
                Err("second job fails".to_string())
            } else {
                Ok(json!(i))
            }
        });
        ids.push(queue.submit_new(operation).unwrap());
    }

    let statuses: Vec<JobStatus> = ids
        .iter()
        .map(|id| queue.wait(id, Duration::from_secs(5)))
        .collect();

    assert!(statuses.iter().all(JobStatus::is_terminal));
    assert_eq!(statuses[0], JobStatus::Completed { result: json!(0) });
    assert_eq!(
        statuses[1],
        JobStatus::Failed {
            error: "second job fails".to_string()
        }
    );
    assert_eq!(statuses[2], JobStatus::Completed { result: json!(2) });
    assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);

    assert_eq!(queue.clear_completed(), 3);
    assert!(matches!(queue.status(&ids[0]), JobStatus::NotFound { .. }));
}

#[test]
fn test_stop_rejects_new_jobs() {
    let bridge = Arc::new(ExecutionBridge::new(1).unwrap());
    let queue = JobQueue::new(bridge, Duration::from_millis(10));
    queue.start().unwrap();
    assert!(queue.is_running());

    queue.stop();
    assert!(!queue.is_running());
    assert!(queue
        .submit_new(JobOperation::blocking(|| Ok(json!(null))))
        .is_err());
}

#[test]
fn test_pipeline_runs_as_background_job() {
    let (ctx, _) = initialized_context(ScriptedCompletionClient::new());
    ctx.jobs.start().unwrap();

    let orchestrator = ctx.workflows.clone();
    let job_id = ctx
        .jobs
        .submit_new(JobOperation::blocking(move || {
            let summary = orchestrator
                .execute_complete_pipeline("Write release notes")
                .map_err(|e| e.to_string())?;
            serde_json::to_value(summary).map_err(|e| e.to_string())
        }))
        .unwrap();

    match ctx.jobs.wait(&job_id, Duration::from_secs(10)) {
        JobStatus::Completed { result } => {
            assert_eq!(result["status"], "completed");
            assert_eq!(result["steps"].as_array().map(Vec::len), Some(3));
        }
        other => panic!("unexpected job status: {:?}", other),
    }
}
