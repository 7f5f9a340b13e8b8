// Execution layer
// Synchronous-to-asynchronous bridging and the background job queue

pub mod bridge;
pub mod job_queue;

pub use bridge::{BridgeError, ExecutionBridge};
pub use job_queue::{JobCallback, JobOperation, JobOutput, JobQueue, JobStatus};
