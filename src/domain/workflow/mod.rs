// Workflow domain module
// Contains the workflow aggregate root, its tasks, value objects, and domain events

#![allow(clippy::module_inception)]

pub mod events;
pub mod task;
pub mod value_objects;
pub mod workflow;

pub use events::WorkflowEvent;
pub use task::{NewTask, Task};
pub use value_objects::{TaskId, TaskStatus, WorkflowId, WorkflowStatus};
pub use workflow::{NewWorkflow, Workflow};
