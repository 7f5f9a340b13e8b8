// Application services
// Synchronous entry points the transport layer calls into

pub mod agent_service;
pub mod workflow_orchestrator;
pub mod workflow_state;

pub use agent_service::{AgentListing, AgentService, CreateAgentResult, Overview, SendResult};
pub use workflow_orchestrator::{
    PipelineStep, PipelineSummary, StartedWorkflow, StepResult, WorkflowOrchestrator,
    WorkflowStatusView,
};
pub use workflow_state::{ActiveWorkflows, StepRecord, WorkflowContext};
