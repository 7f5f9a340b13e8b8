use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use super::workflow_state::{ActiveWorkflows, StepRecord, WorkflowContext};
use crate::agents::errors::{AgentError, AgentResult};
use crate::agents::messages::MessageMeta;
use crate::agents::registry::AgentRegistry;
use crate::agents::types::AgentReply;
use crate::domain::agent::{AgentId, AgentKind};
use crate::domain::message::{NewMessage, SYSTEM_SENDER};
use crate::domain::publisher::EventPublisher;
use crate::domain::repositories::Repositories;
use crate::domain::workflow::{
    NewTask, NewWorkflow, Task, TaskId, TaskStatus, Workflow, WorkflowEvent, WorkflowId,
    WorkflowStatus,
};
use crate::execution::bridge::ExecutionBridge;

/// Outcome of one executed step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepResult {
    pub task_id: TaskId,
    pub agent: AgentKind,
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StartedWorkflow {
    pub workflow_id: WorkflowId,
    pub status: WorkflowStatus,
    pub result: StepResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineStep {
    pub step: usize,
    pub agent: AgentKind,
    pub result: StepResult,
}

/// Summary of a completed three-stage pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineSummary {
    pub workflow_id: WorkflowId,
    pub status: WorkflowStatus,
    pub steps: Vec<PipelineStep>,
}

/// Read-only projection of a workflow and its tasks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowStatusView {
    pub workflow: Workflow,
    pub tasks: Vec<Task>,
    pub active: bool,
    pub context: Option<WorkflowContext>,
}

struct Stage {
    agent: AgentKind,
    description: String,
    message: String,
}

fn pipeline_stages(task: &str) -> [Stage; 3] {
    [
        Stage {
            agent: AgentKind::Orchestrator,
            description: format!("Coordinate: {}", task),
            message: task.to_string(),
        },
        Stage {
            agent: AgentKind::Researcher,
            description: format!("Research: {}", task),
            message: format!("Research the following topic: {}", task),
        },
        Stage {
            agent: AgentKind::Factory,
            description: format!("Create specialist for: {}", task),
            message: format!("Design a specialist agent for: {}", task),
        },
    ]
}

fn workflow_name(task: &str) -> String {
    let head: String = task.chars().take(50).collect();
    format!("Workflow: {}", head)
}

struct OrchestratorCore {
    registry: Arc<AgentRegistry>,
    repos: Repositories,
    publisher: Arc<dyn EventPublisher>,
    active: ActiveWorkflows,
}

impl OrchestratorCore {
    fn publish(&self, event: WorkflowEvent) {
        if let Err(e) = self.publisher.publish(event.name(), event.payload()) {
            tracing::warn!(
                event = event.name(),
                workflow_id = event.workflow_id(),
                error = %e,
                "Failed to publish workflow event"
            );
        }
    }

    async fn load_workflow(&self, id: WorkflowId) -> AgentResult<Workflow> {
        self.repos
            .workflows
            .find_by_id(id)
            .await?
            .ok_or(AgentError::WorkflowNotFound(id))
    }

    fn core_agent_id(&self, kind: AgentKind) -> AgentResult<AgentId> {
        self.registry
            .resolve_kind(kind)
            .and_then(|agent| agent.id())
            .ok_or(AgentError::NotInitialized)
    }

    async fn create_workflow(
        &self,
        name: String,
        description: Option<String>,
        initial_task: String,
    ) -> AgentResult<Workflow> {
        let new = NewWorkflow::new(name, description, initial_task)?;
        let workflow = self.repos.workflows.create(new).await?;

        tracing::info!(workflow_id = workflow.id(), name = %workflow.name(), "Workflow created");
        self.publish(WorkflowEvent::Created {
            workflow_id: workflow.id(),
            name: workflow.name().to_string(),
        });
        Ok(workflow)
    }

    /// Claims and moves a pending workflow to `in_progress`
    async fn begin(&self, id: WorkflowId) -> AgentResult<Workflow> {
        if !self.active.claim(id) {
            return Err(AgentError::InvalidStateTransition {
                from: WorkflowStatus::InProgress.to_string(),
                to: WorkflowStatus::InProgress.to_string(),
            });
        }

        let started = async {
            let mut workflow = self.load_workflow(id).await?;
            let event = workflow.start()?;
            self.repos.workflows.save(&workflow).await?;
            self.publish(event);
            Ok::<_, AgentError>(workflow)
        }
        .await;

        if started.is_err() {
            self.active.release(id);
        }
        started
    }

    async fn start_workflow(&self, id: WorkflowId, message: String) -> AgentResult<StartedWorkflow> {
        let driver_id = self.core_agent_id(AgentKind::Orchestrator)?;
        self.begin(id).await?;
        tracing::info!(workflow_id = id, "Workflow started");

        let outcome = async {
            let task = self
                .repos
                .tasks
                .create(NewTask {
                    workflow_id: id,
                    assigned_to: driver_id,
                    description: message.clone(),
                })
                .await?;
            self.execute_step(id, task.id(), &message).await
        }
        .await;

        match outcome {
            Ok(result) => Ok(StartedWorkflow {
                workflow_id: id,
                status: WorkflowStatus::InProgress,
                result,
            }),
            Err(e) => {
                self.fail_workflow(id, &e.to_string()).await;
                Err(e)
            }
        }
    }

    /// Runs one task against its assigned agent
    ///
    /// A failure after the task started marks the task failed before the
    /// error is returned.
    async fn execute_step(
        &self,
        workflow_id: WorkflowId,
        task_id: TaskId,
        message: &str,
    ) -> AgentResult<StepResult> {
        let mut task = self
            .repos
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or(AgentError::TaskNotFound(task_id))?;

        task.start()?;
        self.repos.tasks.save(&task).await?;

        match self.run_task(workflow_id, &mut task, message).await {
            Ok(result) => Ok(result),
            Err(e) => {
                let error = e.to_string();
                match task.fail(error.clone()) {
                    Ok(()) => {
                        if let Err(save_err) = self.repos.tasks.save(&task).await {
                            tracing::warn!(task_id, error = %save_err, "Failed to mark task failed");
                        }
                    }
                    Err(transition) => {
                        tracing::warn!(task_id, error = %transition, "Task already terminal");
                    }
                }

                self.publish(WorkflowEvent::TaskUpdated {
                    workflow_id,
                    task_id,
                    agent: task
                        .assigned_to()
                        .and_then(|id| self.registry.resolve(id))
                        .map(|a| a.kind())
                        .unwrap_or(AgentKind::Dynamic),
                    status: TaskStatus::Failed,
                    response: Some(error),
                });
                Err(e)
            }
        }
    }

    async fn run_task(
        &self,
        workflow_id: WorkflowId,
        task: &mut Task,
        message: &str,
    ) -> AgentResult<StepResult> {
        let agent_id = task
            .assigned_to()
            .ok_or_else(|| AgentError::AgentNotFound(format!("task {} has no agent", task.id())))?;
        let agent = self
            .registry
            .resolve(agent_id)
            .ok_or_else(|| AgentError::AgentNotFound(agent_id.to_string()))?;

        self.active.record_step(
            workflow_id,
            StepRecord {
                task_id: task.id(),
                agent: agent.kind(),
                message: message.to_string(),
                timestamp: Utc::now(),
            },
        );

        tracing::debug!(workflow_id, task_id = task.id(), agent = %agent.name(), "Executing step");
        let response = match agent.send_message(message, None).await? {
            AgentReply::Completed { text } => text,
            AgentReply::Failed { reason } => return Err(AgentError::AgentCallFailed(reason)),
        };

        let meta = MessageMeta::Workflow {
            workflow_id,
            task_id: task.id(),
        }
        .to_value();
        self.repos
            .messages
            .append(NewMessage::new(
                agent_id,
                SYSTEM_SENDER,
                format!("Workflow task: {}", message),
                meta.clone(),
            ))
            .await?;
        self.repos
            .messages
            .append(NewMessage::new(agent_id, agent.name(), response.clone(), meta))
            .await?;

        task.complete(response.clone())?;
        self.repos.tasks.save(task).await?;

        self.publish(WorkflowEvent::TaskUpdated {
            workflow_id,
            task_id: task.id(),
            agent: agent.kind(),
            status: TaskStatus::Completed,
            response: Some(response.clone()),
        });

        Ok(StepResult {
            task_id: task.id(),
            agent: agent.kind(),
            response,
        })
    }

    async fn complete_workflow(&self, id: WorkflowId) -> AgentResult<()> {
        let mut workflow = self.load_workflow(id).await?;
        let event = workflow.complete()?;
        self.repos.workflows.save(&workflow).await?;
        self.active.release(id);

        tracing::info!(workflow_id = id, "Workflow completed");
        self.publish(event);
        Ok(())
    }

    /// Marks the workflow failed with `error` in its metadata
    ///
    /// Best-effort: problems while failing are logged, never raised, so the
    /// original error reaches the caller.
    async fn fail_workflow(&self, id: WorkflowId, error: &str) {
        self.active.release(id);
        tracing::error!(workflow_id = id, error, "Workflow failed");

        let mut workflow = match self.load_workflow(id).await {
            Ok(workflow) => workflow,
            Err(e) => {
                tracing::warn!(workflow_id = id, error = %e, "Could not load workflow to fail it");
                return;
            }
        };

        match workflow.fail(error) {
            Ok(event) => {
                if let Err(e) = self.repos.workflows.save(&workflow).await {
                    tracing::warn!(workflow_id = id, error = %e, "Failed to persist workflow failure");
                }
                self.publish(event);
            }
            Err(e) => {
                tracing::warn!(workflow_id = id, error = %e, "Workflow could not be failed");
            }
        }
    }

    async fn execute_complete_pipeline(&self, task: String) -> AgentResult<PipelineSummary> {
        if !self.registry.is_initialized() {
            return Err(AgentError::NotInitialized);
        }

        let workflow = self
            .create_workflow(workflow_name(&task), Some(task.clone()), task.clone())
            .await?;
        let id = workflow.id();
        self.begin(id).await?;

        let outcome = async {
            let mut steps = Vec::with_capacity(3);
            for (index, stage) in pipeline_stages(&task).into_iter().enumerate() {
                let assigned_to = self.core_agent_id(stage.agent)?;
                let task = self
                    .repos
                    .tasks
                    .create(NewTask {
                        workflow_id: id,
                        assigned_to,
                        description: stage.description,
                    })
                    .await?;

                let result = self.execute_step(id, task.id(), &stage.message).await?;
                steps.push(PipelineStep {
                    step: index + 1,
                    agent: stage.agent,
                    result,
                });
            }
            self.complete_workflow(id).await?;
            Ok::<_, AgentError>(steps)
        }
        .await;

        match outcome {
            Ok(steps) => Ok(PipelineSummary {
                workflow_id: id,
                status: WorkflowStatus::Completed,
                steps,
            }),
            Err(e) => {
                self.fail_workflow(id, &e.to_string()).await;
                Err(e)
            }
        }
    }

    async fn workflow_status(&self, id: WorkflowId) -> AgentResult<WorkflowStatusView> {
        let workflow = self.load_workflow(id).await?;
        let tasks = self.repos.tasks.find_by_workflow(id).await?;

        Ok(WorkflowStatusView {
            workflow,
            tasks,
            active: self.active.is_active(id),
            context: self.active.context(id),
        })
    }
}

/// Drives persisted workflows through their tasks
///
/// Every public operation is synchronous: the work runs on the execution
/// bridge and the caller blocks until it finishes. Call it from synchronous
/// threads only.
pub struct WorkflowOrchestrator {
    bridge: Arc<ExecutionBridge>,
    core: Arc<OrchestratorCore>,
}

impl WorkflowOrchestrator {
    pub fn new(
        bridge: Arc<ExecutionBridge>,
        registry: Arc<AgentRegistry>,
        repos: Repositories,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            bridge,
            core: Arc::new(OrchestratorCore {
                registry,
                repos,
                publisher,
                active: ActiveWorkflows::new(),
            }),
        }
    }

    fn run<T, F>(&self, op: impl FnOnce(Arc<OrchestratorCore>) -> F) -> AgentResult<T>
    where
        F: Future<Output = AgentResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        self.bridge.run(op(self.core.clone()))?
    }

    /// Persists a new workflow in `pending` with `initial_task` in its metadata
    pub fn create_workflow(
        &self,
        name: &str,
        description: Option<&str>,
        initial_task: &str,
    ) -> AgentResult<Workflow> {
        let name = name.to_string();
        let description = description.map(str::to_string);
        let initial_task = initial_task.to_string();
        self.run(move |core| async move {
            core.create_workflow(name, description, initial_task).await
        })
    }

    /// Starts a pending workflow with a single orchestrator step
    ///
    /// Raises if the workflow is unknown or not `pending`. A failing step
    /// fails the workflow and the error is returned.
    pub fn start_workflow(&self, workflow_id: WorkflowId, message: &str) -> AgentResult<StartedWorkflow> {
        let message = message.to_string();
        self.run(move |core| async move { core.start_workflow(workflow_id, message).await })
    }

    /// Runs a task through the orchestrator, researcher and factory in turn
    ///
    /// Stages are not retried. A failure leaves earlier tasks `completed`,
    /// records the error in the workflow metadata and is returned.
    pub fn execute_complete_pipeline(&self, task_description: &str) -> AgentResult<PipelineSummary> {
        let task = task_description.to_string();
        self.run(move |core| async move { core.execute_complete_pipeline(task).await })
    }

    /// Executes a single existing task against its assigned agent
    pub fn execute_step(
        &self,
        workflow_id: WorkflowId,
        task_id: TaskId,
        message: &str,
    ) -> AgentResult<StepResult> {
        let message = message.to_string();
        self.run(move |core| async move { core.execute_step(workflow_id, task_id, &message).await })
    }

    pub fn workflow_status(&self, workflow_id: WorkflowId) -> AgentResult<WorkflowStatusView> {
        self.run(move |core| async move { core.workflow_status(workflow_id).await })
    }

    pub fn list_workflows(&self) -> AgentResult<Vec<Workflow>> {
        self.run(|core| async move { Ok::<_, AgentError>(core.repos.workflows.list().await?) })
    }

    pub fn active_count(&self) -> usize {
        self.core.active.len()
    }
}
