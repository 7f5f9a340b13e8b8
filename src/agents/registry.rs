use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::json;
use tokio::sync::Mutex;

use super::agent::Agent;
use super::completion::CompletionClient;
use super::errors::{AgentError, AgentResult};
use super::events::AgentEvent;
use super::factory::{FactoryAgent, FACTORY_NAME};
use super::orchestrator::{OrchestratorAgent, ORCHESTRATOR_NAME};
use super::researcher::{ResearcherAgent, RESEARCHER_NAME};
use super::types::{AgentProfile, AgentReply, AgentSnapshot, AgentSpec};
use crate::domain::agent::{AgentId, AgentKind, AgentStatus, NewAgentRecord};
use crate::domain::publisher::EventPublisher;
use crate::domain::repositories::Repositories;
use crate::domain::search::SearchService;

/// Models assigned to agents at construction
#[derive(Debug, Clone)]
pub struct AgentModels {
    pub default_model: String,
    /// Used by the orchestrator
    pub advanced_model: String,
}

#[derive(Default)]
struct CoreAgents {
    orchestrator: Option<Arc<OrchestratorAgent>>,
    researcher: Option<Arc<ResearcherAgent>>,
    factory: Option<Arc<FactoryAgent>>,
}

impl CoreAgents {
    fn agents(&self) -> Vec<Arc<Agent>> {
        let mut agents = Vec::with_capacity(3);
        if let Some(o) = &self.orchestrator {
            agents.push(o.agent().clone());
        }
        if let Some(r) = &self.researcher {
            agents.push(r.agent().clone());
        }
        if let Some(f) = &self.factory {
            agents.push(f.agent().clone());
        }
        agents
    }
}

#[derive(Default)]
struct DynamicAgents {
    by_name: BTreeMap<String, Arc<Agent>>,
    /// Names being instantiated right now
    reserved: HashSet<String>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Releases a reserved dynamic-agent name when creation ends, however it ends
struct Reservation<'a> {
    dynamic: &'a RwLock<DynamicAgents>,
    name: String,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        write(self.dynamic).reserved.remove(&self.name);
    }
}

/// Single source of truth for which agents exist and how to reach them
///
/// Owns the three core agents and the map of dynamic agents. Both are
/// lock-guarded; those locks are never held across an await. Core agent
/// setup runs under `init_lock` so concurrent callers cannot persist a
/// second record for the same agent.
pub struct AgentRegistry {
    completion: Arc<dyn CompletionClient>,
    search: Option<Arc<dyn SearchService>>,
    repos: Repositories,
    publisher: Arc<dyn EventPublisher>,
    models: AgentModels,
    core: RwLock<CoreAgents>,
    dynamic: RwLock<DynamicAgents>,
    init_lock: Mutex<()>,
}

impl AgentRegistry {
    pub fn new(
        completion: Arc<dyn CompletionClient>,
        search: Option<Arc<dyn SearchService>>,
        repos: Repositories,
        publisher: Arc<dyn EventPublisher>,
        models: AgentModels,
    ) -> Self {
        Self {
            completion,
            search,
            repos,
            publisher,
            models,
            core: RwLock::new(CoreAgents::default()),
            dynamic: RwLock::new(DynamicAgents::default()),
            init_lock: Mutex::new(()),
        }
    }

    fn build_agent(&self, profile: AgentProfile) -> Arc<Agent> {
        Arc::new(Agent::new(
            profile,
            self.completion.clone(),
            self.repos.clone(),
        ))
    }

    /// Adopts the persisted identity of a core agent, or creates its record
    async fn sync_with_storage(&self, agent: &Agent) -> AgentResult<()> {
        let existing = self
            .repos
            .agents
            .find_by_name_and_kind(agent.name(), agent.kind())
            .await?;

        let id = match existing {
            Some(record) => {
                self.repos
                    .agents
                    .update_status(record.id, AgentStatus::Active)
                    .await?;
                record.id
            }
            None => {
                self.repos
                    .agents
                    .create(NewAgentRecord {
                        name: agent.name().to_string(),
                        kind: agent.kind(),
                        role: agent.role().to_string(),
                        status: AgentStatus::Active,
                        config: json!({ "model": agent.model() }),
                    })
                    .await?
                    .id
            }
        };

        agent.attach(id);
        Ok(())
    }

    async fn init_kind(&self, kind: AgentKind) -> AgentResult<()> {
        match kind {
            AgentKind::Orchestrator => {
                let existing = read(&self.core).orchestrator.clone();
                let wrapper = match existing {
                    Some(w) => w,
                    None => Arc::new(OrchestratorAgent::new(self.build_agent(
                        OrchestratorAgent::profile(&self.models.advanced_model),
                    ))),
                };
                self.sync_with_storage(wrapper.agent()).await?;
                write(&self.core).orchestrator = Some(wrapper);
            }
            AgentKind::Researcher => {
                let existing = read(&self.core).researcher.clone();
                let wrapper = match existing {
                    Some(w) => w,
                    None => Arc::new(ResearcherAgent::new(
                        self.build_agent(ResearcherAgent::profile(&self.models.default_model)),
                        self.search.clone(),
                    )),
                };
                self.sync_with_storage(wrapper.agent()).await?;
                write(&self.core).researcher = Some(wrapper);
            }
            AgentKind::Factory => {
                let existing = read(&self.core).factory.clone();
                let wrapper = match existing {
                    Some(w) => w,
                    None => Arc::new(FactoryAgent::new(
                        self.build_agent(FactoryAgent::profile(&self.models.default_model)),
                        self.completion.clone(),
                        self.models.default_model.clone(),
                    )),
                };
                self.sync_with_storage(wrapper.agent()).await?;
                write(&self.core).factory = Some(wrapper);
            }
            AgentKind::Dynamic => {
                return Err(AgentError::Validation(
                    "Dynamic agents are not core agents".to_string(),
                ))
            }
        }
        Ok(())
    }

    /// Creates or adopts the three core agents
    ///
    /// Safe to call repeatedly. Each agent is set up independently; failures
    /// are collected under the `error` key without undoing agents that
    /// succeeded in the same call.
    pub async fn initialize_core_agents(&self) -> BTreeMap<String, String> {
        let _init = self.init_lock.lock().await;
        let mut status = BTreeMap::new();
        let mut errors = Vec::new();

        for kind in AgentKind::CORE {
            match self.init_kind(kind).await {
                Ok(()) => {
                    status.insert(kind.to_string(), "initialized".to_string());
                }
                Err(e) => {
                    tracing::error!(kind = %kind, error = %e, "Failed to initialize core agent");
                    errors.push(format!("{}: {}", kind, e));
                }
            }
        }

        if !errors.is_empty() {
            status.insert("error".to_string(), errors.join("; "));
        } else {
            tracing::info!("Core agents initialized");
        }

        status
    }

    pub fn is_initialized(&self) -> bool {
        let core = read(&self.core);
        core.orchestrator.is_some() && core.researcher.is_some() && core.factory.is_some()
    }

    pub fn orchestrator(&self) -> Option<Arc<OrchestratorAgent>> {
        read(&self.core).orchestrator.clone()
    }

    pub fn researcher(&self) -> Option<Arc<ResearcherAgent>> {
        read(&self.core).researcher.clone()
    }

    pub fn factory(&self) -> Option<Arc<FactoryAgent>> {
        read(&self.core).factory.clone()
    }

    /// The core agent of `kind`; `None` for `Dynamic` or before initialization
    pub fn resolve_kind(&self, kind: AgentKind) -> Option<Arc<Agent>> {
        let core = read(&self.core);
        match kind {
            AgentKind::Orchestrator => core.orchestrator.as_ref().map(|o| o.agent().clone()),
            AgentKind::Researcher => core.researcher.as_ref().map(|r| r.agent().clone()),
            AgentKind::Factory => core.factory.as_ref().map(|f| f.agent().clone()),
            AgentKind::Dynamic => None,
        }
    }

    /// Core agents first, then dynamic agents
    pub fn resolve(&self, id: AgentId) -> Option<Arc<Agent>> {
        if let Some(agent) = read(&self.core)
            .agents()
            .into_iter()
            .find(|a| a.id() == Some(id))
        {
            return Some(agent);
        }

        read(&self.dynamic)
            .by_name
            .values()
            .find(|a| a.id() == Some(id))
            .cloned()
    }

    pub fn resolve_by_name(&self, name: &str) -> Option<Arc<Agent>> {
        if let Some(agent) = read(&self.core)
            .agents()
            .into_iter()
            .find(|a| a.name() == name)
        {
            return Some(agent);
        }

        read(&self.dynamic).by_name.get(name).cloned()
    }

    fn reserve_name(&self, base: &str) -> Reservation<'_> {
        let mut dynamic = write(&self.dynamic);
        let taken = |candidate: &str, dynamic: &DynamicAgents| {
            dynamic.by_name.contains_key(candidate)
                || dynamic.reserved.contains(candidate)
                || [ORCHESTRATOR_NAME, RESEARCHER_NAME, FACTORY_NAME].contains(&candidate)
        };

        let mut name = base.to_string();
        let mut suffix = 2;
        while taken(&name, &*dynamic) {
            name = format!("{}-{}", base, suffix);
            suffix += 1;
        }

        dynamic.reserved.insert(name.clone());
        Reservation {
            dynamic: &self.dynamic,
            name,
        }
    }

    fn publish(&self, event: AgentEvent) {
        if let Err(e) = self.publisher.publish(event.name(), event.payload()) {
            tracing::warn!(event = event.name(), error = %e, "Failed to publish agent event");
        }
    }

    /// Instantiates `spec` through the factory and registers the new agent
    ///
    /// A name already in use gets a numeric suffix (`Tester-2`). Returns
    /// `Ok(None)` when the factory could not create the agent.
    pub async fn create_dynamic_agent(&self, mut spec: AgentSpec) -> AgentResult<Option<Arc<Agent>>> {
        let factory = self.factory().ok_or(AgentError::NotInitialized)?;

        let reservation = self.reserve_name(&spec.name);
        if reservation.name != spec.name {
            tracing::info!(requested = %spec.name, assigned = %reservation.name, "Agent name in use, suffixing");
            spec.name = reservation.name.clone();
        }

        let Some(agent) = factory.instantiate(&spec).await else {
            return Ok(None);
        };

        write(&self.dynamic)
            .by_name
            .insert(agent.name().to_string(), agent.clone());
        drop(reservation);

        self.publish(AgentEvent::Created {
            agent: agent.describe(),
        });
        Ok(Some(agent))
    }

    /// Designs a spec for the request, then registers the agent
    pub async fn create_from_request(
        &self,
        role: &str,
        capabilities: &[String],
        reason: &str,
    ) -> AgentResult<Option<Arc<Agent>>> {
        let factory = self.factory().ok_or(AgentError::NotInitialized)?;

        let mut requirements = serde_json::Map::new();
        requirements.insert("reason".to_string(), json!(reason));
        let spec = factory.design_spec(role, capabilities, requirements).await?;

        self.create_dynamic_agent(spec).await
    }

    /// Delivers `message` from one agent to another by name
    ///
    /// `Ok(None)` when either end is unknown.
    pub async fn route(
        &self,
        sender_id: AgentId,
        recipient_name: &str,
        message: &str,
    ) -> AgentResult<Option<AgentReply>> {
        let (Some(sender), Some(recipient)) =
            (self.resolve(sender_id), self.resolve_by_name(recipient_name))
        else {
            return Ok(None);
        };

        let reply = recipient.send_message(message, Some(sender.name())).await?;
        Ok(Some(reply))
    }

    /// Removes a dynamic agent and marks its record terminated
    ///
    /// Always `false` for core agents. `true` only when an agent was removed.
    pub async fn terminate(&self, id: AgentId) -> AgentResult<bool> {
        if read(&self.core).agents().iter().any(|a| a.id() == Some(id)) {
            tracing::warn!(agent_id = id, "Refusing to terminate core agent");
            return Ok(false);
        }

        let removed = {
            let mut dynamic = write(&self.dynamic);
            let name = dynamic
                .by_name
                .iter()
                .find(|(_, a)| a.id() == Some(id))
                .map(|(name, _)| name.clone());
            name.and_then(|name| dynamic.by_name.remove(&name))
        };

        let Some(agent) = removed else {
            return Ok(false);
        };

        if let Err(e) = self
            .repos
            .agents
            .update_status(id, AgentStatus::Terminated)
            .await
        {
            tracing::warn!(agent_id = id, error = %e, "Failed to mark agent terminated");
        }

        if let Some(factory) = self.factory() {
            factory.forget(agent.name()).await;
        }

        tracing::info!(agent = %agent.name(), agent_id = id, "Terminated dynamic agent");
        self.publish(AgentEvent::Terminated {
            agent_id: id,
            name: agent.name().to_string(),
        });
        Ok(true)
    }

    /// Snapshots of every tracked agent: core first, dynamic by id
    pub fn list(&self) -> Vec<AgentSnapshot> {
        let mut snapshots: Vec<AgentSnapshot> =
            read(&self.core).agents().iter().map(|a| a.describe()).collect();

        let mut dynamic: Vec<AgentSnapshot> = read(&self.dynamic)
            .by_name
            .values()
            .map(|a| a.describe())
            .collect();
        dynamic.sort_by_key(|s| s.id);

        snapshots.extend(dynamic);
        snapshots
    }

    pub fn status(&self, id: AgentId) -> Option<AgentSnapshot> {
        self.resolve(id).map(|a| a.describe())
    }

    pub fn dynamic_count(&self) -> usize {
        read(&self.dynamic).by_name.len()
    }

    /// Sets every agent idle and drops all references
    pub async fn shutdown(&self) {
        let mut agents = read(&self.core).agents();
        agents.extend(read(&self.dynamic).by_name.values().cloned());

        for agent in &agents {
            if let Err(e) = agent.update_status(AgentStatus::Idle).await {
                tracing::warn!(agent = %agent.name(), error = %e, "Failed to reset agent status");
            }
        }

        *write(&self.core) = CoreAgents::default();
        write(&self.dynamic).by_name.clear();
        tracing::info!(agents = agents.len(), "Agent registry shut down");
    }
}
