use serde::{Deserialize, Serialize};

/// Persisted identity of an agent, assigned by the database
pub type AgentId = i64;

/// The four kinds of agent the system knows about
///
/// `Orchestrator`, `Researcher` and `Factory` are the permanent core agents;
/// everything created at runtime is `Dynamic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AgentKind {
    Orchestrator,
    Researcher,
    Factory,
    Dynamic,
}

impl AgentKind {
    /// The core kinds, in initialization order
    pub const CORE: [AgentKind; 3] = [
        AgentKind::Orchestrator,
        AgentKind::Researcher,
        AgentKind::Factory,
    ];

    pub fn is_core(&self) -> bool {
        !matches!(self, AgentKind::Dynamic)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Orchestrator => "orchestrator",
            AgentKind::Researcher => "researcher",
            AgentKind::Factory => "factory",
            AgentKind::Dynamic => "dynamic",
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of an agent
///
/// In memory an agent only moves between `Idle`, `Busy` and `Error`.
/// `Active` and `Terminated` are only ever written to persisted records:
/// `Active` when a core agent is synced or a dynamic agent is created,
/// `Terminated` when a dynamic agent is removed.
///
/// # Example
/// ```
/// use agent_orchestra::domain::agent::AgentStatus;
///
/// assert_eq!(AgentStatus::Busy.to_string(), "busy");
/// assert!(AgentStatus::Terminated.is_persisted_only());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AgentStatus {
    Idle,
    Busy,
    Error,
    Active,
    Terminated,
}

impl AgentStatus {
    pub fn is_persisted_only(&self) -> bool {
        matches!(self, AgentStatus::Active | AgentStatus::Terminated)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Idle => "idle",
            AgentStatus::Busy => "busy",
            AgentStatus::Error => "error",
            AgentStatus::Active => "active",
            AgentStatus::Terminated => "terminated",
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
