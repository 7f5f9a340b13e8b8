// Agent system modules
//
// LLM-backed agents, the three core role wrappers, the factory logic that
// creates agents at runtime, and the registry that owns them all.

pub mod agent;
pub mod completion;
pub mod errors;
pub mod events;
pub mod factory;
pub mod messages;
pub mod orchestrator;
pub mod prompts;
pub mod registry;
pub mod researcher;
pub mod types;

// Re-export main types
pub use agent::Agent;
pub use completion::{ChatMessage, ChatRole, CompletionClient};
pub use errors::{AgentError, AgentResult};
pub use factory::FactoryAgent;
pub use orchestrator::OrchestratorAgent;
pub use registry::{AgentModels, AgentRegistry};
pub use researcher::{ResearchReport, ResearcherAgent};
pub use types::{AgentProfile, AgentReply, AgentSnapshot, AgentSpec, CreatedAgentSummary};
