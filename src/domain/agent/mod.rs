// Agent domain module
// Persisted agent records and the value objects shared with the agents layer

pub mod record;
pub mod value_objects;

pub use record::{AgentRecord, NewAgentRecord};
pub use value_objects::{AgentId, AgentKind, AgentStatus};
