// Infrastructure layer module
// Contains database adapters and external service integrations
// Follows Hexagonal Architecture

pub mod database;
pub mod event_bus;
pub mod knowledge_base;
pub mod llm;
pub mod repositories;

pub use event_bus::{EventBus, PublishedEvent};
pub use knowledge_base::InMemoryKnowledgeBase;
