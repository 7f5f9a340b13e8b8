// Domain layer module exports
// Entities, value objects and ports; independent of infrastructure concerns

pub mod agent;
pub mod errors;
pub mod message;
pub mod publisher;
pub mod repositories;
pub mod search;
pub mod workflow;

pub use errors::DomainError;
