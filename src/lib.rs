//! Agent Orchestra Library
//!
//! Coordinates LLM-backed agents through persisted multi-stage workflows:
//! the agent registry, the workflow orchestrator, the synchronous execution
//! bridge and the background job queue, plus the storage, completion and
//! HTTP adapters around them.

pub mod agents;
pub mod api;
pub mod config;
pub mod context;
pub mod domain;
pub mod execution;
pub mod infrastructure;
pub mod services;
