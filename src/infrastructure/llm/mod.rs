// Completion service adapters

pub mod openai;
pub mod scripted;

pub use openai::OpenAiCompletionClient;
pub use scripted::{RecordedCall, ScriptedCompletionClient};
