//! Agent service: conversations, runs and tool-output submission

pub mod client;
pub mod service;
pub mod types;

pub use client::AssistantsClient;
pub use service::AgentService;
pub use types::{ChatMessage, RunState, RunStatus, ToolInvocation, ToolOutput};
