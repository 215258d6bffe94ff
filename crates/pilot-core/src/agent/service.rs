//! Agent service trait
//!
//! The agent service owns conversational state and model invocation. This
//! crate only needs the handful of calls below, so tests can substitute a
//! scripted implementation for the HTTP client.

use async_trait::async_trait;

use crate::agent::types::{ChatMessage, RunState, ToolOutput};
use crate::tool::ToolSpec;
use crate::Result;

#[async_trait]
pub trait AgentService: Send + Sync {
    /// Create a new conversation and return its id
    async fn create_conversation(&self) -> Result<String>;

    /// Append a message to a conversation
    async fn append_message(&self, conversation: &str, role: &str, text: &str) -> Result<()>;

    /// Start a run on a conversation with the given tools available
    async fn start_run(&self, conversation: &str, tools: &[ToolSpec]) -> Result<RunState>;

    /// Retrieve the current state of a run
    async fn get_run(&self, conversation: &str, run_id: &str) -> Result<RunState>;

    /// Resolve a `requires_action` pause with one output per invocation
    async fn submit_tool_outputs(
        &self,
        conversation: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<RunState>;

    /// Ask the service to cancel a run
    async fn cancel_run(&self, conversation: &str, run_id: &str) -> Result<RunState>;

    /// Most recent message of the conversation, if any
    async fn latest_message(&self, conversation: &str) -> Result<Option<ChatMessage>>;
}
