//! pilot-core: Tool orchestration core for Pipeline Pilot
//!
//! Connects an agent service that pauses runs to request tool calls with the
//! tools that carry those calls out. Provides configuration, the tool
//! registry, the Assistants API client and the turn-level polling loop.

pub mod agent;
pub mod config;
pub mod error;
pub mod runner;
pub mod tool;

pub use agent::{
    AgentService, AssistantsClient, ChatMessage, RunState, RunStatus, ToolInvocation, ToolOutput,
};
pub use config::{BrowserSettings, Config, LlmConfig, RunSettings};
pub use error::{Error, Result};
pub use runner::{
    CANCEL_GRACE, Runner, RunnerConfig, TOOL_NOT_EXPOSED, TurnOutcome, TurnReport, dispatch,
};
pub use tool::{ParamKind, ParamSpec, Tool, ToolArgs, ToolRegistry, ToolResult, ToolSpec};

pub use tokio_util::sync::CancellationToken;
