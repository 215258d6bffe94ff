//! Tool trait definition
//!
//! Defines the core trait for operations the agent can request while a run
//! is paused for tool execution.

use async_trait::async_trait;

use crate::tool::args::ToolArgs;
use crate::tool::definition::ToolSpec;
use crate::Result;

/// Tool execution result
#[derive(Debug, Clone)]
pub struct ToolResult {
    /// Output string handed back to the agent service
    pub output: String,
    /// Whether the execution resulted in an error
    pub is_error: bool,
}

impl ToolResult {
    /// Create a successful tool result
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: false,
        }
    }

    /// Create an error tool result
    ///
    /// For failures the agent should read as ordinary output. The text is
    /// handed back unchanged; only a warning is logged.
    pub fn error(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: true,
        }
    }
}

/// An operation the agent can invoke
///
/// Implementations return short natural-language confirmations; the
/// consumer is a language model, not a typed program.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name, description and parameter declarations
    fn spec(&self) -> ToolSpec;

    /// Execute the tool with arguments already bound against [`Tool::spec`]
    async fn execute(&self, args: ToolArgs) -> Result<ToolResult>;
}
