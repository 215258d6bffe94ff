//! Agent service domain types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status of a run as reported by the agent service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Completed,
    Failed,
    Cancelled,
    Expired,
    Incomplete,
    /// Any status this client does not know; treated as still pending
    #[serde(other)]
    Other,
}

impl RunStatus {
    /// Whether the run has stopped for good
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Cancelled | Self::Expired | Self::Incomplete
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Cancelling => "cancelling",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::Incomplete => "incomplete",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One operation requested by a paused run
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    /// Correlation token issued by the agent service
    pub id: String,
    pub name: String,
    /// Raw argument payload exactly as received; may be empty or malformed
    pub arguments: String,
}

impl ToolInvocation {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// Output of one invocation, submitted back to the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    #[serde(rename = "tool_call_id")]
    pub invocation_id: String,
    pub output: String,
}

impl ToolOutput {
    pub fn new(invocation_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            output: output.into(),
        }
    }
}

/// Snapshot of a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunState {
    pub id: String,
    pub status: RunStatus,
    /// Pending invocations; only populated in `requires_action`
    pub pending: Vec<ToolInvocation>,
    /// Error reported by the service for failed runs
    pub last_error: Option<String>,
}

impl RunState {
    pub fn new(id: impl Into<String>, status: RunStatus) -> Self {
        Self {
            id: id.into(),
            status,
            pending: Vec::new(),
            last_error: None,
        }
    }

    pub fn with_pending(mut self, pending: Vec<ToolInvocation>) -> Self {
        self.pending = pending;
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.last_error = Some(error.into());
        self
    }
}

/// A conversation message reduced to its text
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub text: String,
}

impl ChatMessage {
    pub fn is_assistant(&self) -> bool {
        self.role == "assistant"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parsing() {
        let status: RunStatus = serde_json::from_str("\"requires_action\"").unwrap();
        assert_eq!(status, RunStatus::RequiresAction);
        let status: RunStatus = serde_json::from_str("\"warming_up\"").unwrap();
        assert_eq!(status, RunStatus::Other);
        assert!(!status.is_terminal());
    }

    #[test]
    fn test_terminal_statuses() {
        for status in [RunStatus::Completed, RunStatus::Failed, RunStatus::Cancelled] {
            assert!(status.is_terminal());
        }
        for status in [
            RunStatus::Queued,
            RunStatus::InProgress,
            RunStatus::RequiresAction,
            RunStatus::Cancelling,
        ] {
            assert!(!status.is_terminal());
        }
    }

    #[test]
    fn test_tool_output_wire_name() {
        let json = serde_json::to_value(ToolOutput::new("call_1", "ok")).unwrap();
        assert_eq!(json["tool_call_id"], "call_1");
        assert_eq!(json["output"], "ok");
    }
}
