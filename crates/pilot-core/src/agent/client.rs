//! Assistants API HTTP client
//!
//! Talks to an OpenAI-compatible Assistants v2 endpoint: threads carry the
//! conversation, runs execute the assistant against a thread.

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};
use tracing::{debug, info, warn};

use crate::agent::service::AgentService;
use crate::agent::types::{ChatMessage, RunState, RunStatus, ToolInvocation, ToolOutput};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::tool::ToolSpec;

/// Assistants API client bound to one assistant
#[derive(Clone)]
pub struct AssistantsClient {
    client: Client,
    api_key: String,
    base_url: String,
    assistant_id: Option<String>,
}

impl AssistantsClient {
    /// Create a new client from configuration
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client,
            api_key: config.llm.api_key.clone(),
            base_url: config.llm.base_url.trim_end_matches('/').to_string(),
            assistant_id: None,
        })
    }

    /// Create with custom base URL (for testing or custom endpoints)
    pub fn with_base_url(config: &Config, base_url: impl Into<String>) -> Result<Self> {
        let mut client = Self::new(config)?;
        client.base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(client)
    }

    /// Bind the client to an existing assistant
    pub fn with_assistant(mut self, assistant_id: impl Into<String>) -> Self {
        self.assistant_id = Some(assistant_id.into());
        self
    }

    pub fn assistant_id(&self) -> Option<&str> {
        self.assistant_id.as_deref()
    }

    /// Create an assistant with the given instructions and tools
    pub async fn create_assistant(
        &self,
        name: &str,
        model: &str,
        instructions: &str,
        tools: &[ToolSpec],
    ) -> Result<String> {
        let body = json!({
            "name": name,
            "model": model,
            "instructions": instructions,
            "tools": tools.iter().map(ToolSpec::to_schema).collect::<Vec<_>>(),
        });

        let created: IdObject = self
            .send(self.post("/assistants").json(&body), "create assistant")
            .await?;

        info!("Created assistant {} (model: {})", created.id, model);
        Ok(created.id)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.post(format!("{}{}", self.base_url, path)))
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authorize(self.client.get(format!("{}{}", self.base_url, path)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
            .header("content-type", "application/json")
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, what: &str) -> Result<T> {
        debug!("Agent service request: {}", what);

        let response = request.send().await.map_err(Error::Http)?;
        let status = response.status();
        let body = response.text().await.map_err(Error::Http)?;

        if !status.is_success() {
            warn!("Agent service error on {}: {} - {}", what, status, body);
            return Err(Error::Api(format!("{} failed: {}: {}", what, status, body)));
        }

        serde_json::from_str(&body).map_err(|e| {
            Error::Api(format!("Failed to parse {} response: {} - {}", what, e, body))
        })
    }
}

#[async_trait::async_trait]
impl AgentService for AssistantsClient {
    async fn create_conversation(&self) -> Result<String> {
        let thread: IdObject = self
            .send(self.post("/threads").json(&json!({})), "create thread")
            .await?;
        info!("Created thread {}", thread.id);
        Ok(thread.id)
    }

    async fn append_message(&self, conversation: &str, role: &str, text: &str) -> Result<()> {
        let body = json!({ "role": role, "content": text });
        let _: IdObject = self
            .send(
                self.post(&format!("/threads/{}/messages", conversation)).json(&body),
                "create message",
            )
            .await?;
        Ok(())
    }

    async fn start_run(&self, conversation: &str, tools: &[ToolSpec]) -> Result<RunState> {
        let assistant_id = self
            .assistant_id
            .as_deref()
            .ok_or_else(|| Error::Config("No assistant configured for this client".to_string()))?;

        let mut body = json!({ "assistant_id": assistant_id });
        if !tools.is_empty() {
            body["tools"] = JsonValue::Array(tools.iter().map(ToolSpec::to_schema).collect());
        }

        let run: WireRun = self
            .send(
                self.post(&format!("/threads/{}/runs", conversation)).json(&body),
                "create run",
            )
            .await?;
        Ok(run.into())
    }

    async fn get_run(&self, conversation: &str, run_id: &str) -> Result<RunState> {
        let run: WireRun = self
            .send(
                self.get(&format!("/threads/{}/runs/{}", conversation, run_id)),
                "retrieve run",
            )
            .await?;
        Ok(run.into())
    }

    async fn submit_tool_outputs(
        &self,
        conversation: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> Result<RunState> {
        let body = SubmitToolOutputsRequest { tool_outputs: outputs };
        let run: WireRun = self
            .send(
                self.post(&format!(
                    "/threads/{}/runs/{}/submit_tool_outputs",
                    conversation, run_id
                ))
                .json(&body),
                "submit tool outputs",
            )
            .await?;
        Ok(run.into())
    }

    async fn cancel_run(&self, conversation: &str, run_id: &str) -> Result<RunState> {
        let run: WireRun = self
            .send(
                self.post(&format!("/threads/{}/runs/{}/cancel", conversation, run_id)),
                "cancel run",
            )
            .await?;
        Ok(run.into())
    }

    async fn latest_message(&self, conversation: &str) -> Result<Option<ChatMessage>> {
        let list: MessageList = self
            .send(
                self.get(&format!("/threads/{}/messages", conversation))
                    .query(&[("order", "desc"), ("limit", "1")]),
                "list messages",
            )
            .await?;
        Ok(list.data.into_iter().next().map(Into::into))
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct IdObject {
    id: String,
}

#[derive(Debug, Serialize)]
struct SubmitToolOutputsRequest {
    tool_outputs: Vec<ToolOutput>,
}

#[derive(Debug, Deserialize)]
struct WireRun {
    id: String,
    status: RunStatus,
    #[serde(default)]
    required_action: Option<RequiredAction>,
    #[serde(default)]
    last_error: Option<WireRunError>,
}

#[derive(Debug, Deserialize)]
struct RequiredAction {
    submit_tool_outputs: Option<SubmitToolOutputs>,
}

#[derive(Debug, Deserialize)]
struct SubmitToolOutputs {
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct WireRunError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl From<WireRun> for RunState {
    fn from(run: WireRun) -> Self {
        let pending = run
            .required_action
            .and_then(|a| a.submit_tool_outputs)
            .map(|s| {
                s.tool_calls
                    .into_iter()
                    .map(|c| ToolInvocation::new(c.id, c.function.name, c.function.arguments))
                    .collect()
            })
            .unwrap_or_default();

        let last_error = run.last_error.map(|e| match (e.code, e.message) {
            (Some(code), Some(message)) => format!("{}: {}", code, message),
            (None, Some(message)) => message,
            (Some(code), None) => code,
            (None, None) => "unknown error".to_string(),
        });

        RunState {
            id: run.id,
            status: run.status,
            pending,
            last_error,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageList {
    data: Vec<WireMessage>,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Vec<WireContent>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireContent {
    Text { text: WireText },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
struct WireText {
    value: String,
}

impl From<WireMessage> for ChatMessage {
    fn from(message: WireMessage) -> Self {
        let text = message
            .content
            .into_iter()
            .filter_map(|c| match c {
                WireContent::Text { text } => Some(text.value),
                WireContent::Unsupported => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        ChatMessage {
            role: message.role,
            text,
        }
    }
}
