//! Orchestration loop
//!
//! One user turn: append the message, start a run, then poll until the run
//! is terminal. Whenever the run pauses in `requires_action` every pending
//! invocation is dispatched against the [`ToolRegistry`] and the outputs are
//! submitted together before polling resumes.
//!
//! Nothing that goes wrong inside a tool escapes [`dispatch`]: unknown names,
//! malformed payloads, tool errors and panics all become the invocation's
//! output string so the conversation can continue.

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde_json::Value as JsonValue;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::agent::{AgentService, RunState, RunStatus, ToolInvocation, ToolOutput};
use crate::config::RunSettings;
use crate::tool::ToolRegistry;
use crate::{Error, Result};

/// Output reported for invocations of tools that are not registered
pub const TOOL_NOT_EXPOSED: &str = "Tool not exposed";

/// How long a cancelled run may take to reach a terminal status
pub const CANCEL_GRACE: Duration = Duration::from_secs(10);

/// Polling parameters
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub poll_interval: Duration,
    pub max_wait: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::from(&RunSettings::default())
    }
}

impl From<&RunSettings> for RunnerConfig {
    fn from(settings: &RunSettings) -> Self {
        Self {
            poll_interval: settings.poll_interval(),
            max_wait: settings.max_wait(),
        }
    }
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Run completed and the latest message came from the assistant
    Reply(String),
    /// Run completed but there was no assistant message to show
    NoReply,
    /// Run failed, expired or stopped incomplete
    Failed {
        status: RunStatus,
        reason: Option<String>,
    },
    /// The service cancelled the run
    Cancelled,
    /// The user aborted the turn and the run was cancelled on their behalf
    Aborted,
}

/// Summary of one turn
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub run_id: String,
    pub outcome: TurnOutcome,
    /// Number of `requires_action` pauses resolved
    pub tool_rounds: usize,
    /// Number of invocations dispatched
    pub tool_calls: usize,
    /// A tool reported that the browser window is gone
    pub session_lost: bool,
}

/// Result of dispatching a single invocation
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub output: ToolOutput,
    pub session_lost: bool,
}

/// Parse a raw argument payload
///
/// Empty or malformed payloads fall back to an empty object.
pub fn parse_arguments(raw: &str) -> JsonValue {
    if raw.trim().is_empty() {
        return JsonValue::Object(Default::default());
    }

    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("Malformed tool arguments ({}), using empty arguments: {}", e, raw);
            JsonValue::Object(Default::default())
        }
    }
}

/// Execute one invocation and turn whatever happens into its output
pub async fn dispatch(registry: &ToolRegistry, invocation: &ToolInvocation) -> Dispatched {
    let args = parse_arguments(&invocation.arguments);

    debug!("Dispatching {} ({})", invocation.name, invocation.id);

    let result = AssertUnwindSafe(registry.invoke(&invocation.name, &args))
        .catch_unwind()
        .await;

    let mut session_lost = false;
    let output = match result {
        Ok(Ok(result)) => {
            if result.is_error {
                warn!("Tool {} reported an error: {}", invocation.name, result.output);
            }
            result.output
        }
        Ok(Err(Error::UnknownTool(name))) => {
            warn!("Agent requested unknown tool: {}", name);
            TOOL_NOT_EXPOSED.to_string()
        }
        Ok(Err(e)) => {
            if matches!(e, Error::SessionClosed) {
                error!("Browser session lost while running {}", invocation.name);
                session_lost = true;
            } else {
                warn!("Tool {} failed: {}", invocation.name, e);
            }
            format!("Tool error: {}", e)
        }
        Err(_) => {
            error!("Tool {} panicked", invocation.name);
            "Tool error: tool panicked".to_string()
        }
    };

    Dispatched {
        output: ToolOutput::new(invocation.id.clone(), output),
        session_lost,
    }
}

enum Wait {
    Elapsed,
    Cancelled,
}

/// Drives conversation turns against an agent service
pub struct Runner {
    agent: Arc<dyn AgentService>,
    registry: ToolRegistry,
    config: RunnerConfig,
    conversation: String,
}

impl Runner {
    /// Create a runner on a fresh conversation
    pub async fn start(
        agent: Arc<dyn AgentService>,
        registry: ToolRegistry,
        config: RunnerConfig,
    ) -> Result<Self> {
        let conversation = agent.create_conversation().await?;
        info!(
            "Conversation {} ready with {} tool(s)",
            conversation,
            registry.len()
        );

        Ok(Self {
            agent,
            registry,
            config,
            conversation,
        })
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Drop the current conversation and start a new one
    pub async fn reset_conversation(&mut self) -> Result<()> {
        self.conversation = self.agent.create_conversation().await?;
        info!("Started new conversation {}", self.conversation);
        Ok(())
    }

    /// Run one user turn to completion
    ///
    /// # Errors
    /// Agent-service failures propagate. Exceeding `max_wait` cancels the run
    /// and returns [`Error::PollTimeout`]. Tool failures never propagate.
    pub async fn run_turn(&self, text: &str, cancel: &CancellationToken) -> Result<TurnReport> {
        let conversation = self.conversation.as_str();

        self.agent.append_message(conversation, "user", text).await?;
        let tools = self.registry.describe_all();
        let mut run = self.agent.start_run(conversation, &tools).await?;

        info!("Started run {} (status: {})", run.id, run.status);

        let deadline = Instant::now() + self.config.max_wait;
        let mut submitted: HashSet<String> = HashSet::new();
        let mut tool_rounds = 0;
        let mut tool_calls = 0;
        let mut session_lost = false;

        loop {
            if run.status.is_terminal() {
                break;
            }

            if cancel.is_cancelled() {
                return Ok(self
                    .abort(run, tool_rounds, tool_calls, session_lost)
                    .await);
            }

            // Checked before dispatching too: a run can keep asking for tools.
            if Instant::now() >= deadline {
                return Err(self.time_out(run).await);
            }

            if run.status == RunStatus::RequiresAction {
                let fresh: Vec<&ToolInvocation> = run
                    .pending
                    .iter()
                    .filter(|i| !submitted.contains(&i.id))
                    .collect();

                if !fresh.is_empty() {
                    tool_rounds += 1;
                    info!(
                        "Run {} requires action: {} invocation(s)",
                        run.id,
                        fresh.len()
                    );

                    let mut outputs = Vec::with_capacity(fresh.len());
                    for invocation in fresh {
                        let dispatched = dispatch(&self.registry, invocation).await;
                        session_lost |= dispatched.session_lost;
                        submitted.insert(invocation.id.clone());
                        outputs.push(dispatched.output);
                    }
                    tool_calls += outputs.len();

                    run = self
                        .agent
                        .submit_tool_outputs(conversation, &run.id, outputs)
                        .await?;
                    debug!("Submitted tool outputs, run {} is {}", run.id, run.status);
                    continue;
                }

                debug!("Run {} still reports already-submitted invocations", run.id);
            }

            match self.wait(deadline, cancel).await {
                Wait::Cancelled => {
                    return Ok(self
                        .abort(run, tool_rounds, tool_calls, session_lost)
                        .await);
                }
                Wait::Elapsed => {}
            }

            if Instant::now() >= deadline {
                return Err(self.time_out(run).await);
            }

            run = self.agent.get_run(conversation, &run.id).await?;
            debug!("Run {} status: {}", run.id, run.status);
        }

        info!("Run {} finished: {}", run.id, run.status);

        let outcome = match run.status {
            RunStatus::Completed => match self.agent.latest_message(conversation).await? {
                Some(message) if message.is_assistant() => TurnOutcome::Reply(message.text),
                _ => TurnOutcome::NoReply,
            },
            RunStatus::Cancelled => TurnOutcome::Cancelled,
            status => TurnOutcome::Failed {
                status,
                reason: run.last_error.clone(),
            },
        };

        Ok(TurnReport {
            run_id: run.id,
            outcome,
            tool_rounds,
            tool_calls,
            session_lost,
        })
    }

    async fn wait(&self, deadline: Instant, cancel: &CancellationToken) -> Wait {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let pause = self.config.poll_interval.min(remaining);

        tokio::select! {
            _ = cancel.cancelled() => Wait::Cancelled,
            _ = tokio::time::sleep(pause) => Wait::Elapsed,
        }
    }

    async fn abort(
        &self,
        run: RunState,
        tool_rounds: usize,
        tool_calls: usize,
        session_lost: bool,
    ) -> TurnReport {
        info!("Turn aborted, cancelling run {}", run.id);
        self.cancel_and_settle(&run.id).await;

        TurnReport {
            run_id: run.id,
            outcome: TurnOutcome::Aborted,
            tool_rounds,
            tool_calls,
            session_lost,
        }
    }

    async fn time_out(&self, run: RunState) -> Error {
        warn!(
            "Run {} still {} after {:?}, cancelling",
            run.id, run.status, self.config.max_wait
        );
        self.cancel_and_settle(&run.id).await;

        Error::PollTimeout {
            run_id: run.id,
            waited: self.config.max_wait,
        }
    }

    /// Cancel a run and wait until the service reports it terminal
    ///
    /// The conversation rejects new messages while a run is still active,
    /// so the turn must not end with the run in `cancelling`. Gives up after
    /// [`CANCEL_GRACE`].
    async fn cancel_and_settle(&self, run_id: &str) {
        let mut state = match self.agent.cancel_run(&self.conversation, run_id).await {
            Ok(state) => state,
            Err(e) => {
                warn!("Failed to cancel run {}: {}", run_id, e);
                return;
            }
        };

        let grace_end = Instant::now() + CANCEL_GRACE;
        while !state.status.is_terminal() {
            if Instant::now() >= grace_end {
                warn!(
                    "Run {} still {} {:?} after cancel, next message may be rejected",
                    run_id, state.status, CANCEL_GRACE
                );
                return;
            }

            tokio::time::sleep(self.config.poll_interval).await;

            state = match self.agent.get_run(&self.conversation, run_id).await {
                Ok(state) => state,
                Err(e) => {
                    warn!("Failed to poll cancelled run {}: {}", run_id, e);
                    return;
                }
            };
        }

        debug!("Run {} settled as {}", run_id, state.status);
    }
}
