//! Browser tools
//!
//! The four operations advertised to the agent. Each one is a thin adapter
//! from bound arguments to a [`BrowserSession`] primitive; the blocking
//! driver call runs off the async runtime.

use std::sync::Arc;

use async_trait::async_trait;

use pilot_core::{ParamSpec, Tool, ToolArgs, ToolRegistry, ToolResult, ToolSpec};

use crate::error::{BrowserError, Result};
use crate::session::BrowserSession;

/// Run a session primitive on the blocking pool
async fn run_blocking<F>(session: &Arc<BrowserSession>, op: F) -> pilot_core::Result<ToolResult>
where
    F: FnOnce(&BrowserSession) -> Result<String> + Send + 'static,
{
    let session = Arc::clone(session);
    let output = tokio::task::spawn_blocking(move || op(&session))
        .await
        .map_err(|e| {
            pilot_core::Error::ToolExecution(format!("browser task failed: {}", e))
        })??;

    Ok(ToolResult::success(output))
}

fn timeout_arg(args: &ToolArgs) -> pilot_core::Result<u64> {
    let timeout = args.integer("timeout")?;
    u64::try_from(timeout).map_err(|_| {
        BrowserError::InvalidInput(format!("timeout must be positive, got {}", timeout)).into()
    })
}

/// Navigate the shared page
pub struct BrowserGotoTool {
    session: Arc<BrowserSession>,
}

impl BrowserGotoTool {
    pub fn new(session: Arc<BrowserSession>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Tool for BrowserGotoTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "browser_goto",
            "Navigate the shared browser to the given absolute URL.",
        )
        .param(ParamSpec::string("url", "Absolute URL"))
    }

    async fn execute(&self, args: ToolArgs) -> pilot_core::Result<ToolResult> {
        let url = args.str("url")?.to_string();
        run_blocking(&self.session, move |s| s.navigate(&url)).await
    }
}

/// Click an element
pub struct BrowserClickTool {
    session: Arc<BrowserSession>,
    default_timeout_ms: u64,
}

impl BrowserClickTool {
    pub fn new(session: Arc<BrowserSession>) -> Self {
        let default_timeout_ms =
            u64::try_from(session.click_timeout().as_millis()).unwrap_or(u64::MAX);
        Self {
            session,
            default_timeout_ms,
        }
    }
}

#[async_trait]
impl Tool for BrowserClickTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "browser_click",
            "Click the first element matching *selector* (CSS or text).",
        )
        .param(ParamSpec::string("selector", "CSS/text selector"))
        .param(ParamSpec::integer("timeout", "Timeout ms").with_default(self.default_timeout_ms))
    }

    async fn execute(&self, args: ToolArgs) -> pilot_core::Result<ToolResult> {
        let selector = args.str("selector")?.to_string();
        let timeout = timeout_arg(&args)?;
        run_blocking(&self.session, move |s| s.click(&selector, timeout)).await
    }
}

/// Replace the value of an input field
pub struct BrowserTypeTool {
    session: Arc<BrowserSession>,
}

impl BrowserTypeTool {
    pub fn new(session: Arc<BrowserSession>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Tool for BrowserTypeTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "browser_type",
            "Focus the element matching *selector*, replace its value with *text*, \
             then optionally press Enter.",
        )
        .param(ParamSpec::string("selector", "Input field selector"))
        .param(ParamSpec::string("text", "Text to type"))
        .param(ParamSpec::boolean("press_enter", "Press Enter?").with_default(false))
    }

    async fn execute(&self, args: ToolArgs) -> pilot_core::Result<ToolResult> {
        let selector = args.str("selector")?.to_string();
        let text = args.str("text")?.to_string();
        let press_enter = args.boolean("press_enter")?;
        run_blocking(&self.session, move |s| {
            s.type_text(&selector, &text, press_enter)
        })
        .await
    }
}

/// Return the current document markup
pub struct BrowserSnapshotTool {
    session: Arc<BrowserSession>,
}

impl BrowserSnapshotTool {
    pub fn new(session: Arc<BrowserSession>) -> Self {
        Self { session }
    }
}

#[async_trait]
impl Tool for BrowserSnapshotTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec::new(
            "browser_snapshot_dom",
            "Return current document HTML so the model can reason on it.",
        )
    }

    async fn execute(&self, _args: ToolArgs) -> pilot_core::Result<ToolResult> {
        run_blocking(&self.session, |s| s.snapshot()).await
    }
}

/// Register the browser tools against one shared session
pub fn register_browser_tools(registry: &mut ToolRegistry, session: Arc<BrowserSession>) {
    registry.register(Arc::new(BrowserGotoTool::new(session.clone())));
    registry.register(Arc::new(BrowserClickTool::new(session.clone())));
    registry.register(Arc::new(BrowserTypeTool::new(session.clone())));
    registry.register(Arc::new(BrowserSnapshotTool::new(session)));
}
