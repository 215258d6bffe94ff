//! pilot-browser: the browser session driven by the agent
//!
//! One visible Chrome tab, wrapped in a [`BrowserSession`] whose primitives
//! refuse to act once the window is gone, plus the tools that expose those
//! primitives to the agent.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pilot_browser::{BrowserConfig, BrowserSession};
//! use pilot_core::ToolRegistry;
//! use std::sync::Arc;
//!
//! let session = Arc::new(BrowserSession::launch(&BrowserConfig::visible())?);
//!
//! let mut registry = ToolRegistry::new();
//! pilot_browser::register_browser_tools(&mut registry, session.clone());
//! ```

pub mod chrome;
pub mod driver;
pub mod error;
pub mod memory;
pub mod selector;
pub mod session;
pub mod tools;

pub use chrome::{BrowserConfig, BrowserConfigBuilder, ChromePage};
pub use driver::PageDriver;
pub use error::{BrowserError, Result};
pub use memory::MemoryPage;
pub use selector::Selector;
pub use session::{BrowserSession, DEFAULT_CLICK_TIMEOUT_MS};
pub use tools::{
    BrowserClickTool, BrowserGotoTool, BrowserSnapshotTool, BrowserTypeTool,
    register_browser_tools,
};
