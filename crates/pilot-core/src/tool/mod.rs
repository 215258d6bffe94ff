//! Tool system
//!
//! Tools are the operations an agent run may request while paused in
//! `requires_action`.

pub mod args;
pub mod definition;
pub mod registry;
pub mod traits;

pub use args::{ArgValue, ToolArgs};
pub use definition::{ParamKind, ParamSpec, ToolSpec};
pub use registry::ToolRegistry;
pub use traits::{Tool, ToolResult};
