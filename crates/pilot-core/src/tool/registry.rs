//! Tool registry: the mapping from operation name to executable tool

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::tool::{Tool, ToolResult, ToolSpec};
use crate::{Error, Result};

struct Entry {
    spec: ToolSpec,
    tool: Arc<dyn Tool>,
}

/// Registry of tools exposed to the agent
///
/// Specs are captured once at registration and never change afterwards.
/// Registration order is the order in which tools are advertised.
pub struct ToolRegistry {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a tool
    ///
    /// A tool with an already registered name replaces the previous one in
    /// place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let spec = tool.spec();
        let name = spec.name.clone();
        match self.index.get(&name) {
            Some(&i) => self.entries[i] = Entry { spec, tool },
            None => {
                self.index.insert(name, self.entries.len());
                self.entries.push(Entry { spec, tool });
            }
        }
    }

    /// Ordered specs of every registered tool
    pub fn describe_all(&self) -> Vec<ToolSpec> {
        self.entries.iter().map(|e| e.spec.clone()).collect()
    }

    /// Function-tool schemas for the agent service
    pub fn schemas(&self) -> Vec<JsonValue> {
        self.entries.iter().map(|e| e.spec.to_schema()).collect()
    }

    /// Look up a tool by name
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&i| Arc::clone(&self.entries[i].tool))
    }

    /// Bind `args` against the tool's [`ToolSpec`] and execute it
    ///
    /// # Errors
    /// `UnknownTool` if `name` is not registered, `InvalidArguments` if the
    /// payload does not match the declared parameters, or whatever the tool itself returns.
    pub async fn invoke(&self, name: &str, args: &JsonValue) -> Result<ToolResult> {
        let entry = self
            .index
            .get(name)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| Error::UnknownTool(name.to_string()))?;

        let bound = entry.spec.bind(args)?;
        debug!("Invoking tool {} with {} argument(s)", name, bound.len());
        entry.tool.execute(bound).await
    }

    /// Check if a tool is registered
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no tools are registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get all registered tool names in registration order
    pub fn tool_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.spec.name.as_str()).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{ParamSpec, ToolArgs};
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec::new("echo", "Echo the input")
                .param(ParamSpec::string("text", "Text to echo"))
                .param(ParamSpec::integer("times", "Repetitions").with_default(1))
        }

        async fn execute(&self, args: ToolArgs) -> Result<ToolResult> {
            let text = args.str("text")?;
            let times = args.integer("times")? as usize;
            Ok(ToolResult::success(text.repeat(times)))
        }
    }

    struct NoopTool(&'static str);

    #[async_trait]
    impl Tool for NoopTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec::new(self.0, "No-op")
        }

        async fn execute(&self, _args: ToolArgs) -> Result<ToolResult> {
            Ok(ToolResult::success(self.0))
        }
    }

    #[tokio::test]
    async fn test_invoke_binds_defaults() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));

        let result = registry.invoke("echo", &json!({"text": "ab"})).await.unwrap();
        assert_eq!(result.output, "ab");

        let result = registry
            .invoke("echo", &json!({"text": "ab", "times": 3}))
            .await
            .unwrap();
        assert_eq!(result.output, "ababab");
    }

    #[tokio::test]
    async fn test_invoke_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry.invoke("missing", &json!({})).await.unwrap_err();
        assert!(matches!(err, Error::UnknownTool(name) if name == "missing"));
    }

    #[tokio::test]
    async fn test_invoke_invalid_arguments() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        let err = registry.invoke("echo", &json!({})).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArguments(_)));
    }

    #[test]
    fn test_describe_all_keeps_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(NoopTool("b")));
        registry.register(Arc::new(NoopTool("a")));
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(NoopTool("b")));

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.tool_names(), vec!["b", "a", "echo"]);
        let names: Vec<_> = registry.describe_all().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["b", "a", "echo"]);
    }

    #[test]
    fn test_resolve() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        assert!(registry.resolve("echo").is_some());
        assert!(registry.resolve("nope").is_none());
        assert!(registry.contains("echo"));
        assert_eq!(registry.schemas()[0]["function"]["parameters"]["required"], json!(["text"]));
    }
}
