//! Tool declarations
//!
//! A [`ToolSpec`] describes one operation: its name, a description shown to
//! the model, and the parameters it accepts. The same spec is used to
//! advertise the tool to the agent service and to validate incoming
//! argument payloads.

use serde_json::{Map, Value as JsonValue, json};

/// JSON schema type of a tool parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
    Boolean,
}

impl ParamKind {
    /// Schema type name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
        }
    }
}

/// A single declared parameter
#[derive(Debug, Clone)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub description: String,
    /// Value used when the caller omits the parameter
    pub default: Option<JsonValue>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, kind: ParamKind, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            description: description.into(),
            default: None,
        }
    }

    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamKind::String, description)
    }

    pub fn integer(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Integer, description)
    }

    pub fn boolean(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, ParamKind::Boolean, description)
    }

    /// Attach a default, which also makes the parameter optional
    pub fn with_default(mut self, default: impl Into<JsonValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    fn to_property(&self) -> JsonValue {
        let mut prop = json!({
            "type": self.kind.as_str(),
            "description": self.description,
        });
        if let Some(default) = &self.default {
            prop["default"] = default.clone();
        }
        prop
    }
}

/// Immutable description of one supported operation
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
    required: Option<Vec<String>>,
}

impl ToolSpec {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            params: Vec::new(),
            required: None,
        }
    }

    /// Add a parameter (declaration order is preserved in the schema)
    pub fn param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Override the required set instead of deriving it from defaults
    pub fn with_required<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Names of the required parameters
    ///
    /// Without an explicit override every parameter lacking a default is
    /// required.
    pub fn required(&self) -> Vec<String> {
        match &self.required {
            Some(names) => names.clone(),
            None => self
                .params
                .iter()
                .filter(|p| p.default.is_none())
                .map(|p| p.name.clone())
                .collect(),
        }
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required().iter().any(|n| n == name)
    }

    pub fn get_param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// JSON schema of the parameter object
    pub fn parameters_schema(&self) -> JsonValue {
        let properties: Map<String, JsonValue> = self
            .params
            .iter()
            .map(|p| (p.name.clone(), p.to_property()))
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required(),
        })
    }

    /// Function-tool definition as advertised to the agent service
    pub fn to_schema(&self) -> JsonValue {
        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters_schema(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click_spec() -> ToolSpec {
        ToolSpec::new("browser_click", "Click")
            .param(ParamSpec::string("selector", "CSS/text selector"))
            .param(ParamSpec::integer("timeout", "Timeout ms").with_default(8000))
    }

    #[test]
    fn test_required_defaults_to_params_without_default() {
        let spec = click_spec();
        assert_eq!(spec.required(), vec!["selector".to_string()]);
        assert!(spec.is_required("selector"));
        assert!(!spec.is_required("timeout"));
    }

    #[test]
    fn test_required_all_when_no_defaults() {
        let spec = ToolSpec::new("test", "desc")
            .param(ParamSpec::string("foo", ""))
            .param(ParamSpec::integer("bar", ""));
        assert_eq!(spec.required(), vec!["foo".to_string(), "bar".to_string()]);
    }

    #[test]
    fn test_required_override() {
        let spec = click_spec().with_required(["selector", "timeout"]);
        assert!(spec.is_required("timeout"));
    }

    #[test]
    fn test_schema_shape() {
        let schema = click_spec().to_schema();
        assert_eq!(schema["type"], "function");
        assert_eq!(schema["function"]["name"], "browser_click");
        let params = &schema["function"]["parameters"];
        assert_eq!(params["type"], "object");
        assert_eq!(params["properties"]["timeout"]["type"], "integer");
        assert_eq!(params["properties"]["timeout"]["default"], 8000);
        assert!(params["properties"]["selector"].get("default").is_none());
        assert_eq!(params["required"], json!(["selector"]));
    }

    #[test]
    fn test_empty_params_schema() {
        let schema = ToolSpec::new("browser_snapshot_dom", "Snapshot").parameters_schema();
        assert_eq!(schema["properties"], json!({}));
        assert_eq!(schema["required"], json!([]));
    }
}
