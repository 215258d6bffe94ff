//! Typed argument binding
//!
//! Agent services deliver tool arguments as untyped JSON. [`ToolSpec::bind`]
//! validates such a payload against the declared parameters and produces a
//! [`ToolArgs`] bag whose values already carry the declared types.

use std::collections::HashMap;

use serde_json::Value as JsonValue;

use crate::error::{Error, Result};
use crate::tool::definition::{ParamKind, ToolSpec};

/// A validated argument value
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    String(String),
    Integer(i64),
    Boolean(bool),
}

impl ArgValue {
    fn from_json(kind: ParamKind, value: &JsonValue) -> Option<Self> {
        match kind {
            ParamKind::String => value.as_str().map(|s| Self::String(s.to_string())),
            ParamKind::Integer => value.as_i64().map(Self::Integer).or_else(|| {
                value
                    .as_f64()
                    .filter(|f| f.fract() == 0.0 && f.is_finite())
                    .map(|f| Self::Integer(f as i64))
            }),
            ParamKind::Boolean => value.as_bool().map(Self::Boolean),
        }
    }
}

/// Arguments bound against a [`ToolSpec`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs {
    values: HashMap<String, ArgValue>,
}

impl ToolArgs {
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    pub fn str(&self, name: &str) -> Result<&str> {
        match self.values.get(name) {
            Some(ArgValue::String(s)) => Ok(s),
            _ => Err(missing(name, "string")),
        }
    }

    pub fn integer(&self, name: &str) -> Result<i64> {
        match self.values.get(name) {
            Some(ArgValue::Integer(i)) => Ok(*i),
            _ => Err(missing(name, "integer")),
        }
    }

    pub fn boolean(&self, name: &str) -> Result<bool> {
        match self.values.get(name) {
            Some(ArgValue::Boolean(b)) => Ok(*b),
            _ => Err(missing(name, "boolean")),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn missing(name: &str, kind: &str) -> Error {
    Error::InvalidArguments(format!("argument '{}' is not a bound {}", name, kind))
}

impl ToolSpec {
    /// Validate a raw payload and bind it to typed values
    ///
    /// Omitted parameters take their declared default. A `null` value counts
    /// as omitted. Non-object payloads, unexpected names, type mismatches and
    /// missing required parameters are rejected.
    pub fn bind(&self, raw: &JsonValue) -> Result<ToolArgs> {
        let object = match raw {
            JsonValue::Object(map) => map,
            other => {
                return Err(Error::InvalidArguments(format!(
                    "{}() expects a JSON object of arguments, got {}",
                    self.name,
                    json_type_name(other)
                )));
            }
        };

        if let Some(unexpected) = object.keys().find(|k| self.get_param(k).is_none()) {
            return Err(Error::InvalidArguments(format!(
                "{}() got an unexpected argument '{}'",
                self.name, unexpected
            )));
        }

        let required = self.required();
        let mut values = HashMap::with_capacity(self.params.len());

        for param in &self.params {
            let supplied = object.get(&param.name).filter(|v| !v.is_null());
            let value = match (supplied, &param.default) {
                (Some(v), _) => v,
                (None, Some(default)) => default,
                (None, None) => {
                    if required.contains(&param.name) {
                        return Err(Error::InvalidArguments(format!(
                            "{}() missing required argument '{}'",
                            self.name, param.name
                        )));
                    }
                    continue;
                }
            };

            let bound = ArgValue::from_json(param.kind, value).ok_or_else(|| {
                Error::InvalidArguments(format!(
                    "{}() argument '{}' must be {}, got {}",
                    self.name,
                    param.name,
                    param.kind.as_str(),
                    json_type_name(value)
                ))
            })?;
            values.insert(param.name.clone(), bound);
        }

        Ok(ToolArgs { values })
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::definition::ParamSpec;
    use serde_json::json;

    fn type_spec() -> ToolSpec {
        ToolSpec::new("browser_type", "Type")
            .param(ParamSpec::string("selector", "Input field selector"))
            .param(ParamSpec::string("text", "Text to type"))
            .param(ParamSpec::boolean("press_enter", "Press Enter?").with_default(false))
    }

    #[test]
    fn test_bind_applies_defaults() {
        let args = type_spec()
            .bind(&json!({"selector": "#q", "text": "hello"}))
            .unwrap();
        assert_eq!(args.str("selector").unwrap(), "#q");
        assert_eq!(args.str("text").unwrap(), "hello");
        assert!(!args.boolean("press_enter").unwrap());
    }

    #[test]
    fn test_bind_null_counts_as_omitted() {
        let args = type_spec()
            .bind(&json!({"selector": "#q", "text": "x", "press_enter": null}))
            .unwrap();
        assert!(!args.boolean("press_enter").unwrap());
    }

    #[test]
    fn test_bind_missing_required() {
        let err = type_spec().bind(&json!({"selector": "#q"})).unwrap_err();
        assert!(matches!(err, Error::InvalidArguments(_)));
        assert!(err.to_string().contains("missing required argument 'text'"));
    }

    #[test]
    fn test_bind_type_mismatch() {
        let err = type_spec()
            .bind(&json!({"selector": "#q", "text": "x", "press_enter": "yes"}))
            .unwrap_err();
        assert!(err.to_string().contains("'press_enter' must be boolean"));
    }

    #[test]
    fn test_bind_rejects_unexpected_argument() {
        let err = type_spec()
            .bind(&json!({"selector": "#q", "text": "x", "delay": 5}))
            .unwrap_err();
        assert!(err.to_string().contains("unexpected argument 'delay'"));
    }

    #[test]
    fn test_bind_rejects_non_object() {
        let err = type_spec().bind(&json!(["#q", "x"])).unwrap_err();
        assert!(err.to_string().contains("got array"));
    }

    #[test]
    fn test_integer_accepts_whole_float() {
        let spec = ToolSpec::new("browser_click", "Click")
            .param(ParamSpec::string("selector", ""))
            .param(ParamSpec::integer("timeout", "").with_default(8000));
        let args = spec.bind(&json!({"selector": "a", "timeout": 2500.0})).unwrap();
        assert_eq!(args.integer("timeout").unwrap(), 2500);

        let err = spec.bind(&json!({"selector": "a", "timeout": 2.5})).unwrap_err();
        assert!(err.to_string().contains("must be integer"));
    }

    #[test]
    fn test_empty_spec_binds_empty_object() {
        let args = ToolSpec::new("browser_snapshot_dom", "").bind(&json!({})).unwrap();
        assert!(args.is_empty());
    }
}
