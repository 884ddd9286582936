//! Binding declarations as persisted in `contextBindings`

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Prefix of the synthetic binding keys mirrored into `metadata.bindings`
pub const BINDING_KEY_PREFIX: &str = "contextBinding";

/// Key of the declaration at `index`
pub fn binding_key(index: usize) -> String {
    format!("{}{}", BINDING_KEY_PREFIX, index)
}

/// One user-declared binding row
///
/// Field names on disk follow the editor script: `variableName`, `source`,
/// `arguments`, `preview_value`, `bindingKey`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingDeclaration {
    #[serde(rename = "variableName", default)]
    pub variable_name: String,

    #[serde(rename = "source", default)]
    pub source_id: String,

    /// Raw JSON argument string, parsed on use
    #[serde(rename = "arguments", default)]
    pub arguments_json: String,

    #[serde(rename = "preview_value", alias = "previewValue", default)]
    pub preview_value: String,

    /// Persisted copy of the position-derived key; may be stale on old blocks
    #[serde(rename = "bindingKey", default)]
    pub binding_key: String,
}

/// Outcome of parsing `arguments_json`
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedArguments {
    /// Nothing given
    Empty,
    /// Valid JSON of any shape
    Valid(Value),
    /// Not JSON; carries the parser message
    Invalid(String),
}

impl ParsedArguments {
    pub fn is_invalid(&self) -> bool {
        matches!(self, ParsedArguments::Invalid(_))
    }

    /// Argument set handed to a resolver
    ///
    /// Only objects and arrays count as an argument set; empty, invalid and
    /// scalar JSON all yield an empty object.
    pub fn into_args(self) -> Value {
        match self {
            ParsedArguments::Valid(value @ (Value::Object(_) | Value::Array(_))) => value,
            _ => Value::Object(Map::new()),
        }
    }
}

impl BindingDeclaration {
    pub fn new(variable_name: impl Into<String>, source_id: impl Into<String>) -> Self {
        Self {
            variable_name: variable_name.into(),
            source_id: source_id.into(),
            ..Self::default()
        }
    }

    pub fn with_arguments(mut self, arguments_json: impl Into<String>) -> Self {
        self.arguments_json = arguments_json.into();
        self
    }

    pub fn with_preview_value(mut self, preview_value: impl Into<String>) -> Self {
        self.preview_value = preview_value.into();
        self
    }

    pub fn has_source(&self) -> bool {
        !self.source_id.is_empty()
    }

    pub fn parse_arguments(&self) -> ParsedArguments {
        if self.arguments_json.trim().is_empty() {
            return ParsedArguments::Empty;
        }
        match serde_json::from_str::<Value>(&self.arguments_json) {
            Ok(value) => ParsedArguments::Valid(value),
            Err(e) => ParsedArguments::Invalid(e.to_string()),
        }
    }

    /// See [`ParsedArguments::into_args`]
    pub fn resolver_args(&self) -> Value {
        self.parse_arguments().into_args()
    }
}
