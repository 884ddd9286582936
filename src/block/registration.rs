//! Block type registration and attribute schema
//!
//! [`block_type`] is the descriptor handed to the editor (attribute
//! definitions, supports, used context). [`attributes_schema`] expresses the
//! same attributes as JSON Schema so stored attributes can be validated before
//! they are rendered or edited.

use indexmap::IndexMap;
use jsonschema::JSONSchema;
use serde::Serialize;
use serde_json::{json, Value};

use super::attributes::{BlockAttributes, PreviewMode, DEFAULT_TEMPLATE};
use crate::error::{BinderyError, Result};

/// Registered block name
pub const BLOCK_NAME: &str = "bindery/template";

/// Handle of the editor script carrying the attribute schema
pub const EDITOR_SCRIPT: &str = "bindery-template-editor";

/// One attribute definition in registration form
#[derive(Debug, Clone, Serialize)]
pub struct AttributeDef {
    #[serde(rename = "type")]
    pub kind: &'static str,

    pub default: Value,

    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<&'static str>>,
}

/// Registration descriptor for the template block
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockType {
    pub api_version: u8,
    pub name: &'static str,
    pub title: &'static str,
    pub category: &'static str,
    pub icon: &'static str,
    pub editor_script: &'static str,
    pub attributes: IndexMap<&'static str, AttributeDef>,
    pub supports: Value,
    pub uses_context: Vec<&'static str>,
}

pub fn block_type() -> BlockType {
    let mut attributes = IndexMap::new();
    attributes.insert(
        "twigTemplate",
        AttributeDef {
            kind: "string",
            default: json!(DEFAULT_TEMPLATE),
            allowed: None,
        },
    );
    attributes.insert(
        "metadata",
        AttributeDef {
            kind: "object",
            default: json!({}),
            allowed: None,
        },
    );
    attributes.insert(
        "contextBindings",
        AttributeDef {
            kind: "array",
            default: json!([]),
            allowed: None,
        },
    );
    attributes.insert(
        "previewMode",
        AttributeDef {
            kind: "string",
            default: json!(PreviewMode::Default.as_str()),
            allowed: Some(vec![
                PreviewMode::Default.as_str(),
                PreviewMode::ServerSide.as_str(),
                PreviewMode::Twigjs.as_str(),
            ]),
        },
    );
    attributes.insert(
        "previewPostId",
        AttributeDef {
            kind: "string",
            default: json!(""),
            allowed: None,
        },
    );

    BlockType {
        api_version: 3,
        name: BLOCK_NAME,
        title: "Template",
        category: "text",
        icon: "embed-generic",
        editor_script: EDITOR_SCRIPT,
        attributes,
        supports: json!({
            "align": true,
            "html": false,
            "typography": { "fontSize": true }
        }),
        uses_context: vec!["postId", "postType"],
    }
}

/// JSON Schema (draft 7) for stored attributes
pub fn attributes_schema() -> Value {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": {
            "twigTemplate": { "type": "string" },
            "metadata": {
                "type": "object",
                "properties": {
                    "bindings": {
                        "type": "object",
                        "additionalProperties": {
                            "type": "object",
                            "required": ["source"],
                            "properties": {
                                "source": { "type": "string" }
                            }
                        }
                    }
                }
            },
            "contextBindings": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "variableName": { "type": "string" },
                        "source": { "type": "string" },
                        "arguments": { "type": "string" },
                        "preview_value": { "type": "string" },
                        "previewValue": { "type": "string" },
                        "bindingKey": { "type": "string" }
                    }
                }
            },
            "previewMode": { "enum": ["default", "server-side", "twigjs"] },
            "previewPostId": { "type": "string" }
        }
    })
}

/// Validate raw attributes against the schema, then deserialize them
pub fn parse_attributes(raw: &Value) -> Result<BlockAttributes> {
    let schema = attributes_schema();
    let compiled = JSONSchema::compile(&schema).map_err(|e| BinderyError::SchemaFailed {
        details: format!("attribute schema does not compile: {}", e),
    })?;

    if let Err(errors) = compiled.validate(raw) {
        let details: Vec<String> = errors
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    e.to_string()
                } else {
                    format!("{}: {}", path, e)
                }
            })
            .collect();
        return Err(BinderyError::SchemaFailed {
            details: details.join("; "),
        });
    }

    Ok(serde_json::from_value(raw.clone())?)
}
