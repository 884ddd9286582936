//! Error types with fix suggestions

use thiserror::Error;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

pub type Result<T> = std::result::Result<T, BinderyError>;

/// Errors raised outside the render path.
///
/// Rendering itself never fails: resolver and template failures degrade to
/// placeholders or error blocks. These variants cover loading attributes,
/// configuration and registry setup.
#[derive(Error, Debug)]
pub enum BinderyError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ─────────────────────────────────────────────────────────────
    // Attributes (BND-010 to BND-012)
    // ─────────────────────────────────────────────────────────────

    #[error("BND-010: Block attributes do not match the schema: {details}")]
    SchemaFailed { details: String },

    #[error("BND-011: Binding index {index} out of range ({len} declared)")]
    BindingIndex { index: usize, len: usize },

    #[error("BND-012: Metadata out of sync with context bindings: {details}")]
    MetadataDrift { details: String },

    // ─────────────────────────────────────────────────────────────
    // Sources (BND-020 to BND-021)
    // ─────────────────────────────────────────────────────────────

    #[error("BND-020: Binding source '{id}' is already registered")]
    SourceAlreadyRegistered { id: String },

    #[error("BND-021: Invalid binding source id '{id}'")]
    InvalidSourceId { id: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration (BND-030)
    // ─────────────────────────────────────────────────────────────

    #[error("BND-030: Config error: {reason}")]
    Config { reason: String },
}

impl FixSuggestion for BinderyError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            BinderyError::JsonParse(_) => Some("Check the attributes file is valid JSON"),
            BinderyError::YamlParse(_) => Some("Check YAML syntax: indentation and quoting"),
            BinderyError::Io(_) => Some("Check file path and permissions"),
            BinderyError::SchemaFailed { .. } => {
                Some("Run `bindery schema` to see the expected attribute types")
            }
            BinderyError::BindingIndex { .. } => Some("Use an index below the number of bindings"),
            BinderyError::MetadataDrift { .. } => {
                Some("Re-save the block so metadata.bindings is derived from contextBindings")
            }
            BinderyError::SourceAlreadyRegistered { .. } => {
                Some("Register each binding source id once at startup")
            }
            BinderyError::InvalidSourceId { .. } => {
                Some("Use a non-empty id such as `my-plugin/my-source`")
            }
            BinderyError::Config { .. } => Some("Check config.toml syntax and value types"),
        }
    }
}
