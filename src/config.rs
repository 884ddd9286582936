//! Bindery Configuration Module
//!
//! Render limits and user-facing messages.
//! Config is stored in `~/.config/bindery/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`BINDERY_MAX_INCLUDE_DEPTH`)
//! 2. Config file (`$BINDERY_CONFIG`, else `~/.config/bindery/config.toml`)
//! 3. Defaults
//!
//! ```toml
//! [render]
//! max_include_depth = 8
//! undefined = "lenient"   # lenient | chainable | strict
//!
//! [messages]
//! error_heading = "Template Error:"
//! generic_error = "Block rendering error. Please contact administrator."
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BinderyError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BinderyConfig {
    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub messages: Messages,
}

/// Template engine settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderConfig {
    /// Nested include limit (template part → block → template part …)
    #[serde(default = "default_max_include_depth")]
    pub max_include_depth: usize,

    /// How the engine treats undefined variables
    #[serde(default)]
    pub undefined: UndefinedPolicy,
}

fn default_max_include_depth() -> usize {
    8
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_include_depth: default_max_include_depth(),
            undefined: UndefinedPolicy::default(),
        }
    }
}

/// Undefined-variable policy, mirrors the engine's behaviors
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UndefinedPolicy {
    /// Undefined prints as empty, attribute access on it fails
    #[default]
    Lenient,
    /// Undefined prints as empty, attribute access chains to undefined
    Chainable,
    /// Any use of an undefined value is an error
    Strict,
}

/// Localizable texts of the render output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Messages {
    /// Heading of the detailed error block (privileged viewers)
    #[serde(default = "default_error_heading")]
    pub error_heading: String,

    /// Error notice for everyone else
    #[serde(default = "default_generic_error")]
    pub generic_error: String,

    /// Prefix of placeholder-preview failures
    #[serde(default = "default_preview_error")]
    pub preview_error: String,
}

fn default_error_heading() -> String {
    "Template Error:".to_string()
}

fn default_generic_error() -> String {
    "Block rendering error. Please contact administrator.".to_string()
}

fn default_preview_error() -> String {
    "Error rendering template:".to_string()
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            error_heading: default_error_heading(),
            generic_error: default_generic_error(),
            preview_error: default_preview_error(),
        }
    }
}

impl BinderyConfig {
    /// Get the config directory path
    ///
    /// Returns `~/.config/bindery/` on Unix, `%APPDATA%/bindery/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bindery")
    }

    /// Get the config file path (`$BINDERY_CONFIG` wins)
    pub fn config_path() -> PathBuf {
        match std::env::var("BINDERY_CONFIG") {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => Self::config_dir().join("config.toml"),
        }
    }

    /// Load configuration from the default location, then apply env overrides
    pub fn load() -> Result<Self> {
        Ok(Self::load_from(Self::config_path())?.with_env())
    }

    /// Load configuration from `path`
    ///
    /// Returns default config if file doesn't exist.
    /// Returns error if file exists but is malformed.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| BinderyError::Config {
            reason: format!("Failed to read config file: {}", e),
        })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| BinderyError::Config {
            reason: format!("Failed to parse config file: {}", e),
        })
    }

    /// Merge with environment variables
    ///
    /// Malformed values are ignored.
    pub fn with_env(mut self) -> Self {
        if let Ok(depth) = std::env::var("BINDERY_MAX_INCLUDE_DEPTH") {
            if let Ok(depth) = depth.trim().parse::<usize>() {
                self.render.max_include_depth = depth;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let config = BinderyConfig::default();
        assert_eq!(config.render.max_include_depth, 8);
        assert_eq!(config.render.undefined, UndefinedPolicy::Lenient);
        assert_eq!(config.messages.error_heading, "Template Error:");
    }

    #[test]
    fn config_dir_is_named_after_crate() {
        assert!(BinderyConfig::config_dir().to_string_lossy().ends_with("bindery"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = BinderyConfig::from_toml(
            r#"
[render]
undefined = "strict"

[messages]
generic_error = "Virhe lohkon renderöinnissä."
"#,
        )
        .unwrap();

        assert_eq!(config.render.undefined, UndefinedPolicy::Strict);
        assert_eq!(config.render.max_include_depth, 8);
        assert_eq!(config.messages.generic_error, "Virhe lohkon renderöinnissä.");
        assert_eq!(config.messages.error_heading, "Template Error:");
    }

    #[test]
    fn missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let config = BinderyConfig::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, BinderyConfig::default());
    }

    #[test]
    fn loads_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[render]\nmax_include_depth = 3").unwrap();

        let config = BinderyConfig::load_from(&path).unwrap();
        assert_eq!(config.render.max_include_depth, 3);
    }

    #[test]
    fn malformed_file_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[render\nmax_include_depth = ").unwrap();

        let err = BinderyConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, BinderyError::Config { .. }));
    }

    #[test]
    fn unknown_undefined_policy_errors() {
        assert!(BinderyConfig::from_toml("[render]\nundefined = \"loud\"").is_err());
    }
}
