//! Builtin binding sources

use anyhow::{anyhow, Result};
use serde_json::Value;

use super::BindingSource;
use crate::subject::Subject;

/// Id of the post meta source
pub const POST_META_SOURCE: &str = "core/post-meta";

/// Reads `args.key` from the current subject's meta
#[derive(Debug, Default, Clone, Copy)]
pub struct PostMetaSource;

impl BindingSource for PostMetaSource {
    fn label(&self) -> &str {
        "Post Meta"
    }

    fn get_value(&self, args: &Value, subject: Option<&Subject>, _binding_key: &str) -> Result<Value> {
        let key = args
            .get("key")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("post meta binding needs a string `key` argument"))?;

        Ok(subject
            .and_then(|s| s.meta.get(key))
            .cloned()
            .unwrap_or(Value::Null))
    }
}

/// Always returns the same value
#[derive(Debug, Clone)]
pub struct StaticSource {
    label: String,
    value: Value,
}

impl StaticSource {
    pub fn new(label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

impl BindingSource for StaticSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn get_value(&self, _args: &Value, _subject: Option<&Subject>, _binding_key: &str) -> Result<Value> {
        Ok(self.value.clone())
    }
}

type ResolveFn = dyn Fn(&Value, Option<&Subject>, &str) -> Result<Value> + Send + Sync;

/// Closure-backed source, handy for host glue code and tests
pub struct FnSource {
    label: String,
    resolve: Box<ResolveFn>,
}

impl FnSource {
    pub fn new<F>(label: impl Into<String>, resolve: F) -> Self
    where
        F: Fn(&Value, Option<&Subject>, &str) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            resolve: Box::new(resolve),
        }
    }
}

impl BindingSource for FnSource {
    fn label(&self) -> &str {
        &self.label
    }

    fn get_value(&self, args: &Value, subject: Option<&Subject>, binding_key: &str) -> Result<Value> {
        (self.resolve)(args, subject, binding_key)
    }
}

impl std::fmt::Debug for FnSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnSource").field("label", &self.label).finish()
    }
}
