//! # Binding Sources
//!
//! Registry of named resolvers that turn `(args, subject, binding key)` into a
//! value. The render pipeline only ever looks sources up; registering them is
//! the host's job, done once at startup.
//!
//! ```rust
//! use std::sync::Arc;
//! use bindery::source::{SourceRegistry, StaticSource};
//!
//! let registry = SourceRegistry::new();
//! registry
//!     .register("demo/greeting", Arc::new(StaticSource::new("Greeting", "Hello")))
//!     .unwrap();
//!
//! assert_eq!(registry.label("demo/greeting").as_deref(), Some("Greeting"));
//! assert!(registry.get_registered("demo/missing").is_none());
//! ```

mod builtin;

pub use builtin::{FnSource, PostMetaSource, StaticSource, POST_META_SOURCE};

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::{BinderyError, Result};
use crate::subject::Subject;

/// Resolver capability registered under a source id
pub trait BindingSource: Send + Sync {
    /// Human readable name shown in editor previews
    fn label(&self) -> &str;

    /// Resolve a value for one binding
    ///
    /// `args` is always a JSON object or array. `binding_key` identifies the
    /// binding slot (`contextBinding0`, …) for sources that key off it.
    fn get_value(&self, args: &Value, subject: Option<&Subject>, binding_key: &str) -> anyhow::Result<Value>;
}

/// Thread-safe source registry (id → resolver)
#[derive(Default)]
pub struct SourceRegistry {
    sources: DashMap<String, Arc<dyn BindingSource>>,
}

static GLOBAL: Lazy<Arc<SourceRegistry>> = Lazy::new(|| Arc::new(SourceRegistry::with_builtins()));

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the builtin sources
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry
            .sources
            .insert(POST_META_SOURCE.to_string(), Arc::new(PostMetaSource));
        registry
    }

    /// Process-wide registry
    pub fn global() -> Arc<SourceRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// Register a source; ids are unique
    pub fn register(&self, id: &str, source: Arc<dyn BindingSource>) -> Result<()> {
        if id.trim().is_empty() {
            return Err(BinderyError::InvalidSourceId { id: id.to_string() });
        }
        match self.sources.entry(id.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(BinderyError::SourceAlreadyRegistered { id: id.to_string() })
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(source);
                Ok(())
            }
        }
    }

    pub fn get_registered(&self, id: &str) -> Option<Arc<dyn BindingSource>> {
        self.sources.get(id).map(|s| Arc::clone(s.value()))
    }

    pub fn label(&self, id: &str) -> Option<String> {
        self.sources.get(id).map(|s| s.label().to_string())
    }

    /// Registered ids, sorted
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sources.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl std::fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("ids", &self.ids())
            .finish()
    }
}

/// Keep strings and structured values, blank out everything else
pub fn coerce_resolved(value: Value) -> Value {
    match value {
        Value::String(_) | Value::Object(_) | Value::Array(_) => value,
        _ => Value::String(String::new()),
    }
}
