//! Include Resolvers - template functions reaching back into the host
//!
//! | function | renders |
//! |----------|---------|
//! | `include_template_part(id, subject?)` | a template part, `theme//slug` |
//! | `include_pattern(slug, subject?)` | the first published pattern with `slug` |
//! | `call_block_binding(source, args?, overrides?)` | the raw value of a binding source |
//!
//! Included content is rendered by the host's block pipeline, which may hold
//! further template blocks. Every include takes a [`DepthGuard`] on the shared
//! render scope; past `max_include_depth` the include raises a template error
//! instead of recursing.
//!
//! Missing targets are not errors: they render as `""` and log at `debug`.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use minijinja::value::{Value, ValueKind};
use minijinja::{Environment, Error, ErrorKind};
use tracing::{debug, warn};

use crate::renderer::{BlockRenderer, RenderScope, ScopedRenderer};

/// Detail prefix of the error raised when includes nest too deep
pub const INCLUDE_DEPTH_EXCEEDED: &str = "include depth limit";

/// Prefix of the binding keys synthesized by `call_block_binding`
pub const CALL_BINDING_PREFIX: &str = "bindery_binding_";

static NEXT_CALL_ID: AtomicU64 = AtomicU64::new(0);

fn next_call_key() -> String {
    format!("{}{}", CALL_BINDING_PREFIX, NEXT_CALL_ID.fetch_add(1, Ordering::Relaxed))
}

/// One level of include nesting, released on drop
#[derive(Debug)]
pub struct DepthGuard {
    depth: Arc<AtomicUsize>,
    level: usize,
}

impl DepthGuard {
    /// Enter one level below `depth`, failing past `max`
    pub fn enter(depth: &Arc<AtomicUsize>, max: usize) -> Result<Self, Error> {
        let level = depth.fetch_add(1, Ordering::SeqCst) + 1;
        let guard = Self {
            depth: Arc::clone(depth),
            level,
        };

        if level > max {
            return Err(Error::new(
                ErrorKind::InvalidOperation,
                format!("{} of {} reached, the included content includes itself", INCLUDE_DEPTH_EXCEEDED, max),
            ));
        }
        Ok(guard)
    }

    /// Nesting level held by this guard (1 = first include)
    pub fn level(&self) -> usize {
        self.level
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Subject id from a template argument
///
/// Accepts positive integers, numeric strings, or a map with such an `id`
/// (e.g. `post`). Anything else means "no override".
pub fn subject_id(value: &Value) -> Option<u64> {
    let id = match value.kind() {
        ValueKind::Number => i64::try_from(value.clone()).ok().and_then(|id| u64::try_from(id).ok()),
        ValueKind::String => value.as_str().and_then(|s| s.trim().parse::<u64>().ok()),
        ValueKind::Map => value.get_attr("id").ok().and_then(|id| match id.kind() {
            ValueKind::Map => None,
            _ => subject_id(&id),
        }),
        _ => None,
    };
    id.filter(|id| *id > 0)
}

/// Template functions bound to one render scope
#[derive(Debug, Clone)]
pub struct IncludeResolver {
    renderer: BlockRenderer,
    scope: RenderScope,
}

impl IncludeResolver {
    pub fn new(renderer: BlockRenderer, scope: RenderScope) -> Self {
        Self { renderer, scope }
    }

    fn nested(&self) -> ScopedRenderer<'_> {
        ScopedRenderer::new(&self.renderer, &self.scope)
    }

    /// Render a template part; ids without `//` live in the active theme
    pub fn include_template_part(&self, part_id: &str, subject: Option<u64>) -> Result<String, Error> {
        let part_id = part_id.trim();
        if part_id.is_empty() {
            return Ok(String::new());
        }

        let host = self.renderer.host();
        let full_id = if part_id.contains("//") {
            part_id.to_string()
        } else {
            format!("{}//{}", host.active_theme(), part_id)
        };

        let content = match host.template_part(&full_id) {
            Some(part) if !part.content.is_empty() => part.content,
            _ => {
                debug!(part = %full_id, "template part not found");
                return Ok(String::new());
            }
        };

        let _depth = self.scope.enter_include()?;
        Ok(self
            .scope
            .subjects()
            .with_subject(host.as_ref(), subject, || host.render_blocks(&content, &self.nested())))
    }

    /// Render the first published pattern matching `slug`
    pub fn include_pattern(&self, slug: &str, subject: Option<u64>) -> Result<String, Error> {
        if slug.is_empty() {
            return Ok(String::new());
        }

        let host = self.renderer.host();
        let mut patterns = host.patterns(slug);
        if patterns.len() > 1 {
            debug!(slug, matches = patterns.len(), "several published patterns share a slug, using the first");
        }
        if patterns.is_empty() {
            debug!(slug, "pattern not found");
            return Ok(String::new());
        }
        let pattern = patterns.swap_remove(0);

        let _depth = self.scope.enter_include()?;
        Ok(self
            .scope
            .subjects()
            .with_subject(host.as_ref(), subject, || host.render_blocks(&pattern.content, &self.nested())))
    }

    /// Resolve a binding source directly from a template
    ///
    /// Only the `postID` override is honoured. Returns the raw resolver
    /// value, `""` when the source is unknown or fails.
    pub fn call_block_binding(
        &self,
        source_id: &str,
        args: &serde_json::Value,
        post_id: Option<u64>,
    ) -> serde_json::Value {
        let empty = serde_json::Value::String(String::new());
        let Some(source) = self.renderer.registry().get_registered(source_id) else {
            warn!(source = %source_id, "call_block_binding: source not registered");
            return empty;
        };

        let args = match args {
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => args.clone(),
            _ => serde_json::Value::Object(serde_json::Map::new()),
        };
        let key = next_call_key();
        let subjects = self.scope.subjects();

        subjects.with_subject(self.renderer.host().as_ref(), post_id, || {
            match source.get_value(&args, subjects.current().as_ref(), &key) {
                Ok(value) => value,
                Err(e) => {
                    warn!(binding = %key, source = %source_id, error = %e, "call_block_binding: source failed");
                    empty
                }
            }
        })
    }

    /// Install the template functions into `env`
    pub(crate) fn register(self, env: &mut Environment<'static>) {
        let this = self.clone();
        env.add_function(
            "include_template_part",
            move |part_id: Value, subject: Option<Value>| -> Result<Value, Error> {
                let Some(part_id) = part_id.as_str() else {
                    return Ok(Value::from(""));
                };
                let subject = subject.as_ref().and_then(subject_id);
                this.include_template_part(part_id, subject).map(Value::from)
            },
        );

        let this = self.clone();
        env.add_function(
            "include_pattern",
            move |slug: Value, subject: Option<Value>| -> Result<Value, Error> {
                let Some(slug) = slug.as_str() else {
                    return Ok(Value::from(""));
                };
                let subject = subject.as_ref().and_then(subject_id);
                this.include_pattern(slug, subject).map(Value::from)
            },
        );

        let this = self;
        env.add_function(
            "call_block_binding",
            move |source: Value, args: Option<Value>, overrides: Option<Value>| -> Result<Value, Error> {
                let Some(source) = source.as_str() else {
                    return Ok(Value::from(""));
                };
                let args = match args {
                    Some(args) if !args.is_undefined() && !args.is_none() => {
                        serde_json::to_value(&args).unwrap_or(serde_json::Value::Null)
                    }
                    _ => serde_json::Value::Null,
                };
                let post_id = overrides.as_ref().and_then(override_post_id);
                let value = this.call_block_binding(source, &args, post_id);
                Ok(Value::from_serialize(&value))
            },
        );
    }
}

fn override_post_id(overrides: &Value) -> Option<u64> {
    if overrides.kind() != ValueKind::Map {
        return None;
    }
    if let Ok(keys) = overrides.try_iter() {
        for key in keys.filter(|key| key.as_str() != Some("postID")) {
            debug!(key = %key, "call_block_binding: ignoring unsupported override");
        }
    }
    overrides.get_attr("postID").ok().as_ref().and_then(subject_id)
}
