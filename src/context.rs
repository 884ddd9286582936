//! Context Builder - binding declarations → template variables
//!
//! Walks `contextBindings` in order and produces the flat variable map the
//! template is compiled against.
//!
//! Resolution per declaration:
//! 1. empty variable name → skipped
//! 2. preview value set → used verbatim, in every mode
//! 3. source set → arguments parsed (invalid JSON → empty set), resolver
//!    called with the ambient subject, result coerced
//! 4. otherwise → `""`
//!
//! Resolver failures never abort the build; they are logged and bound to `""`.
//! Later declarations overwrite earlier ones sharing a variable name.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::binding::{binding_key, BindingDeclaration, ParsedArguments};
use crate::source::{coerce_resolved, SourceRegistry};
use crate::subject::SubjectContext;

/// Reserved variable holding the wrapper CSS classes
pub const EDITOR_CLASSES_VAR: &str = "editor_classes";

/// Variable holding the ambient subject
pub const POST_VAR: &str = "post";

/// Variable holding the block's rendered inner content
pub const INNER_BLOCKS_VAR: &str = "inner_blocks";

/// Marker appended to labels whose arguments are not JSON
pub const INVALID_JSON_MARKER: &str = "[Invalid JSON]";

/// How bound variables get their values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolutionMode {
    /// Call the binding sources
    #[default]
    Live,
    /// Editor placeholder preview: `{{ Label: args }}` instead of values
    Placeholder,
}

/// Variables of one render, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RenderContext {
    vars: IndexMap<String, Value>,
}

impl RenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable; an existing name keeps its position
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// The whole context as a JSON object
    pub fn to_value(&self) -> Value {
        serde_json::to_value(&self.vars).unwrap_or(Value::Null)
    }
}

/// Builds a [`RenderContext`] from declarations
#[derive(Debug, Clone, Copy)]
pub struct ContextBuilder<'a> {
    registry: &'a SourceRegistry,
    mode: ResolutionMode,
    inner_blocks: Option<&'a str>,
}

impl<'a> ContextBuilder<'a> {
    pub fn new(registry: &'a SourceRegistry) -> Self {
        Self {
            registry,
            mode: ResolutionMode::Live,
            inner_blocks: None,
        }
    }

    pub fn mode(mut self, mode: ResolutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Expose the block's inner content as `inner_blocks`
    pub fn inner_blocks(mut self, content: &'a str) -> Self {
        self.inner_blocks = Some(content);
        self
    }

    /// Resolve every declaration into a fresh context
    ///
    /// `post` and `inner_blocks` go in first so declarations may shadow them;
    /// `editor_classes` is written last and always holds `editor_classes`.
    pub fn build(
        &self,
        declarations: &[BindingDeclaration],
        is_preview_request: bool,
        subjects: &SubjectContext,
        editor_classes: &str,
    ) -> RenderContext {
        let mut ctx = RenderContext::new();

        if let Some(subject) = subjects.current() {
            match serde_json::to_value(&subject) {
                Ok(value) => ctx.insert(POST_VAR, value),
                Err(e) => debug!(error = %e, "could not expose subject to template"),
            }
        }
        if let Some(content) = self.inner_blocks {
            ctx.insert(INNER_BLOCKS_VAR, content);
        }

        for (index, decl) in declarations.iter().enumerate() {
            if decl.variable_name.is_empty() {
                continue;
            }
            let value = self.resolve(index, decl, is_preview_request, subjects);
            ctx.insert(decl.variable_name.clone(), value);
        }

        ctx.insert(EDITOR_CLASSES_VAR, editor_classes);
        ctx
    }

    fn resolve(
        &self,
        index: usize,
        decl: &BindingDeclaration,
        is_preview_request: bool,
        subjects: &SubjectContext,
    ) -> Value {
        if !decl.preview_value.is_empty() {
            if !is_preview_request && self.mode == ResolutionMode::Live {
                debug!(
                    variable = %decl.variable_name,
                    "preview value used outside an editor preview request"
                );
            }
            return Value::String(decl.preview_value.clone());
        }

        if !decl.has_source() {
            return Value::String(String::new());
        }

        match self.mode {
            ResolutionMode::Live => self.resolve_live(index, decl, subjects),
            ResolutionMode::Placeholder => Value::String(placeholder(self.registry, decl)),
        }
    }

    fn resolve_live(&self, index: usize, decl: &BindingDeclaration, subjects: &SubjectContext) -> Value {
        let key = binding_key(index);

        let parsed = decl.parse_arguments();
        if let ParsedArguments::Invalid(reason) = &parsed {
            debug!(binding = %key, %reason, "invalid binding arguments, using an empty set");
        }
        let args = parsed.into_args();

        let Some(source) = self.registry.get_registered(&decl.source_id) else {
            warn!(binding = %key, source = %decl.source_id, "binding source not registered");
            return Value::String(String::new());
        };

        let subject = subjects.current();
        match source.get_value(&args, subject.as_ref(), &key) {
            Ok(value) => coerce_resolved(value),
            Err(e) => {
                warn!(binding = %key, source = %decl.source_id, error = %e, "binding source failed");
                Value::String(String::new())
            }
        }
    }
}

/// Label of a source, falling back to the raw id
pub fn source_label(registry: &SourceRegistry, source_id: &str) -> String {
    registry
        .label(source_id)
        .unwrap_or_else(|| source_id.to_string())
}

/// `Label`, `Label: {"key":"x"}` or `Label: [Invalid JSON]`
pub fn label_with_arguments(registry: &SourceRegistry, decl: &BindingDeclaration) -> String {
    let label = source_label(registry, &decl.source_id);
    match decl.parse_arguments() {
        ParsedArguments::Empty => label,
        ParsedArguments::Valid(args) => format!("{}: {}", label, args),
        ParsedArguments::Invalid(_) => format!("{}: {}", label, INVALID_JSON_MARKER),
    }
}

fn placeholder(registry: &SourceRegistry, decl: &BindingDeclaration) -> String {
    format!("{{{{ {} }}}}", label_with_arguments(registry, decl))
}
