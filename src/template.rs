//! Template Renderer - compiles a template string against a [`RenderContext`]
//!
//! Thin layer over `minijinja` (Jinja2/Twig syntax):
//! - undefined variables follow the configured [`UndefinedPolicy`]
//! - auto-escaping is off, templates emit raw HTML
//! - include functions are registered only when an [`IncludeResolver`] is given
//!
//! Engine failures come back as a [`TemplateError`]; callers turn them into
//! markup with [`present_error`], so a broken template never breaks the page.

use minijinja::{AutoEscape, Environment, ErrorKind, UndefinedBehavior};
use thiserror::Error;

use crate::config::{Messages, RenderConfig, UndefinedPolicy};
use crate::context::RenderContext;
use crate::include::{IncludeResolver, INCLUDE_DEPTH_EXCEEDED};
use crate::util::escape_html;

/// Template compile/render failure, classified by cause
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("{message}")]
    Syntax { message: String, line: Option<usize> },

    #[error("{message}")]
    Undefined { message: String, line: Option<usize> },

    #[error("{message}")]
    Include { message: String, line: Option<usize> },

    #[error("{message}")]
    Render { message: String, line: Option<usize> },
}

impl TemplateError {
    /// Short name of the class, used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            TemplateError::Syntax { .. } => "syntax",
            TemplateError::Undefined { .. } => "undefined",
            TemplateError::Include { .. } => "include",
            TemplateError::Render { .. } => "render",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            TemplateError::Syntax { message, .. }
            | TemplateError::Undefined { message, .. }
            | TemplateError::Include { message, .. }
            | TemplateError::Render { message, .. } => message,
        }
    }

    /// Template line the engine blamed, if known
    pub fn line(&self) -> Option<usize> {
        match self {
            TemplateError::Syntax { line, .. }
            | TemplateError::Undefined { line, .. }
            | TemplateError::Include { line, .. }
            | TemplateError::Render { line, .. } => *line,
        }
    }
}

impl From<minijinja::Error> for TemplateError {
    fn from(err: minijinja::Error) -> Self {
        let message = err.to_string();
        let line = err.line();
        let depth_exceeded = err
            .detail()
            .is_some_and(|detail| detail.starts_with(INCLUDE_DEPTH_EXCEEDED));

        match err.kind() {
            ErrorKind::SyntaxError => TemplateError::Syntax { message, line },
            ErrorKind::UndefinedError => TemplateError::Undefined { message, line },
            ErrorKind::InvalidOperation if depth_exceeded => TemplateError::Include { message, line },
            _ => TemplateError::Render { message, line },
        }
    }
}

impl From<UndefinedPolicy> for UndefinedBehavior {
    fn from(policy: UndefinedPolicy) -> Self {
        match policy {
            UndefinedPolicy::Lenient => UndefinedBehavior::Lenient,
            UndefinedPolicy::Chainable => UndefinedBehavior::Chainable,
            UndefinedPolicy::Strict => UndefinedBehavior::Strict,
        }
    }
}

/// One configured engine instance
pub struct TemplateRenderer {
    env: Environment<'static>,
}

impl TemplateRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(config.undefined.into());
        env.set_auto_escape_callback(|_name: &str| AutoEscape::None);
        Self { env }
    }

    /// Register `include_template_part`, `include_pattern` and `call_block_binding`
    pub fn with_includes(mut self, includes: IncludeResolver) -> Self {
        includes.register(&mut self.env);
        self
    }

    /// Compile and render `template` in one go
    pub fn render(&self, template: &str, ctx: &RenderContext) -> Result<String, TemplateError> {
        Ok(self.env.render_str(template, ctx)?)
    }
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer").finish_non_exhaustive()
    }
}

/// Markup shown in place of a failed template
///
/// Privileged viewers get the engine message, everyone else the generic text.
pub fn present_error(err: &TemplateError, privileged: bool, messages: &Messages) -> String {
    if privileged {
        format!(
            r#"<div class="error" style="border:2px dashed red; padding: 20px;"><strong>{}</strong> {}</div>"#,
            escape_html(&messages.error_heading),
            escape_html(err.message())
        )
    } else {
        format!(r#"<div class="error">{}</div>"#, escape_html(&messages.generic_error))
    }
}
