//! Editor previews
//!
//! Three strategies, chosen by the block's `previewMode`:
//!
//! - `default`: binding labels only, e.g. `{{ Post Meta, Author }}`
//! - `server-side`: the full render, with the preview subject applied
//! - `twigjs`: the template compiled against label placeholders, no includes

use tracing::warn;

use crate::binding::BindingDeclaration;
use crate::block::{BlockAttributes, BlockInstance, PreviewMode};
use crate::context::{label_with_arguments, source_label, ContextBuilder, ResolutionMode};
use crate::renderer::BlockRenderer;
use crate::source::SourceRegistry;
use crate::subject::SubjectContext;
use crate::template::TemplateRenderer;
use crate::util::escape_html;

const NO_BINDINGS: &str = "No bindings";

fn wrap_labels(labels: Vec<String>) -> String {
    if labels.is_empty() {
        format!("{{{{ {} }}}}", NO_BINDINGS)
    } else {
        format!("{{{{ {} }}}}", labels.join(", "))
    }
}

/// `{{ Label1, Label2 }}` for every declaration with a source
pub fn label_preview(declarations: &[BindingDeclaration], registry: &SourceRegistry) -> String {
    wrap_labels(
        declarations
            .iter()
            .filter(|d| d.has_source())
            .map(|d| source_label(registry, &d.source_id))
            .collect(),
    )
}

/// Like [`label_preview`], with each label followed by its arguments
pub fn label_preview_with_args(declarations: &[BindingDeclaration], registry: &SourceRegistry) -> String {
    wrap_labels(
        declarations
            .iter()
            .filter(|d| d.has_source())
            .map(|d| label_with_arguments(registry, d))
            .collect(),
    )
}

/// Renders what the editor canvas shows for a block
#[derive(Debug, Clone)]
pub struct EditorPreview {
    renderer: BlockRenderer,
}

impl EditorPreview {
    pub fn new(renderer: BlockRenderer) -> Self {
        Self { renderer }
    }

    pub fn render(&self, attributes: &BlockAttributes, block: &BlockInstance) -> String {
        self.render_mode(attributes.preview_mode, attributes, block)
    }

    /// Render with an explicit mode instead of `attributes.preview_mode`
    pub fn render_mode(&self, mode: PreviewMode, attributes: &BlockAttributes, block: &BlockInstance) -> String {
        match mode {
            PreviewMode::Default => format!(
                "<div>{}</div>",
                escape_html(&label_preview(&attributes.context_bindings, self.renderer.registry()))
            ),
            PreviewMode::ServerSide => self.renderer.render(attributes, "", block),
            PreviewMode::Twigjs => self.render_placeholders(attributes, block),
        }
    }

    /// Only `editor_classes` and the declared names are in scope. Declarations
    /// without a source or preview value bind `""`, as in a live render.
    fn render_placeholders(&self, attributes: &BlockAttributes, block: &BlockInstance) -> String {
        let ctx = ContextBuilder::new(self.renderer.registry())
            .mode(ResolutionMode::Placeholder)
            .build(&attributes.context_bindings, true, &SubjectContext::default(), &block.editor_classes());

        let engine = TemplateRenderer::new(&self.renderer.config().render);
        match engine.render(&attributes.twig_template, &ctx) {
            Ok(html) => html,
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "placeholder preview failed");
                format!(
                    r#"<div class="template-error">{} {}</div>"#,
                    escape_html(&self.renderer.config().messages.preview_error),
                    escape_html(e.message())
                )
            }
        }
    }
}
