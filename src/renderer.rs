//! # Block Renderer
//!
//! Server-side entrypoint: `(attributes, inner content, block) → HTML`.
//!
//! ```text
//! render(attributes, content, block)
//!   │
//!   ├─ RenderScope        subject from block.context.postId, include depth 0
//!   ├─ preview request?   switch to previewPostId for the whole render
//!   ├─ ContextBuilder     bindings → variables
//!   ├─ TemplateRenderer   + include functions bound to the scope
//!   │     └─ include_* → Host::render_blocks → ScopedRenderer → render_in_scope …
//!   └─ failure            error!(…) + error block (detailed for admins)
//! ```
//!
//! Nothing here returns an error: every failure degrades to markup.

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use minijinja::Error;
use tracing::error;

use crate::block::{BlockAttributes, BlockInstance};
use crate::config::BinderyConfig;
use crate::context::{ContextBuilder, RenderContext};
use crate::host::{Host, NestedRender};
use crate::include::{DepthGuard, IncludeResolver};
use crate::source::SourceRegistry;
use crate::subject::{Subject, SubjectContext};
use crate::template::{present_error, TemplateRenderer};

/// State shared by every nested render of one request
#[derive(Debug, Clone)]
pub struct RenderScope {
    subjects: SubjectContext,
    depth: Arc<AtomicUsize>,
    max_depth: usize,
}

impl RenderScope {
    pub fn new(subjects: SubjectContext, max_depth: usize) -> Self {
        Self {
            subjects,
            depth: Arc::new(AtomicUsize::new(0)),
            max_depth,
        }
    }

    pub fn subjects(&self) -> &SubjectContext {
        &self.subjects
    }

    /// Current include nesting
    pub fn depth(&self) -> usize {
        self.depth.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// Take one include level, failing past the configured maximum
    pub fn enter_include(&self) -> Result<DepthGuard, Error> {
        DepthGuard::enter(&self.depth, self.max_depth)
    }
}

/// Render pipeline bound to a host, a source registry and a config
#[derive(Clone)]
pub struct BlockRenderer {
    host: Arc<dyn Host>,
    registry: Arc<SourceRegistry>,
    config: Arc<BinderyConfig>,
}

impl BlockRenderer {
    pub fn new(host: Arc<dyn Host>, registry: Arc<SourceRegistry>, config: BinderyConfig) -> Self {
        Self {
            host,
            registry,
            config: Arc::new(config),
        }
    }

    pub fn host(&self) -> &Arc<dyn Host> {
        &self.host
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn config(&self) -> &BinderyConfig {
        &self.config
    }

    /// Fresh scope for a top-level block
    pub fn scope_for(&self, block: &BlockInstance) -> RenderScope {
        let subject = block.context.post_id.and_then(|id| self.host.subject(id));
        RenderScope::new(SubjectContext::new(subject), self.config.render.max_include_depth)
    }

    /// Render a block at the top of a request
    pub fn render(&self, attributes: &BlockAttributes, content: &str, block: &BlockInstance) -> String {
        let scope = self.scope_for(block);
        self.render_in_scope(attributes, content, block, &scope)
    }

    /// Render a block inside an existing request scope
    ///
    /// A block context naming another subject makes that subject ambient;
    /// on preview requests `previewPostId` wins over both.
    pub fn render_in_scope(
        &self,
        attributes: &BlockAttributes,
        content: &str,
        block: &BlockInstance,
        scope: &RenderScope,
    ) -> String {
        let subjects = scope.subjects();
        let block_subject = block
            .context
            .post_id
            .filter(|id| subjects.current_id() != Some(*id));

        subjects.with_subject(self.host.as_ref(), block_subject, || {
            let preview = self.host.is_preview_request();
            let preview_subject = if preview {
                attributes.preview_subject_id()
            } else {
                None
            };

            subjects.with_subject(self.host.as_ref(), preview_subject, || {
                self.render_template(attributes, content, block, scope, preview)
            })
        })
    }

    /// Variables a render of `attributes` would see, without rendering
    pub fn context_for(&self, attributes: &BlockAttributes, content: &str, block: &BlockInstance) -> RenderContext {
        let scope = self.scope_for(block);
        let preview = self.host.is_preview_request();
        let preview_subject = if preview {
            attributes.preview_subject_id()
        } else {
            None
        };

        scope.subjects().with_subject(self.host.as_ref(), preview_subject, || {
            ContextBuilder::new(&self.registry).inner_blocks(content).build(
                &attributes.context_bindings,
                preview,
                scope.subjects(),
                &block.editor_classes(),
            )
        })
    }

    fn render_template(
        &self,
        attributes: &BlockAttributes,
        content: &str,
        block: &BlockInstance,
        scope: &RenderScope,
        preview: bool,
    ) -> String {
        let ctx = ContextBuilder::new(&self.registry).inner_blocks(content).build(
            &attributes.context_bindings,
            preview,
            scope.subjects(),
            &block.editor_classes(),
        );

        let engine = TemplateRenderer::new(&self.config.render)
            .with_includes(IncludeResolver::new(self.clone(), scope.clone()));

        match engine.render(&attributes.twig_template, &ctx) {
            Ok(html) => html,
            Err(e) => {
                error!(
                    kind = e.kind(),
                    line = ?e.line(),
                    depth = scope.depth(),
                    subject = ?scope.subjects().current_id(),
                    error = %e,
                    "template block failed to render"
                );
                present_error(&e, self.host.can_manage_options(), &self.config.messages)
            }
        }
    }
}

impl std::fmt::Debug for BlockRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockRenderer")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// [`NestedRender`] handle tying a renderer to a request scope
pub struct ScopedRenderer<'a> {
    renderer: &'a BlockRenderer,
    scope: &'a RenderScope,
}

impl<'a> ScopedRenderer<'a> {
    pub fn new(renderer: &'a BlockRenderer, scope: &'a RenderScope) -> Self {
        Self { renderer, scope }
    }
}

impl NestedRender for ScopedRenderer<'_> {
    fn subject(&self) -> Option<Subject> {
        self.scope.subjects().current()
    }

    fn render_block(&self, attributes: &BlockAttributes, content: &str, block: &BlockInstance) -> String {
        self.renderer.render_in_scope(attributes, content, block, self.scope)
    }
}
