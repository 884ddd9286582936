//! Bindery - templating block with binding-source resolution

pub mod binding;
pub mod block;
pub mod config;
pub mod context;
pub mod error;
pub mod host;
pub mod include;
pub mod preview;
pub mod renderer;
pub mod source;
pub mod subject;
pub mod template;
pub mod util;

pub use binding::{BindingDeclaration, BlockMetadata, MetadataDrift};
pub use block::{parse_attributes, BlockAttributes, BlockInstance, PreviewMode};
pub use config::BinderyConfig;
pub use context::{ContextBuilder, RenderContext, ResolutionMode};
pub use error::{BinderyError, FixSuggestion};
pub use host::{FixtureSite, Host, NestedRender};
pub use include::IncludeResolver;
pub use preview::{label_preview, label_preview_with_args, EditorPreview};
pub use renderer::{BlockRenderer, RenderScope};
pub use source::{BindingSource, SourceRegistry};
pub use subject::{Subject, SubjectContext};
pub use template::{present_error, TemplateError, TemplateRenderer};
