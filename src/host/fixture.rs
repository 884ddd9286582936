//! In-memory host backed by a YAML site description
//!
//! Used by the CLI and the test-suite. Block markup support is limited to
//! self-closing block comments:
//!
//! - `<!-- wp:bindery/template {…attributes…} /-->` → nested template block
//! - `<!-- wp:post-title /-->` → title of the ambient subject
//!
//! Anything else passes through untouched.

use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{Host, NestedRender, Pattern, TemplatePart};
use crate::block::{BlockAttributes, BlockContext, BlockInstance, BLOCK_NAME};
use crate::error::Result;
use crate::source::{SourceRegistry, StaticSource};
use crate::subject::Subject;
use crate::util::escape_html;

/// Self-closing block comment: name + optional JSON attributes
static BLOCK_COMMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<!--\s+wp:([a-z][a-z0-9_-]*(?:/[a-z0-9_-]+)?)(?:\s+(\{.*?\}))?\s+/-->")
        .expect("block comment regex is valid")
});

/// Static binding source declared in a site file
#[derive(Debug, Clone, Deserialize)]
pub struct SiteSource {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub value: Value,
}

/// Host implementation holding a whole (tiny) site in memory
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureSite {
    #[serde(default = "default_theme")]
    pub theme: String,

    /// Treat renders as editor preview requests
    #[serde(default)]
    pub preview_request: bool,

    /// Current user may see detailed template errors
    #[serde(default)]
    pub can_manage_options: bool,

    #[serde(default, deserialize_with = "subjects_by_id")]
    pub subjects: IndexMap<u64, Subject>,

    /// Full id (`theme//slug`) → block markup
    #[serde(default)]
    pub template_parts: IndexMap<String, String>,

    #[serde(default)]
    pub patterns: Vec<Pattern>,

    #[serde(default)]
    pub sources: Vec<SiteSource>,
}

fn default_theme() -> String {
    "bindery-theme".to_string()
}

fn subjects_by_id<'de, D>(deserializer: D) -> std::result::Result<IndexMap<u64, Subject>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let list = Vec::<Subject>::deserialize(deserializer)?;
    Ok(list.into_iter().map(|s| (s.id, s)).collect())
}

impl Default for FixtureSite {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureSite {
    pub fn new() -> Self {
        Self {
            theme: default_theme(),
            preview_request: false,
            can_manage_options: false,
            subjects: IndexMap::new(),
            template_parts: IndexMap::new(),
            patterns: Vec::new(),
            sources: Vec::new(),
        }
    }

    /// Parse a YAML site description
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a YAML site description from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = theme.into();
        self
    }

    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subjects.insert(subject.id, subject);
        self
    }

    pub fn with_template_part(mut self, full_id: impl Into<String>, content: impl Into<String>) -> Self {
        self.template_parts.insert(full_id.into(), content.into());
        self
    }

    pub fn with_pattern(mut self, slug: impl Into<String>, content: impl Into<String>) -> Self {
        self.patterns.push(Pattern {
            slug: slug.into(),
            content: content.into(),
            status: "publish".to_string(),
        });
        self
    }

    pub fn with_draft_pattern(mut self, slug: impl Into<String>, content: impl Into<String>) -> Self {
        self.patterns.push(Pattern {
            slug: slug.into(),
            content: content.into(),
            status: "draft".to_string(),
        });
        self
    }

    pub fn preview(mut self, preview: bool) -> Self {
        self.preview_request = preview;
        self
    }

    pub fn privileged(mut self, privileged: bool) -> Self {
        self.can_manage_options = privileged;
        self
    }

    /// Register the site's static sources
    pub fn register_sources(&self, registry: &SourceRegistry) -> Result<()> {
        for source in &self.sources {
            registry.register(
                &source.id,
                Arc::new(StaticSource::new(source.label.clone(), source.value.clone())),
            )?;
        }
        Ok(())
    }

    fn render_comment(&self, caps: &Captures<'_>, nested: &dyn NestedRender) -> String {
        let name = &caps[1];
        match name {
            BLOCK_NAME => {
                let raw = caps.get(2).map_or("{}", |m| m.as_str());
                let attributes: BlockAttributes = match serde_json::from_str(raw) {
                    Ok(attributes) => attributes,
                    Err(e) => {
                        debug!(error = %e, "skipping template block with unreadable attributes");
                        return String::new();
                    }
                };
                let subject = nested.subject();
                let block = BlockInstance {
                    name: BLOCK_NAME.to_string(),
                    wrapper_attributes: r#"class="wp-block-bindery-template""#.to_string(),
                    context: BlockContext {
                        post_id: subject.as_ref().map(|s| s.id),
                        post_type: subject.map(|s| s.post_type),
                    },
                };
                nested.render_block(&attributes, "", &block)
            }
            "post-title" => nested
                .subject()
                .map(|s| format!(r#"<h2 class="wp-block-post-title">{}</h2>"#, escape_html(&s.title)))
                .unwrap_or_default(),
            _ => caps[0].to_string(),
        }
    }
}

impl Host for FixtureSite {
    fn subject(&self, id: u64) -> Option<Subject> {
        self.subjects.get(&id).cloned()
    }

    fn template_part(&self, full_id: &str) -> Option<TemplatePart> {
        self.template_parts.get(full_id).map(|content| TemplatePart {
            id: full_id.to_string(),
            content: content.clone(),
        })
    }

    fn patterns(&self, slug: &str) -> Vec<Pattern> {
        self.patterns
            .iter()
            .filter(|p| p.slug == slug && p.is_published())
            .cloned()
            .collect()
    }

    fn active_theme(&self) -> String {
        self.theme.clone()
    }

    fn render_blocks(&self, content: &str, nested: &dyn NestedRender) -> String {
        BLOCK_COMMENT_RE
            .replace_all(content, |caps: &Captures<'_>| self.render_comment(caps, nested))
            .into_owned()
    }

    fn is_preview_request(&self) -> bool {
        self.preview_request
    }

    fn can_manage_options(&self) -> bool {
        self.can_manage_options
    }
}
