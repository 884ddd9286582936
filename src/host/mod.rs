//! # Host Interface
//!
//! Everything the block needs from the surrounding CMS, expressed as one trait.
//!
//! ## Overview
//!
//! The render pipeline owns binding resolution and templating. Content storage,
//! block markup rendering and user privileges belong to the host:
//!
//! - [`Host`] - content lookups, block rendering, request flags
//! - [`NestedRender`] - handle the host uses to render nested template blocks
//!   inside the same request scope
//! - [`FixtureSite`] - in-memory host for the CLI and tests
//!
//! ## Recursion
//!
//! Includes call [`Host::render_blocks`], which may contain further template
//! blocks rendered through [`NestedRender`]. The include depth is tracked by the
//! renderer, not the host.

mod fixture;

pub use fixture::{FixtureSite, SiteSource};

use serde::{Deserialize, Serialize};

use crate::block::{BlockAttributes, BlockInstance};
use crate::subject::Subject;

/// Reusable fragment stored under a namespaced id (`theme//slug`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplatePart {
    pub id: String,
    #[serde(default)]
    pub content: String,
}

/// Reusable content pattern looked up by slug
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub slug: String,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "publish".to_string()
}

impl Pattern {
    pub fn is_published(&self) -> bool {
        self.status == "publish"
    }
}

/// Host CMS capabilities consumed by the render pipeline
pub trait Host: Send + Sync {
    /// Fetch a content item by id
    fn subject(&self, id: u64) -> Option<Subject>;

    /// Fetch a template part by its fully namespaced id
    fn template_part(&self, full_id: &str) -> Option<TemplatePart>;

    /// Published patterns whose slug matches
    fn patterns(&self, slug: &str) -> Vec<Pattern>;

    /// Namespace used for template parts given without `//`
    fn active_theme(&self) -> String;

    /// Render raw block markup with the host's own block pipeline
    fn render_blocks(&self, content: &str, nested: &dyn NestedRender) -> String;

    /// Whether this request comes from the editor (server-side preview)
    fn is_preview_request(&self) -> bool;

    /// Privilege gate for detailed error output
    fn can_manage_options(&self) -> bool;
}

/// Render handle passed to [`Host::render_blocks`]
///
/// Carries the request scope so nested template blocks share the ambient
/// subject and include depth of the render that included them.
pub trait NestedRender {
    /// Subject currently ambient in this scope
    fn subject(&self) -> Option<Subject>;

    /// Render a nested template block
    fn render_block(&self, attributes: &BlockAttributes, content: &str, block: &BlockInstance) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_status_defaults_to_publish() {
        let pattern: Pattern = serde_yaml::from_str("slug: cta\ncontent: hi").unwrap();
        assert!(pattern.is_published());
    }

    #[test]
    fn draft_pattern_is_not_published() {
        let pattern: Pattern = serde_yaml::from_str("slug: cta\nstatus: draft").unwrap();
        assert!(!pattern.is_published());
    }
}
