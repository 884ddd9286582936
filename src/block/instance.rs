//! The block instance being rendered

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static CLASS_ATTR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"class="([^"]*)""#).expect("class attribute regex is valid"));

/// Context values the block declares in `usesContext`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockContext {
    #[serde(rename = "postId", default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<u64>,

    #[serde(rename = "postType", default, skip_serializing_if = "Option::is_none")]
    pub post_type: Option<String>,
}

/// Host-side view of the block instance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInstance {
    #[serde(default)]
    pub name: String,

    /// Rendered wrapper attribute string, e.g. `class="wp-block-x has-large-font-size"`
    #[serde(default)]
    pub wrapper_attributes: String,

    #[serde(default)]
    pub context: BlockContext,
}

impl BlockInstance {
    pub fn with_classes(classes: &str) -> Self {
        Self {
            name: super::BLOCK_NAME.to_string(),
            wrapper_attributes: format!(r#"class="{}""#, classes),
            context: BlockContext::default(),
        }
    }

    pub fn with_post(mut self, post_id: u64) -> Self {
        self.context.post_id = Some(post_id);
        self
    }

    /// Class list from the wrapper attributes (opaque to the pipeline)
    pub fn editor_classes(&self) -> String {
        CLASS_ATTR_RE
            .captures(&self.wrapper_attributes)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_class_list() {
        let block = BlockInstance {
            wrapper_attributes: r#"class="wp-block-bindery-template has-large-font-size" style="x""#.into(),
            ..BlockInstance::default()
        };
        assert_eq!(block.editor_classes(), "wp-block-bindery-template has-large-font-size");
    }

    #[test]
    fn no_class_attribute_is_empty() {
        let block = BlockInstance {
            wrapper_attributes: r#"id="hero""#.into(),
            ..BlockInstance::default()
        };
        assert_eq!(block.editor_classes(), "");
    }

    #[test]
    fn deserializes_context() {
        let block: BlockInstance = serde_json::from_str(
            r#"{"name":"bindery/template","wrapperAttributes":"class=\"a\"","context":{"postId":5,"postType":"page"}}"#,
        )
        .unwrap();
        assert_eq!(block.context.post_id, Some(5));
        assert_eq!(block.context.post_type.as_deref(), Some("page"));
        assert_eq!(block.editor_classes(), "a");
    }
}
