//! Persisted block attributes and editor-side mutations

use serde::{Deserialize, Serialize};

use crate::binding::{binding_key, metadata, BindingDeclaration, BlockMetadata};
use crate::error::{BinderyError, Result};

/// Template used when the attribute is absent
pub const DEFAULT_TEMPLATE: &str = "<div class=\"{{ editor_classes }}\">\n<div>{{ content }}</div>\n</div>";

fn default_template() -> String {
    DEFAULT_TEMPLATE.to_string()
}

/// Editor preview strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PreviewMode {
    /// Binding labels only, nothing compiled
    #[default]
    Default,
    /// Full server render
    ServerSide,
    /// Template compiled with label placeholders
    Twigjs,
}

impl PreviewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreviewMode::Default => "default",
            PreviewMode::ServerSide => "server-side",
            PreviewMode::Twigjs => "twigjs",
        }
    }
}

impl std::str::FromStr for PreviewMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "default" => Ok(PreviewMode::Default),
            "server-side" => Ok(PreviewMode::ServerSide),
            "twigjs" => Ok(PreviewMode::Twigjs),
            other => Err(format!("unknown preview mode '{other}' (default, server-side, twigjs)")),
        }
    }
}

/// Attributes stored on a block instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockAttributes {
    #[serde(default = "default_template")]
    pub twig_template: String,

    #[serde(default)]
    pub metadata: BlockMetadata,

    #[serde(default)]
    pub context_bindings: Vec<BindingDeclaration>,

    #[serde(default)]
    pub preview_mode: PreviewMode,

    /// Editor-only preview subject, kept as the raw text field value
    #[serde(default)]
    pub preview_post_id: String,
}

impl Default for BlockAttributes {
    fn default() -> Self {
        Self {
            twig_template: default_template(),
            metadata: BlockMetadata::default(),
            context_bindings: Vec::new(),
            preview_mode: PreviewMode::default(),
            preview_post_id: String::new(),
        }
    }
}

impl BlockAttributes {
    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            twig_template: template.into(),
            ..Self::default()
        }
    }

    /// Append a declaration and keep metadata in sync (builder form)
    pub fn with_binding(mut self, declaration: BindingDeclaration) -> Self {
        self.context_bindings.push(declaration);
        self.sync_metadata();
        self
    }

    /// Positive integer in `previewPostId`, if any
    pub fn preview_subject_id(&self) -> Option<u64> {
        self.preview_post_id
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|id| *id > 0)
    }

    /// Re-derive `metadata.bindings` and renumber binding keys
    pub fn sync_metadata(&mut self) {
        for (index, decl) in self.context_bindings.iter_mut().enumerate() {
            decl.binding_key = binding_key(index);
        }
        metadata::sync(&mut self.metadata, &self.context_bindings);
    }

    /// Add an empty binding row, returning its index
    pub fn add_binding(&mut self) -> usize {
        let index = self.context_bindings.len();
        self.context_bindings.push(BindingDeclaration::default());
        self.sync_metadata();
        index
    }

    pub fn set_variable_name(&mut self, index: usize, name: impl Into<String>) -> Result<()> {
        self.declaration_mut(index)?.variable_name = name.into();
        self.sync_metadata();
        Ok(())
    }

    pub fn set_source(&mut self, index: usize, source_id: impl Into<String>) -> Result<()> {
        self.declaration_mut(index)?.source_id = source_id.into();
        self.sync_metadata();
        Ok(())
    }

    pub fn set_arguments(&mut self, index: usize, arguments_json: impl Into<String>) -> Result<()> {
        self.declaration_mut(index)?.arguments_json = arguments_json.into();
        self.sync_metadata();
        Ok(())
    }

    pub fn set_preview_value(&mut self, index: usize, value: impl Into<String>) -> Result<()> {
        self.declaration_mut(index)?.preview_value = value.into();
        Ok(())
    }

    /// Remove a row; later rows shift down and take the freed keys
    pub fn remove_binding(&mut self, index: usize) -> Result<BindingDeclaration> {
        self.check_index(index)?;
        let removed = self.context_bindings.remove(index);
        self.sync_metadata();
        Ok(removed)
    }

    /// Persisted metadata disagreements with the declarations
    pub fn metadata_drift(&self) -> Vec<metadata::MetadataDrift> {
        metadata::drift(&self.metadata, &self.context_bindings)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        let len = self.context_bindings.len();
        if index >= len {
            return Err(BinderyError::BindingIndex { index, len });
        }
        Ok(())
    }

    fn declaration_mut(&mut self, index: usize) -> Result<&mut BindingDeclaration> {
        self.check_index(index)?;
        Ok(&mut self.context_bindings[index])
    }
}
