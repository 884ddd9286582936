//! Block Module - attribute schema, registration and instance data
//!
//! - `attributes`: persisted attributes and editor mutations
//! - `instance`: the rendered block instance (wrapper classes, used context)
//! - `registration`: block type descriptor and JSON Schema validation

mod attributes;
mod instance;
mod registration;

pub use attributes::{BlockAttributes, PreviewMode, DEFAULT_TEMPLATE};
pub use instance::{BlockContext, BlockInstance};
pub use registration::{
    attributes_schema, block_type, parse_attributes, AttributeDef, BlockType, BLOCK_NAME, EDITOR_SCRIPT,
};
