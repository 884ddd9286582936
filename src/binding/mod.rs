//! Binding Module - declared variable bindings
//!
//! - `declaration`: persisted binding rows (`contextBindings`)
//! - `metadata`: the derived `metadata.bindings` view required by the host
//!
//! Data flow:
//! ```text
//! contextBindings[i] ──► project() ──► metadata.bindings["contextBinding{i}"]
//!        │
//!        └──► ContextBuilder (render time, read-only)
//! ```

mod declaration;
pub mod metadata;

pub use declaration::{binding_key, BindingDeclaration, ParsedArguments, BINDING_KEY_PREFIX};
pub use metadata::{BlockMetadata, MetadataBinding, MetadataDrift};
