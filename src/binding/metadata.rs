//! `metadata.bindings` as a projection of the declarations
//!
//! The host's binding API expects bindings in a side-channel metadata map.
//! Rather than keeping two mutable copies in sync, the map is derived from
//! `contextBindings` on demand; [`drift`] reports where persisted metadata
//! disagrees with that derivation.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::declaration::{binding_key, BindingDeclaration, ParsedArguments, BINDING_KEY_PREFIX};

/// Registry-shaped binding entry: `{ source, args? }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataBinding {
    pub source: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Value>,
}

/// The block's `metadata` attribute
///
/// Keys other than `bindings` (block name, lock settings, …) belong to the
/// host and are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockMetadata {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub bindings: IndexMap<String, MetadataBinding>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One disagreement between persisted metadata and the projection
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataDrift {
    /// Declaration has a source but no metadata entry
    Missing { key: String },
    /// Entry exists with a different source
    SourceMismatch { key: String, expected: String, found: String },
    /// Entry args differ from the parsed arguments
    ArgsMismatch { key: String },
    /// Entry in the `contextBinding*` namespace with no matching declaration
    Orphan { key: String },
}

impl std::fmt::Display for MetadataDrift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataDrift::Missing { key } => write!(f, "{key}: missing metadata entry"),
            MetadataDrift::SourceMismatch { key, expected, found } => {
                write!(f, "{key}: source is '{found}', expected '{expected}'")
            }
            MetadataDrift::ArgsMismatch { key } => write!(f, "{key}: args differ from arguments JSON"),
            MetadataDrift::Orphan { key } => write!(f, "{key}: no matching context binding"),
        }
    }
}

/// Derive `metadata.bindings` from the declarations
pub fn project(declarations: &[BindingDeclaration]) -> IndexMap<String, MetadataBinding> {
    declarations
        .iter()
        .enumerate()
        .filter(|(_, decl)| decl.has_source())
        .map(|(index, decl)| {
            let args = match decl.parse_arguments() {
                ParsedArguments::Valid(value) => Some(value),
                ParsedArguments::Empty | ParsedArguments::Invalid(_) => None,
            };
            (
                binding_key(index),
                MetadataBinding {
                    source: decl.source_id.clone(),
                    args,
                },
            )
        })
        .collect()
}

/// Whether `key` belongs to the synthetic binding namespace
pub fn is_binding_key(key: &str) -> bool {
    key.strip_prefix(BINDING_KEY_PREFIX)
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// Replace every synthetic entry of `metadata` with the projection
pub fn sync(metadata: &mut BlockMetadata, declarations: &[BindingDeclaration]) {
    metadata.bindings.retain(|key, _| !is_binding_key(key));
    metadata.bindings.extend(project(declarations));
}

/// Compare persisted metadata with the projection
pub fn drift(metadata: &BlockMetadata, declarations: &[BindingDeclaration]) -> Vec<MetadataDrift> {
    let expected = project(declarations);
    let mut problems = Vec::new();

    for (key, want) in &expected {
        match metadata.bindings.get(key) {
            None => problems.push(MetadataDrift::Missing { key: key.clone() }),
            Some(found) if found.source != want.source => {
                problems.push(MetadataDrift::SourceMismatch {
                    key: key.clone(),
                    expected: want.source.clone(),
                    found: found.source.clone(),
                })
            }
            Some(found) if want.args.is_some() && found.args != want.args => {
                problems.push(MetadataDrift::ArgsMismatch { key: key.clone() })
            }
            Some(_) => {}
        }
    }

    for key in metadata.bindings.keys() {
        if is_binding_key(key) && !expected.contains_key(key) {
            problems.push(MetadataDrift::Orphan { key: key.clone() });
        }
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn decls() -> Vec<BindingDeclaration> {
        vec![
            BindingDeclaration::new("title", "core/post-meta").with_arguments(r#"{"key":"subtitle"}"#),
            BindingDeclaration::new("draft", ""),
            BindingDeclaration::new("broken", "demo/src").with_arguments("{bad json"),
        ]
    }

    #[test]
    fn projection_mirrors_sources_and_args() {
        let bindings = project(&decls());

        assert_eq!(bindings.len(), 2);
        assert_eq!(
            bindings["contextBinding0"],
            MetadataBinding {
                source: "core/post-meta".into(),
                args: Some(json!({"key": "subtitle"}))
            }
        );
        assert!(!bindings.contains_key("contextBinding1"));
        assert_eq!(bindings["contextBinding2"].args, None);
    }

    #[test]
    fn removing_a_declaration_removes_its_entry() {
        let mut list = decls();
        list.remove(0);
        let bindings = project(&list);
        assert!(!bindings.values().any(|b| b.source == "core/post-meta"));
    }

    #[test]
    fn binding_key_namespace() {
        assert!(is_binding_key("contextBinding0"));
        assert!(is_binding_key("contextBinding15"));
        assert!(!is_binding_key("contextBinding"));
        assert!(!is_binding_key("contextBindingX"));
        assert!(!is_binding_key("content"));
    }

    #[test]
    fn sync_keeps_foreign_entries_and_extra_keys() {
        let mut metadata: BlockMetadata = serde_json::from_value(json!({
            "name": "Hero",
            "bindings": {
                "content": {"source": "core/pattern-overrides"},
                "contextBinding7": {"source": "stale/source"}
            }
        }))
        .unwrap();

        sync(&mut metadata, &decls());

        assert_eq!(metadata.extra.get("name"), Some(&json!("Hero")));
        assert!(metadata.bindings.contains_key("content"));
        assert!(!metadata.bindings.contains_key("contextBinding7"));
        assert!(metadata.bindings.contains_key("contextBinding0"));
        assert!(drift(&metadata, &decls()).is_empty());
    }

    #[test]
    fn drift_reports_every_kind() {
        let metadata: BlockMetadata = serde_json::from_value(json!({
            "bindings": {
                "contextBinding0": {"source": "core/post-meta", "args": {"key": "other"}},
                "contextBinding2": {"source": "wrong/source"},
                "contextBinding9": {"source": "demo/src"}
            }
        }))
        .unwrap();

        let mut list = decls();
        list.push(BindingDeclaration::new("extra", "demo/extra"));

        let problems = drift(&metadata, &list);
        assert_eq!(
            problems,
            vec![
                MetadataDrift::ArgsMismatch { key: "contextBinding0".into() },
                MetadataDrift::SourceMismatch {
                    key: "contextBinding2".into(),
                    expected: "demo/src".into(),
                    found: "wrong/source".into()
                },
                MetadataDrift::Missing { key: "contextBinding3".into() },
                MetadataDrift::Orphan { key: "contextBinding9".into() },
            ]
        );
    }

    #[test]
    fn empty_bindings_are_not_serialized() {
        let metadata = BlockMetadata::default();
        assert_eq!(serde_json::to_value(&metadata).unwrap(), json!({}));
    }
}
