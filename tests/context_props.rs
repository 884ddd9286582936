//! Property tests for the context builder and the metadata projection

use std::collections::HashSet;
use std::sync::Arc;

use bindery::binding::{binding_key, metadata, BindingDeclaration};
use bindery::block::BlockAttributes;
use bindery::context::{ContextBuilder, ResolutionMode, EDITOR_CLASSES_VAR};
use bindery::source::{SourceRegistry, StaticSource};
use bindery::subject::SubjectContext;
use proptest::prelude::*;
use serde_json::{json, Value};

fn registry() -> SourceRegistry {
    let registry = SourceRegistry::new();
    registry
        .register("demo/a", Arc::new(StaticSource::new("A", "alpha")))
        .unwrap();
    registry
        .register("demo/list", Arc::new(StaticSource::new("List", json!([1, 2]))))
        .unwrap();
    registry
}

fn declaration() -> impl Strategy<Value = BindingDeclaration> {
    (
        "[abc]{0,2}",
        prop_oneof![Just(""), Just("demo/a"), Just("demo/list"), Just("demo/missing")],
        prop_oneof![
            Just(String::new()),
            Just(r#"{"key":"x"}"#.to_string()),
            Just("[1,2]".to_string()),
            "[{}:\"a-z ]{0,12}",
        ],
        prop_oneof![Just(String::new()), "[a-z]{1,6}"],
    )
        .prop_map(|(name, source, arguments, preview)| {
            BindingDeclaration::new(name, source)
                .with_arguments(arguments)
                .with_preview_value(preview)
        })
}

fn build(decls: &[BindingDeclaration], mode: ResolutionMode) -> Value {
    ContextBuilder::new(&registry())
        .mode(mode)
        .build(decls, false, &SubjectContext::default(), "wp-block")
        .to_value()
}

proptest! {
    #[test]
    fn one_entry_per_distinct_name(decls in prop::collection::vec(declaration(), 0..8)) {
        let ctx = build(&decls, ResolutionMode::Live);
        let names: HashSet<&str> = decls
            .iter()
            .map(|d| d.variable_name.as_str())
            .filter(|n| !n.is_empty())
            .collect();

        let object = ctx.as_object().unwrap();
        prop_assert_eq!(object.len(), names.len() + 1);
        prop_assert_eq!(&object[EDITOR_CLASSES_VAR], &json!("wp-block"));
    }

    #[test]
    fn last_declaration_wins(decls in prop::collection::vec(declaration(), 1..8)) {
        let ctx = build(&decls, ResolutionMode::Live);
        for name in decls.iter().map(|d| &d.variable_name).filter(|n| !n.is_empty()) {
            let last = decls.iter().rev().find(|d| &d.variable_name == name).unwrap();
            let alone = build(std::slice::from_ref(last), ResolutionMode::Live);
            prop_assert_eq!(&ctx[name.as_str()], &alone[name.as_str()]);
        }
    }

    #[test]
    fn build_is_idempotent(decls in prop::collection::vec(declaration(), 0..8)) {
        let first = serde_json::to_string(&build(&decls, ResolutionMode::Live)).unwrap();
        let second = serde_json::to_string(&build(&decls, ResolutionMode::Live)).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn preview_value_is_verbatim(decl in declaration(), mode in prop_oneof![Just(ResolutionMode::Live), Just(ResolutionMode::Placeholder)]) {
        prop_assume!(!decl.variable_name.is_empty() && !decl.preview_value.is_empty());
        let ctx = build(std::slice::from_ref(&decl), mode);
        prop_assert_eq!(&ctx[decl.variable_name.as_str()], &json!(decl.preview_value));
    }

    #[test]
    fn invalid_json_never_aborts(arguments in "\\PC{0,20}") {
        let decl = BindingDeclaration::new("v", "demo/missing").with_arguments(arguments.clone());
        let live = build(std::slice::from_ref(&decl), ResolutionMode::Live);
        prop_assert_eq!(&live["v"], &json!(""));

        let placeholder = build(std::slice::from_ref(&decl), ResolutionMode::Placeholder);
        let text = placeholder["v"].as_str().unwrap();
        prop_assert!(text.starts_with("{{ demo/missing"));
        if decl.parse_arguments().is_invalid() {
            prop_assert!(text.ends_with(": [Invalid JSON] }}"));
        }
    }

    #[test]
    fn metadata_args_round_trip(key in "[a-z_]{1,10}", value in "[a-zA-Z0-9 ]{0,10}") {
        let args = json!({ "key": key, "value": value });
        let decls = vec![
            BindingDeclaration::new("x", "demo/a"),
            BindingDeclaration::new("y", "demo/a").with_arguments(args.to_string()),
        ];

        let projected = metadata::project(&decls);
        prop_assert_eq!(projected[&binding_key(1)].args.as_ref(), Some(&args));

        let mut attrs = BlockAttributes::with_template("");
        for decl in decls {
            attrs = attrs.with_binding(decl);
        }
        attrs.remove_binding(1).unwrap();
        prop_assert!(!attrs.metadata.bindings.contains_key(&binding_key(1)));
        prop_assert!(attrs.metadata_drift().is_empty());
    }
}
