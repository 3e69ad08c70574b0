//! Property-based tests using proptest
//!
//! These tests verify placeholder resolution over randomized JSON trees
//! and parameter values.

use http_resource::template::{BuildEnv, Namespace, Resolver};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

/// Generate strings that cannot contain a placeholder
fn arb_plain_string() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ,._/-]{0,16}"
}

/// Generate arbitrary JSON trees without placeholders
fn arb_plain_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| json!(n)),
        arb_plain_string().prop_map(Value::String),
    ];

    leaf.prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
            prop::collection::vec(("[a-z]{1,8}", inner), 0..8)
                .prop_map(|entries| Value::Object(entries.into_iter().collect())),
        ]
    })
}

/// Generate placeholder names
fn arb_name() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,10}"
}

/// Generate param values, including text that looks like placeholders
fn arb_param_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-zA-Z0-9 {}_]{0,20}".prop_map(Value::String),
        any::<i64>().prop_map(|n| json!(n)),
        arb_plain_json(),
    ]
}

fn namespace(params: Map<String, Value>) -> Namespace {
    Namespace::new(params, BuildEnv::from_pairs([("BUILD_NAME", "1")]), ".")
}

proptest! {
    /// Trees without placeholders resolve to themselves
    #[test]
    fn resolve_is_identity_without_placeholders(
        tree in arb_plain_json(),
        params in prop::collection::vec((arb_name(), arb_param_value()), 0..5)
    ) {
        let ns = namespace(params.into_iter().collect());
        let resolved = Resolver::new(&ns).resolve_value(&tree).unwrap();
        prop_assert_eq!(resolved, tree);
    }

    /// A whole-field placeholder becomes exactly the param value
    #[test]
    fn whole_field_substitution_is_single_pass(
        name in arb_name(),
        value in arb_param_value(),
        other in arb_param_value()
    ) {
        let mut params = Map::new();
        // A second param that the substituted text might mention
        params.insert("other_param".to_string(), other);
        params.insert(name.clone(), value.clone());

        let ns = namespace(params);
        let body = json!({"x": format!("{{{name}}}")});
        let resolved = Resolver::new(&ns).resolve_value(&body).unwrap();
        prop_assert_eq!(&resolved["x"], &value);
    }

    /// Resolving twice gives the same result as resolving once
    #[test]
    fn resolution_is_idempotent_on_resolved_trees(
        tree in arb_plain_json(),
        name in arb_name(),
        text in arb_plain_string()
    ) {
        let mut params = Map::new();
        params.insert(name.clone(), Value::String(text));
        let ns = namespace(params);
        let resolver = Resolver::new(&ns);

        let body = json!({"tree": tree, "field": format!("pre-{{{name}}}-post")});
        let once = resolver.resolve_value(&body).unwrap();
        let twice = resolver.resolve_value(&once).unwrap();
        prop_assert_eq!(once, twice);
    }

    /// Unknown placeholders survive verbatim
    #[test]
    fn unknown_placeholders_left_verbatim(
        prefix in arb_plain_string(),
        suffix in arb_plain_string()
    ) {
        let ns = namespace(Map::new());
        let text = format!("{prefix}{{not_defined_anywhere}}{suffix}");
        let resolved = Resolver::new(&ns).resolve_value(&Value::String(text.clone())).unwrap();
        prop_assert_eq!(resolved, Value::String(text));
    }

    /// Top-level keys and their order survive resolution
    #[test]
    fn shape_is_preserved(tree in arb_plain_json()) {
        let body = json!({"wrapped": tree, "name": "{BUILD_NAME}"});
        let ns = namespace(Map::new());
        let resolved = Resolver::new(&ns).resolve_value(&body).unwrap();

        let keys: Vec<&String> = resolved.as_object().unwrap().keys().collect();
        prop_assert_eq!(keys, vec!["wrapped", "name"]);
        prop_assert_eq!(&resolved["name"], &json!("1"));
    }
}
