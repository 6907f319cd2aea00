//! Property-based tests for the loader.

use proptest::prelude::*;

use libyaml12::{load_one, parse_events, EventKind, Value};

/// YAML flow text with unique mapping keys.
fn flow_node() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        "[a-z][a-z0-9]{0,6}",
        any::<i64>().prop_map(|n| n.to_string()),
        "'[a-z #:]{0,8}'",
        Just("~".to_string()),
    ];
    leaf.prop_recursive(4, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4)
                .prop_map(|items| format!("[{}]", items.join(", "))),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4).prop_map(|entries| {
                let entries: Vec<String> = entries
                    .into_iter()
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .collect();
                format!("{{{}}}", entries.join(", "))
            }),
        ]
    })
}

/// A block mapping whose values are flow nodes.
fn block_document() -> impl Strategy<Value = String> {
    prop::collection::btree_map("[a-z]{1,6}", flow_node(), 1..5).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(k, v)| format!("{}: {}\n", k, v))
            .collect()
    })
}

/// Plain scalars covering each step of the Core Schema cascade.
fn plain_scalar() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("~".to_string()),
        Just("null".to_string()),
        "(true|false|True|FALSE)",
        "[-+]?[0-9]{1,24}",
        "0x[0-9a-fA-F]{1,8}",
        "0o[0-7]{1,8}",
        "[-+]?[0-9]{1,4}\\.[0-9]{0,4}",
        "[0-9]\\.[0-9]{1,3}e[-+]?[0-9]{1,2}",
        "20[0-9]{2}-0[1-9]-1[0-9]",
        "[a-z][a-z ]{0,10}[a-z]",
    ]
}

fn core_tag(value: &Value) -> &'static str {
    match value {
        Value::Null => "!!null",
        Value::Bool(_) => "!!bool",
        Value::Integer(_) => "!!int",
        Value::Float(_) => "!!float",
        Value::Timestamp(_) => "!!timestamp",
        _ => "!!str",
    }
}

fn event_kinds(text: &str) -> Vec<EventKind> {
    parse_events(text)
        .map(|event| event.map(|e| e.kind))
        .collect::<libyaml12::Result<_>>()
        .unwrap()
}

proptest! {
    #[test]
    fn test_event_stream_is_balanced(input in prop_oneof![flow_node(), block_document()]) {
        let kinds = event_kinds(&input);
        prop_assert_eq!(kinds.first(), Some(&EventKind::StreamStart));
        prop_assert_eq!(kinds.last(), Some(&EventKind::StreamEnd));

        let mut depth: i64 = 0;
        for kind in &kinds {
            match kind {
                EventKind::StreamStart
                | EventKind::MappingStart { .. }
                | EventKind::SequenceStart { .. }
                | EventKind::DocumentStart { .. } => depth += 1,
                EventKind::StreamEnd
                | EventKind::MappingEnd
                | EventKind::SequenceEnd
                | EventKind::DocumentEnd { .. } => depth -= 1,
                _ => {}
            }
            prop_assert!(depth >= 0);
        }
        prop_assert_eq!(depth, 0);
    }

    #[test]
    fn test_plain_resolution_is_deterministic(text in plain_scalar()) {
        let first = load_one(&text).unwrap();
        let second = load_one(&text).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_resolution_is_idempotent(text in plain_scalar()) {
        let implicit = load_one(&text).unwrap();
        let explicit = load_one(format!("{} {}", core_tag(&implicit), text)).unwrap();
        prop_assert_eq!(implicit, explicit);
    }

    #[test]
    fn test_decimal_integers(text in "[-+]?[0-9]{1,30}") {
        let expected: num_bigint::BigInt = text.trim_start_matches('+').parse().unwrap();
        prop_assert_eq!(load_one(&text).unwrap(), Value::Integer(expected));
    }

    #[test]
    fn test_alias_equals_anchored_value(node in flow_node()) {
        let value = load_one(format!("a: &x {}\nb: *x\n", node)).unwrap();
        prop_assert!(value.get("a").is_some());
        prop_assert_eq!(value.get("a"), value.get("b"));
    }

    #[test]
    fn test_each_document_loads_independently(docs in prop::collection::vec(flow_node(), 1..4)) {
        let stream: String = docs.iter().map(|d| format!("--- {}\n", d)).collect();
        let loaded: Vec<Value> = libyaml12::load_all(&stream)
            .collect::<libyaml12::Result<_>>()
            .unwrap();
        prop_assert_eq!(loaded.len(), docs.len());
        for (doc, value) in docs.iter().zip(&loaded) {
            prop_assert_eq!(&load_one(doc).unwrap(), value);
        }
    }
}
