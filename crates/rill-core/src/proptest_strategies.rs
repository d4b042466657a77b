//! Proptest strategies for event core property tests
//!
//! Generators for payloads, event type names and records.

use crate::event::{EventRecord, EventType, Payload};
use proptest::prelude::*;
use serde_json::{Map, Number, Value};

/// JSON leaf values, including `null`
pub fn arb_leaf() -> impl Strategy<Value = Payload> {
    prop_oneof![
        2 => Just(Value::Null),
        1 => any::<bool>().prop_map(Value::Bool),
        3 => any::<i64>().prop_map(|n| Value::Number(n.into())),
        1 => (-1.0e9f64..1.0e9)
            .prop_map(|f| Number::from_f64(f).map_or(Value::Null, Value::Number)),
        3 => "[a-zA-Z0-9 ]{0,16}".prop_map(Value::String),
    ]
}

/// Arbitrary payloads: leaves, arrays and objects nested a few levels deep
pub fn arb_payload() -> impl Strategy<Value = Payload> {
    arb_leaf().prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..6)
                .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Interaction-style names: `click`, `onChange`, `item3`
pub fn arb_event_name() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9]{0,11}"
}

pub fn arb_event_type() -> impl Strategy<Value = EventType> {
    arb_event_name().prop_map(EventType::from)
}

/// Distinct names in random order
pub fn arb_unique_names(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set(arb_event_name(), 0..=max)
        .prop_map(|names| names.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
}

/// Names drawn from a small pool so repeats are likely
pub fn arb_names_with_repeats(max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop::sample::select(vec!["click", "change", "input", "submit"]), 0..=max)
        .prop_map(|names| names.into_iter().map(String::from).collect())
}

pub fn arb_record() -> impl Strategy<Value = EventRecord> {
    (arb_event_type(), arb_payload()).prop_map(|(ty, payload)| ty.record(payload))
}
