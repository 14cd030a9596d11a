// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property tests for argument reconciliation.

use proptest::prelude::*;
use serde_json::{Value, json};
use tb_callable::reconcile;
use tb_core::{AliasMap, Arguments};

// ── Strategies ──────────────────────────────────────────────────────────

fn field_set() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-z][a-z_]{0,8}", 1..5).prop_map(|s| s.into_iter().collect())
}

fn raw_args() -> impl Strategy<Value = Arguments> {
    prop::collection::btree_map("[a-zA-Z_\\-]{1,10}", any::<i64>(), 0..6).prop_map(|m| {
        m.into_iter().map(|(k, v)| (k, json!(v))).collect()
    })
}

fn schema_for(fields: &[String]) -> Value {
    let props: serde_json::Map<String, Value> =
        fields.iter().map(|f| (f.clone(), json!({"type": "integer"}))).collect();
    json!({"type": "object", "properties": props})
}

// ── Properties ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn never_drops_arguments(fields in field_set(), raw in raw_args()) {
        let schema = schema_for(&fields);
        let out = reconcile(raw.clone(), &schema, &AliasMap::new());
        prop_assert_eq!(out.len(), raw.len());
        let mut before: Vec<String> = raw.values().map(Value::to_string).collect();
        let mut after: Vec<String> = out.values().map(Value::to_string).collect();
        before.sort();
        after.sort();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn exact_names_are_untouched(fields in field_set()) {
        let schema = schema_for(&fields);
        let raw: Arguments = fields.iter().map(|f| (f.clone(), json!(1))).collect();
        let out = reconcile(raw.clone(), &schema, &AliasMap::new());
        prop_assert_eq!(out, raw);
    }
}
