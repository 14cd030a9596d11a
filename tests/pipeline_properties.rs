// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property tests spanning the schema, callable and adapter crates.

use proptest::prelude::*;
use serde_json::{Value, json};
use tb_adapter::{CommonToolSet, ToolSelection};
use tb_core::{MAX_TOOL_NAME_LEN, Tool, normalize_tool_name};
use tb_integrations::{FRAMEWORKS, default_registry};

// ── Strategies ──────────────────────────────────────────────────────

fn tool_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,99}"
}

fn field_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,11}"
}

// ── Properties ──────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_framework_sees_the_same_name(name in tool_name()) {
        let set: CommonToolSet = vec![Tool::new(&name, "").with_func(|_| Ok(json!(null)))].into();
        let expected = normalize_tool_name(&name);
        prop_assert!(expected.chars().count() <= MAX_TOOL_NAME_LEN);
        for id in FRAMEWORKS {
            let out = set.to_framework(default_registry(), id, &ToolSelection::all());
            prop_assert_eq!(out[0].name(), expected.as_str());
        }
    }

    #[test]
    fn echoed_arguments_survive_every_framework(field in field_name(), value in "[a-z]{0,8}") {
        let schema = json!({
            "type": "object",
            "properties": {(field.clone()): {"type": "string"}},
            "required": [field.clone()]
        });
        let set: CommonToolSet = vec![
            Tool::new("echo", "").with_schema(schema).with_func(|a| Ok(Value::Object(a)))
        ].into();
        for id in ["openai", "anthropic", "google_adk", "langchain", "crewai", "pydantic_ai"] {
            let out = set.to_framework(default_registry(), id, &ToolSelection::all());
            let args = json!({(field.clone()): value.clone()}).as_object().cloned().unwrap();
            let result = out[0].call(args).unwrap();
            prop_assert_eq!(&result[&field], &json!(value));
        }
    }
}
