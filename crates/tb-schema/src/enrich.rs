// SPDX-License-Identifier: MIT OR Apache-2.0
//! Provider-facing parameter schema enrichment.

use crate::resolve::resolve;
use serde_json::{Map, Value, json};

/// Keys copied back from the original property onto its resolved schema.
const META_KEYS: &[&str] = &[
    "default",
    "description",
    "examples",
    "title",
    "deprecated",
    "enum",
    "const",
    "format",
];

/// Re-annotate a parameters schema for OpenAI/Anthropic style tool specs.
///
/// Each property is replaced by its resolved core schema with the
/// metadata keys of the original property (`default`, `description`,
/// `title`, `enum`, ...) carried over. Every property gets
/// a `description` (empty when absent) and `nullable: true` when the
/// resolver saw a null branch, the property says `nullable`, or it is
/// optional with a `null` default. Everything outside `properties`,
/// including `$defs`, is left as is.
#[must_use]
pub fn enrich_parameters(raw: &Value) -> Value {
    let Some(root) = raw.as_object() else {
        return json!({"type": "object", "properties": {}});
    };
    let Some(properties) = root.get("properties").and_then(Value::as_object) else {
        return raw.clone();
    };
    let required: Vec<&str> = root
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .collect();

    let mut normalized = Map::with_capacity(properties.len());
    for (name, field) in properties {
        let resolved = resolve(field, raw);
        let mut enriched = resolved.schema;
        if let Some(original) = field.as_object() {
            for key in META_KEYS {
                if let Some(v) = original.get(*key) {
                    enriched.insert((*key).to_owned(), v.clone());
                }
            }
        }
        enriched
            .entry("description")
            .or_insert_with(|| Value::String(String::new()));

        let default_is_null = !required.contains(&name.as_str())
            && field.get("default").is_some_and(Value::is_null);
        let declared_nullable = field.get("nullable").and_then(Value::as_bool).unwrap_or(false);
        if resolved.nullable || declared_nullable || default_is_null {
            enriched.insert("nullable".into(), Value::Bool(true));
        }
        normalized.insert(name.clone(), Value::Object(enriched));
    }

    let mut out = root.clone();
    out.insert("properties".into(), Value::Object(normalized));
    Value::Object(out)
}
