// SPDX-License-Identifier: MIT OR Apache-2.0
//! Argument schemas derived from tool metadata, and request-body re-nesting.

use crate::meta::ToolMeta;
use serde_json::{Map, Value, json};
use tb_core::{AliasMap, Arguments};
use tracing::debug;

/// Request-body content types tried in order.
const BODY_CONTENT_TYPES: [&str; 2] = ["application/json", "application/x-www-form-urlencoded"];

/// Field holding an opaque (non-flattened) request body.
pub const BODY_FIELD: &str = "body";

/// Key the dispatcher expects the request body under.
pub const JSON_PAYLOAD_KEY: &str = "json";

/// An argument schema plus what is needed to undo body flattening.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgsSchema {
    /// Object schema with `properties` and `required`.
    pub schema: Value,
    /// Top-level fields that came from a flattened request body.
    pub body_fields: Vec<String>,
    /// Alternate argument names.
    pub aliases: AliasMap,
}

/// Derive the argument schema from whichever metadata shape is present.
///
/// Returns `None` when no shape yields an object schema.
#[must_use]
pub fn build_args_schema(meta: &ToolMeta) -> Option<ArgsSchema> {
    match &meta.parameters {
        Some(Value::Object(params)) if params.contains_key("type") => {
            return Some(ArgsSchema {
                schema: Value::Object(params.clone()),
                ..ArgsSchema::default()
            });
        }
        _ => {}
    }

    if let Some(input) = &meta.input_schema {
        return load_json_object(input).map(|schema| ArgsSchema {
            schema: Value::Object(schema),
            ..ArgsSchema::default()
        });
    }

    if matches!(meta.parameters, Some(Value::Array(_))) || meta.request_body.is_some() {
        return Some(build_openapi_schema(meta));
    }
    None
}

fn load_json_object(value: &Value) -> Option<Map<String, Value>> {
    match value {
        Value::Object(map) => Some(map.clone()),
        Value::String(text) => match serde_json::from_str(text) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        },
        _ => None,
    }
}

/// Build an object schema from OpenAPI `parameters` and `request_body`.
///
/// Path and query parameters become top-level fields. A JSON (or form)
/// body that is an object with properties, none colliding with existing
/// parameters, is flattened into top-level fields; any other body is
/// exposed as a single [`BODY_FIELD`].
#[must_use]
pub fn build_openapi_schema(meta: &ToolMeta) -> ArgsSchema {
    let mut properties = Map::new();
    let mut required: Vec<String> = Vec::new();
    let mut body_fields = Vec::new();
    let mut aliases = AliasMap::new();

    let params = meta.parameters.as_ref().and_then(Value::as_array);
    for param in params.into_iter().flatten().filter_map(Value::as_object) {
        let Some(name) = param.get("name").and_then(Value::as_str).filter(|n| !n.is_empty()) else {
            continue;
        };
        let Some(mut schema) = param.get("schema").map_or_else(|| Some(Map::new()), |s| s.as_object().cloned()) else {
            continue;
        };
        let description = param
            .get("description")
            .and_then(Value::as_str)
            .filter(|d| !d.is_empty())
            .or_else(|| schema.get("description").and_then(Value::as_str))
            .unwrap_or_default()
            .to_owned();
        schema.insert("description".into(), Value::String(description));
        properties.insert(name.to_owned(), Value::Object(schema));
        if param.get("required").and_then(Value::as_bool).unwrap_or(false) {
            required.push(name.to_owned());
        }
    }

    if let Some(body) = meta.request_body.as_ref().and_then(Value::as_object) {
        let content = body.get("content").and_then(Value::as_object);
        let body_schema = BODY_CONTENT_TYPES
            .iter()
            .find_map(|ct| content.and_then(|c| c.get(*ct)))
            .map(|media| media.get("schema").cloned().unwrap_or_else(|| json!({})));

        if let Some(body_schema) = body_schema.filter(|s| !is_empty(s)) {
            let flat = body_schema
                .as_object()
                .filter(|s| s.get("type").and_then(Value::as_str) == Some("object"))
                .and_then(|s| s.get("properties").and_then(Value::as_object))
                .filter(|p| !p.is_empty() && !p.keys().any(|k| properties.contains_key(k)));

            match flat {
                Some(body_props) => {
                    let nested_required: Vec<&str> = body_schema
                        .get("required")
                        .and_then(Value::as_array)
                        .into_iter()
                        .flatten()
                        .filter_map(Value::as_str)
                        .collect();
                    let total = body_props.len();
                    for (field, field_schema) in body_props {
                        let mut field_schema = field_schema.clone();
                        for alias in maybe_body_alias(field, &mut field_schema, total) {
                            aliases.insert(alias, field.clone());
                        }
                        properties.insert(field.clone(), field_schema);
                        if nested_required.contains(&field.as_str()) {
                            required.push(field.clone());
                        }
                        body_fields.push(field.clone());
                    }
                }
                None => {
                    debug!(target: "tb.openapi", "request body kept as a single '{BODY_FIELD}' field");
                    properties.insert(BODY_FIELD.into(), body_schema);
                    if body.get("required").and_then(Value::as_bool).unwrap_or(false) {
                        required.push(BODY_FIELD.into());
                    }
                }
            }
        }
    }

    let mut seen = Vec::new();
    required.retain(|r| {
        let fresh = !seen.contains(r);
        seen.push(r.clone());
        fresh
    });

    ArgsSchema {
        schema: json!({
            "type": "object",
            "properties": properties,
            "required": required,
        }),
        body_fields,
        aliases,
    }
}

fn is_empty(value: &Value) -> bool {
    value.is_null() || value.as_object().is_some_and(Map::is_empty)
}

/// Attach a `query` alias to the sole flattened body field when its name
/// suggests a search or input role.
///
/// The alias is also recorded under the field's `x-aliases`. Returns the
/// aliases added.
pub fn maybe_body_alias(field: &str, field_schema: &mut Value, total_fields: usize) -> Vec<String> {
    let lower = field.to_lowercase();
    if total_fields != 1 || lower.contains("query") {
        return Vec::new();
    }
    if !(lower.contains("search") || lower.ends_with("_input")) {
        return Vec::new();
    }
    if let Some(obj) = field_schema.as_object_mut() {
        let entry = obj.entry("x-aliases").or_insert_with(|| json!([]));
        if !entry.is_array() {
            *entry = json!([]);
        }
        if let Some(list) = entry.as_array_mut() {
            if !list.iter().any(|a| a == "query") {
                list.push(json!("query"));
            }
        }
    }
    vec!["query".to_owned()]
}

/// Undo body flattening before dispatch.
///
/// An opaque [`BODY_FIELD`] is renamed to [`JSON_PAYLOAD_KEY`]; flattened
/// body fields are gathered under [`JSON_PAYLOAD_KEY`] unless the caller
/// already supplied one.
#[must_use]
pub fn nest_body(args: Arguments, body_fields: &[String]) -> Arguments {
    let mut out: Arguments = args
        .into_iter()
        .map(|(k, v)| if k == BODY_FIELD { (JSON_PAYLOAD_KEY.to_owned(), v) } else { (k, v) })
        .collect();
    if body_fields.is_empty() {
        return out;
    }
    let mut payload = Map::new();
    for field in body_fields {
        if let Some(value) = out.remove(field) {
            payload.insert(field.clone(), value);
        }
    }
    if !payload.is_empty() && !out.contains_key(JSON_PAYLOAD_KEY) {
        out.insert(JSON_PAYLOAD_KEY.into(), Value::Object(payload));
    }
    out
}
