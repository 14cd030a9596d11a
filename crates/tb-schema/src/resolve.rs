// SPDX-License-Identifier: MIT OR Apache-2.0
//! Resolution of `$ref`, `anyOf`, `oneOf` and `allOf` against a root schema.
//!
//! [`resolve`] turns a property schema into a single concrete "core" schema
//! plus a nullability flag. It never fails: pointers that cannot be resolved
//! degrade to a plain object schema and are logged at debug level.

use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::debug;

/// A JSON-Schema node as a JSON object.
pub type Schema = Map<String, Value>;

/// Output of [`resolve`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolved {
    /// The normalized core schema.
    pub schema: Schema,
    /// Whether a `null` branch or `null` type member was seen.
    pub nullable: bool,
}

/// Look up a local JSON pointer (`#/a/b/c`) in `root`.
///
/// Segments are unescaped per RFC 6901 (`~1` → `/`, `~0` → `~`). Only
/// pointers that land on a JSON object are returned.
#[must_use]
pub fn lookup_ref<'a>(reference: &str, root: &'a Value) -> Option<&'a Schema> {
    let path = reference.strip_prefix("#/")?;
    let mut target = root;
    for raw in path.split('/') {
        let segment = raw.replace("~1", "/").replace("~0", "~");
        target = target.as_object()?.get(&segment)?;
    }
    target.as_object()
}

/// Recursively merge `overlay` onto `base`.
///
/// Nested objects merge key by key; any other value in `overlay` replaces the
/// value in `base`.
#[must_use]
pub fn merge_schemas(base: &Schema, overlay: &Schema) -> Schema {
    let mut merged = base.clone();
    for (key, value) in overlay {
        match (merged.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                *existing = merge_schemas(existing, incoming);
            }
            _ => {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}

/// Resolve `schema` against `root`.
///
/// - `anyOf` / `oneOf`: `null` branches set `nullable`; the first remaining
///   branch (itself resolved) replaces the node. No branch left ⇒ `{}`.
/// - `allOf`: resolved branches are deep-merged in order, then the node's own
///   keys are merged on top.
/// - `$ref`: the target is resolved and the node's sibling keys override it.
///   A pointer already being expanded higher up the same resolution is left
///   in place.
/// - `type` arrays such as `["string", "null"]` collapse to their first
///   non-null member and set `nullable`.
#[must_use]
pub fn resolve(schema: &Value, root: &Value) -> Resolved {
    let mut seen = HashSet::new();
    match schema.as_object() {
        Some(obj) => resolve_object(obj, root, &mut seen),
        None => Resolved::default(),
    }
}

fn resolve_object(field: &Schema, root: &Value, seen: &mut HashSet<String>) -> Resolved {
    let mut schema = field.clone();
    let mut nullable = false;

    let union_key = ["anyOf", "oneOf"]
        .into_iter()
        .find(|k| schema.contains_key(*k));
    if let Some(key) = union_key {
        let options = schema.remove(key);
        schema = pick_first_branch(options.as_ref(), root, seen, &mut nullable);
    }

    if let Some(parts) = schema.remove("allOf") {
        let mut merged = Schema::new();
        for part in parts.as_array().into_iter().flatten().filter_map(Value::as_object) {
            let resolved = resolve_object(part, root, seen);
            nullable |= resolved.nullable;
            merged = merge_schemas(&merged, &resolved.schema);
        }
        schema = merge_schemas(&merged, &schema);
    }

    if let Some(reference) = schema.get("$ref").and_then(Value::as_str).map(str::to_owned) {
        match lookup_ref(&reference, root) {
            Some(target) if !seen.contains(&reference) => {
                seen.insert(reference.clone());
                schema.remove("$ref");
                let resolved = resolve_object(target, root, seen);
                seen.remove(&reference);
                nullable |= resolved.nullable;
                schema = merge_schemas(&resolved.schema, &schema);
            }
            Some(_) => {}
            None => {
                debug!(target: "tb.schema.resolve", reference = %reference, "unresolvable $ref, degrading to object");
                schema.remove("$ref");
                schema
                    .entry("type")
                    .or_insert_with(|| Value::String("object".into()));
            }
        }
    }

    nullable |= collapse_type_array(&mut schema);
    Resolved { schema, nullable }
}

fn pick_first_branch(
    options: Option<&Value>,
    root: &Value,
    seen: &mut HashSet<String>,
    nullable: &mut bool,
) -> Schema {
    let mut chosen: Option<Schema> = None;
    for option in options
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
    {
        if option.get("type").and_then(Value::as_str) == Some("null") {
            *nullable = true;
            continue;
        }
        let resolved = resolve_object(option, root, seen);
        *nullable |= resolved.nullable;
        if chosen.is_none() {
            chosen = Some(resolved.schema);
        }
    }
    chosen.unwrap_or_default()
}

/// Collapse `"type": [..]` to a single type name. Returns `true` when `null`
/// was one of the members.
fn collapse_type_array(schema: &mut Schema) -> bool {
    let Some(Value::Array(types)) = schema.get("type") else {
        return false;
    };
    let has_null = types.iter().any(|t| t.as_str() == Some("null"));
    let first = types
        .iter()
        .find(|t| t.as_str().is_some_and(|s| s != "null"))
        .cloned();
    match first {
        Some(t) => {
            schema.insert("type".into(), t);
        }
        None if has_null => {
            schema.insert("type".into(), Value::String("null".into()));
        }
        None => {
            schema.remove("type");
        }
    }
    has_null
}

/// Replace every resolvable `$ref` in `schema` with its target, recursively.
///
/// Cycles and unresolvable pointers become `{"type": "object"}`. `$defs` and
/// `definitions` are dropped from the output since nothing points into them
/// any more.
#[must_use]
pub fn inline_refs(schema: &Value, root: &Value) -> Value {
    let mut stack = Vec::new();
    inline_inner(schema, root, &mut stack)
}

fn inline_inner(value: &Value, root: &Value, stack: &mut Vec<String>) -> Value {
    match value {
        Value::Object(obj) => {
            if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
                let target = lookup_ref(reference, root);
                return match target {
                    Some(target) if !stack.iter().any(|r| r == reference) => {
                        stack.push(reference.to_owned());
                        let mut siblings = obj.clone();
                        siblings.remove("$ref");
                        let merged = merge_schemas(target, &siblings);
                        let out = inline_inner(&Value::Object(merged), root, stack);
                        stack.pop();
                        out
                    }
                    _ => serde_json::json!({ "type": "object" }),
                };
            }
            let out = obj
                .iter()
                .filter(|(k, _)| k.as_str() != "$defs" && k.as_str() != "definitions")
                .map(|(k, v)| (k.clone(), inline_inner(v, root, stack)))
                .collect();
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| inline_inner(item, root, stack))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ref_resolves_against_defs() {
        let root = json!({
            "$defs": {"A": {"type": "object", "properties": {"x": {"type": "string"}}}}
        });
        let out = resolve(&json!({"$ref": "#/$defs/A"}), &root);
        assert!(!out.nullable);
        assert_eq!(out.schema["type"], "object");
        assert_eq!(out.schema["properties"]["x"]["type"], "string");
    }

    #[test]
    fn pointer_escapes_are_unescaped() {
        let root = json!({"defs": {"a/b": {"type": "integer"}, "c~d": {"type": "boolean"}}});
        assert_eq!(lookup_ref("#/defs/a~1b", &root).unwrap()["type"], "integer");
        assert_eq!(lookup_ref("#/defs/c~0d", &root).unwrap()["type"], "boolean");
        assert!(lookup_ref("defs/a~1b", &root).is_none());
    }

    #[test]
    fn sibling_keys_override_ref_target() {
        let root = json!({"$defs": {"A": {"type": "string", "description": "inner"}}});
        let out = resolve(&json!({"$ref": "#/$defs/A", "description": "outer"}), &root);
        assert_eq!(out.schema["description"], "outer");
        assert_eq!(out.schema["type"], "string");
    }

    #[test]
    fn any_of_with_null_is_nullable_first_branch() {
        let s = json!({"anyOf": [{"type": "integer"}, {"type": "null"}, {"type": "string"}]});
        let out = resolve(&s, &s);
        assert!(out.nullable);
        assert_eq!(out.schema, json!({"type": "integer"}).as_object().unwrap().clone());
    }

    #[test]
    fn one_of_only_null_yields_empty_schema() {
        let s = json!({"oneOf": [{"type": "null"}]});
        let out = resolve(&s, &s);
        assert!(out.nullable);
        assert!(out.schema.is_empty());
    }

    #[test]
    fn all_of_deep_merges_in_order() {
        let s = json!({
            "allOf": [
                {"type": "object", "properties": {"a": {"type": "string", "description": "first"}}},
                {"properties": {"a": {"description": "second"}, "b": {"type": "integer"}}}
            ],
            "description": "own"
        });
        let out = resolve(&s, &s);
        let props = &out.schema["properties"];
        assert_eq!(props["a"]["type"], "string");
        assert_eq!(props["a"]["description"], "second");
        assert_eq!(props["b"]["type"], "integer");
        assert_eq!(out.schema["description"], "own");
    }

    #[test]
    fn unresolvable_ref_degrades_to_object() {
        let s = json!({"$ref": "#/$defs/Missing"});
        let out = resolve(&s, &json!({}));
        assert_eq!(out.schema, json!({"type": "object"}).as_object().unwrap().clone());
    }

    #[test]
    fn cyclic_ref_terminates() {
        let root = json!({
            "$defs": {"Node": {"$ref": "#/$defs/Node", "description": "loop"}}
        });
        let out = resolve(&json!({"$ref": "#/$defs/Node"}), &root);
        assert_eq!(out.schema["description"], "loop");
        assert_eq!(out.schema["$ref"], "#/$defs/Node");
    }

    #[test]
    fn type_array_collapses() {
        let s = json!({"type": ["string", "null"], "format": "date"});
        let out = resolve(&s, &s);
        assert!(out.nullable);
        assert_eq!(out.schema["type"], "string");
        assert_eq!(out.schema["format"], "date");
    }

    #[test]
    fn non_object_schema_is_empty() {
        let out = resolve(&json!(true), &json!({}));
        assert!(out.schema.is_empty());
        assert!(!out.nullable);
    }

    #[test]
    fn merge_overlay_wins_for_scalars_and_arrays() {
        let base = json!({"a": 1, "r": ["x"], "n": {"k": 1, "j": 2}});
        let overlay = json!({"a": 2, "r": ["y"], "n": {"k": 3}});
        let merged = merge_schemas(base.as_object().unwrap(), overlay.as_object().unwrap());
        assert_eq!(Value::Object(merged), json!({"a": 2, "r": ["y"], "n": {"k": 3, "j": 2}}));
    }

    #[test]
    fn inline_refs_replaces_pointers_and_drops_defs() {
        let root = json!({
            "type": "object",
            "properties": {"user": {"$ref": "#/$defs/User"}},
            "$defs": {"User": {"type": "object", "properties": {"name": {"type": "string"}}}}
        });
        let out = inline_refs(&root, &root);
        assert!(out.get("$defs").is_none());
        assert_eq!(out["properties"]["user"]["properties"]["name"]["type"], "string");
    }

    #[test]
    fn inline_refs_breaks_cycles() {
        let root = json!({
            "$defs": {"Node": {"type": "object", "properties": {"next": {"$ref": "#/$defs/Node"}}}},
            "properties": {"head": {"$ref": "#/$defs/Node"}}
        });
        let out = inline_refs(&root, &root);
        assert_eq!(out["properties"]["head"]["properties"]["next"], json!({"type": "object"}));
    }
}
