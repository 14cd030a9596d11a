// SPDX-License-Identifier: MIT OR Apache-2.0
//! Plain-text structural descriptions of parameter schemas.
//!
//! Frameworks that cannot inspect nested structured types get these
//! descriptions appended to a tool's documentation instead.

use crate::resolve::lookup_ref;
use serde_json::Value;

/// Render a human-readable type description of `schema`.
///
/// ```
/// use serde_json::json;
/// use tb_schema::describe_type;
///
/// let s = json!({"type": "array", "items": {"type": "string", "enum": ["a", "b"]}});
/// assert_eq!(describe_type(&s, &s), "array[string('a', 'b')]");
/// ```
#[must_use]
pub fn describe_type(schema: &Value, root: &Value) -> String {
    let mut active = Vec::new();
    describe(schema, root, 0, &mut active)
}

fn describe(schema: &Value, root: &Value, indent: usize, active: &mut Vec<String>) -> String {
    let Some(obj) = schema.as_object().filter(|o| !o.is_empty()) else {
        return "any".into();
    };

    if let Some(reference) = obj.get("$ref") {
        let reference = reference.as_str().unwrap_or_default();
        if active.iter().any(|r| r == reference) {
            return "object".into();
        }
        return match lookup_ref(reference, root) {
            Some(target) => {
                active.push(reference.to_owned());
                let out = describe(&Value::Object(target.clone()), root, indent, active);
                active.pop();
                out
            }
            None => "object".into(),
        };
    }

    for key in ["anyOf", "oneOf"] {
        if let Some(options) = obj.get(key) {
            return options
                .as_array()
                .into_iter()
                .flatten()
                .map(|o| describe(o, root, indent, active))
                .collect::<Vec<_>>()
                .join(" | ");
        }
    }

    let pad = "  ".repeat(indent);
    match obj.get("type").and_then(Value::as_str) {
        Some("null") => "null".into(),
        Some("array") => match obj.get("items").filter(|i| !is_empty_schema(i)) {
            Some(items) => format!("array[{}]", describe(items, root, indent, active)),
            None => "array".into(),
        },
        Some("object") => {
            let Some(props) = obj
                .get("properties")
                .and_then(Value::as_object)
                .filter(|p| !p.is_empty())
            else {
                return "object".into();
            };
            let required = required_set(obj.get("required"));
            let title = obj.get("title").and_then(Value::as_str).unwrap_or("object");
            let mut lines = vec![format!("{title} {{")];
            for (name, prop) in props {
                let desc = describe(prop, root, indent + 1, active);
                let marker = if required.contains(&name.as_str()) { "" } else { "?" };
                let mut line = format!("{pad}  {name}{marker}: {desc}");
                if let Some(text) = description_of(prop) {
                    line.push_str("  # ");
                    line.push_str(text);
                }
                lines.push(line);
            }
            lines.push(format!("{pad}}}"));
            lines.join("\n")
        }
        Some(t @ ("string" | "integer" | "number" | "boolean")) => {
            match obj.get("enum").and_then(Value::as_array).filter(|e| !e.is_empty()) {
                Some(values) => {
                    let rendered: Vec<String> = values.iter().map(render_enum_value).collect();
                    format!("{t}({})", rendered.join(", "))
                }
                None => t.to_owned(),
            }
        }
        _ => "any".into(),
    }
}

/// Build the `Args:` block appended to a tool description.
///
/// Returns an empty string when the schema declares no properties. Simple
/// types render on one line; multi-line (object) types render as an indented
/// `Type:` block.
#[must_use]
pub fn params_doc(parameters: &Value) -> String {
    let Some(props) = parameters
        .get("properties")
        .and_then(Value::as_object)
        .filter(|p| !p.is_empty())
    else {
        return String::new();
    };
    let required = required_set(parameters.get("required"));

    let mut lines = vec!["\n\nArgs:".to_owned()];
    for (name, prop) in props {
        let optional = if required.contains(&name.as_str()) { "" } else { " (optional)" };
        let type_desc = describe_type(prop, parameters);
        let description = description_of(prop);

        if type_desc.contains('\n') {
            lines.push(format!("    {name}{optional}:"));
            if let Some(text) = description {
                lines.push(format!("        {text}"));
            }
            lines.push("        Type:".into());
            lines.extend(type_desc.lines().map(|l| format!("            {l}")));
        } else {
            let mut line = format!("    {name} ({type_desc}){optional}");
            if let Some(text) = description {
                line.push_str(": ");
                line.push_str(text);
            }
            lines.push(line);
        }
    }
    lines.join("\n")
}

fn description_of(schema: &Value) -> Option<&str> {
    schema
        .get("description")
        .and_then(Value::as_str)
        .filter(|d| !d.is_empty())
}

fn required_set(required: Option<&Value>) -> Vec<&str> {
    required
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .collect()
}

fn is_empty_schema(v: &Value) -> bool {
    v.as_object().is_some_and(|o| o.is_empty()) || v.is_null()
}

fn render_enum_value(v: &Value) -> String {
    match v {
        Value::String(s) => format!("'{s}'"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn primitives() {
        for t in ["string", "integer", "number", "boolean", "null"] {
            let s = json!({ "type": t });
            assert_eq!(describe_type(&s, &s), t);
        }
        assert_eq!(describe_type(&json!({"type": "weird"}), &json!({})), "any");
        assert_eq!(describe_type(&json!({}), &json!({})), "any");
    }

    #[test]
    fn enum_rendering() {
        let s = json!({"type": "string", "enum": ["celsius", "fahrenheit"]});
        assert_eq!(describe_type(&s, &s), "string('celsius', 'fahrenheit')");
        let n = json!({"type": "integer", "enum": [1, 2]});
        assert_eq!(describe_type(&n, &n), "integer(1, 2)");
    }

    #[test]
    fn arrays() {
        let s = json!({"type": "array", "items": {"type": "string"}});
        assert_eq!(describe_type(&s, &s), "array[string]");
        let bare = json!({"type": "array"});
        assert_eq!(describe_type(&bare, &bare), "array");
    }

    #[test]
    fn unions_join_with_pipe() {
        let s = json!({"anyOf": [{"type": "string"}, {"type": "null"}]});
        assert_eq!(describe_type(&s, &s), "string | null");
    }

    #[test]
    fn object_block() {
        let s = json!({
            "type": "object",
            "title": "User",
            "properties": {
                "name": {"type": "string", "description": "Full name"},
                "age": {"type": "integer"}
            },
            "required": ["name"]
        });
        let out = describe_type(&s, &s);
        assert_eq!(
            out,
            "User {\n  name: string  # Full name\n  age?: integer\n}"
        );
    }

    #[test]
    fn nested_object_indents() {
        let s = json!({
            "type": "object",
            "properties": {
                "inner": {
                    "type": "object",
                    "title": "Inner",
                    "properties": {"x": {"type": "number"}},
                    "required": ["x"]
                }
            }
        });
        let out = describe_type(&s, &s);
        assert_eq!(
            out,
            "object {\n  inner?: Inner {\n    x: number\n  }\n}"
        );
    }

    #[test]
    fn refs_resolve_or_degrade() {
        let root = json!({"$defs": {"Color": {"type": "string", "enum": ["red"]}}});
        assert_eq!(describe_type(&json!({"$ref": "#/$defs/Color"}), &root), "string('red')");
        assert_eq!(describe_type(&json!({"$ref": "#/$defs/Nope"}), &root), "object");
    }

    #[test]
    fn recursive_ref_terminates() {
        let root = json!({"$defs": {"N": {"type": "object", "title": "N", "properties": {"next": {"$ref": "#/$defs/N"}}}}});
        let out = describe_type(&json!({"$ref": "#/$defs/N"}), &root);
        assert_eq!(out, "N {\n  next?: object\n}");
    }

    #[test]
    fn params_doc_simple_and_complex() {
        let params = json!({
            "type": "object",
            "properties": {
                "city": {"type": "string", "description": "City name"},
                "filter": {
                    "type": "object",
                    "title": "Filter",
                    "description": "Result filter",
                    "properties": {"limit": {"type": "integer"}}
                }
            },
            "required": ["city"]
        });
        let doc = params_doc(&params);
        let expected = "\n\nArgs:\n    city (string): City name\n    filter (optional):\n        Result filter\n        Type:\n            Filter {\n              limit?: integer\n            }";
        assert_eq!(doc, expected);
    }

    #[test]
    fn params_doc_empty_without_properties() {
        assert_eq!(params_doc(&json!({"type": "object"})), "");
    }
}
