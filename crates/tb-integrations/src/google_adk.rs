// SPDX-License-Identifier: MIT OR Apache-2.0
//! Google ADK: `FunctionDeclaration`s with Google-style schemas, ADK
//! `contents`/`parts` messages and a LiteLLM streaming client.
//!
//! Google schemas know no `$ref`, so references are inlined while
//! converting; anything unresolvable becomes a bare `OBJECT`.

use crate::common::{ToolState, content_text, invalid, litellm_model, result_text, str_field, wrap_with};
use serde_json::{Map, Value, json};
use tb_adapter::{
    ChatClientConfig, CommonModel, FrameworkModel, FrameworkTool, MessageAdapter, ModelAdapter, RegisteredTools,
    ToolAdapter, UsageReporting, function_tools,
};
use tb_callable::{CallableSynthesizer, SynthesisOptions};
use tb_core::{CanonicalMessage, CanonicalTool, CanonicalToolCall, MessageRole, parse_arguments};
use tb_error::BridgeError;
use tb_schema::lookup_ref;
use tracing::{debug, warn};

/// Framework id.
pub const FRAMEWORK: &str = "google_adk";

// ---------------------------------------------------------------------------
// Schema conversion
// ---------------------------------------------------------------------------

/// Convert a JSON Schema into the Google `Schema` shape.
///
/// Types become `STRING`, `INTEGER`, `NUMBER`, `BOOLEAN`, `ARRAY` or
/// `OBJECT` (the fallback). Arrays keep `items`, objects keep `properties`
/// and a non-empty `required`, every node keeps its `description`.
/// `anyOf`/`oneOf` take the first non-null branch and mark the node
/// `nullable` when a null branch was present.
#[must_use]
pub fn google_schema(schema: &Value, root: &Value) -> Value {
    let mut stack = Vec::new();
    convert(schema, root, &mut stack)
}

fn object() -> Value {
    json!({"type": "OBJECT"})
}

fn convert(schema: &Value, root: &Value, stack: &mut Vec<String>) -> Value {
    let Some(obj) = schema.as_object().filter(|o| !o.is_empty()) else {
        return object();
    };

    if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
        if stack.iter().any(|r| r == reference) {
            debug!(target: "tb.integrations", framework = FRAMEWORK, reference, "recursive $ref, using OBJECT");
            return object();
        }
        let Some(target) = lookup_ref(reference, root) else {
            debug!(target: "tb.integrations", framework = FRAMEWORK, reference, "unresolvable $ref, using OBJECT");
            return object();
        };
        stack.push(reference.to_owned());
        let out = convert(&Value::Object(target.clone()), root, stack);
        stack.pop();
        return out;
    }

    for key in ["anyOf", "oneOf"] {
        if let Some(branches) = obj.get(key).and_then(Value::as_array) {
            let has_null = branches.iter().any(|b| b.get("type").and_then(Value::as_str) == Some("null"));
            let picked = branches
                .iter()
                .find(|b| b.get("type").and_then(Value::as_str) != Some("null"));
            let mut out = picked.map_or_else(object, |b| convert(b, root, stack));
            if has_null {
                out["nullable"] = Value::Bool(true);
            }
            if let Some(desc) = obj.get("description") {
                out["description"] = desc.clone();
            }
            return out;
        }
    }

    let kind = match obj.get("type") {
        Some(Value::String(t)) => t.as_str(),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .find(|t| *t != "null")
            .unwrap_or("object"),
        _ => "object",
    };
    let google_type = match kind {
        "string" => "STRING",
        "integer" => "INTEGER",
        "number" => "NUMBER",
        "boolean" => "BOOLEAN",
        "array" => "ARRAY",
        _ => "OBJECT",
    };

    let mut out = Map::new();
    out.insert("type".into(), Value::String(google_type.into()));
    if let Some(desc) = obj.get("description").filter(|d| d.is_string()) {
        out.insert("description".into(), desc.clone());
    }
    if obj.get("nullable") == Some(&Value::Bool(true)) {
        out.insert("nullable".into(), Value::Bool(true));
    }
    if let Some(values) = obj.get("enum").filter(|_| kind == "string") {
        out.insert("enum".into(), values.clone());
    }
    match kind {
        "array" => {
            if let Some(items) = obj.get("items").filter(|i| i.as_object().is_some_and(|o| !o.is_empty())) {
                out.insert("items".into(), convert(items, root, stack));
            }
        }
        "object" => {
            let props: Map<String, Value> = obj
                .get("properties")
                .and_then(Value::as_object)
                .into_iter()
                .flatten()
                .map(|(name, prop)| (name.clone(), convert(prop, root, stack)))
                .collect();
            if !props.is_empty() {
                out.insert("properties".into(), Value::Object(props));
            }
            if let Some(required) = obj
                .get("required")
                .and_then(Value::as_array)
                .filter(|r| !r.is_empty())
            {
                out.insert("required".into(), Value::Array(required.clone()));
            }
        }
        _ => {}
    }
    Value::Object(out)
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

/// Tools as `FunctionDeclaration`s `{name, description, parameters}`.
#[derive(Debug, Default)]
pub struct GoogleAdkToolAdapter {
    state: ToolState,
}

impl GoogleAdkToolAdapter {
    /// An adapter with a private type cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An adapter sharing `synth`'s type cache.
    #[must_use]
    pub fn with_synthesizer(synth: CallableSynthesizer) -> Self {
        Self {
            state: ToolState::with_synthesizer(synth),
        }
    }
}

impl ToolAdapter for GoogleAdkToolAdapter {
    fn framework(&self) -> &str {
        FRAMEWORK
    }

    fn from_canonical(&self, tools: &[CanonicalTool]) -> Vec<FrameworkTool> {
        function_tools(
            FRAMEWORK,
            tools,
            &self.state.synth,
            None,
            SynthesisOptions::default(),
            &self.state.registered,
            |c| {
                let parameters = c.tool().parameters();
                json!({
                    "name": c.name(),
                    "description": c.doc(),
                    "parameters": google_schema(parameters, parameters),
                })
            },
        )
    }

    fn registered(&self) -> &RegisteredTools {
        &self.state.registered
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// ADK `Content` objects: `{role: "user" | "model", parts: [...]}`.
///
/// Function calls without an `id` get a synthesized one; a
/// `functionResponse` without an `id` answers the most recent call of the
/// same name.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoogleAdkMessageAdapter;

impl MessageAdapter for GoogleAdkMessageAdapter {
    fn framework(&self) -> &str {
        FRAMEWORK
    }

    fn to_canonical(&self, messages: &[Value]) -> Result<Vec<CanonicalMessage>, BridgeError> {
        let mut out = Vec::new();
        // (name, id) of calls seen so far, for responses without ids.
        let mut pending: Vec<(String, String)> = Vec::new();
        for content in messages {
            let role = str_field(FRAMEWORK, content, "role")?;
            let parts = content
                .get("parts")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            let mut text = String::new();
            let mut calls = Vec::new();
            for part in parts {
                if let Some(t) = part.get("text").and_then(Value::as_str) {
                    text.push_str(t);
                } else if let Some(call) = part.get("functionCall").or_else(|| part.get("function_call")) {
                    let name = str_field(FRAMEWORK, call, "name")?;
                    let arguments = parse_arguments(call.get("args"))?;
                    let call = match call.get("id").and_then(Value::as_str) {
                        Some(id) => CanonicalToolCall::new(id, name, arguments),
                        None => CanonicalToolCall::with_generated_id(name, arguments),
                    };
                    pending.push((call.name.clone(), call.id.clone()));
                    calls.push(call);
                } else if let Some(resp) = part
                    .get("functionResponse")
                    .or_else(|| part.get("function_response"))
                {
                    let name = str_field(FRAMEWORK, resp, "name")?;
                    let id = match resp.get("id").and_then(Value::as_str) {
                        Some(id) => id.to_owned(),
                        None => match pending.iter().rposition(|(n, _)| n == name) {
                            Some(i) => {
                                let id = pending.remove(i).1;
                                debug!(target: "tb.integrations", framework = FRAMEWORK, name, id = %id, "matched functionResponse to call by name");
                                id
                            }
                            None => {
                                warn!(target: "tb.integrations", framework = FRAMEWORK, name, "functionResponse without id answers no pending call");
                                return Err(invalid(FRAMEWORK, format!("functionResponse '{name}' answers no call")));
                            }
                        },
                    };
                    let payload = response_text(resp.get("response"));
                    out.push(CanonicalMessage::tool_result(id, payload).with_name(name));
                } else {
                    debug!(target: "tb.integrations", framework = FRAMEWORK, role, "skipping unsupported part");
                }
            }
            match role {
                "model" if !calls.is_empty() => {
                    let mut msg = CanonicalMessage::assistant_tool_calls(calls);
                    if !text.is_empty() {
                        msg.content = Some(text);
                    }
                    out.push(msg);
                }
                "model" if !text.is_empty() => out.push(CanonicalMessage::assistant(text)),
                "user" | "system" if !calls.is_empty() => {
                    return Err(invalid(FRAMEWORK, format!("functionCall in a {role} content")));
                }
                "user" if !text.is_empty() => out.push(CanonicalMessage::user(text)),
                "system" if !text.is_empty() => out.push(CanonicalMessage::system(text)),
                "user" | "model" | "system" => {}
                other => {
                    warn!(target: "tb.integrations", framework = FRAMEWORK, role = other, "unknown content role");
                    return Err(invalid(FRAMEWORK, format!("unknown role '{other}'")));
                }
            }
        }
        Ok(out)
    }

    fn from_canonical(&self, messages: &[CanonicalMessage]) -> Result<Vec<Value>, BridgeError> {
        let mut names: Vec<(String, String)> = Vec::new();
        let mut out = Vec::new();
        for message in messages {
            message.validate()?;
            let mut parts = Vec::new();
            if message.role != MessageRole::Tool
                && let Some(text) = message.content.as_deref().filter(|t| !t.is_empty())
            {
                parts.push(json!({"text": text}));
            }
            for call in message.calls() {
                names.push((call.id.clone(), call.name.clone()));
                parts.push(json!({"functionCall": {"id": call.id, "name": call.name, "args": call.arguments}}));
            }
            if message.role == MessageRole::Tool {
                let id = message.tool_call_id.clone().unwrap_or_default();
                let name = message
                    .name
                    .clone()
                    .or_else(|| names.iter().find(|(i, _)| *i == id).map(|(_, n)| n.clone()))
                    .unwrap_or_else(|| {
                        warn!(target: "tb.integrations", framework = FRAMEWORK, id = %id, "tool result names no known call");
                        String::new()
                    });
                let response = message
                    .content
                    .as_deref()
                    .map_or(Value::Null, |c| serde_json::from_str(c).unwrap_or_else(|_| json!(c)));
                let response = match response {
                    obj @ Value::Object(_) => obj,
                    other => json!({"result": other}),
                };
                parts.push(json!({"functionResponse": {"id": id, "name": name, "response": response}}));
            }
            let role = match message.role {
                MessageRole::Assistant => "model",
                _ => "user",
            };
            out.push(json!({"role": role, "parts": parts}));
        }
        Ok(out)
    }
}

/// A function response payload as text; `{"result": x}` unwraps to `x`.
fn response_text(response: Option<&Value>) -> String {
    match response {
        Some(Value::Object(map)) if map.len() == 1 && map.contains_key("result") => result_text(&map["result"]),
        Some(other) => content_text(Some(other)).unwrap_or_default(),
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// LiteLLM client named `provider/model`, streaming with usage included.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoogleAdkModelAdapter;

impl ModelAdapter for GoogleAdkModelAdapter {
    fn framework(&self) -> &str {
        FRAMEWORK
    }

    fn wrap_model(&self, model: &CommonModel) -> Result<FrameworkModel, BridgeError> {
        wrap_with(FRAMEWORK, model, |info| {
            Ok(ChatClientConfig::from_info(info, litellm_model(info))?.streaming(UsageReporting::StreamOptions))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tb_core::Arguments;

    #[test]
    fn schema_types_are_uppercased() {
        let s = json!({
            "type": "object",
            "description": "args",
            "properties": {
                "q": {"type": "string", "description": "query"},
                "n": {"type": "integer"},
                "tags": {"type": "array", "items": {"type": "string"}},
                "on": {"type": "boolean"}
            },
            "required": ["q"]
        });
        let g = google_schema(&s, &s);
        assert_eq!(g["type"], "OBJECT");
        assert_eq!(g["description"], "args");
        assert_eq!(g["properties"]["q"], json!({"type": "STRING", "description": "query"}));
        assert_eq!(g["properties"]["n"]["type"], "INTEGER");
        assert_eq!(g["properties"]["tags"]["items"]["type"], "STRING");
        assert_eq!(g["properties"]["on"]["type"], "BOOLEAN");
        assert_eq!(g["required"], json!(["q"]));
    }

    #[test]
    fn refs_inlined_and_missing_become_object() {
        let s = json!({
            "type": "object",
            "properties": {
                "p": {"$ref": "#/$defs/P"},
                "gone": {"$ref": "#/$defs/Gone"}
            },
            "$defs": {"P": {"type": "object", "properties": {"x": {"type": "number"}}}}
        });
        let g = google_schema(&s, &s);
        assert_eq!(g["properties"]["p"]["properties"]["x"]["type"], "NUMBER");
        assert_eq!(g["properties"]["gone"], json!({"type": "OBJECT"}));
        assert!(g.get("$defs").is_none());
    }

    #[test]
    fn cyclic_ref_terminates() {
        let s = json!({
            "$ref": "#/$defs/Node",
            "$defs": {"Node": {"type": "object", "properties": {"next": {"$ref": "#/$defs/Node"}}}}
        });
        let g = google_schema(&s, &s);
        assert_eq!(g["properties"]["next"], json!({"type": "OBJECT"}));
    }

    #[test]
    fn empty_and_optional() {
        assert_eq!(google_schema(&json!({}), &json!({})), json!({"type": "OBJECT"}));
        let g = google_schema(&json!({"anyOf": [{"type": "integer"}, {"type": "null"}]}), &json!({}));
        assert_eq!(g, json!({"type": "INTEGER", "nullable": true}));
    }

    #[test]
    fn function_call_without_id_gets_one() {
        let raw = vec![
            json!({"role": "model", "parts": [{"functionCall": {"name": "f", "args": {"a": 1}}}]}),
            json!({"role": "user", "parts": [{"functionResponse": {"name": "f", "response": {"result": "ok"}}}]}),
        ];
        let canonical = GoogleAdkMessageAdapter.to_canonical(&raw).unwrap();
        let id = &canonical[0].calls()[0].id;
        assert!(id.starts_with("call_"));
        assert_eq!(canonical[1].tool_call_id.as_ref(), Some(id));
        assert_eq!(canonical[1].content.as_deref(), Some("ok"));
    }

    #[test]
    fn orphan_response_rejected() {
        let raw = vec![json!({"role": "user", "parts": [{"functionResponse": {"name": "f", "response": {}}}]})];
        assert!(GoogleAdkMessageAdapter.to_canonical(&raw).is_err());
    }

    #[test]
    fn unknown_role_rejected_and_unknown_parts_skipped() {
        let raw = vec![json!({"role": "tool", "parts": [{"text": "x"}]})];
        assert!(GoogleAdkMessageAdapter.to_canonical(&raw).is_err());

        let raw = vec![json!({"role": "user", "parts": [{"inlineData": {"mimeType": "image/png"}}, {"text": "hi"}]})];
        let canonical = GoogleAdkMessageAdapter.to_canonical(&raw).unwrap();
        assert_eq!(canonical.len(), 1);
        assert_eq!(canonical[0].content.as_deref(), Some("hi"));
    }

    #[test]
    fn from_canonical_names_responses() {
        let call = CanonicalToolCall::new("c1", "weather", Arguments::new());
        let messages = vec![
            CanonicalMessage::assistant_tool_calls(vec![call]),
            CanonicalMessage::tool_result("c1", "{\"temp\": 20}"),
        ];
        let out = GoogleAdkMessageAdapter.from_canonical(&messages).unwrap();
        assert_eq!(out[0]["role"], "model");
        let resp = &out[1]["parts"][0]["functionResponse"];
        assert_eq!(resp["name"], "weather");
        assert_eq!(resp["response"]["temp"], 20);
    }
}
