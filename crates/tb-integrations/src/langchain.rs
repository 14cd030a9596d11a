// SPDX-License-Identifier: MIT OR Apache-2.0
//! LangChain / LangGraph: structured tools, message dictionaries and a
//! streaming chat client.

use crate::common::{ToolState, content_text, invalid, str_field, wrap_with};
use serde_json::{Map, Value, json};
use tb_adapter::{
    ChatClientConfig, CommonModel, FrameworkModel, FrameworkTool, MessageAdapter, ModelAdapter, RegisteredTools,
    ToolAdapter, UsageReporting, function_tools,
};
use tb_callable::{CallableSynthesizer, SynthesisOptions, SynthesizedCallable};
use tb_core::{CanonicalMessage, CanonicalTool, CanonicalToolCall, MessageRole, parse_arguments};
use tb_error::BridgeError;

/// Framework id.
pub const FRAMEWORK: &str = "langchain";

/// Alias id under which the same adapters are registered.
pub const LANGGRAPH: &str = "langgraph";

/// `args_schema` rebuilt from the synthesized parameter types.
///
/// Nested objects come out as titled records, so the schema carries the
/// full structure rather than the raw input.
#[must_use]
pub fn args_schema(callable: &SynthesizedCallable) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for param in callable.params() {
        let mut prop = param.annotation().to_json_schema();
        if let Some(obj) = prop.as_object_mut() {
            if !param.description.is_empty() {
                obj.insert("description".into(), Value::String(param.description.clone()));
            }
            if let Some(default) = &param.default {
                obj.insert("default".into(), default.clone());
            }
        }
        properties.insert(param.name.clone(), prop);
        if param.required {
            required.push(Value::String(param.name.clone()));
        }
    }
    json!({
        "title": callable.name(),
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

/// `StructuredTool`-shaped declarations `{name, description, args_schema}`.
#[derive(Debug, Default)]
pub struct LangChainToolAdapter {
    state: ToolState,
}

impl LangChainToolAdapter {
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

impl ToolAdapter for LangChainToolAdapter {
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
                json!({
                    "name": c.name(),
                    "description": c.doc(),
                    "args_schema": args_schema(c),
                })
            },
        )
    }

    fn registered(&self) -> &RegisteredTools {
        &self.state.registered
    }
}

/// Message dictionaries keyed by `type`: `human`, `ai`, `system`, `tool`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LangChainMessageAdapter;

impl MessageAdapter for LangChainMessageAdapter {
    fn framework(&self) -> &str {
        FRAMEWORK
    }

    fn to_canonical(&self, messages: &[Value]) -> Result<Vec<CanonicalMessage>, BridgeError> {
        messages
            .iter()
            .map(|m| {
                let kind = str_field(FRAMEWORK, m, "type")?;
                let text = content_text(m.get("content"));
                let mut msg = match kind {
                    "human" => CanonicalMessage::user(text.unwrap_or_default()),
                    "system" => CanonicalMessage::system(text.unwrap_or_default()),
                    "tool" => CanonicalMessage::tool_result(str_field(FRAMEWORK, m, "tool_call_id")?, text.unwrap_or_default()),
                    "ai" => {
                        let calls = m
                            .get("tool_calls")
                            .and_then(Value::as_array)
                            .into_iter()
                            .flatten()
                            .map(|c| {
                                let name = str_field(FRAMEWORK, c, "name")?;
                                let arguments = parse_arguments(c.get("args"))?;
                                Ok(match c.get("id").and_then(Value::as_str) {
                                    Some(id) => CanonicalToolCall::new(id, name, arguments),
                                    None => CanonicalToolCall::with_generated_id(name, arguments),
                                })
                            })
                            .collect::<Result<Vec<_>, BridgeError>>()?;
                        if calls.is_empty() {
                            CanonicalMessage::assistant(text.unwrap_or_default())
                        } else {
                            let mut msg = CanonicalMessage::assistant_tool_calls(calls);
                            msg.content = text.filter(|t| !t.is_empty());
                            msg
                        }
                    }
                    other => return Err(invalid(FRAMEWORK, format!("unknown message type '{other}'"))),
                };
                if let Some(name) = m.get("name").and_then(Value::as_str) {
                    msg = msg.with_name(name);
                }
                Ok(msg)
            })
            .collect()
    }

    fn from_canonical(&self, messages: &[CanonicalMessage]) -> Result<Vec<Value>, BridgeError> {
        messages
            .iter()
            .map(|m| {
                m.validate()?;
                let kind = match m.role {
                    MessageRole::User => "human",
                    MessageRole::Assistant => "ai",
                    MessageRole::System => "system",
                    MessageRole::Tool => "tool",
                };
                let mut out = Map::new();
                out.insert("type".into(), Value::String(kind.into()));
                out.insert("content".into(), Value::String(m.content.clone().unwrap_or_default()));
                if let Some(name) = &m.name {
                    out.insert("name".into(), Value::String(name.clone()));
                }
                if !m.calls().is_empty() {
                    let calls = m
                        .calls()
                        .iter()
                        .map(|c| json!({"id": c.id, "name": c.name, "args": c.arguments, "type": "tool_call"}))
                        .collect();
                    out.insert("tool_calls".into(), Value::Array(calls));
                }
                if let Some(id) = &m.tool_call_id {
                    out.insert("tool_call_id".into(), Value::String(id.clone()));
                }
                Ok(Value::Object(out))
            })
            .collect()
    }
}

/// Streaming `ChatOpenAI` with `stream_usage`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LangChainModelAdapter;

impl ModelAdapter for LangChainModelAdapter {
    fn framework(&self) -> &str {
        FRAMEWORK
    }

    fn wrap_model(&self, model: &CommonModel) -> Result<FrameworkModel, BridgeError> {
        wrap_with(FRAMEWORK, model, |info| {
            Ok(ChatClientConfig::from_info(info, info.model_name())?.streaming(UsageReporting::StreamUsage))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_schema_has_nested_record() {
        let tool = CanonicalTool::new(
            "book",
            "Book a trip",
            json!({
                "type": "object",
                "properties": {
                    "dest": {"$ref": "#/$defs/Place", "description": "Where"},
                    "nights": {"type": "integer", "default": 1}
                },
                "required": ["dest"],
                "$defs": {"Place": {
                    "type": "object",
                    "title": "Place",
                    "properties": {"city": {"type": "string"}},
                    "required": ["city"]
                }}
            }),
        );
        let out = LangChainToolAdapter::new().from_canonical(&[tool]);
        let schema = &out[0].declaration["args_schema"];
        assert_eq!(schema["title"], "book");
        assert_eq!(schema["required"], json!(["dest"]));
        assert_eq!(schema["properties"]["dest"]["title"], "Place");
        assert_eq!(schema["properties"]["dest"]["description"], "Where");
        assert_eq!(schema["properties"]["nights"]["default"], 1);
        assert_eq!(schema["properties"]["nights"]["anyOf"][1]["type"], "null");
    }

    #[test]
    fn message_types_round_trip() {
        let raw = vec![
            json!({"type": "system", "content": "s"}),
            json!({"type": "human", "content": "h"}),
            json!({"type": "ai", "content": "", "tool_calls": [{"id": "1", "name": "f", "args": {"x": 1}}]}),
            json!({"type": "tool", "content": "r", "tool_call_id": "1"}),
            json!({"type": "ai", "content": "done"}),
        ];
        let canonical = LangChainMessageAdapter.to_canonical(&raw).unwrap();
        let roles: Vec<MessageRole> = canonical.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            [MessageRole::System, MessageRole::User, MessageRole::Assistant, MessageRole::Tool, MessageRole::Assistant]
        );
        assert!(canonical[2].content.is_none());
        let back = LangChainMessageAdapter.from_canonical(&canonical).unwrap();
        assert_eq!(back[2]["tool_calls"][0]["args"]["x"], 1);
        assert_eq!(back[3]["tool_call_id"], "1");
        assert_eq!(LangChainMessageAdapter.to_canonical(&back).unwrap(), canonical);
    }

    #[test]
    fn unknown_type_rejected() {
        assert!(LangChainMessageAdapter.to_canonical(&[json!({"type": "chat", "content": "x"})]).is_err());
    }
}
