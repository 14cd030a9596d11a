// SPDX-License-Identifier: MIT OR Apache-2.0
//! The canonical model every framework conversion funnels through.
//!
//! No framework type ever appears here. Tool-call arguments are kept as a
//! JSON map; serialization to a string happens only at adapter output
//! boundaries (see [`CanonicalToolCall::to_openai`]).

use crate::error::ToolError;
use crate::naming::normalize_tool_name;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tb_error::{BridgeError, ErrorCode};

/// Keyword arguments passed to a tool.
pub type Arguments = Map<String, Value>;

/// Backing function of a tool: one mapping of named arguments in, a JSON
/// result out.
pub type ToolFn = Arc<dyn Fn(Arguments) -> Result<Value, ToolError> + Send + Sync>;

/// Box a closure as a [`ToolFn`].
pub fn tool_fn<F>(f: F) -> ToolFn
where
    F: Fn(Arguments) -> Result<Value, ToolError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Accepted alternate argument name → canonical field name.
pub type AliasMap = BTreeMap<String, String>;

// ── Roles ───────────────────────────────────────────────────────────────

/// Message author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// System prompt.
    System,
    /// User turn.
    User,
    /// Assistant turn.
    Assistant,
    /// Tool result.
    Tool,
}

impl MessageRole {
    /// Wire name of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }

    /// Parse an OpenAI-style role name. `developer` maps to [`MessageRole::System`].
    #[must_use]
    pub fn parse(role: &str) -> Option<Self> {
        match role {
            "system" | "developer" => Some(Self::System),
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            "tool" => Some(Self::Tool),
            _ => None,
        }
    }
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Tool calls ──────────────────────────────────────────────────────────

/// A tool invocation requested by a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CanonicalToolCall {
    /// Opaque id, provider-assigned or synthesized.
    pub id: String,
    /// Tool name.
    pub name: String,
    /// Arguments as a mapping.
    pub arguments: Arguments,
}

impl CanonicalToolCall {
    /// Create a tool call.
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Create a tool call with a synthesized `call_<uuid>` id, for providers
    /// that do not assign one.
    pub fn with_generated_id(name: impl Into<String>, arguments: Arguments) -> Self {
        Self::new(generate_call_id(), name, arguments)
    }

    /// OpenAI chat-completions form; `arguments` becomes a JSON string.
    #[must_use]
    pub fn to_openai(&self) -> Value {
        json!({
            "id": self.id,
            "type": "function",
            "function": {
                "name": self.name,
                "arguments": Value::Object(self.arguments.clone()).to_string(),
            }
        })
    }

    /// Parse the OpenAI chat-completions form.
    ///
    /// `function.arguments` may be a JSON string or an object; an empty
    /// string means no arguments.
    pub fn from_openai(value: &Value) -> Result<Self, BridgeError> {
        let function = value
            .get("function")
            .ok_or_else(|| invalid_message("tool call has no 'function'"))?;
        let name = function
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid_message("tool call has no function name"))?;
        let arguments = parse_arguments(function.get("arguments"))?;
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .map_or_else(generate_call_id, str::to_owned);
        Ok(Self::new(id, name, arguments))
    }
}

/// Synthesize a tool-call id.
#[must_use]
pub fn generate_call_id() -> String {
    format!("call_{}", uuid::Uuid::new_v4().simple())
}

/// Parse tool-call arguments given either as an object or a JSON string.
pub fn parse_arguments(raw: Option<&Value>) -> Result<Arguments, BridgeError> {
    match raw {
        None | Some(Value::Null) => Ok(Arguments::new()),
        Some(Value::Object(map)) => Ok(map.clone()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(Arguments::new()),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(invalid_message(format!(
                "tool call arguments must be a JSON object, got {other}"
            ))),
            Err(e) => Err(invalid_message(format!("tool call arguments are not valid JSON: {e}"))
                .with_source(e)),
        },
        Some(other) => Err(invalid_message(format!(
            "tool call arguments must be a JSON object, got {other}"
        ))),
    }
}

fn invalid_message(msg: impl Into<String>) -> BridgeError {
    BridgeError::new(ErrorCode::MessageInvalid, msg)
}

// ── Messages ────────────────────────────────────────────────────────────

/// A single message in canonical form.
///
/// A `tool` message always carries `tool_call_id`; use
/// [`CanonicalMessage::tool_result`] to build one and
/// [`CanonicalMessage::validate`] to check foreign input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CanonicalMessage {
    /// Author role.
    pub role: MessageRole,
    /// Plain text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Optional author name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Tool calls requested by an assistant message, in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<CanonicalToolCall>>,
    /// Id of the tool call a `tool` message answers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl CanonicalMessage {
    fn bare(role: MessageRole, content: Option<String>) -> Self {
        Self {
            role,
            content,
            name: None,
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// A system message.
    pub fn system(text: impl Into<String>) -> Self {
        Self::bare(MessageRole::System, Some(text.into()))
    }

    /// A user message.
    pub fn user(text: impl Into<String>) -> Self {
        Self::bare(MessageRole::User, Some(text.into()))
    }

    /// An assistant text message.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::bare(MessageRole::Assistant, Some(text.into()))
    }

    /// An assistant message requesting tool calls.
    #[must_use]
    pub fn assistant_tool_calls(calls: Vec<CanonicalToolCall>) -> Self {
        let mut msg = Self::bare(MessageRole::Assistant, None);
        msg.tool_calls = Some(calls);
        msg
    }

    /// A tool result answering `tool_call_id`.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        let mut msg = Self::bare(MessageRole::Tool, Some(content.into()));
        msg.tool_call_id = Some(tool_call_id.into());
        msg
    }

    /// Set the author name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Tool calls, or an empty slice.
    #[must_use]
    pub fn calls(&self) -> &[CanonicalToolCall] {
        self.tool_calls.as_deref().unwrap_or_default()
    }

    /// Check the canonical invariants.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.role == MessageRole::Tool && self.tool_call_id.as_deref().is_none_or(str::is_empty) {
            return Err(invalid_message("tool message is missing tool_call_id"));
        }
        if self.role != MessageRole::Assistant && !self.calls().is_empty() {
            return Err(invalid_message(format!(
                "{} message cannot carry tool_calls",
                self.role
            )));
        }
        Ok(())
    }

    /// OpenAI chat-completions dictionary form.
    #[must_use]
    pub fn to_openai(&self) -> Value {
        let mut out = Map::new();
        out.insert("role".into(), Value::String(self.role.as_str().into()));
        if let Some(content) = &self.content {
            out.insert("content".into(), Value::String(content.clone()));
        }
        if let Some(name) = &self.name {
            out.insert("name".into(), Value::String(name.clone()));
        }
        if let Some(calls) = &self.tool_calls {
            out.insert(
                "tool_calls".into(),
                Value::Array(calls.iter().map(CanonicalToolCall::to_openai).collect()),
            );
        }
        if let Some(id) = &self.tool_call_id {
            out.insert("tool_call_id".into(), Value::String(id.clone()));
        }
        Value::Object(out)
    }

    /// Parse an OpenAI chat-completions message.
    ///
    /// Array content (content parts) is flattened to its `text` parts.
    pub fn from_openai(value: &Value) -> Result<Self, BridgeError> {
        let role_str = value
            .get("role")
            .and_then(Value::as_str)
            .ok_or_else(|| invalid_message("message has no role"))?;
        let role = MessageRole::parse(role_str)
            .ok_or_else(|| invalid_message(format!("unknown role '{role_str}'")))?;
        let content = match value.get("content") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Array(parts)) => Some(
                parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join(""),
            ),
            Some(other) => Some(other.to_string()),
        };
        let tool_calls = match value.get("tool_calls").and_then(Value::as_array) {
            Some(calls) => Some(
                calls
                    .iter()
                    .map(CanonicalToolCall::from_openai)
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            None => None,
        };
        let msg = Self {
            role,
            content,
            name: value.get("name").and_then(Value::as_str).map(str::to_owned),
            tool_calls,
            tool_call_id: value
                .get("tool_call_id")
                .and_then(Value::as_str)
                .map(str::to_owned),
        };
        msg.validate()?;
        Ok(msg)
    }
}

// ── Tools ───────────────────────────────────────────────────────────────

/// A tool in canonical form.
///
/// The name is normalized on construction; adapters only read a
/// `CanonicalTool` and build their own representation from it.
#[derive(Clone)]
pub struct CanonicalTool {
    name: String,
    description: String,
    parameters: Value,
    func: Option<ToolFn>,
    aliases: AliasMap,
}

impl CanonicalTool {
    /// Create a tool; `name` is passed through [`normalize_tool_name`].
    pub fn new(name: impl AsRef<str>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            name: normalize_tool_name(name.as_ref()),
            description: description.into(),
            parameters,
            func: None,
            aliases: AliasMap::new(),
        }
    }

    /// Attach the backing function.
    #[must_use]
    pub fn with_func(mut self, func: ToolFn) -> Self {
        self.func = Some(func);
        self
    }

    /// Attach accepted argument aliases.
    #[must_use]
    pub fn with_aliases(mut self, aliases: AliasMap) -> Self {
        self.aliases = aliases;
        self
    }

    /// Normalized name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-text description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// JSON-Schema object describing the parameters.
    #[must_use]
    pub fn parameters(&self) -> &Value {
        &self.parameters
    }

    /// Backing function, if any.
    #[must_use]
    pub fn func(&self) -> Option<&ToolFn> {
        self.func.as_ref()
    }

    /// Argument aliases.
    #[must_use]
    pub fn aliases(&self) -> &AliasMap {
        &self.aliases
    }

    /// Whether a backing function is present.
    #[must_use]
    pub fn is_implemented(&self) -> bool {
        self.func.is_some()
    }

    /// Call the backing function directly, without reconciliation or
    /// validation.
    pub fn invoke(&self, arguments: Arguments) -> Result<Value, ToolError> {
        match &self.func {
            Some(func) => func(arguments),
            None => Err(ToolError::NotImplemented {
                tool: self.name.clone(),
            }),
        }
    }

    /// Declared property names in order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.parameters
            .get("properties")
            .and_then(Value::as_object)
            .map(|p| p.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// OpenAI function spec `{name, description, parameters}`.
    #[must_use]
    pub fn to_openai_function(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "parameters": self.parameters,
        })
    }

    /// Anthropic tool spec `{name, description, input_schema}`.
    #[must_use]
    pub fn to_anthropic_tool(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "input_schema": self.parameters,
        })
    }
}

impl fmt::Debug for CanonicalTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanonicalTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .field("implemented", &self.func.is_some())
            .field("aliases", &self.aliases)
            .finish()
    }
}

// ── Model responses ─────────────────────────────────────────────────────

/// A model response in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CanonicalModelResponse {
    /// Text content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Requested tool calls.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<CanonicalToolCall>>,
    /// Token usage counters (`prompt_tokens`, `completion_tokens`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<BTreeMap<String, u64>>,
}

impl CanonicalModelResponse {
    /// OpenAI-style dictionary form.
    #[must_use]
    pub fn to_openai(&self) -> Value {
        let mut out = Map::new();
        if let Some(content) = &self.content {
            out.insert("content".into(), Value::String(content.clone()));
        }
        if let Some(calls) = &self.tool_calls {
            out.insert(
                "tool_calls".into(),
                Value::Array(calls.iter().map(CanonicalToolCall::to_openai).collect()),
            );
        }
        if let Some(usage) = &self.usage {
            out.insert("usage".into(), json!(usage));
        }
        Value::Object(out)
    }

    /// The response as an assistant message.
    #[must_use]
    pub fn to_message(&self) -> CanonicalMessage {
        CanonicalMessage {
            role: MessageRole::Assistant,
            content: self.content.clone(),
            name: None,
            tool_calls: self.tool_calls.clone(),
            tool_call_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: Value) -> Arguments {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn tool_name_is_normalized() {
        let tool = CanonicalTool::new("a".repeat(80), "", json!({"type": "object"}));
        assert_eq!(tool.name().len(), 64);
        assert_eq!(&tool.name()[..32], "a".repeat(32));
    }

    #[test]
    fn invoke_without_func_is_not_implemented() {
        let tool = CanonicalTool::new("noop", "", json!({}));
        let err = tool.invoke(Arguments::new()).unwrap_err();
        assert_eq!(err, ToolError::NotImplemented { tool: "noop".into() });
    }

    #[test]
    fn invoke_with_func() {
        let tool = CanonicalTool::new("echo", "", json!({}))
            .with_func(tool_fn(|a| Ok(Value::Object(a))));
        let out = tool.invoke(args(json!({"x": 1}))).unwrap();
        assert_eq!(out, json!({"x": 1}));
    }

    #[test]
    fn openai_and_anthropic_specs() {
        let tool = CanonicalTool::new("t", "desc", json!({"type": "object"}));
        assert_eq!(tool.to_openai_function()["parameters"]["type"], "object");
        assert_eq!(tool.to_anthropic_tool()["input_schema"]["type"], "object");
        assert!(tool.to_anthropic_tool().get("parameters").is_none());
    }

    #[test]
    fn tool_call_arguments_serialize_as_string() {
        let call = CanonicalToolCall::new("c1", "search", args(json!({"q": "rust"})));
        let wire = call.to_openai();
        assert_eq!(wire["type"], "function");
        assert_eq!(wire["function"]["arguments"], r#"{"q":"rust"}"#);
        let back = CanonicalToolCall::from_openai(&wire).unwrap();
        assert_eq!(back, call);
    }

    #[test]
    fn tool_call_from_openai_edge_cases() {
        let empty = json!({"id": "c", "function": {"name": "f", "arguments": ""}});
        assert!(CanonicalToolCall::from_openai(&empty).unwrap().arguments.is_empty());
        let object = json!({"function": {"name": "f", "arguments": {"a": 1}}});
        let call = CanonicalToolCall::from_openai(&object).unwrap();
        assert!(call.id.starts_with("call_"));
        assert_eq!(call.arguments["a"], 1);
        let bad = json!({"id": "c", "function": {"name": "f", "arguments": "[1]"}});
        let err = CanonicalToolCall::from_openai(&bad).unwrap_err();
        assert_eq!(err.code, ErrorCode::MessageInvalid);
    }

    #[test]
    fn message_to_openai_omits_absent_fields() {
        let msg = CanonicalMessage::user("hi");
        assert_eq!(msg.to_openai(), json!({"role": "user", "content": "hi"}));
        let tool = CanonicalMessage::tool_result("c1", "42");
        assert_eq!(
            tool.to_openai(),
            json!({"role": "tool", "content": "42", "tool_call_id": "c1"})
        );
    }

    #[test]
    fn tool_message_requires_call_id() {
        let bad = json!({"role": "tool", "content": "x"});
        assert!(CanonicalMessage::from_openai(&bad).is_err());
        let mut msg = CanonicalMessage::tool_result("c1", "x");
        msg.tool_call_id = None;
        assert!(msg.validate().is_err());
    }

    #[test]
    fn assistant_with_calls_roundtrip() {
        let msg = CanonicalMessage::assistant_tool_calls(vec![CanonicalToolCall::new(
            "c1",
            "weather",
            args(json!({"city": "Paris"})),
        )]);
        let back = CanonicalMessage::from_openai(&msg.to_openai()).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn content_parts_are_flattened() {
        let m = json!({"role": "user", "content": [{"type": "text", "text": "a"}, {"type": "text", "text": "b"}]});
        assert_eq!(CanonicalMessage::from_openai(&m).unwrap().content.as_deref(), Some("ab"));
    }

    #[test]
    fn response_to_openai() {
        let resp = CanonicalModelResponse {
            content: Some("done".into()),
            tool_calls: None,
            usage: Some(BTreeMap::from([("total_tokens".to_string(), 12)])),
        };
        assert_eq!(
            resp.to_openai(),
            json!({"content": "done", "usage": {"total_tokens": 12}})
        );
        assert_eq!(resp.to_message().role, MessageRole::Assistant);
    }
}
