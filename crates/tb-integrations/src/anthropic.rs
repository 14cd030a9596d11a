// SPDX-License-Identifier: MIT OR Apache-2.0
//! Anthropic Messages API: `input_schema` tools, content blocks and a
//! non-streaming client.
//!
//! System prompts travel outside the message list. [`from_canonical`]
//! skips system messages; use [`to_request`] to get both halves.
//!
//! [`from_canonical`]: MessageAdapter::from_canonical

use crate::common::{ToolState, content_text, invalid, str_field, wrap_with};
use serde_json::{Value, json};
use tb_adapter::{
    ChatClientConfig, CommonModel, FrameworkModel, FrameworkTool, MessageAdapter, ModelAdapter, RegisteredTools,
    ToolAdapter, function_tools,
};
use tb_callable::{CallableSynthesizer, SynthesisOptions};
use tb_core::{CanonicalMessage, CanonicalTool, CanonicalToolCall, MessageRole, parse_arguments};
use tb_error::BridgeError;

/// Framework id.
pub const FRAMEWORK: &str = "anthropic";

/// Tools as `{name, description, input_schema}`.
#[derive(Debug, Default)]
pub struct AnthropicToolAdapter {
    state: ToolState,
}

impl AnthropicToolAdapter {
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

impl ToolAdapter for AnthropicToolAdapter {
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
                    "input_schema": c.tool().parameters(),
                })
            },
        )
    }

    fn registered(&self) -> &RegisteredTools {
        &self.state.registered
    }
}

/// Messages API `{role, content}` entries with typed content blocks.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnthropicMessageAdapter;

impl AnthropicMessageAdapter {
    /// Request body halves: `{"system": ..., "messages": [...]}`.
    ///
    /// System messages are joined with blank lines; `system` is omitted
    /// when there are none.
    pub fn to_request(&self, messages: &[CanonicalMessage]) -> Result<Value, BridgeError> {
        let mut out = json!({ "messages": self.from_canonical(messages)? });
        if let Some(system) = system_prompt(messages) {
            out["system"] = Value::String(system);
        }
        Ok(out)
    }

    /// Parse a request body with an optional top-level `system`.
    pub fn from_request(&self, request: &Value) -> Result<Vec<CanonicalMessage>, BridgeError> {
        let mut out = Vec::new();
        if let Some(system) = content_text(request.get("system")).filter(|s| !s.is_empty()) {
            out.push(CanonicalMessage::system(system));
        }
        let messages = request
            .get("messages")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        out.extend(self.to_canonical(messages)?);
        Ok(out)
    }
}

/// Joined text of the system messages, if any.
#[must_use]
pub fn system_prompt(messages: &[CanonicalMessage]) -> Option<String> {
    let parts: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == MessageRole::System)
        .filter_map(|m| m.content.as_deref())
        .filter(|c| !c.is_empty())
        .collect();
    (!parts.is_empty()).then(|| parts.join("\n\n"))
}

impl MessageAdapter for AnthropicMessageAdapter {
    fn framework(&self) -> &str {
        FRAMEWORK
    }

    fn to_canonical(&self, messages: &[Value]) -> Result<Vec<CanonicalMessage>, BridgeError> {
        let mut out = Vec::new();
        for message in messages {
            let role = str_field(FRAMEWORK, message, "role")?;
            match message.get("content") {
                Some(Value::Array(blocks)) => blocks_to_canonical(role, blocks, &mut out)?,
                content => out.push(text_message(role, content_text(content).unwrap_or_default())?),
            }
        }
        Ok(out)
    }

    fn from_canonical(&self, messages: &[CanonicalMessage]) -> Result<Vec<Value>, BridgeError> {
        let mut out: Vec<Value> = Vec::new();
        for message in messages {
            message.validate()?;
            match message.role {
                MessageRole::System => {}
                MessageRole::User => out.push(json!({
                    "role": "user",
                    "content": message.content.clone().unwrap_or_default(),
                })),
                MessageRole::Assistant if message.calls().is_empty() => out.push(json!({
                    "role": "assistant",
                    "content": message.content.clone().unwrap_or_default(),
                })),
                MessageRole::Assistant => {
                    let mut blocks = Vec::new();
                    if let Some(text) = message.content.as_deref().filter(|t| !t.is_empty()) {
                        blocks.push(json!({"type": "text", "text": text}));
                    }
                    blocks.extend(message.calls().iter().map(|call| {
                        json!({
                            "type": "tool_use",
                            "id": call.id,
                            "name": call.name,
                            "input": call.arguments,
                        })
                    }));
                    out.push(json!({"role": "assistant", "content": blocks}));
                }
                MessageRole::Tool => {
                    let block = json!({
                        "type": "tool_result",
                        "tool_use_id": message.tool_call_id,
                        "content": message.content.clone().unwrap_or_default(),
                    });
                    // Consecutive results share one user turn.
                    match out.last_mut() {
                        Some(prev) if is_tool_result_turn(prev) => {
                            if let Some(blocks) = prev["content"].as_array_mut() {
                                blocks.push(block);
                            }
                        }
                        _ => out.push(json!({"role": "user", "content": [block]})),
                    }
                }
            }
        }
        Ok(out)
    }
}

fn is_tool_result_turn(message: &Value) -> bool {
    message["role"] == "user"
        && message["content"]
            .as_array()
            .is_some_and(|blocks| blocks.iter().all(|b| b["type"] == "tool_result"))
}

fn text_message(role: &str, text: String) -> Result<CanonicalMessage, BridgeError> {
    match role {
        "user" => Ok(CanonicalMessage::user(text)),
        "assistant" => Ok(CanonicalMessage::assistant(text)),
        "system" => Ok(CanonicalMessage::system(text)),
        other => Err(invalid(FRAMEWORK, format!("unknown role '{other}'"))),
    }
}

fn blocks_to_canonical(role: &str, blocks: &[Value], out: &mut Vec<CanonicalMessage>) -> Result<(), BridgeError> {
    let mut text = String::new();
    let mut calls = Vec::new();
    for block in blocks {
        match block.get("type").and_then(Value::as_str) {
            Some("text") => text.push_str(block.get("text").and_then(Value::as_str).unwrap_or_default()),
            Some("tool_use") => {
                let name = str_field(FRAMEWORK, block, "name")?;
                let arguments = parse_arguments(block.get("input"))?;
                calls.push(match block.get("id").and_then(Value::as_str) {
                    Some(id) => CanonicalToolCall::new(id, name, arguments),
                    None => CanonicalToolCall::with_generated_id(name, arguments),
                });
            }
            Some("tool_result") => {
                let id = str_field(FRAMEWORK, block, "tool_use_id")?;
                let content = content_text(block.get("content")).unwrap_or_default();
                out.push(CanonicalMessage::tool_result(id, content));
            }
            // Images, thinking and documents carry no canonical text.
            _ => {}
        }
    }
    if !calls.is_empty() {
        if role != "assistant" {
            return Err(invalid(FRAMEWORK, format!("tool_use block in a {role} message")));
        }
        let mut msg = CanonicalMessage::assistant_tool_calls(calls);
        if !text.is_empty() {
            msg.content = Some(text);
        }
        out.push(msg);
    } else if !text.is_empty() {
        out.push(text_message(role, text)?);
    }
    Ok(())
}

/// Non-streaming client for an Anthropic-compatible endpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnthropicModelAdapter;

impl ModelAdapter for AnthropicModelAdapter {
    fn framework(&self) -> &str {
        FRAMEWORK
    }

    fn wrap_model(&self, model: &CommonModel) -> Result<FrameworkModel, BridgeError> {
        wrap_with(FRAMEWORK, model, |info| ChatClientConfig::from_info(info, info.model_name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_spec_uses_input_schema() {
        let tool = CanonicalTool::new("t", "d", json!({"type": "object", "properties": {}}));
        let out = AnthropicToolAdapter::new().from_canonical(&[tool]);
        assert_eq!(out[0].declaration["input_schema"]["type"], "object");
        assert!(out[0].declaration.get("parameters").is_none());
    }

    #[test]
    fn tool_use_and_result_blocks() {
        let raw = vec![
            json!({"role": "user", "content": "weather?"}),
            json!({"role": "assistant", "content": [
                {"type": "text", "text": "checking"},
                {"type": "tool_use", "id": "tu_1", "name": "weather", "input": {"city": "Oslo"}}
            ]}),
            json!({"role": "user", "content": [
                {"type": "tool_result", "tool_use_id": "tu_1", "content": [{"type": "text", "text": "sunny"}]}
            ]}),
        ];
        let canonical = AnthropicMessageAdapter.to_canonical(&raw).unwrap();
        assert_eq!(canonical.len(), 3);
        assert_eq!(canonical[1].content.as_deref(), Some("checking"));
        assert_eq!(canonical[1].calls()[0].id, "tu_1");
        assert_eq!(canonical[2].role, MessageRole::Tool);
        assert_eq!(canonical[2].content.as_deref(), Some("sunny"));
    }

    #[test]
    fn consecutive_results_share_a_turn() {
        let messages = vec![
            CanonicalMessage::tool_result("a", "1"),
            CanonicalMessage::tool_result("b", "2"),
        ];
        let out = AnthropicMessageAdapter.from_canonical(&messages).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["content"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn system_goes_top_level() {
        let messages = vec![CanonicalMessage::system("be brief"), CanonicalMessage::user("hi")];
        let req = AnthropicMessageAdapter.to_request(&messages).unwrap();
        assert_eq!(req["system"], "be brief");
        assert_eq!(req["messages"].as_array().unwrap().len(), 1);
        let back = AnthropicMessageAdapter.from_request(&req).unwrap();
        assert_eq!(back, messages);
    }

    #[test]
    fn tool_use_in_user_turn_rejected() {
        let raw = vec![json!({"role": "user", "content": [
            {"type": "tool_use", "id": "x", "name": "f", "input": {}}
        ]})];
        assert!(AnthropicMessageAdapter.to_canonical(&raw).is_err());
    }
}
