// SPDX-License-Identifier: MIT OR Apache-2.0
//! AgentScope: tools answering with a text-block `ToolResponse`, `Msg`
//! dictionaries and a streaming chat client.

use crate::common::{ToolState, content_text, function_envelope, invalid, result_text, str_field, wrap_with};
use serde_json::{Value, json};
use tb_adapter::{
    ChatClientConfig, CommonModel, FrameworkModel, FrameworkTool, MessageAdapter, ModelAdapter, RegisteredTools,
    ToolAdapter, UsageReporting, function_tools,
};
use tb_callable::{CallableSynthesizer, InvokeHook, SynthesisOptions, invoke_hook};
use tb_core::{CanonicalMessage, CanonicalTool, CanonicalToolCall, MessageRole, parse_arguments};
use tb_error::BridgeError;
use tracing::{debug, warn};

/// Framework id.
pub const FRAMEWORK: &str = "agentscope";

/// Wrap a tool result as `{"content": [{"type": "text", "text": ...}]}`.
///
/// Strings are used verbatim; anything else is JSON-encoded.
#[must_use]
pub fn text_block_response(result: &Value) -> Value {
    if !result.is_string() {
        debug!(target: "tb.integrations", framework = FRAMEWORK, "JSON-encoding non-string tool result");
    }
    json!({"content": [{"type": "text", "text": result_text(result)}]})
}

/// Tools declared in OpenAI function form whose calls return a
/// [`text_block_response`].
pub struct AgentScopeToolAdapter {
    state: ToolState,
    hook: InvokeHook,
}

impl Default for AgentScopeToolAdapter {
    fn default() -> Self {
        Self::with_synthesizer(CallableSynthesizer::new())
    }
}

impl std::fmt::Debug for AgentScopeToolAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentScopeToolAdapter").field("state", &self.state).finish()
    }
}

impl AgentScopeToolAdapter {
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
            hook: invoke_hook(|tool, args| tool.invoke(args).map(|out| text_block_response(&out))),
        }
    }
}

impl ToolAdapter for AgentScopeToolAdapter {
    fn framework(&self) -> &str {
        FRAMEWORK
    }

    fn from_canonical(&self, tools: &[CanonicalTool]) -> Vec<FrameworkTool> {
        function_tools(
            FRAMEWORK,
            tools,
            &self.state.synth,
            Some(&self.hook),
            SynthesisOptions::default(),
            &self.state.registered,
            function_envelope,
        )
    }

    fn registered(&self) -> &RegisteredTools {
        &self.state.registered
    }
}

/// `Msg` dictionaries: `{name, role, content}` where content is a string or
/// a list of `text` / `tool_use` / `tool_result` blocks.
#[derive(Debug, Default, Clone, Copy)]
pub struct AgentScopeMessageAdapter;

impl MessageAdapter for AgentScopeMessageAdapter {
    fn framework(&self) -> &str {
        FRAMEWORK
    }

    fn to_canonical(&self, messages: &[Value]) -> Result<Vec<CanonicalMessage>, BridgeError> {
        let mut out = Vec::new();
        for message in messages {
            let role = str_field(FRAMEWORK, message, "role")?;
            let name = message.get("name").and_then(Value::as_str);
            let blocks = match message.get("content") {
                Some(Value::Array(blocks)) => blocks.as_slice(),
                content => {
                    let text = content_text(content).unwrap_or_default();
                    out.push(named(simple(role, text)?, name));
                    continue;
                }
            };
            let mut text = String::new();
            let mut calls = Vec::new();
            for block in blocks {
                match block.get("type").and_then(Value::as_str) {
                    Some("text") => text.push_str(block.get("text").and_then(Value::as_str).unwrap_or_default()),
                    Some("tool_use") => calls.push(CanonicalToolCall::new(
                        str_field(FRAMEWORK, block, "id")?,
                        str_field(FRAMEWORK, block, "name")?,
                        parse_arguments(block.get("input"))?,
                    )),
                    Some("tool_result") => {
                        let id = str_field(FRAMEWORK, block, "id")?;
                        let output = content_text(block.get("output")).unwrap_or_default();
                        let mut msg = CanonicalMessage::tool_result(id, output);
                        msg.name = block
                            .get("name")
                            .and_then(Value::as_str)
                            .filter(|n| !n.is_empty())
                            .map(str::to_owned);
                        out.push(msg);
                    }
                    kind => {
                        debug!(target: "tb.integrations", framework = FRAMEWORK, block = kind.unwrap_or("<none>"), "skipping unsupported block");
                    }
                }
            }
            if !calls.is_empty() {
                let mut msg = CanonicalMessage::assistant_tool_calls(calls);
                msg.content = (!text.is_empty()).then_some(text);
                out.push(named(msg, name));
            } else if !text.is_empty() {
                out.push(named(simple(role, text)?, name));
            }
        }
        Ok(out)
    }

    fn from_canonical(&self, messages: &[CanonicalMessage]) -> Result<Vec<Value>, BridgeError> {
        messages
            .iter()
            .map(|m| {
                m.validate()?;
                let name = m.name.clone().unwrap_or_else(|| m.role.as_str().to_owned());
                let content = match m.role {
                    MessageRole::Tool => json!([{
                        "type": "tool_result",
                        "id": m.tool_call_id,
                        "name": m.name.clone().unwrap_or_default(),
                        "output": [{"type": "text", "text": m.content.clone().unwrap_or_default()}],
                    }]),
                    MessageRole::Assistant if !m.calls().is_empty() => {
                        let mut blocks = Vec::new();
                        if let Some(text) = m.content.as_deref().filter(|t| !t.is_empty()) {
                            blocks.push(json!({"type": "text", "text": text}));
                        }
                        blocks.extend(m.calls().iter().map(|c| {
                            json!({"type": "tool_use", "id": c.id, "name": c.name, "input": c.arguments})
                        }));
                        Value::Array(blocks)
                    }
                    _ => Value::String(m.content.clone().unwrap_or_default()),
                };
                // Tool results travel in system-role messages.
                let role = match m.role {
                    MessageRole::Tool => "system",
                    other => other.as_str(),
                };
                Ok(json!({"name": name, "role": role, "content": content}))
            })
            .collect()
    }
}

fn simple(role: &str, text: String) -> Result<CanonicalMessage, BridgeError> {
    match role {
        "user" => Ok(CanonicalMessage::user(text)),
        "assistant" => Ok(CanonicalMessage::assistant(text)),
        "system" => Ok(CanonicalMessage::system(text)),
        other => {
            warn!(target: "tb.integrations", framework = FRAMEWORK, role = other, "unknown message role");
            Err(invalid(FRAMEWORK, format!("unknown role '{other}'")))
        }
    }
}

fn named(message: CanonicalMessage, name: Option<&str>) -> CanonicalMessage {
    match name {
        Some(n) if !n.is_empty() && n != message.role.as_str() => message.with_name(n),
        _ => message,
    }
}

/// Streaming OpenAI chat model with usage requested via `generate_kwargs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AgentScopeModelAdapter;

impl ModelAdapter for AgentScopeModelAdapter {
    fn framework(&self) -> &str {
        FRAMEWORK
    }

    fn wrap_model(&self, model: &CommonModel) -> Result<FrameworkModel, BridgeError> {
        wrap_with(FRAMEWORK, model, |info| {
            Ok(ChatClientConfig::from_info(info, info.model_name())?.streaming(UsageReporting::GenerateKwargs))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tb_core::{Arguments, tool_fn};

    fn args(v: Value) -> Arguments {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn results_are_wrapped_in_text_blocks() {
        let tool = CanonicalTool::new(
            "sum",
            "",
            json!({"type": "object", "properties": {"a": {"type": "integer"}}, "required": ["a"]}),
        )
        .with_func(tool_fn(|a| Ok(json!({"total": a["a"]}))));
        let out = AgentScopeToolAdapter::new().from_canonical(&[tool]);
        let resp = out[0].call(args(json!({"a": 2}))).unwrap();
        assert_eq!(resp, json!({"content": [{"type": "text", "text": "{\"total\":2}"}]}));
    }

    #[test]
    fn string_results_verbatim() {
        assert_eq!(text_block_response(&json!("hi"))["content"][0]["text"], "hi");
    }

    #[test]
    fn unsupported_blocks_skipped_and_unknown_role_rejected() {
        let raw = vec![json!({"name": "u", "role": "user", "content": [
            {"type": "image", "url": "x.png"},
            {"type": "text", "text": "look"}
        ]})];
        let canonical = AgentScopeMessageAdapter.to_canonical(&raw).unwrap();
        assert_eq!(canonical.len(), 1);
        assert_eq!(canonical[0].content.as_deref(), Some("look"));

        let raw = vec![json!({"role": "critic", "content": "x"})];
        assert!(AgentScopeMessageAdapter.to_canonical(&raw).is_err());
    }

    #[test]
    fn msg_blocks_to_canonical() {
        let raw = vec![
            json!({"name": "Friday", "role": "assistant", "content": [
                {"type": "tool_use", "id": "t1", "name": "sum", "input": {"a": 1}}
            ]}),
            json!({"name": "system", "role": "system", "content": [
                {"type": "tool_result", "id": "t1", "name": "sum", "output": [{"type": "text", "text": "1"}]}
            ]}),
        ];
        let canonical = AgentScopeMessageAdapter.to_canonical(&raw).unwrap();
        assert_eq!(canonical[0].name.as_deref(), Some("Friday"));
        assert_eq!(canonical[1].role, MessageRole::Tool);
        assert_eq!(canonical[1].content.as_deref(), Some("1"));

        let back = AgentScopeMessageAdapter.from_canonical(&canonical).unwrap();
        assert_eq!(back[1]["content"][0]["type"], "tool_result");
        assert_eq!(AgentScopeMessageAdapter.to_canonical(&back).unwrap(), canonical);
    }
}
