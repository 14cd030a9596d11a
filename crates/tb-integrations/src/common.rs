// SPDX-License-Identifier: MIT OR Apache-2.0
//! Pieces shared by the framework modules.

use tb_adapter::{ChatClientConfig, CommonModel, FrameworkModel, RegisteredTools};
use tb_callable::CallableSynthesizer;
use tb_error::BridgeError;

#[cfg(any(
    feature = "agentscope",
    feature = "anthropic",
    feature = "google_adk",
    feature = "langchain",
    feature = "openai"
))]
use serde_json::Value;

/// Synthesizer plus converted-tool record owned by every tool adapter.
#[derive(Debug, Default)]
pub(crate) struct ToolState {
    pub(crate) synth: CallableSynthesizer,
    pub(crate) registered: RegisteredTools,
}

impl ToolState {
    pub(crate) fn with_synthesizer(synth: CallableSynthesizer) -> Self {
        Self {
            synth,
            registered: RegisteredTools::new(),
        }
    }
}

#[cfg(any(feature = "agentscope", feature = "anthropic", feature = "google_adk", feature = "langchain"))]
pub(crate) fn invalid(framework: &str, msg: impl Into<String>) -> BridgeError {
    BridgeError::new(tb_error::ErrorCode::MessageInvalid, msg).with_context("framework", framework)
}

/// A required string field of a framework message.
#[cfg(any(feature = "agentscope", feature = "anthropic", feature = "google_adk", feature = "langchain"))]
pub(crate) fn str_field<'a>(framework: &str, value: &'a Value, key: &str) -> Result<&'a str, BridgeError> {
    value
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(framework, format!("message has no '{key}'")))
}

/// Text carried by a content value.
///
/// Strings pass through; arrays contribute the `text` of each part; `null`
/// or a missing value is `None`; anything else is JSON-encoded.
#[cfg(any(feature = "agentscope", feature = "anthropic", feature = "google_adk", feature = "langchain"))]
pub(crate) fn content_text(content: Option<&Value>) -> Option<String> {
    match content? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(parts) => Some(
            parts
                .iter()
                .filter_map(|p| match p {
                    Value::String(s) => Some(s.as_str()),
                    other => other.get("text").and_then(Value::as_str),
                })
                .collect::<Vec<_>>()
                .join(""),
        ),
        other => Some(other.to_string()),
    }
}

/// A tool result as text: strings verbatim, everything else as JSON.
#[must_use]
#[cfg(any(feature = "agentscope", feature = "google_adk"))]
pub(crate) fn result_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// OpenAI-style `{"type": "function", "function": {...}}` wrapper.
#[cfg(any(feature = "agentscope", feature = "openai"))]
pub(crate) fn function_envelope(callable: &tb_callable::SynthesizedCallable) -> Value {
    let mut out = serde_json::Map::new();
    out.insert("type".into(), Value::String("function".into()));
    out.insert("function".into(), callable.declaration());
    Value::Object(out)
}

/// Read the model info once and hand it to `build`.
pub(crate) fn wrap_with<F>(framework: &str, model: &CommonModel, build: F) -> Result<FrameworkModel, BridgeError>
where
    F: FnOnce(&tb_core::ModelInfo) -> Result<ChatClientConfig, BridgeError>,
{
    let info = model.model_info()?;
    let client = build(&info).map_err(|e| e.with_context("framework", framework))?;
    Ok(FrameworkModel {
        framework: framework.to_owned(),
        client,
    })
}

/// `provider/model`, defaulting the provider to `openai`.
#[cfg(any(feature = "crewai", feature = "google_adk"))]
pub(crate) fn litellm_model(info: &tb_core::ModelInfo) -> String {
    let provider = info
        .provider
        .as_deref()
        .filter(|p| !p.is_empty())
        .unwrap_or("openai");
    format!("{provider}/{}", info.model_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    #[cfg(any(feature = "agentscope", feature = "anthropic", feature = "google_adk", feature = "langchain"))]
    fn content_text_shapes() {
        assert_eq!(content_text(None), None);
        assert_eq!(content_text(Some(&Value::Null)), None);
        assert_eq!(content_text(Some(&json!("hi"))).as_deref(), Some("hi"));
        assert_eq!(
            content_text(Some(&json!([{"type": "text", "text": "a"}, "b", {"type": "image"}]))).as_deref(),
            Some("ab")
        );
        assert_eq!(content_text(Some(&json!({"k": 1}))).as_deref(), Some(r#"{"k":1}"#));
    }

    #[test]
    #[cfg(any(feature = "agentscope", feature = "google_adk"))]
    fn result_text_encodes_non_strings() {
        assert_eq!(result_text(&json!("ok")), "ok");
        assert_eq!(result_text(&json!({"a": [1, 2]})), r#"{"a":[1,2]}"#);
        assert_eq!(result_text(&json!(3)), "3");
    }

    #[test]
    #[cfg(any(feature = "crewai", feature = "google_adk"))]
    fn litellm_defaults_provider() {
        let mut info = tb_core::ModelInfo {
            model: Some("qwen-max".into()),
            ..Default::default()
        };
        assert_eq!(litellm_model(&info), "openai/qwen-max");
        info.provider = Some("dashscope".into());
        assert_eq!(litellm_model(&info), "dashscope/qwen-max");
    }
}
