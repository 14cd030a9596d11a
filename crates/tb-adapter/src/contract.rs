// SPDX-License-Identifier: MIT OR Apache-2.0
//! Adapter contracts and the values they produce.

use crate::model::CommonModel;
use crate::registered::RegisteredTools;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::fmt;
use tb_callable::SynthesizedCallable;
use tb_core::{Arguments, CanonicalMessage, CanonicalTool, ModelInfo, ToolError};
use tb_error::BridgeError;

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

/// A tool in one framework's representation.
#[derive(Debug, Clone)]
pub struct FrameworkTool {
    /// Framework id that produced it.
    pub framework: String,
    /// Declaration object in the framework's own shape.
    pub declaration: Value,
    /// The invocable callable behind the declaration.
    pub callable: SynthesizedCallable,
}

impl FrameworkTool {
    /// Visible tool name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.callable.name()
    }

    /// Invoke through the callable (reconciliation, validation, hook).
    pub fn call(&self, args: Arguments) -> Result<Value, ToolError> {
        self.callable.call(args)
    }
}

/// Converts canonical tools into one framework's tools.
pub trait ToolAdapter: Send + Sync {
    /// Framework id.
    fn framework(&self) -> &str;

    /// Convert a batch. One tool's degraded conversion never drops the rest.
    fn from_canonical(&self, tools: &[CanonicalTool]) -> Vec<FrameworkTool>;

    /// Tools this adapter has converted so far.
    fn registered(&self) -> &RegisteredTools;

    /// A converted tool by name; the query is normalized first.
    fn get_registered_tool(&self, name: &str) -> Option<CanonicalTool> {
        self.registered().get(name)
    }
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Translates messages between canonical form and one framework's shape.
pub trait MessageAdapter: Send + Sync {
    /// Framework id.
    fn framework(&self) -> &str;

    /// Framework messages to canonical ones.
    fn to_canonical(&self, messages: &[Value]) -> Result<Vec<CanonicalMessage>, BridgeError>;

    /// Canonical messages to the framework's shape.
    fn from_canonical(&self, messages: &[CanonicalMessage]) -> Result<Vec<Value>, BridgeError>;
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

/// Wraps a [`CommonModel`] into one framework's model client.
pub trait ModelAdapter: Send + Sync {
    /// Framework id.
    fn framework(&self) -> &str;

    /// Build the client. Implementations read the model info exactly once.
    fn wrap_model(&self, model: &CommonModel) -> Result<FrameworkModel, BridgeError>;
}

/// Where a streaming client asks for usage accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageReporting {
    /// `stream_options.include_usage = true` (OpenAI / LiteLLM style).
    StreamOptions,
    /// `generate_kwargs.stream_options.include_usage = true`.
    GenerateKwargs,
    /// `stream_usage = true` (LangChain style).
    StreamUsage,
}

/// Configuration of an OpenAI-compatible chat client.
///
/// Usage-inclusion options only ever appear on streaming clients; they are
/// set by [`ChatClientConfig::streaming`] and nothing else.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatClientConfig {
    /// Model name as the framework expects it.
    pub model: String,
    /// Endpoint base URL.
    pub base_url: String,
    /// Bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Extra HTTP headers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Whether the client streams.
    pub stream: bool,
    /// Framework-specific client options.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
}

impl ChatClientConfig {
    /// A non-streaming client from model info. Fails without `base_url`.
    pub fn from_info(info: &ModelInfo, model: impl Into<String>) -> Result<Self, BridgeError> {
        Ok(Self {
            model: model.into(),
            base_url: info.require_base_url()?.to_owned(),
            api_key: info.api_key.clone(),
            headers: info.headers.clone(),
            stream: false,
            options: Map::new(),
        })
    }

    /// Switch to streaming with usage accounting placed as `reporting` says.
    #[must_use]
    pub fn streaming(mut self, reporting: UsageReporting) -> Self {
        self.stream = true;
        match reporting {
            UsageReporting::StreamOptions => {
                self.options
                    .insert("stream_options".into(), json!({"include_usage": true}));
            }
            UsageReporting::GenerateKwargs => {
                self.options.insert(
                    "generate_kwargs".into(),
                    json!({"stream_options": {"include_usage": true}}),
                );
            }
            UsageReporting::StreamUsage => {
                self.options.insert("stream_usage".into(), Value::Bool(true));
            }
        }
        self
    }

    /// Add a framework-specific option.
    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Whether any usage-inclusion option is present.
    #[must_use]
    pub fn requests_usage(&self) -> bool {
        self.options.contains_key("stream_options")
            || self.options.contains_key("stream_usage")
            || self
                .options
                .get("generate_kwargs")
                .is_some_and(|g| g.get("stream_options").is_some())
    }
}

impl fmt::Debug for ChatClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatClientConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("stream", &self.stream)
            .field("options", &self.options)
            .finish()
    }
}

/// A model client configured for one framework.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameworkModel {
    /// Framework id.
    pub framework: String,
    /// Client configuration.
    pub client: ChatClientConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> ModelInfo {
        ModelInfo {
            api_key: Some("sk-test".into()),
            base_url: Some("https://models.example.test/v1".into()),
            model: Some("qwen-max".into()),
            ..ModelInfo::default()
        }
    }

    #[test]
    fn non_streaming_has_no_usage_options() {
        let cfg = ChatClientConfig::from_info(&info(), "qwen-max").unwrap();
        assert!(!cfg.stream);
        assert!(!cfg.requests_usage());
    }

    #[test]
    fn usage_placements() {
        let base = ChatClientConfig::from_info(&info(), "m").unwrap();
        let a = base.clone().streaming(UsageReporting::StreamOptions);
        assert_eq!(a.options["stream_options"]["include_usage"], true);
        let b = base.clone().streaming(UsageReporting::GenerateKwargs);
        assert_eq!(b.options["generate_kwargs"]["stream_options"]["include_usage"], true);
        let c = base.streaming(UsageReporting::StreamUsage);
        assert_eq!(c.options["stream_usage"], true);
        assert!(a.stream && b.stream && c.stream);
        assert!(a.requests_usage() && b.requests_usage() && c.requests_usage());
    }

    #[test]
    fn missing_base_url_fails() {
        let mut i = info();
        i.base_url = None;
        let err = ChatClientConfig::from_info(&i, "m").unwrap_err();
        assert_eq!(err.code, tb_error::ErrorCode::ModelInfoIncomplete);
    }

    #[test]
    fn debug_redacts_key() {
        let cfg = ChatClientConfig::from_info(&info(), "m").unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("sk-test"));
        assert!(dbg.contains("<redacted>"));
    }
}
