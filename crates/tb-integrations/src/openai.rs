// SPDX-License-Identifier: MIT OR Apache-2.0
//! OpenAI Chat Completions: function tools, chat messages and a
//! non-streaming client.

use crate::common::{ToolState, function_envelope, wrap_with};
use serde_json::Value;
use tb_adapter::{
    ChatClientConfig, CommonModel, FrameworkModel, FrameworkTool, MessageAdapter, ModelAdapter, RegisteredTools,
    ToolAdapter, function_tools,
};
use tb_callable::{CallableSynthesizer, SynthesisOptions};
use tb_core::{CanonicalMessage, CanonicalTool};
use tb_error::BridgeError;

/// Framework id.
pub const FRAMEWORK: &str = "openai";

/// Tools as `{"type": "function", "function": {name, description, parameters}}`.
#[derive(Debug, Default)]
pub struct OpenAiToolAdapter {
    state: ToolState,
}

impl OpenAiToolAdapter {
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

impl ToolAdapter for OpenAiToolAdapter {
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
            function_envelope,
        )
    }

    fn registered(&self) -> &RegisteredTools {
        &self.state.registered
    }
}

/// Chat-completions message dictionaries.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenAiMessageAdapter;

impl MessageAdapter for OpenAiMessageAdapter {
    fn framework(&self) -> &str {
        FRAMEWORK
    }

    fn to_canonical(&self, messages: &[Value]) -> Result<Vec<CanonicalMessage>, BridgeError> {
        messages.iter().map(CanonicalMessage::from_openai).collect()
    }

    fn from_canonical(&self, messages: &[CanonicalMessage]) -> Result<Vec<Value>, BridgeError> {
        messages
            .iter()
            .map(|m| {
                m.validate()?;
                Ok(m.to_openai())
            })
            .collect()
    }
}

/// Plain OpenAI-compatible client; requests are not streamed.
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenAiModelAdapter;

impl ModelAdapter for OpenAiModelAdapter {
    fn framework(&self) -> &str {
        FRAMEWORK
    }

    fn wrap_model(&self, model: &CommonModel) -> Result<FrameworkModel, BridgeError> {
        wrap_with(FRAMEWORK, model, |info| ChatClientConfig::from_info(info, info.model_name()))
    }
}
