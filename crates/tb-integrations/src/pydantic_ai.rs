// SPDX-License-Identifier: MIT OR Apache-2.0
//! PydanticAI: plain function tools and a non-streaming OpenAI provider.

use crate::common::{ToolState, wrap_with};
use serde_json::json;
use tb_adapter::{
    ChatClientConfig, CommonModel, FrameworkModel, FrameworkTool, ModelAdapter, RegisteredTools, ToolAdapter,
    function_tools,
};
use tb_callable::{CallableSynthesizer, SynthesisOptions};
use tb_core::CanonicalTool;
use tb_error::BridgeError;

/// Framework id.
pub const FRAMEWORK: &str = "pydantic_ai";

/// `Tool`-shaped declarations `{name, description, parameters_json_schema}`.
#[derive(Debug, Default)]
pub struct PydanticAiToolAdapter {
    state: ToolState,
}

impl PydanticAiToolAdapter {
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

impl ToolAdapter for PydanticAiToolAdapter {
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
                    "parameters_json_schema": c.tool().parameters(),
                })
            },
        )
    }

    fn registered(&self) -> &RegisteredTools {
        &self.state.registered
    }
}

/// `OpenAIChatModel` over an `OpenAIProvider`; not streamed.
#[derive(Debug, Default, Clone, Copy)]
pub struct PydanticAiModelAdapter;

impl ModelAdapter for PydanticAiModelAdapter {
    fn framework(&self) -> &str {
        FRAMEWORK
    }

    fn wrap_model(&self, model: &CommonModel) -> Result<FrameworkModel, BridgeError> {
        wrap_with(FRAMEWORK, model, |info| ChatClientConfig::from_info(info, info.model_name()))
    }
}
