// SPDX-License-Identifier: MIT OR Apache-2.0
//! CrewAI: tools whose description carries the structural `Args:` block,
//! and a non-streaming LiteLLM-style client.

use crate::common::{ToolState, litellm_model, wrap_with};
use serde_json::json;
use tb_adapter::{
    ChatClientConfig, CommonModel, FrameworkModel, FrameworkTool, ModelAdapter, RegisteredTools, ToolAdapter,
    function_tools,
};
use tb_callable::{CallableSynthesizer, SynthesisOptions};
use tb_core::CanonicalTool;
use tb_error::BridgeError;

/// Framework id.
pub const FRAMEWORK: &str = "crewai";

/// `BaseTool`-shaped declarations `{name, description, args_schema}`.
#[derive(Debug, Default)]
pub struct CrewAiToolAdapter {
    state: ToolState,
}

impl CrewAiToolAdapter {
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

impl ToolAdapter for CrewAiToolAdapter {
    fn framework(&self) -> &str {
        FRAMEWORK
    }

    fn from_canonical(&self, tools: &[CanonicalTool]) -> Vec<FrameworkTool> {
        function_tools(
            FRAMEWORK,
            tools,
            &self.state.synth,
            None,
            SynthesisOptions::with_type_docstring(),
            &self.state.registered,
            |c| {
                json!({
                    "name": c.name(),
                    "description": c.doc(),
                    "args_schema": c.tool().parameters(),
                })
            },
        )
    }

    fn registered(&self) -> &RegisteredTools {
        &self.state.registered
    }
}

/// `LLM(model="provider/model")`, not streamed.
#[derive(Debug, Default, Clone, Copy)]
pub struct CrewAiModelAdapter;

impl ModelAdapter for CrewAiModelAdapter {
    fn framework(&self) -> &str {
        FRAMEWORK
    }

    fn wrap_model(&self, model: &CommonModel) -> Result<FrameworkModel, BridgeError> {
        wrap_with(FRAMEWORK, model, |info| ChatClientConfig::from_info(info, litellm_model(info)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tb_core::ModelInfo;

    #[test]
    fn description_has_args_block() {
        let tool = CanonicalTool::new(
            "search",
            "Search the web",
            json!({"type": "object", "properties": {"q": {"type": "string", "description": "Query"}}, "required": ["q"]}),
        );
        let out = CrewAiToolAdapter::new().from_canonical(&[tool]);
        let desc = out[0].declaration["description"].as_str().unwrap();
        assert!(desc.starts_with("Search the web\n\nArgs:"), "{desc}");
        assert!(desc.contains("q (string): Query"), "{desc}");
    }

    #[test]
    fn model_is_provider_qualified_without_stream_options() {
        let model = CommonModel::from_info(ModelInfo {
            base_url: Some("https://m.example.test/v1".into()),
            model: Some("qwen-max".into()),
            ..ModelInfo::default()
        });
        let wrapped = CrewAiModelAdapter.wrap_model(&model).unwrap();
        assert_eq!(wrapped.client.model, "openai/qwen-max");
        assert!(!wrapped.client.stream);
        assert!(!wrapped.client.requests_usage());
    }
}
