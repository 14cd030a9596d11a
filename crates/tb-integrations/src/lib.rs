// SPDX-License-Identifier: MIT OR Apache-2.0
//! Concrete framework adapters for toolbridge.
//!
//! Every framework lives behind a cargo feature of the same name (all on by
//! default). [`register_all`] installs whichever ones are compiled in;
//! a framework left out is simply absent from the registry.
//!
//! ```
//! use tb_adapter::AdapterRegistry;
//!
//! let registry = AdapterRegistry::new();
//! tb_integrations::register_all(&registry);
//! assert!(registry.contains("openai"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

#[cfg(any(
    feature = "openai",
    feature = "anthropic",
    feature = "google_adk",
    feature = "agentscope",
    feature = "langchain",
    feature = "crewai",
    feature = "pydantic_ai"
))]
mod common;

#[cfg(feature = "agentscope")]
pub mod agentscope;
#[cfg(feature = "anthropic")]
pub mod anthropic;
#[cfg(feature = "crewai")]
pub mod crewai;
#[cfg(feature = "google_adk")]
pub mod google_adk;
#[cfg(feature = "langchain")]
pub mod langchain;
#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "pydantic_ai")]
pub mod pydantic_ai;

use std::sync::{Arc, OnceLock};
use tb_adapter::AdapterRegistry;
use tb_callable::CallableSynthesizer;

/// Ids of the frameworks compiled into this build, in registration order.
pub const FRAMEWORKS: &[&str] = &[
    #[cfg(feature = "openai")]
    "openai",
    #[cfg(feature = "anthropic")]
    "anthropic",
    #[cfg(feature = "google_adk")]
    "google_adk",
    #[cfg(feature = "agentscope")]
    "agentscope",
    #[cfg(feature = "langchain")]
    "langchain",
    #[cfg(feature = "langchain")]
    "langgraph",
    #[cfg(feature = "crewai")]
    "crewai",
    #[cfg(feature = "pydantic_ai")]
    "pydantic_ai",
];

/// Register every compiled-in adapter, all sharing one type cache.
pub fn register_all(registry: &AdapterRegistry) {
    register_all_with(registry, &CallableSynthesizer::new());
}

/// Register every compiled-in adapter over `synth`'s type cache.
#[allow(unused_variables)]
pub fn register_all_with(registry: &AdapterRegistry, synth: &CallableSynthesizer) {
    #[cfg(feature = "openai")]
    {
        use openai::*;
        registry.register_tool_adapter(FRAMEWORK, Arc::new(OpenAiToolAdapter::with_synthesizer(synth.clone())));
        registry.register_message_adapter(FRAMEWORK, Arc::new(OpenAiMessageAdapter));
        registry.register_model_adapter(FRAMEWORK, Arc::new(OpenAiModelAdapter));
    }
    #[cfg(feature = "anthropic")]
    {
        use anthropic::*;
        registry.register_tool_adapter(FRAMEWORK, Arc::new(AnthropicToolAdapter::with_synthesizer(synth.clone())));
        registry.register_message_adapter(FRAMEWORK, Arc::new(AnthropicMessageAdapter));
        registry.register_model_adapter(FRAMEWORK, Arc::new(AnthropicModelAdapter));
    }
    #[cfg(feature = "google_adk")]
    {
        use google_adk::*;
        registry.register_tool_adapter(FRAMEWORK, Arc::new(GoogleAdkToolAdapter::with_synthesizer(synth.clone())));
        registry.register_message_adapter(FRAMEWORK, Arc::new(GoogleAdkMessageAdapter));
        registry.register_model_adapter(FRAMEWORK, Arc::new(GoogleAdkModelAdapter));
    }
    #[cfg(feature = "agentscope")]
    {
        use agentscope::*;
        registry.register_tool_adapter(FRAMEWORK, Arc::new(AgentScopeToolAdapter::with_synthesizer(synth.clone())));
        registry.register_message_adapter(FRAMEWORK, Arc::new(AgentScopeMessageAdapter));
        registry.register_model_adapter(FRAMEWORK, Arc::new(AgentScopeModelAdapter));
    }
    #[cfg(feature = "langchain")]
    {
        use langchain::*;
        let tools = Arc::new(LangChainToolAdapter::with_synthesizer(synth.clone()));
        for id in [FRAMEWORK, LANGGRAPH] {
            registry.register_tool_adapter(id, tools.clone());
            registry.register_message_adapter(id, Arc::new(LangChainMessageAdapter));
            registry.register_model_adapter(id, Arc::new(LangChainModelAdapter));
        }
    }
    #[cfg(feature = "crewai")]
    {
        use crewai::*;
        registry.register_tool_adapter(FRAMEWORK, Arc::new(CrewAiToolAdapter::with_synthesizer(synth.clone())));
        registry.register_model_adapter(FRAMEWORK, Arc::new(CrewAiModelAdapter));
    }
    #[cfg(feature = "pydantic_ai")]
    {
        use pydantic_ai::*;
        registry.register_tool_adapter(FRAMEWORK, Arc::new(PydanticAiToolAdapter::with_synthesizer(synth.clone())));
        registry.register_model_adapter(FRAMEWORK, Arc::new(PydanticAiModelAdapter));
    }
}

/// Process-wide registry with every compiled-in adapter, built on first use.
pub fn default_registry() -> &'static AdapterRegistry {
    static REGISTRY: OnceLock<AdapterRegistry> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let registry = AdapterRegistry::new();
        register_all(&registry);
        registry
    })
}
