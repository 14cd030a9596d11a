// SPDX-License-Identifier: MIT OR Apache-2.0
//! Model connection info consumed from the model collaborator.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tb_error::{BridgeError, ErrorCode};

/// Connection info for an OpenAI-compatible model endpoint.
///
/// Every field is optional except that HTTP-backed wraps need `base_url`
/// (see [`ModelInfo::require_base_url`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ModelInfo {
    /// API key sent as a bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Endpoint base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Model name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Extra HTTP headers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// Provider id, used for `provider/model` style names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl ModelInfo {
    /// The base URL, or a [`ErrorCode::ModelInfoIncomplete`] error.
    pub fn require_base_url(&self) -> Result<&str, BridgeError> {
        self.base_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                BridgeError::new(ErrorCode::ModelInfoIncomplete, "model info has no base_url")
                    .with_context("model", &self.model)
            })
    }

    /// Model name or the empty string.
    #[must_use]
    pub fn model_name(&self) -> &str {
        self.model.as_deref().unwrap_or_default()
    }

    /// `provider/model` when a provider is known, else the bare model name.
    #[must_use]
    pub fn qualified_model(&self) -> String {
        match self.provider.as_deref().filter(|p| !p.is_empty()) {
            Some(provider) => format!("{provider}/{}", self.model_name()),
            None => self.model_name().to_owned(),
        }
    }
}

/// Anything that can describe how to reach a model.
pub trait ModelInfoSource: Send + Sync {
    /// Fetch the connection info. Called once per framework wrap.
    fn model_info(&self) -> Result<ModelInfo, BridgeError>;
}

impl ModelInfoSource for ModelInfo {
    fn model_info(&self) -> Result<ModelInfo, BridgeError> {
        Ok(self.clone())
    }
}
