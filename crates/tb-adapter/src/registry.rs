// SPDX-License-Identifier: MIT OR Apache-2.0
//! Framework id → adapter dispatch.

use crate::contract::{FrameworkModel, FrameworkTool, MessageAdapter, ModelAdapter, ToolAdapter};
use crate::model::CommonModel;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use tb_core::{CanonicalMessage, CanonicalTool};
use tb_error::{BridgeError, ErrorCode};
use tracing::{info, warn};

/// Adapters keyed by framework id.
///
/// Populated once at startup by whichever integrations are compiled in; a
/// missing framework is a lookup miss, never a failure.
#[derive(Default)]
pub struct AdapterRegistry {
    tools: RwLock<HashMap<String, Arc<dyn ToolAdapter>>>,
    models: RwLock<HashMap<String, Arc<dyn ModelAdapter>>>,
    messages: RwLock<HashMap<String, Arc<dyn MessageAdapter>>>,
}

fn put<T: ?Sized>(slot: &RwLock<HashMap<String, Arc<T>>>, kind: &str, id: String, adapter: Arc<T>) {
    let previous = slot
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(id.clone(), adapter);
    if previous.is_some() {
        info!(target: "tb.adapter.registry", framework = %id, kind, "adapter replaced");
    }
}

fn lookup<T: ?Sized>(slot: &RwLock<HashMap<String, Arc<T>>>, kind: &str, id: &str) -> Option<Arc<T>> {
    let found = slot.read().unwrap_or_else(PoisonError::into_inner).get(id).cloned();
    if found.is_none() {
        warn!(target: "tb.adapter.registry", framework = %id, kind, "adapter not found");
    }
    found
}

fn ids<T: ?Sized>(slot: &RwLock<HashMap<String, Arc<T>>>) -> Vec<String> {
    slot.read()
        .unwrap_or_else(PoisonError::into_inner)
        .keys()
        .cloned()
        .collect()
}

impl AdapterRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool adapter under `id`, replacing any previous one.
    pub fn register_tool_adapter(&self, id: impl Into<String>, adapter: Arc<dyn ToolAdapter>) {
        put(&self.tools, "tool", id.into(), adapter);
    }

    /// Register a model adapter under `id`, replacing any previous one.
    pub fn register_model_adapter(&self, id: impl Into<String>, adapter: Arc<dyn ModelAdapter>) {
        put(&self.models, "model", id.into(), adapter);
    }

    /// Register a message adapter under `id`, replacing any previous one.
    pub fn register_message_adapter(&self, id: impl Into<String>, adapter: Arc<dyn MessageAdapter>) {
        put(&self.messages, "message", id.into(), adapter);
    }

    /// Tool adapter for `id`; a miss is logged.
    #[must_use]
    pub fn tool_adapter(&self, id: &str) -> Option<Arc<dyn ToolAdapter>> {
        lookup(&self.tools, "tool", id)
    }

    /// Model adapter for `id`; a miss is logged.
    #[must_use]
    pub fn model_adapter(&self, id: &str) -> Option<Arc<dyn ModelAdapter>> {
        lookup(&self.models, "model", id)
    }

    /// Message adapter for `id`; a miss is logged.
    #[must_use]
    pub fn message_adapter(&self, id: &str) -> Option<Arc<dyn MessageAdapter>> {
        lookup(&self.messages, "message", id)
    }

    /// Whether any adapter is registered under `id`.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.frameworks().iter().any(|f| f == id)
    }

    /// Sorted ids with at least one adapter.
    #[must_use]
    pub fn frameworks(&self) -> Vec<String> {
        let all: BTreeSet<String> = ids(&self.tools)
            .into_iter()
            .chain(ids(&self.models))
            .chain(ids(&self.messages))
            .collect();
        all.into_iter().collect()
    }

    /// Convert `tools` for framework `id`; a miss yields an empty list.
    #[must_use]
    pub fn convert_tools(&self, id: &str, tools: &[CanonicalTool]) -> Vec<FrameworkTool> {
        match self.tool_adapter(id) {
            Some(adapter) => adapter.from_canonical(tools),
            None => Vec::new(),
        }
    }

    /// Wrap `model` for framework `id`; a miss yields `Ok(None)`.
    pub fn wrap_model(&self, id: &str, model: &CommonModel) -> Result<Option<FrameworkModel>, BridgeError> {
        self.model_adapter(id)
            .map(|adapter| adapter.wrap_model(model))
            .transpose()
    }

    /// Framework messages to canonical ones.
    pub fn messages_to_canonical(&self, id: &str, messages: &[Value]) -> Result<Vec<CanonicalMessage>, BridgeError> {
        self.message_adapter(id)
            .ok_or_else(|| not_found(id))?
            .to_canonical(messages)
    }

    /// Canonical messages to framework ones.
    pub fn messages_from_canonical(
        &self,
        id: &str,
        messages: &[CanonicalMessage],
    ) -> Result<Vec<Value>, BridgeError> {
        self.message_adapter(id)
            .ok_or_else(|| not_found(id))?
            .from_canonical(messages)
    }
}

fn not_found(id: &str) -> BridgeError {
    BridgeError::new(ErrorCode::AdapterNotFound, format!("no message adapter for framework '{id}'"))
        .with_context("framework", id)
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("frameworks", &self.frameworks())
            .finish()
    }
}
