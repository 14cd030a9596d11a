// SPDX-License-Identifier: MIT OR Apache-2.0
//! Per-adapter record of converted tools.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tb_core::{CanonicalTool, normalize_tool_name};

/// Canonical tools an adapter has converted, keyed by normalized name.
///
/// Later registrations under the same name replace earlier ones.
#[derive(Debug, Default)]
pub struct RegisteredTools {
    tools: RwLock<HashMap<String, CanonicalTool>>,
}

impl RegisteredTools {
    /// An empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `tool` under its (already normalized) name.
    pub fn insert(&self, tool: &CanonicalTool) {
        self.tools
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(tool.name().to_owned(), tool.clone());
    }

    /// Record every tool in `tools`.
    pub fn extend<'a>(&self, tools: impl IntoIterator<Item = &'a CanonicalTool>) {
        let mut map = self.tools.write().unwrap_or_else(PoisonError::into_inner);
        for tool in tools {
            map.insert(tool.name().to_owned(), tool.clone());
        }
    }

    /// Look a tool up; `name` is normalized before the lookup.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<CanonicalTool> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&normalize_tool_name(name))
            .cloned()
    }

    /// Sorted names.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Number of recorded tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
