// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ordered tool collections convertible to any registered framework.

use crate::contract::FrameworkTool;
use crate::registry::AdapterRegistry;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tb_core::{CanonicalTool, Tool};
use tb_error::BridgeError;
use tb_openapi::{OpenApiDocument, RemoteToolSet, tools_from_document, tools_from_toolset};

type NameFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;
type ToolModifier = Arc<dyn Fn(Tool) -> Tool + Send + Sync>;

/// Which tools to hand out and how to rename them.
///
/// The filter sees the original names; the prefix is applied next and the
/// modifier last.
#[derive(Clone, Default)]
pub struct ToolSelection {
    prefix: Option<String>,
    filter: Option<NameFilter>,
    modify: Option<ToolModifier>,
}

impl ToolSelection {
    /// Every tool, unchanged.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Prepend `prefix` to each name.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Keep only tools whose name passes `filter`.
    #[must_use]
    pub fn filter(mut self, filter: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Rewrite each tool with `modify`.
    #[must_use]
    pub fn modify(mut self, modify: impl Fn(Tool) -> Tool + Send + Sync + 'static) -> Self {
        self.modify = Some(Arc::new(modify));
        self
    }
}

impl fmt::Debug for ToolSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolSelection")
            .field("prefix", &self.prefix)
            .field("filter", &self.filter.is_some())
            .field("modify", &self.modify.is_some())
            .finish()
    }
}

/// An ordered set of tools.
#[derive(Debug, Clone, Default)]
pub struct CommonToolSet {
    tools: Vec<Tool>,
}

impl CommonToolSet {
    /// A set over `tools`.
    #[must_use]
    pub fn new(tools: Vec<Tool>) -> Self {
        Self { tools }
    }

    /// Import every tool from a remote tool set; later duplicates are
    /// skipped with a warning.
    pub fn from_toolset(remote: Arc<dyn RemoteToolSet>) -> Result<Self, BridgeError> {
        Ok(Self::new(tools_from_toolset(remote)?))
    }

    /// One tool per OpenAPI operation, dispatched through `remote` when given.
    #[must_use]
    pub fn from_openapi(doc: &OpenApiDocument, remote: Option<Arc<dyn RemoteToolSet>>) -> Self {
        Self::new(tools_from_document(doc, remote))
    }

    /// Append a tool.
    pub fn push(&mut self, tool: Tool) {
        self.tools.push(tool);
    }

    /// Number of tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// The tools as authored.
    #[must_use]
    pub fn as_slice(&self) -> &[Tool] {
        &self.tools
    }

    /// Selected tools in canonical form.
    #[must_use]
    pub fn tools(&self, selection: &ToolSelection) -> Vec<CanonicalTool> {
        self.tools
            .iter()
            .filter(|t| selection.filter.as_ref().is_none_or(|f| f(t.name())))
            .map(|t| match &selection.prefix {
                Some(prefix) => t.renamed(format!("{prefix}{}", t.name())),
                None => t.clone(),
            })
            .map(|t| match &selection.modify {
                Some(modify) => modify(t),
                None => t,
            })
            .map(|t| t.to_canonical())
            .collect()
    }

    /// OpenAI function specs.
    #[must_use]
    pub fn to_openai_function(&self, selection: &ToolSelection) -> Vec<Value> {
        self.tools(selection)
            .iter()
            .map(CanonicalTool::to_openai_function)
            .collect()
    }

    /// Anthropic tool specs.
    #[must_use]
    pub fn to_anthropic_tool(&self, selection: &ToolSelection) -> Vec<Value> {
        self.tools(selection)
            .iter()
            .map(CanonicalTool::to_anthropic_tool)
            .collect()
    }

    /// Tools for framework `id`; a missing adapter yields an empty list.
    #[must_use]
    pub fn to_framework(&self, registry: &AdapterRegistry, id: &str, selection: &ToolSelection) -> Vec<FrameworkTool> {
        registry.convert_tools(id, &self.tools(selection))
    }
}

impl From<Vec<Tool>> for CommonToolSet {
    fn from(tools: Vec<Tool>) -> Self {
        Self::new(tools)
    }
}

impl FromIterator<Tool> for CommonToolSet {
    fn from_iter<I: IntoIterator<Item = Tool>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn set() -> CommonToolSet {
        CommonToolSet::new(vec![
            Tool::new("search", "Search the web"),
            Tool::new("fetch", "Fetch a page").with_schema(json!({
                "type": "object", "properties": {"url": {"type": "string"}}, "required": ["url"]
            })),
        ])
    }

    #[test]
    fn selection_filters_before_prefixing() {
        let sel = ToolSelection::all().filter(|n| n == "fetch").prefix("web_");
        let tools = set().tools(&sel);
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name(), "web_fetch");
    }

    #[test]
    fn modifier_runs_last() {
        let sel = ToolSelection::all()
            .prefix("p_")
            .modify(|t| t.renamed(t.name().to_uppercase()));
        let names: Vec<String> = set().tools(&sel).iter().map(|t| t.name().to_owned()).collect();
        assert_eq!(names, ["P_SEARCH", "P_FETCH"]);
    }

    #[test]
    fn openai_and_anthropic_specs_are_enriched() {
        let openai = set().to_openai_function(&ToolSelection::all());
        assert_eq!(openai[1]["parameters"]["properties"]["url"]["description"], "");
        let anthropic = set().to_anthropic_tool(&ToolSelection::all());
        assert_eq!(anthropic[1]["input_schema"]["required"], json!(["url"]));
    }

    #[test]
    fn unknown_framework_is_empty() {
        let out = set().to_framework(&AdapterRegistry::new(), "missing", &ToolSelection::all());
        assert!(out.is_empty());
    }
}
