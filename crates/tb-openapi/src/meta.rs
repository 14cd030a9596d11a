// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tool metadata as listed by a remote tool set.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata for one remote tool.
///
/// The argument schema comes from one of four shapes, checked in order:
/// a JSON Schema object in `parameters`, an MCP `input_schema` (object or
/// JSON string), an OpenAPI `parameters` list, or an OpenAPI
/// `request_body`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolMeta {
    /// Tool name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// OpenAPI operation id.
    #[serde(default, rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    /// Platform tool id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_id: Option<String>,
    /// Long description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Short summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// HTTP method for OpenAPI operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// HTTP path for OpenAPI operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// JSON Schema object or OpenAPI parameter list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Value>,
    /// MCP input schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
    /// OpenAPI request body.
    #[serde(default, alias = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<Value>,
}

impl ToolMeta {
    /// Read metadata from a JSON value; anything that is not an object
    /// yields empty metadata.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        serde_json::from_value(value.clone()).unwrap_or_default()
    }

    /// `name`, else `operationId`, else `tool_id`.
    #[must_use]
    pub fn tool_name(&self) -> Option<&str> {
        [&self.name, &self.operation_id, &self.tool_id]
            .into_iter()
            .find_map(|v| v.as_deref().filter(|s| !s.is_empty()))
    }

    /// `description`, else `summary`, else `"METHOD path"`, else empty.
    #[must_use]
    pub fn description_text(&self) -> String {
        if let Some(text) = [&self.description, &self.summary]
            .into_iter()
            .find_map(|v| v.as_deref().filter(|s| !s.is_empty()))
        {
            return text.to_owned();
        }
        format!(
            "{} {}",
            self.method.as_deref().unwrap_or_default(),
            self.path.as_deref().unwrap_or_default()
        )
        .trim()
        .to_owned()
    }

    /// Whether any schema-bearing field is present.
    #[must_use]
    pub fn declares_schema(&self) -> bool {
        self.parameters.is_some() || self.input_schema.is_some() || self.request_body.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn name_fallbacks() {
        let meta = ToolMeta::from_value(&json!({"operationId": "listUsers", "tool_id": "t-1"}));
        assert_eq!(meta.tool_name(), Some("listUsers"));
        let meta = ToolMeta::from_value(&json!({"name": "", "tool_id": "t-1"}));
        assert_eq!(meta.tool_name(), Some("t-1"));
        assert_eq!(ToolMeta::from_value(&json!([1])).tool_name(), None);
    }

    #[test]
    fn description_fallbacks() {
        let meta = ToolMeta::from_value(&json!({"summary": "List", "method": "GET", "path": "/u"}));
        assert_eq!(meta.description_text(), "List");
        let meta = ToolMeta::from_value(&json!({"method": "GET", "path": "/u"}));
        assert_eq!(meta.description_text(), "GET /u");
        assert_eq!(ToolMeta::default().description_text(), "");
    }

    #[test]
    fn request_body_camel_case_alias() {
        let meta = ToolMeta::from_value(&json!({"requestBody": {"content": {}}}));
        assert!(meta.request_body.is_some());
        assert!(meta.declares_schema());
    }
}
