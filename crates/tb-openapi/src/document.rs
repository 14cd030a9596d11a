// SPDX-License-Identifier: MIT OR Apache-2.0
//! OpenAPI 3 documents as a source of tool metadata.

use crate::error::OpenApiError;
use crate::meta::ToolMeta;
use serde_json::{Map, Value};
use tb_schema::inline_refs;

/// HTTP methods that become operations.
pub const SUPPORTED_METHODS: [&str; 7] = ["DELETE", "GET", "HEAD", "OPTIONS", "PATCH", "POST", "PUT"];

/// One operation of an OpenAPI document.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// `operationId`, or `"METHOD path"` when absent.
    pub operation_id: String,
    /// Upper-case HTTP method.
    pub method: String,
    /// Path template.
    pub path: String,
    /// Short summary.
    pub summary: Option<String>,
    /// Long description.
    pub description: Option<String>,
    /// Path-level parameters followed by operation-level ones.
    pub parameters: Vec<Value>,
    /// Names of `in: path` parameters.
    pub path_parameters: Vec<String>,
    /// Request body object.
    pub request_body: Option<Value>,
    /// Tags.
    pub tags: Vec<String>,
    /// Server URL picked for this operation.
    pub server_url: Option<String>,
}

impl Operation {
    /// Metadata in the shape a remote tool set would list.
    #[must_use]
    pub fn to_meta(&self) -> ToolMeta {
        ToolMeta {
            name: Some(self.operation_id.clone()),
            operation_id: Some(self.operation_id.clone()),
            tool_id: None,
            description: self.description.clone(),
            summary: self.summary.clone(),
            method: Some(self.method.clone()),
            path: Some(self.path.clone()),
            parameters: Some(Value::Array(self.parameters.clone())),
            input_schema: None,
            request_body: self.request_body.clone(),
        }
    }
}

/// A parsed OpenAPI document with local `$ref`s inlined.
#[derive(Debug, Clone)]
pub struct OpenApiDocument {
    doc: Value,
    operations: Vec<Operation>,
}

impl OpenApiDocument {
    /// Parse a JSON document.
    pub fn parse(text: &str) -> Result<Self, OpenApiError> {
        Self::from_value(serde_json::from_str(text)?)
    }

    /// Build from an already parsed value.
    pub fn from_value(raw: Value) -> Result<Self, OpenApiError> {
        if !raw.is_object() {
            return Err(OpenApiError::NotAnObject);
        }
        let doc = inline_refs(&raw, &raw);
        let operations = build_operations(&doc)?;
        Ok(Self { doc, operations })
    }

    /// The document with references inlined.
    #[must_use]
    pub fn document(&self) -> &Value {
        &self.doc
    }

    /// `info.title`, if any.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.doc.pointer("/info/title").and_then(Value::as_str)
    }

    /// Operations in path then method order.
    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Operation by id.
    #[must_use]
    pub fn operation(&self, id: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.operation_id == id)
    }

    /// Base URL from the top-level `servers`.
    #[must_use]
    pub fn server_url(&self) -> Option<String> {
        pick_server_url(self.doc.get("servers"))
    }
}

fn build_operations(doc: &Value) -> Result<Vec<Operation>, OpenApiError> {
    let paths = match doc.get("paths") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(paths)) => paths,
        Some(_) => return Err(OpenApiError::InvalidPaths),
    };
    let root_server = pick_server_url(doc.get("servers"));

    let mut out = Vec::new();
    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            continue;
        };
        let path_params = item.get("parameters").and_then(Value::as_array);
        for (method, operation) in item {
            let method = method.to_uppercase();
            if !SUPPORTED_METHODS.contains(&method.as_str()) {
                continue;
            }
            let Some(operation) = operation.as_object() else {
                continue;
            };
            let parameters: Vec<Value> = path_params
                .into_iter()
                .flatten()
                .chain(operation.get("parameters").and_then(Value::as_array).into_iter().flatten())
                .cloned()
                .collect();
            let path_parameters = parameters
                .iter()
                .filter(|p| p.get("in").and_then(Value::as_str) == Some("path"))
                .filter_map(|p| p.get("name").and_then(Value::as_str))
                .filter(|n| !n.is_empty())
                .map(str::to_owned)
                .collect();
            let server_url = pick_server_url(operation.get("servers"))
                .or_else(|| pick_server_url(item.get("servers")))
                .or_else(|| root_server.clone());

            out.push(Operation {
                operation_id: text(operation, "operationId").unwrap_or_else(|| format!("{method} {path}")),
                method,
                path: path.clone(),
                summary: text(operation, "summary"),
                description: text(operation, "description"),
                parameters,
                path_parameters,
                request_body: operation.get("requestBody").cloned(),
                tags: operation
                    .get("tags")
                    .and_then(Value::as_array)
                    .into_iter()
                    .flatten()
                    .filter_map(Value::as_str)
                    .map(str::to_owned)
                    .collect(),
                server_url,
            });
        }
    }
    Ok(out)
}

fn text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// First usable server URL, with `{var}` placeholders replaced by their
/// defaults.
#[must_use]
pub fn pick_server_url(servers: Option<&Value>) -> Option<String> {
    let servers: Vec<&Value> = match servers? {
        Value::Array(list) => list.iter().collect(),
        single @ Value::Object(_) => vec![single],
        Value::String(url) => return Some(url.clone()),
        _ => return None,
    };
    for server in servers {
        if let Value::String(url) = server {
            return Some(url.clone());
        }
        let Some(mut url) = server.get("url").and_then(Value::as_str).filter(|u| !u.is_empty()).map(str::to_owned) else {
            continue;
        };
        if let Some(vars) = server.get("variables").and_then(Value::as_object) {
            for (key, var) in vars {
                if let Some(default) = var.get("default").filter(|d| !d.is_null()) {
                    let rendered = default.as_str().map_or_else(|| default.to_string(), str::to_owned);
                    url = url.replace(&format!("{{{key}}}"), &rendered);
                }
            }
        }
        return Some(url);
    }
    None
}
