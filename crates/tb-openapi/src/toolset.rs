// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tools backed by a remote tool-set collaborator.

use crate::document::OpenApiDocument;
use crate::meta::ToolMeta;
use crate::schema::{build_args_schema, nest_body};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;
use tb_core::{Arguments, Tool, ToolError, normalize_tool_name, sanitize_identifier};
use tb_error::BridgeError;
use tracing::{debug, warn};

/// A remote tool set: lists tool metadata and executes calls by name.
pub trait RemoteToolSet: Send + Sync {
    /// Metadata of every tool, as JSON objects (see [`ToolMeta`]).
    fn list_tools(&self) -> Result<Vec<Value>, BridgeError>;

    /// Execute the tool `name` with dispatch-ready arguments.
    fn call_tool(&self, name: &str, arguments: Arguments) -> Result<Value, BridgeError>;
}

/// Build a tool from one metadata entry.
///
/// Returns `None` when the metadata carries no usable name. The visible
/// tool name is the metadata name made identifier-safe and normalized; the
/// remote call uses the original name. With no `remote`, the tool is
/// declared but unimplemented.
#[must_use]
pub fn build_tool_from_meta(meta: &ToolMeta, remote: Option<Arc<dyn RemoteToolSet>>) -> Option<Tool> {
    let remote_name = meta.tool_name()?.to_owned();
    let visible = normalize_tool_name(&sanitize_identifier(&remote_name));

    let args = build_args_schema(meta).unwrap_or_else(|| {
        if meta.declares_schema() {
            debug!(target: "tb.openapi", tool = %remote_name, "no usable schema, using empty parameters");
        }
        crate::schema::ArgsSchema {
            schema: json!({"type": "object", "properties": {}}),
            ..Default::default()
        }
    });

    let mut tool = Tool::new(&visible, meta.description_text())
        .with_schema(args.schema)
        .with_aliases(args.aliases);
    if let Some(remote) = remote {
        let body_fields = args.body_fields;
        tool = tool.with_func(move |arguments: Arguments| {
            let payload = nest_body(arguments, &body_fields);
            remote
                .call_tool(&remote_name, payload)
                .map_err(|e| ToolError::execution(remote_name.clone(), e.message))
        });
    }
    Some(tool)
}

/// Import every tool of `remote`, skipping entries without a name and
/// later entries whose name repeats an earlier one.
pub fn tools_from_toolset(remote: Arc<dyn RemoteToolSet>) -> Result<Vec<Tool>, BridgeError> {
    let metas = remote.list_tools()?;
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(metas.len());
    for raw in &metas {
        let meta = ToolMeta::from_value(raw);
        let Some(tool) = build_tool_from_meta(&meta, Some(remote.clone())) else {
            continue;
        };
        if !seen.insert(tool.name().to_owned()) {
            warn!(target: "tb.openapi", tool = %tool.name(), "duplicate tool name, skipping later occurrence");
            continue;
        }
        out.push(tool);
    }
    Ok(out)
}

/// One tool per operation of `doc`.
#[must_use]
pub fn tools_from_document(doc: &OpenApiDocument, remote: Option<Arc<dyn RemoteToolSet>>) -> Vec<Tool> {
    let mut seen = HashSet::new();
    doc.operations()
        .iter()
        .filter_map(|op| build_tool_from_meta(&op.to_meta(), remote.clone()))
        .filter(|tool| {
            let fresh = seen.insert(tool.name().to_owned());
            if !fresh {
                warn!(target: "tb.openapi", tool = %tool.name(), "duplicate operation name, skipping");
            }
            fresh
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        metas: Vec<Value>,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl RemoteToolSet for Recorder {
        fn list_tools(&self) -> Result<Vec<Value>, BridgeError> {
            Ok(self.metas.clone())
        }

        fn call_tool(&self, name: &str, arguments: Arguments) -> Result<Value, BridgeError> {
            self.calls
                .lock()
                .unwrap()
                .push((name.to_owned(), Value::Object(arguments)));
            Ok(json!("done"))
        }
    }

    #[test]
    fn remote_call_receives_nested_body() {
        let remote = Arc::new(Recorder::default());
        let meta = ToolMeta::from_value(&json!({
            "name": "POST /notes",
            "parameters": [{"name": "folder", "in": "query", "schema": {"type": "string"}}],
            "request_body": {"content": {"application/json": {"schema": {
                "type": "object", "properties": {"title": {"type": "string"}}
            }}}}
        }));
        let tool = build_tool_from_meta(&meta, Some(remote.clone())).unwrap();
        assert_eq!(tool.name(), "POST__notes");
        let args = json!({"folder": "inbox", "title": "hi"}).as_object().cloned().unwrap();
        assert_eq!(tool.call(args).unwrap(), json!("done"));

        let calls = remote.calls.lock().unwrap();
        assert_eq!(calls[0].0, "POST /notes");
        assert_eq!(calls[0].1, json!({"folder": "inbox", "json": {"title": "hi"}}));
    }

    #[test]
    fn duplicates_and_nameless_entries_are_skipped() {
        let remote = Arc::new(Recorder {
            metas: vec![
                json!({"name": "a", "description": "first"}),
                json!({"description": "no name"}),
                json!({"name": "a", "description": "second"}),
                json!({"tool_id": "b"}),
            ],
            ..Recorder::default()
        });
        let tools = tools_from_toolset(remote).unwrap();
        let names: Vec<&str> = tools.iter().map(Tool::name).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(tools[0].description(), "first");
    }

    #[test]
    fn unusable_schema_becomes_empty_object() {
        let meta = ToolMeta::from_value(&json!({"name": "t", "input_schema": "oops"}));
        let tool = build_tool_from_meta(&meta, None).unwrap();
        assert_eq!(tool.raw_schema(), &json!({"type": "object", "properties": {}}));
        assert!(tool.call(Arguments::new()).is_err());
    }
}
