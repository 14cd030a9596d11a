// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command implementations for the `toolbridge` CLI.
//!
//! These return their output instead of printing it so they can be tested
//! without spawning the binary.

use anyhow::{Context, Result};
use schemars::schema_for;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::Path;
use tb_adapter::{AdapterRegistry, CommonToolSet, ToolSelection};
use tb_callable::{CallableSynthesizer, SynthesisOptions};
use tb_config::BridgeConfig;
use tb_core::{CanonicalTool, normalize_tool_name};
use tb_openapi::OpenApiDocument;
use tracing::debug;

/// Framework used when neither the command line nor the config names one.
pub const FALLBACK_FRAMEWORK: &str = "openai";

/// One entry of a tool definition file.
#[derive(Debug, Deserialize)]
struct ToolSpec {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "empty_object")]
    parameters: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

/// Normalize each name.
pub fn normalize_names(names: &[String]) -> Vec<String> {
    names.iter().map(|n| normalize_tool_name(n)).collect()
}

/// Read canonical tools from `path`.
///
/// The file is a JSON array of `{name, description, parameters}` objects, or
/// an OpenAPI 3 document when `openapi` is set.
pub fn read_tools(path: &Path, openapi: bool) -> Result<Vec<CanonicalTool>> {
    let content = std::fs::read_to_string(path).with_context(|| format!("read file '{}'", path.display()))?;
    if openapi {
        let doc = OpenApiDocument::parse(&content).with_context(|| format!("parse OpenAPI from '{}'", path.display()))?;
        debug!(target: "toolbridge", operations = doc.operations().len(), "parsed OpenAPI document");
        return Ok(CommonToolSet::from_openapi(&doc, None).tools(&ToolSelection::all()));
    }
    let specs: Vec<ToolSpec> =
        serde_json::from_str(&content).with_context(|| format!("parse tool list from '{}'", path.display()))?;
    Ok(specs
        .into_iter()
        .map(|s| CanonicalTool::new(&s.name, s.description, s.parameters))
        .collect())
}

/// Pick the framework for a command.
///
/// An explicit id wins over the configured default; the result must be
/// registered and not disabled.
pub fn resolve_framework(registry: &AdapterRegistry, config: &BridgeConfig, explicit: Option<&str>) -> Result<String> {
    let id = explicit
        .or(config.default_framework.as_deref())
        .unwrap_or(FALLBACK_FRAMEWORK);
    if !registry.contains(id) {
        anyhow::bail!("unknown framework '{id}' (known: {})", registry.frameworks().join(", "));
    }
    if !config.is_enabled(id) {
        anyhow::bail!("framework '{id}' is disabled in the configuration");
    }
    Ok(id.to_owned())
}

/// Framework declarations for `tools`.
pub fn convert(registry: &AdapterRegistry, framework: &str, tools: &[CanonicalTool]) -> Value {
    Value::Array(
        registry
            .convert_tools(framework, tools)
            .into_iter()
            .map(|t| t.declaration)
            .collect(),
    )
}

/// Signature and documentation of every synthesized callable.
pub fn describe(tools: &[CanonicalTool], options: SynthesisOptions) -> String {
    let synth = CallableSynthesizer::new();
    let mut out = String::new();
    for callable in synth.synthesize_all(tools, None, options) {
        out.push_str(&callable.signature());
        out.push('\n');
        for line in callable.doc().lines() {
            out.push_str(&format!("    {line}\n"));
        }
        out.push('\n');
    }
    out
}

/// Registered frameworks, one per line, marking disabled ones.
pub fn frameworks(registry: &AdapterRegistry, config: &BridgeConfig) -> Vec<String> {
    registry
        .frameworks()
        .into_iter()
        .map(|id| {
            if config.is_enabled(&id) {
                id
            } else {
                format!("{id} (disabled)")
            }
        })
        .collect()
}

/// JSON Schema of [`BridgeConfig`], pretty-printed.
pub fn schema_json() -> Result<String> {
    let value = serde_json::to_value(schema_for!(BridgeConfig))?;
    serde_json::to_string_pretty(&value).context("serialize schema")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn registry() -> &'static AdapterRegistry {
        tb_integrations::default_registry()
    }

    fn tool() -> CanonicalTool {
        CanonicalTool::new(
            "search",
            "Search the web",
            json!({"type": "object", "properties": {"q": {"type": "string", "description": "Query"}}, "required": ["q"]}),
        )
    }

    #[test]
    fn long_names_normalized() {
        let out = normalize_names(&["short".into(), "n".repeat(80)]);
        assert_eq!(out[0], "short");
        assert_eq!(out[1].len(), 64);
    }

    #[test]
    fn reads_tool_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"name": "ping"}}, {{"name": "echo", "description": "Echo", "parameters": {{"type": "object"}}}}]"#).unwrap();
        let tools = read_tools(file.path(), false).unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[1].description(), "Echo");
    }

    #[test]
    fn framework_resolution_order() {
        let mut config = BridgeConfig::default();
        assert_eq!(resolve_framework(registry(), &config, None).unwrap(), "openai");
        config.default_framework = Some("langchain".into());
        assert_eq!(resolve_framework(registry(), &config, None).unwrap(), "langchain");
        assert_eq!(resolve_framework(registry(), &config, Some("crewai")).unwrap(), "crewai");
        assert!(resolve_framework(registry(), &config, Some("smolagents")).is_err());
    }

    #[test]
    fn disabled_framework_refused() {
        let config = tb_config::parse_toml("[frameworks.crewai]\nenabled = false\n").unwrap();
        let err = resolve_framework(registry(), &config, Some("crewai")).unwrap_err();
        assert!(err.to_string().contains("disabled"));
        assert!(frameworks(registry(), &config).contains(&"crewai (disabled)".to_owned()));
    }

    #[test]
    fn convert_to_anthropic() {
        let out = convert(registry(), "anthropic", &[tool()]);
        assert_eq!(out[0]["name"], "search");
        assert_eq!(out[0]["input_schema"]["required"], json!(["q"]));
    }

    #[test]
    fn describe_with_type_docstring() {
        let text = describe(&[tool()], SynthesisOptions::with_type_docstring());
        assert!(text.starts_with("search("));
        assert!(text.contains("    Search the web"));
        assert!(text.contains("q (string): Query"));
    }
}
