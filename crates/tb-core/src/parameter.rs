// SPDX-License-Identifier: MIT OR Apache-2.0
//! Flattened single-field parameter view.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;
use tb_schema::resolve;

/// JSON type of a [`ToolParameter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    /// `string`
    String,
    /// `integer`
    Integer,
    /// `number`
    Number,
    /// `boolean`
    Boolean,
    /// `array`
    Array,
    /// `object`
    Object,
}

impl ParamType {
    /// JSON-Schema type name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }

    /// Parse a JSON-Schema type name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "array" => Some(Self::Array),
            "object" => Some(Self::Object),
            _ => None,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tool parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ToolParameter {
    /// Parameter name.
    pub name: String,
    /// JSON type.
    pub param_type: ParamType,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Whether the caller must supply it.
    #[serde(default)]
    pub required: bool,
    /// Default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Allowed values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#enum: Option<Vec<Value>>,
    /// Element schema for arrays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Value>,
    /// Property schemas for objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Map<String, Value>>,
    /// Format hint such as `int64` or `date-time`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Whether `null` is accepted.
    #[serde(default)]
    pub nullable: bool,
}

impl ToolParameter {
    /// A parameter with only a name and type set.
    pub fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: String::new(),
            required: false,
            default: None,
            r#enum: None,
            items: None,
            properties: None,
            format: None,
            nullable: false,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    /// Mark as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the default value.
    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Restrict to the given values.
    #[must_use]
    pub fn one_of(mut self, values: Vec<Value>) -> Self {
        self.r#enum = Some(values);
        self
    }

    /// Element schema for arrays.
    #[must_use]
    pub fn items(mut self, schema: Value) -> Self {
        self.items = Some(schema);
        self
    }

    /// Property schemas for objects.
    #[must_use]
    pub fn properties(mut self, props: Map<String, Value>) -> Self {
        self.properties = Some(props);
        self
    }

    /// Format hint.
    #[must_use]
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Accept `null`.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// JSON-Schema fragment for this parameter.
    ///
    /// `default` is emitted only when non-null, `items` only for arrays and
    /// `properties` only for objects.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        let mut schema = Map::new();
        schema.insert("type".into(), json!(self.param_type.as_str()));
        if !self.description.is_empty() {
            schema.insert("description".into(), json!(self.description));
        }
        if let Some(default) = self.default.as_ref().filter(|d| !d.is_null()) {
            schema.insert("default".into(), default.clone());
        }
        if let Some(values) = &self.r#enum {
            schema.insert("enum".into(), json!(values));
        }
        if let Some(format) = self.format.as_deref().filter(|f| !f.is_empty()) {
            schema.insert("format".into(), json!(format));
        }
        if self.nullable {
            schema.insert("nullable".into(), Value::Bool(true));
        }
        if self.param_type == ParamType::Array {
            if let Some(items) = self.items.as_ref().filter(|i| !is_empty(i)) {
                schema.insert("items".into(), items.clone());
            }
        }
        if self.param_type == ParamType::Object {
            if let Some(props) = self.properties.as_ref().filter(|p| !p.is_empty()) {
                schema.insert("properties".into(), Value::Object(props.clone()));
            }
        }
        Value::Object(schema)
    }

    /// Derive a parameter from one property of `root`'s `properties`.
    ///
    /// The property is resolved first; when the resolved schema has no
    /// `type` it is inferred from `properties` / `items` / `enum`, falling
    /// back to `string`.
    #[must_use]
    pub fn from_property(name: &str, field: &Value, root: &Value, required: bool) -> Self {
        let resolved = resolve(field, root);
        let core = &resolved.schema;

        let param_type = core
            .get("type")
            .and_then(Value::as_str)
            .and_then(ParamType::parse)
            .unwrap_or_else(|| {
                if core.contains_key("properties") {
                    ParamType::Object
                } else if core.contains_key("items") {
                    ParamType::Array
                } else {
                    field
                        .get("type")
                        .and_then(Value::as_str)
                        .and_then(ParamType::parse)
                        .unwrap_or(ParamType::String)
                }
            });

        let description = field
            .get("description")
            .and_then(Value::as_str)
            .filter(|d| !d.is_empty())
            .or_else(|| core.get("description").and_then(Value::as_str))
            .unwrap_or_default()
            .to_owned();
        let default = field
            .get("default")
            .or_else(|| core.get("default"))
            .cloned();
        let r#enum = field
            .get("enum")
            .or_else(|| core.get("enum"))
            .and_then(Value::as_array)
            .cloned();
        let default_is_null = !required && field.get("default").is_some_and(Value::is_null);

        Self {
            name: name.to_owned(),
            param_type,
            description,
            required,
            default,
            r#enum,
            items: core.get("items").cloned(),
            properties: core.get("properties").and_then(Value::as_object).cloned(),
            format: core.get("format").and_then(Value::as_str).map(str::to_owned),
            nullable: resolved.nullable || default_is_null,
        }
    }
}

fn is_empty(v: &Value) -> bool {
    v.is_null() || v.as_object().is_some_and(Map::is_empty)
}

/// Flatten an object schema into parameters, in `properties` order.
#[must_use]
pub fn parameters_from_schema(schema: &Value) -> Vec<ToolParameter> {
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .collect();
    schema
        .get("properties")
        .and_then(Value::as_object)
        .into_iter()
        .flatten()
        .map(|(name, field)| {
            ToolParameter::from_property(name, field, schema, required.contains(&name.as_str()))
        })
        .collect()
}

/// Build an object schema from a parameter list.
#[must_use]
pub fn schema_from_parameters(params: &[ToolParameter]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for param in params {
        properties.insert(param.name.clone(), param.to_json_schema());
        if param.required {
            required.push(Value::String(param.name.clone()));
        }
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_json_schema_omits_empty_parts() {
        let p = ToolParameter::new("q", ParamType::String);
        assert_eq!(p.to_json_schema(), json!({"type": "string"}));
    }

    #[test]
    fn to_json_schema_full() {
        let p = ToolParameter::new("tags", ParamType::Array)
            .description("Tags")
            .items(json!({"type": "string"}))
            .default_value(json!([]))
            .nullable();
        assert_eq!(
            p.to_json_schema(),
            json!({
                "type": "array",
                "description": "Tags",
                "default": [],
                "nullable": true,
                "items": {"type": "string"}
            })
        );
    }

    #[test]
    fn items_ignored_for_non_arrays() {
        let p = ToolParameter::new("x", ParamType::String).items(json!({"type": "string"}));
        assert!(p.to_json_schema().get("items").is_none());
    }

    #[test]
    fn null_default_not_emitted() {
        let p = ToolParameter::new("x", ParamType::Integer).default_value(Value::Null);
        assert!(p.to_json_schema().get("default").is_none());
    }

    #[test]
    fn from_schema_resolves_and_infers() {
        let schema = json!({
            "type": "object",
            "properties": {
                "unit": {"$ref": "#/$defs/Unit"},
                "limit": {"anyOf": [{"type": "integer"}, {"type": "null"}], "default": null},
                "point": {"properties": {"x": {"type": "number"}}}
            },
            "required": ["unit"],
            "$defs": {"Unit": {"type": "string", "enum": ["c", "f"], "description": "Unit"}}
        });
        let params = parameters_from_schema(&schema);
        assert_eq!(params.len(), 3);
        assert_eq!(params[0].name, "unit");
        assert_eq!(params[0].param_type, ParamType::String);
        assert_eq!(params[0].r#enum, Some(vec![json!("c"), json!("f")]));
        assert_eq!(params[0].description, "Unit");
        assert!(params[0].required);
        assert_eq!(params[1].param_type, ParamType::Integer);
        assert!(params[1].nullable);
        assert_eq!(params[2].param_type, ParamType::Object);
    }

    #[test]
    fn parameters_roundtrip_through_schema() {
        let params = vec![
            ToolParameter::new("city", ParamType::String).required(),
            ToolParameter::new("days", ParamType::Integer).default_value(json!(3)),
        ];
        let schema = schema_from_parameters(&params);
        assert_eq!(schema["required"], json!(["city"]));
        let back = parameters_from_schema(&schema);
        assert_eq!(back, params);
    }
}
