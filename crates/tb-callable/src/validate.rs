// SPDX-License-Identifier: MIT OR Apache-2.0
//! Argument validation against the declared parameters.

use crate::synthesize::CallableParam;
use jsonschema::error::ValidationErrorKind;
use serde_json::{Map, Value, json};
use tb_core::{Arguments, ToolError};
use tb_schema::inline_refs;
use tracing::debug;

/// Compiled validator for one tool's parameters schema.
///
/// Required-field and top-level type checks run against the synthesized
/// [`CallableParam`]s so errors can name fields. A JSON-Schema validator
/// compiled from the (ref-inlined) schema adds nested checks; when the
/// schema does not compile only the field checks apply.
///
/// Before compiling, every property the type synthesizer treats as nullable
/// (optional, `nullable: true`, or with a `null` branch) is widened to admit
/// `null`, so both checks agree on which values are acceptable.
pub struct ArgumentValidator {
    tool: String,
    schema: Option<jsonschema::Validator>,
}

impl ArgumentValidator {
    /// Compile a validator for `parameters`.
    #[must_use]
    pub fn new(tool: impl Into<String>, parameters: &Value) -> Self {
        let tool = tool.into();
        let inlined = admit_null(&inline_refs(parameters, parameters));
        let schema = match jsonschema::validator_for(&inlined) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!(target: "tb.callable", tool = %tool, error = %e, "parameters schema did not compile, using field checks only");
                None
            }
        };
        Self { tool, schema }
    }

    /// Whether the nested JSON-Schema check is active.
    #[must_use]
    pub fn has_schema_check(&self) -> bool {
        self.schema.is_some()
    }

    /// Check `args` against `params`.
    ///
    /// `null` is accepted for optional and nullable parameters. Unknown keys
    /// are left to the schema check (and pass when it allows additional
    /// properties).
    pub fn validate(&self, params: &[CallableParam], args: &Arguments) -> Result<(), ToolError> {
        let missing: Vec<String> = params
            .iter()
            .filter(|p| p.required && args.get(&p.name).is_none_or(|v| v.is_null() && !p.ty.is_nullable()))
            .map(|p| p.name.clone())
            .collect();
        if !missing.is_empty() {
            let cause = format!("missing required field(s): {}", missing.join(", "));
            return Err(self.invalid(missing, cause));
        }

        let mut mismatched = Vec::new();
        let mut causes = Vec::new();
        for param in params {
            let Some(value) = args.get(&param.name) else {
                continue;
            };
            if value.is_null() && param.accepts_null() {
                continue;
            }
            if !param.ty.accepts(value) {
                causes.push(format!("field '{}' expected {}, got {}", param.name, param.ty, kind_of(value)));
                mismatched.push(param.name.clone());
            }
        }
        if !mismatched.is_empty() {
            return Err(self.invalid(mismatched, causes.join("; ")));
        }

        if let Some(schema) = &self.schema {
            let instance = Value::Object(args.clone());
            let mut fields = Vec::new();
            let mut causes = Vec::new();
            for err in schema.iter_errors(&instance) {
                let path = err.instance_path.to_string();
                let field = match path.trim_start_matches('/').split('/').next().filter(|f| !f.is_empty()) {
                    Some(f) => Some(f.replace("~1", "/").replace("~0", "~")),
                    None => match &err.kind {
                        ValidationErrorKind::Required { property } => property.as_str().map(str::to_owned),
                        _ => None,
                    },
                };
                if let Some(field) = field
                    && !fields.contains(&field)
                {
                    fields.push(field);
                }
                causes.push(err.to_string());
            }
            if !causes.is_empty() {
                return Err(self.invalid(fields, causes.join("; ")));
            }
        }
        Ok(())
    }

    fn invalid(&self, fields: Vec<String>, cause: String) -> ToolError {
        ToolError::InvalidArguments {
            tool: self.tool.clone(),
            fields,
            cause,
        }
    }
}

impl std::fmt::Debug for ArgumentValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgumentValidator")
            .field("tool", &self.tool)
            .field("schema_check", &self.schema.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Null widening
// ---------------------------------------------------------------------------

/// Rewrite `schema` so nullable properties also validate `null`.
fn admit_null(schema: &Value) -> Value {
    let Some(obj) = schema.as_object() else {
        return schema.clone();
    };
    let mut out = Map::with_capacity(obj.len());
    for (key, value) in obj {
        let rewritten = match key.as_str() {
            "properties" => match value.as_object() {
                Some(props) => {
                    let required: Vec<&str> = obj
                        .get("required")
                        .and_then(Value::as_array)
                        .into_iter()
                        .flatten()
                        .filter_map(Value::as_str)
                        .collect();
                    Value::Object(
                        props
                            .iter()
                            .map(|(name, prop)| {
                                let prop = admit_null(prop);
                                let widened = if !required.contains(&name.as_str()) || is_nullable(&prop) {
                                    with_null(prop)
                                } else {
                                    prop
                                };
                                (name.clone(), widened)
                            })
                            .collect(),
                    )
                }
                None => value.clone(),
            },
            "items" | "additionalProperties" => admit_null(value),
            "anyOf" | "oneOf" | "allOf" => match value.as_array() {
                Some(branches) => Value::Array(branches.iter().map(admit_null).collect()),
                None => value.clone(),
            },
            _ => value.clone(),
        };
        out.insert(key.clone(), rewritten);
    }
    Value::Object(out)
}

/// Whether a property schema declares itself nullable.
fn is_nullable(prop: &Value) -> bool {
    prop.get("nullable").and_then(Value::as_bool) == Some(true) || has_null_branch(prop)
}

fn has_null_branch(prop: &Value) -> bool {
    ["anyOf", "oneOf"].iter().any(|key| {
        prop.get(*key)
            .and_then(Value::as_array)
            .is_some_and(|branches| branches.iter().any(admits_null))
    })
}

fn admits_null(schema: &Value) -> bool {
    match schema.get("type") {
        Some(Value::String(t)) => t == "null",
        Some(Value::Array(types)) => types.iter().any(|t| t == "null"),
        _ => false,
    }
}

/// Widen `prop` to accept `null` as well.
fn with_null(mut prop: Value) -> Value {
    if admits_null(&prop) || has_null_branch(&prop) {
        return prop;
    }
    let constrained = prop.get("enum").is_some() || prop.get("const").is_some();
    if let Some(obj) = prop.as_object_mut()
        && !constrained
    {
        match obj.get_mut("type") {
            Some(ty @ Value::String(_)) => {
                let single = ty.take();
                *ty = json!([single, "null"]);
                return prop;
            }
            Some(Value::Array(types)) => {
                types.push(json!("null"));
                return prop;
            }
            _ => {}
        }
        if let Some(branches) = obj.get_mut("anyOf").and_then(Value::as_array_mut) {
            branches.push(json!({"type": "null"}));
            return prop;
        }
    }
    json!({"anyOf": [prop, {"type": "null"}]})
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
