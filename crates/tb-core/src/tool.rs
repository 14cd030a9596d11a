// SPDX-License-Identifier: MIT OR Apache-2.0
//! User-facing tool builder.
//!
//! A [`Tool`] is defined from a parameter list, a raw JSON Schema, or a
//! typed Rust function whose argument struct derives
//! [`schemars::JsonSchema`]. [`Tool::to_canonical`] produces the
//! [`CanonicalTool`] the adapters consume.

use crate::canonical::{AliasMap, Arguments, CanonicalTool, ToolFn, tool_fn};
use crate::error::ToolError;
use crate::naming::normalize_tool_name;
use crate::parameter::{ToolParameter, parameters_from_schema, schema_from_parameters};
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::fmt;
use tb_error::BridgeError;
use tb_schema::enrich_parameters;

/// A tool definition with an optional backing function.
#[derive(Clone)]
pub struct Tool {
    name: String,
    description: String,
    schema: Value,
    func: Option<ToolFn>,
    aliases: AliasMap,
}

impl Tool {
    /// A tool with no parameters and no function.
    pub fn new(name: impl AsRef<str>, description: impl Into<String>) -> Self {
        Self {
            name: normalize_tool_name(name.as_ref()),
            description: description.into(),
            schema: json!({"type": "object", "properties": {}}),
            func: None,
            aliases: AliasMap::new(),
        }
    }

    /// Replace the parameters with an explicit list.
    #[must_use]
    pub fn with_parameters(mut self, params: &[ToolParameter]) -> Self {
        self.schema = schema_from_parameters(params);
        self
    }

    /// Replace the parameters with a raw JSON Schema object.
    #[must_use]
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = schema;
        self
    }

    /// Attach the backing function.
    #[must_use]
    pub fn with_func<F>(mut self, func: F) -> Self
    where
        F: Fn(Arguments) -> Result<Value, ToolError> + Send + Sync + 'static,
    {
        self.func = Some(tool_fn(func));
        self
    }

    /// Attach an already boxed backing function.
    #[must_use]
    pub fn with_tool_fn(mut self, func: ToolFn) -> Self {
        self.func = Some(func);
        self
    }

    /// Attach accepted argument aliases.
    #[must_use]
    pub fn with_aliases(mut self, aliases: AliasMap) -> Self {
        self.aliases = aliases;
        self
    }

    /// Build a tool from a typed function.
    ///
    /// The parameter schema is generated from `A`; arguments are
    /// deserialized into `A` before the call and the result serialized back
    /// to JSON. Deserialization failures surface as
    /// [`ToolError::InvalidArguments`].
    ///
    /// ```
    /// use schemars::JsonSchema;
    /// use serde::Deserialize;
    /// use tb_core::{Tool, ToolError};
    ///
    /// #[derive(Deserialize, JsonSchema)]
    /// struct Add {
    ///     /// Left operand.
    ///     a: i64,
    ///     /// Right operand.
    ///     b: i64,
    /// }
    ///
    /// let tool = Tool::from_fn("add", "Add two integers", |args: Add| {
    ///     Ok::<_, ToolError>(args.a + args.b)
    /// })
    /// .unwrap();
    /// let out = tool.call(serde_json::json!({"a": 2, "b": 3}).as_object().cloned().unwrap());
    /// assert_eq!(out.unwrap(), serde_json::json!(5));
    /// ```
    pub fn from_fn<A, R, F>(
        name: impl AsRef<str>,
        description: impl Into<String>,
        func: F,
    ) -> Result<Self, BridgeError>
    where
        A: JsonSchema + DeserializeOwned + 'static,
        R: Serialize + 'static,
        F: Fn(A) -> Result<R, ToolError> + Send + Sync + 'static,
    {
        let mut schema = serde_json::to_value(schemars::schema_for!(A))?;
        if let Some(obj) = schema.as_object_mut() {
            obj.remove("$schema");
        }
        let tool = Self::new(name, description).with_schema(schema);
        let tool_name = tool.name.clone();
        Ok(tool.with_func(move |args: Arguments| {
            let typed: A = serde_json::from_value(Value::Object(args)).map_err(|e| {
                ToolError::InvalidArguments {
                    tool: tool_name.clone(),
                    fields: Vec::new(),
                    cause: e.to_string(),
                }
            })?;
            let out = func(typed)?;
            serde_json::to_value(out).map_err(|e| ToolError::execution(tool_name.clone(), e.to_string()))
        }))
    }

    /// Normalized name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The parameters schema as authored.
    #[must_use]
    pub fn raw_schema(&self) -> &Value {
        &self.schema
    }

    /// Flattened parameter view derived from the schema.
    #[must_use]
    pub fn parameters(&self) -> Vec<ToolParameter> {
        parameters_from_schema(&self.schema)
    }

    /// Provider-facing parameters schema (see [`enrich_parameters`]).
    #[must_use]
    pub fn parameters_schema(&self) -> Value {
        enrich_parameters(&self.schema)
    }

    /// Call the backing function directly.
    pub fn call(&self, args: Arguments) -> Result<Value, ToolError> {
        match &self.func {
            Some(f) => f(args),
            None => Err(ToolError::NotImplemented {
                tool: self.name.clone(),
            }),
        }
    }

    /// A copy of this tool under another name.
    #[must_use]
    pub fn renamed(&self, name: impl AsRef<str>) -> Self {
        let mut out = self.clone();
        out.name = normalize_tool_name(name.as_ref());
        out
    }

    /// OpenAI function spec with the enriched schema.
    #[must_use]
    pub fn to_openai_function(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "parameters": self.parameters_schema(),
        })
    }

    /// Anthropic tool spec with the enriched schema.
    #[must_use]
    pub fn to_anthropic_tool(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "input_schema": self.parameters_schema(),
        })
    }

    /// Canonical form carrying the enriched schema.
    #[must_use]
    pub fn to_canonical(&self) -> CanonicalTool {
        let mut canonical = CanonicalTool::new(&self.name, self.description.clone(), self.parameters_schema())
            .with_aliases(self.aliases.clone());
        if let Some(func) = &self.func {
            canonical = canonical.with_func(func.clone());
        }
        canonical
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("schema", &self.schema)
            .field("implemented", &self.func.is_some())
            .finish()
    }
}
