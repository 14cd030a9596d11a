// SPDX-License-Identifier: MIT OR Apache-2.0
//! Build invocable callables from canonical tools.

use crate::reconcile::{aliases_from_schema, reconcile};
use crate::validate::ArgumentValidator;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;
use tb_core::{AliasMap, Arguments, CanonicalTool, ToolError};
use tb_schema::{TypeRef, TypeSynthesizer, params_doc};
use tracing::debug;

/// Interception hook called instead of the tool function.
///
/// Adapters install one to shape results (e.g. wrap them in an envelope);
/// the hook receives the canonical tool and the reconciled arguments and is
/// expected to call [`CanonicalTool::invoke`] itself.
pub type InvokeHook = Arc<dyn Fn(&CanonicalTool, Arguments) -> Result<Value, ToolError> + Send + Sync>;

/// Box a closure as an [`InvokeHook`].
pub fn invoke_hook<F>(f: F) -> InvokeHook
where
    F: Fn(&CanonicalTool, Arguments) -> Result<Value, ToolError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// One keyword-only parameter of a synthesized callable.
#[derive(Debug, Clone, PartialEq)]
pub struct CallableParam {
    /// Field name.
    pub name: String,
    /// Synthesized type as declared (not widened for optionality).
    pub ty: TypeRef,
    /// Whether a caller must supply it.
    pub required: bool,
    /// Declared default for optional parameters.
    pub default: Option<Value>,
    /// Declared description.
    pub description: String,
}

impl CallableParam {
    /// Whether `null` is an acceptable value.
    #[must_use]
    pub fn accepts_null(&self) -> bool {
        !self.required || self.ty.is_nullable()
    }

    /// Type a caller sees: optional parameters accept null.
    #[must_use]
    pub fn annotation(&self) -> TypeRef {
        if self.required {
            self.ty.clone()
        } else {
            self.ty.clone().optional()
        }
    }
}

impl fmt::Display for CallableParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.annotation())?;
        if !self.required {
            match &self.default {
                Some(default) => write!(f, " = {default}")?,
                None => f.write_str(" = null")?,
            }
        }
        Ok(())
    }
}

/// Per-framework synthesis switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisOptions {
    /// Append the plain-text structural `Args:` block to the description,
    /// for frameworks that cannot inspect nested types.
    pub include_type_docstring: bool,
}

impl SynthesisOptions {
    /// Options with the structural description enabled.
    #[must_use]
    pub fn with_type_docstring() -> Self {
        Self {
            include_type_docstring: true,
        }
    }
}

/// A callable whose signature mirrors a tool's parameters schema.
///
/// Calling convention is a single mapping of named arguments; see
/// [`SynthesizedCallable::call`].
#[derive(Clone)]
pub struct SynthesizedCallable {
    name: String,
    doc: String,
    params: Vec<CallableParam>,
    tool: CanonicalTool,
    hook: Option<InvokeHook>,
    aliases: AliasMap,
    validator: Arc<ArgumentValidator>,
}

impl SynthesizedCallable {
    /// Visible name (the normalized tool name).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description, with the `Args:` block when requested.
    #[must_use]
    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// Parameters in declaration order.
    #[must_use]
    pub fn params(&self) -> &[CallableParam] {
        &self.params
    }

    /// Parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&CallableParam> {
        self.params.iter().find(|p| p.name == name)
    }

    /// The canonical tool this callable was built from.
    #[must_use]
    pub fn tool(&self) -> &CanonicalTool {
        &self.tool
    }

    /// Effective alias map (tool aliases plus schema `x-aliases`).
    #[must_use]
    pub fn aliases(&self) -> &AliasMap {
        &self.aliases
    }

    /// Whether an interception hook is installed.
    #[must_use]
    pub fn has_hook(&self) -> bool {
        self.hook.is_some()
    }

    /// Human-readable signature, e.g. `add(*, a: integer, b: optional[integer] = 1)`.
    #[must_use]
    pub fn signature(&self) -> String {
        if self.params.is_empty() {
            return format!("{}()", self.name);
        }
        let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
        format!("{}(*, {})", self.name, params.join(", "))
    }

    /// Declaration `{name, description, parameters}` as this callable
    /// presents itself.
    #[must_use]
    pub fn declaration(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.doc,
            "parameters": self.tool.parameters(),
        })
    }

    /// Invoke with named arguments.
    ///
    /// A tool without a function fails with [`ToolError::NotImplemented`]
    /// before anything else. Otherwise the arguments are reconciled,
    /// validated, completed with declared defaults and passed to the hook
    /// when one is installed, else to the tool function.
    pub fn call(&self, args: Arguments) -> Result<Value, ToolError> {
        if !self.tool.is_implemented() {
            return Err(ToolError::NotImplemented {
                tool: self.name.clone(),
            });
        }
        let mut args = reconcile(args, self.tool.parameters(), &self.aliases);
        self.validator.validate(&self.params, &args)?;
        for param in &self.params {
            if let Some(default) = param.default.as_ref().filter(|d| !d.is_null()) {
                args.entry(param.name.clone()).or_insert_with(|| default.clone());
            }
        }
        debug!(target: "tb.callable", tool = %self.name, hooked = self.hook.is_some(), "invoking tool");
        match &self.hook {
            Some(hook) => hook(&self.tool, args),
            None => self.tool.invoke(args),
        }
    }
}

impl fmt::Debug for SynthesizedCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthesizedCallable")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("hooked", &self.hook.is_some())
            .finish()
    }
}

/// Synthesizes [`SynthesizedCallable`]s, sharing one [`TypeSynthesizer`]
/// (and so one record cache) across every tool it sees.
#[derive(Debug, Clone, Default)]
pub struct CallableSynthesizer {
    types: TypeSynthesizer,
}

impl CallableSynthesizer {
    /// A synthesizer with a private type cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A synthesizer over an existing type synthesizer.
    #[must_use]
    pub fn with_types(types: TypeSynthesizer) -> Self {
        Self { types }
    }

    /// The underlying type synthesizer.
    #[must_use]
    pub fn types(&self) -> &TypeSynthesizer {
        &self.types
    }

    /// Build the callable for `tool`.
    ///
    /// Never fails: parameter types that cannot be synthesized degrade to
    /// untyped maps, and an unimplemented tool still yields a callable that
    /// fails when invoked.
    #[must_use]
    pub fn synthesize(
        &self,
        tool: &CanonicalTool,
        hook: Option<InvokeHook>,
        options: SynthesisOptions,
    ) -> SynthesizedCallable {
        let parameters = tool.parameters();
        let required: Vec<&str> = parameters
            .get("required")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .collect();

        let params = parameters
            .get("properties")
            .and_then(Value::as_object)
            .into_iter()
            .flatten()
            .map(|(name, prop)| {
                let required = required.contains(&name.as_str());
                CallableParam {
                    name: name.clone(),
                    ty: self.types.to_type(prop, parameters),
                    required,
                    default: if required { None } else { prop.get("default").cloned() },
                    description: prop
                        .get("description")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_owned(),
                }
            })
            .collect();

        let mut doc = tool.description().to_owned();
        if options.include_type_docstring {
            doc.push_str(&params_doc(parameters));
        }

        let mut aliases = aliases_from_schema(parameters);
        aliases.extend(tool.aliases().iter().map(|(k, v)| (k.clone(), v.clone())));

        SynthesizedCallable {
            name: tool.name().to_owned(),
            doc,
            params,
            tool: tool.clone(),
            hook,
            aliases,
            validator: Arc::new(ArgumentValidator::new(tool.name(), parameters)),
        }
    }

    /// Build callables for every tool, in order.
    #[must_use]
    pub fn synthesize_all(
        &self,
        tools: &[CanonicalTool],
        hook: Option<&InvokeHook>,
        options: SynthesisOptions,
    ) -> Vec<SynthesizedCallable> {
        tools
            .iter()
            .map(|tool| self.synthesize(tool, hook.cloned(), options))
            .collect()
    }
}
