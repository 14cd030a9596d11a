// SPDX-License-Identifier: MIT OR Apache-2.0
//! Canonical types for toolbridge.
//!
//! Every framework conversion goes through the types in this crate:
//! [`CanonicalTool`], [`CanonicalMessage`], [`CanonicalToolCall`] and
//! [`CanonicalModelResponse`]. Tools are authored with [`Tool`], and model
//! connection details arrive as [`ModelInfo`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod canonical;
pub mod error;
pub mod model;
pub mod naming;
pub mod parameter;
pub mod tool;

pub use canonical::{
    AliasMap, Arguments, CanonicalMessage, CanonicalModelResponse, CanonicalTool, CanonicalToolCall,
    MessageRole, ToolFn, generate_call_id, parse_arguments, tool_fn,
};
pub use error::ToolError;
pub use model::{ModelInfo, ModelInfoSource};
pub use naming::{MAX_TOOL_NAME_LEN, TOOL_NAME_HEAD_LEN, normalize_tool_name, sanitize_identifier};
pub use parameter::{ParamType, ToolParameter, parameters_from_schema, schema_from_parameters};
pub use tool::Tool;
