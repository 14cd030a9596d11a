// SPDX-License-Identifier: MIT OR Apache-2.0
//! Tools from OpenAPI operations and remote tool-set metadata.
//!
//! Metadata comes in four shapes (JSON Schema, MCP `input_schema`, an
//! OpenAPI parameter list, an OpenAPI request body). [`build_args_schema`]
//! turns any of them into one object schema, flattening object request
//! bodies into top-level fields; [`nest_body`] reverses that before a call
//! reaches the [`RemoteToolSet`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod document;
pub mod error;
pub mod meta;
pub mod schema;
pub mod toolset;

pub use document::{OpenApiDocument, Operation, SUPPORTED_METHODS, pick_server_url};
pub use error::OpenApiError;
pub use meta::ToolMeta;
pub use schema::{
    ArgsSchema, BODY_FIELD, JSON_PAYLOAD_KEY, build_args_schema, build_openapi_schema, maybe_body_alias,
    nest_body,
};
pub use toolset::{RemoteToolSet, build_tool_from_meta, tools_from_document, tools_from_toolset};
