// SPDX-License-Identifier: MIT OR Apache-2.0
//! Unified error taxonomy with stable error codes for toolbridge.
//!
//! Every bridge error carries an [`ErrorCode`] (a machine-readable, stable
//! string tag), a human-readable message, an optional cause chain, and
//! arbitrary key-value context. Use [`BridgeError::new`] and the `with_*`
//! builders to construct errors fluently.
//!
//! Crate-local error enums elsewhere in the workspace convert into
//! [`BridgeError`] so that callers integrating several layers see one shape.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// ErrorCategory
// ---------------------------------------------------------------------------

/// Broad family that an [`ErrorCode`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// JSON-Schema shape and `$ref` problems.
    Schema,
    /// Structured type synthesis.
    Synthesis,
    /// Invoking a canonical tool.
    Tool,
    /// Adapter lookup and framework conversion.
    Adapter,
    /// Model connection info.
    Model,
    /// Canonical message shape.
    Message,
    /// OpenAPI metadata and documents.
    OpenApi,
    /// Sandbox collaborator failures.
    Sandbox,
    /// Configuration errors.
    Config,
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Schema => "schema",
            Self::Synthesis => "synthesis",
            Self::Tool => "tool",
            Self::Adapter => "adapter",
            Self::Model => "model",
            Self::Message => "message",
            Self::OpenApi => "openapi",
            Self::Sandbox => "sandbox",
            Self::Config => "config",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Machine-readable, stable error code.
///
/// Each variant serialises to a `SCREAMING_SNAKE_CASE` string that does not
/// change across patch releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // -- Schema --
    /// Schema is not a JSON object or has an unusable shape.
    SchemaInvalid,
    /// A `$ref` pointer could not be resolved against the root schema.
    SchemaRefUnresolved,

    // -- Synthesis --
    /// Building a structured record type failed.
    SynthesisFailed,

    // -- Tool --
    /// The canonical tool has no backing function.
    ToolNotImplemented,
    /// Arguments failed required-field or type validation.
    ToolInvalidArguments,
    /// The backing function returned an error.
    ToolExecutionFailed,

    // -- Adapter --
    /// No adapter is registered for the requested framework.
    AdapterNotFound,
    /// An adapter could not convert a canonical value.
    AdapterConversionFailed,

    // -- Model --
    /// Model connection info lacks a required field (e.g. `base_url`).
    ModelInfoIncomplete,

    // -- Message --
    /// A framework message could not be mapped to the canonical form.
    MessageInvalid,

    // -- OpenAPI --
    /// OpenAPI document or operation metadata is malformed.
    OpenapiInvalid,

    // -- Sandbox --
    /// The sandbox session could not be created.
    SandboxUnavailable,
    /// A sandbox operation failed.
    SandboxOperationFailed,

    // -- Config --
    /// Configuration file or value is invalid.
    ConfigInvalid,

    // -- Internal --
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl ErrorCode {
    /// Returns the broad [`ErrorCategory`] this code belongs to.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::SchemaInvalid | Self::SchemaRefUnresolved => ErrorCategory::Schema,
            Self::SynthesisFailed => ErrorCategory::Synthesis,
            Self::ToolNotImplemented | Self::ToolInvalidArguments | Self::ToolExecutionFailed => {
                ErrorCategory::Tool
            }
            Self::AdapterNotFound | Self::AdapterConversionFailed => ErrorCategory::Adapter,
            Self::ModelInfoIncomplete => ErrorCategory::Model,
            Self::MessageInvalid => ErrorCategory::Message,
            Self::OpenapiInvalid => ErrorCategory::OpenApi,
            Self::SandboxUnavailable | Self::SandboxOperationFailed => ErrorCategory::Sandbox,
            Self::ConfigInvalid => ErrorCategory::Config,
            Self::Internal => ErrorCategory::Internal,
        }
    }

    /// Stable `&'static str` representation of the code (e.g.
    /// `"TOOL_INVALID_ARGUMENTS"`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SchemaInvalid => "SCHEMA_INVALID",
            Self::SchemaRefUnresolved => "SCHEMA_REF_UNRESOLVED",
            Self::SynthesisFailed => "SYNTHESIS_FAILED",
            Self::ToolNotImplemented => "TOOL_NOT_IMPLEMENTED",
            Self::ToolInvalidArguments => "TOOL_INVALID_ARGUMENTS",
            Self::ToolExecutionFailed => "TOOL_EXECUTION_FAILED",
            Self::AdapterNotFound => "ADAPTER_NOT_FOUND",
            Self::AdapterConversionFailed => "ADAPTER_CONVERSION_FAILED",
            Self::ModelInfoIncomplete => "MODEL_INFO_INCOMPLETE",
            Self::MessageInvalid => "MESSAGE_INVALID",
            Self::OpenapiInvalid => "OPENAPI_INVALID",
            Self::SandboxUnavailable => "SANDBOX_UNAVAILABLE",
            Self::SandboxOperationFailed => "SANDBOX_OPERATION_FAILED",
            Self::ConfigInvalid => "CONFIG_INVALID",
            Self::Internal => "INTERNAL",
        }
    }

    /// Whether an agent loop may reasonably retry after this error.
    ///
    /// Argument errors are retryable because the caller can correct the
    /// arguments; missing implementations and adapters are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ToolInvalidArguments | Self::SandboxUnavailable | Self::SandboxOperationFailed
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// BridgeError
// ---------------------------------------------------------------------------

/// Unified toolbridge error.
///
/// # Builder usage
///
/// ```
/// use tb_error::{BridgeError, ErrorCode};
///
/// let err = BridgeError::new(ErrorCode::AdapterNotFound, "no adapter for 'crewai'")
///     .with_context("framework", "crewai");
/// assert_eq!(err.code, ErrorCode::AdapterNotFound);
/// ```
pub struct BridgeError {
    /// Machine-readable error code.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Optional underlying cause.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Arbitrary structured context for diagnostics.
    pub context: BTreeMap<String, serde_json::Value>,
}

impl BridgeError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
            context: BTreeMap::new(),
        }
    }

    /// Attach a key-value pair to the diagnostic context.
    ///
    /// The value is converted via [`serde_json::to_value`]; if serialisation
    /// fails, the entry is skipped.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Attach an underlying cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Shorthand for `self.code.category()`.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }

    /// Render the error as the `{"error": message}` payload that tool
    /// results use to surface failures as content.
    #[must_use]
    pub fn to_error_payload(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.message })
    }
}

impl fmt::Debug for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("BridgeError");
        d.field("code", &self.code);
        d.field("message", &self.message);
        if let Some(ref src) = self.source {
            d.field("source", &src.to_string());
        }
        if !self.context.is_empty() {
            d.field("context", &self.context);
        }
        d.finish()
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)?;
        if !self.context.is_empty() {
            if let Ok(ctx) = serde_json::to_string(&self.context) {
                write!(f, " {ctx}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for BridgeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::new(ErrorCode::SchemaInvalid, err.to_string()).with_source(err)
    }
}

// ---------------------------------------------------------------------------
// Serialization support
// ---------------------------------------------------------------------------

/// Serialisable snapshot of a [`BridgeError`] (without the opaque source).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BridgeErrorDto {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Structured context.
    pub context: BTreeMap<String, serde_json::Value>,
    /// String representation of the source error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_message: Option<String>,
}

impl From<&BridgeError> for BridgeErrorDto {
    fn from(err: &BridgeError) -> Self {
        Self {
            code: err.code,
            message: err.message.clone(),
            context: err.context.clone(),
            source_message: err.source.as_ref().map(|s| s.to_string()),
        }
    }
}

impl From<BridgeErrorDto> for BridgeError {
    fn from(dto: BridgeErrorDto) -> Self {
        Self {
            code: dto.code,
            message: dto.message,
            source: None,
            context: dto.context,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
