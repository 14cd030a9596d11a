// SPDX-License-Identifier: MIT OR Apache-2.0
//! Errors raised when invoking a tool.

use tb_error::{BridgeError, ErrorCode};

/// Failure while invoking a canonical tool or a callable synthesized from it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    /// The tool was declared without a backing function.
    #[error("Tool function for '{tool}' is not implemented.")]
    NotImplemented {
        /// Normalized tool name.
        tool: String,
    },

    /// Arguments failed required-field or type validation.
    #[error("Invalid arguments for tool '{tool}': {cause}")]
    InvalidArguments {
        /// Normalized tool name.
        tool: String,
        /// Offending field names, possibly empty when the whole payload is bad.
        fields: Vec<String>,
        /// Human-readable validation cause.
        cause: String,
    },

    /// The backing function reported a failure.
    #[error("Tool '{tool}' failed: {message}")]
    Execution {
        /// Normalized tool name.
        tool: String,
        /// Failure message from the function.
        message: String,
    },
}

impl ToolError {
    /// Shorthand for [`ToolError::Execution`].
    pub fn execution(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Execution {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Name of the tool the error belongs to.
    #[must_use]
    pub fn tool(&self) -> &str {
        match self {
            Self::NotImplemented { tool }
            | Self::InvalidArguments { tool, .. }
            | Self::Execution { tool, .. } => tool,
        }
    }

    /// Stable error code for this failure.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotImplemented { .. } => ErrorCode::ToolNotImplemented,
            Self::InvalidArguments { .. } => ErrorCode::ToolInvalidArguments,
            Self::Execution { .. } => ErrorCode::ToolExecutionFailed,
        }
    }
}

impl From<ToolError> for BridgeError {
    fn from(err: ToolError) -> Self {
        let mut out = BridgeError::new(err.code(), err.to_string()).with_context("tool", err.tool());
        if let ToolError::InvalidArguments { fields, .. } = &err {
            if !fields.is_empty() {
                out = out.with_context("fields", fields);
            }
        }
        out
    }
}
