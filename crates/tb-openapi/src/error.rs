// SPDX-License-Identifier: MIT OR Apache-2.0
//! OpenAPI document errors.

use tb_error::{BridgeError, ErrorCode};

/// Failure while reading an OpenAPI document.
#[derive(Debug, thiserror::Error)]
pub enum OpenApiError {
    /// The document is not valid JSON.
    #[error("OpenAPI document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The document root is not an object.
    #[error("OpenAPI document root must be an object")]
    NotAnObject,

    /// `paths` is present but not an object.
    #[error("OpenAPI 'paths' must be an object")]
    InvalidPaths,
}

impl From<OpenApiError> for BridgeError {
    fn from(err: OpenApiError) -> Self {
        let message = err.to_string();
        match err {
            OpenApiError::Json(source) => {
                BridgeError::new(ErrorCode::OpenapiInvalid, message).with_source(source)
            }
            _ => BridgeError::new(ErrorCode::OpenapiInvalid, message),
        }
    }
}
