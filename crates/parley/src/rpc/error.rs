// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for registration and request handling.

use crate::codec::CodecError;
use crate::introspect::Role;
use crate::model::ModelError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Result type for procedure handlers.
pub type RpcResult<T> = Result<T, RpcError>;

/// Structured request error, sent to clients as `{code, message, data?}`.
///
/// `code` is also the HTTP status of the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{message} ({code})")]
pub struct RpcError {
    pub code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl RpcError {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(401, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(403, message)
    }

    pub fn not_found() -> Self {
        Self::new(404, "Not found")
    }

    /// Generic server error; carries no internals.
    pub fn internal() -> Self {
        Self::new(500, "Internal server error")
    }

    /// HTTP status for this error; codes outside 400..=599 become 500.
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code)
            .ok()
            .filter(|s| s.is_client_error() || s.is_server_error())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<CodecError> for RpcError {
    fn from(err: CodecError) -> Self {
        let error = Self::bad_request(err.to_string());
        match err.path() {
            Some(path) => error.with_data(json!({ "path": path })),
            None => error,
        }
    }
}

/// Configuration errors raised while registering procedures.
///
/// These are programmer mistakes: startup must abort on them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("procedure {procedure}: {role} must be a named record (for example {suggested}), found an anonymous record")]
    AnonymousRoot {
        procedure: String,
        role: Role,
        suggested: String,
    },

    #[error("procedure {procedure}: {role} must be a record, found {kind}")]
    NonRecordRoot {
        procedure: String,
        role: Role,
        kind: String,
    },

    #[error("standalone definitions must be named records or unions, found {kind}")]
    InvalidDefinition { kind: String },

    #[error("unsupported type {kind} at {path}")]
    Unsupported { kind: String, path: String },

    #[error("optional wrapper at {path} is only allowed directly on a record field")]
    MisplacedOptional { path: String },

    #[error("procedure {procedure}: query parameter {path} must be a scalar or a flat array of scalars")]
    NestedQueryParameter { procedure: String, path: String },

    #[error("procedure {0:?} is already registered")]
    DuplicateProcedure(String),

    #[error("route {path} is already used by {existing}")]
    DuplicateRoute { path: String, existing: String },

    #[error("invalid procedure name {0:?}")]
    InvalidName(String),

    #[error("invalid path {0:?}: must start with '/'")]
    InvalidPath(String),

    #[error(transparent)]
    Model(#[from] ModelError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_error_becomes_bad_request_with_path() {
        let err: RpcError = CodecError::MissingField {
            path: "/name".into(),
        }
        .into();
        assert_eq!(err.code, 400);
        assert_eq!(err.data, Some(json!({"path": "/name"})));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_status_falls_back_to_500() {
        assert_eq!(RpcError::new(200, "ok?").status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(RpcError::new(42, "nope").status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(RpcError::new(418, "teapot").status(), StatusCode::IM_A_TEAPOT);
    }

    #[test]
    fn test_serialized_shape() {
        let body = serde_json::to_value(RpcError::not_found()).expect("serialize");
        assert_eq!(body, json!({"code": 404, "message": "Not found"}));
        let body = serde_json::to_value(RpcError::bad_request("bad").with_data(json!([1])))
            .expect("serialize");
        assert_eq!(body, json!({"code": 400, "message": "bad", "data": [1]}));
    }
}
