// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec errors.

use crate::model::ModelError;
use thiserror::Error;

/// Errors raised while encoding or decoding a value against a type definition.
///
/// Paths are instance paths in wire keys: `/user/tags/0`, root `/`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CodecError {
    #[error("missing required field {path}")]
    MissingField { path: String },

    #[error("null is not allowed at {path}")]
    NullNotAllowed { path: String },

    #[error("expected {expected} at {path}, found {actual}")]
    TypeMismatch {
        path: String,
        expected: String,
        actual: String,
    },

    #[error("maximum depth of {max} exceeded at {path}")]
    DepthExceeded { path: String, max: usize },

    #[error("unknown discriminator value {tag:?} at {path}")]
    UnknownTag { path: String, tag: String },

    #[error("{value:?} is not an allowed enum value at {path}")]
    UnknownEnumValue { path: String, value: String },

    #[error("unresolved type reference {0:?}")]
    UnresolvedRef(String),

    #[error("invalid JSON: {0}")]
    Json(String),

    #[error("invalid value at {path}: {message}")]
    InvalidValue { path: String, message: String },
}

impl CodecError {
    /// Instance path of the offending value, when the error has one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::MissingField { path }
            | Self::NullNotAllowed { path }
            | Self::TypeMismatch { path, .. }
            | Self::DepthExceeded { path, .. }
            | Self::UnknownTag { path, .. }
            | Self::UnknownEnumValue { path, .. }
            | Self::InvalidValue { path, .. } => Some(path),
            Self::UnresolvedRef(_) | Self::Json(_) => None,
        }
    }

    /// Prefix the path with one parent segment.
    ///
    /// Used while unwinding out of nested `from_value` calls.
    #[must_use]
    pub fn at(mut self, segment: &str) -> Self {
        match &mut self {
            Self::MissingField { path }
            | Self::NullNotAllowed { path }
            | Self::TypeMismatch { path, .. }
            | Self::DepthExceeded { path, .. }
            | Self::UnknownTag { path, .. }
            | Self::UnknownEnumValue { path, .. }
            | Self::InvalidValue { path, .. } => {
                *path = if path == "/" {
                    format!("/{segment}")
                } else {
                    format!("/{segment}{path}")
                };
            }
            Self::UnresolvedRef(_) | Self::Json(_) => {}
        }
        self
    }
}

impl From<ModelError> for CodecError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::UnresolvedRef(name) => Self::UnresolvedRef(name),
            other => Self::InvalidValue {
                path: "/".into(),
                message: other.to_string(),
            },
        }
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Path of `key` below `parent`.
pub(crate) fn child_path(parent: &str, key: &str) -> String {
    if parent == "/" {
        format!("/{key}")
    } else {
        format!("{parent}/{key}")
    }
}
