// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime values exchanged between typed handlers and the codec.
//!
//! The codec never sees Rust types directly: handlers' types convert to and
//! from [`Value`] through [`Model`], and the codec checks values against a
//! [`TypeDef`](crate::model::TypeDef). `Absent` and `Null` are distinct
//! variants so the four presence states of a field survive the trip.

mod impls;
mod presence;

pub use presence::{Field, Optional};

use crate::codec::CodecError;
use crate::introspect::Shape;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A type with a declared shape and a lossless mapping to [`Value`].
///
/// Usually derived with `#[derive(Model)]`.
pub trait Model: Sized + Send + Sync + 'static {
    /// Declared structure, walked once at registration.
    fn shape() -> Shape;

    fn to_value(&self) -> Value;

    /// Rebuild from a value the codec has already checked against
    /// [`shape`](Model::shape).
    fn from_value(value: Value) -> Result<Self, CodecError>;
}

/// A decoded or to-be-encoded value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// The key is missing.
    #[default]
    Absent,
    /// The key is present with an explicit null.
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Array(Vec<Value>),
    Map(BTreeMap<String, Value>),
    Object(Object),
    /// Variant `tag` of a discriminated union with its own fields.
    Union { tag: String, fields: Object },
    /// Opaque JSON.
    Any(serde_json::Value),
}

impl Value {
    /// Kind label used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Absent => "absent",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) | Self::Uint(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Timestamp(_) => "timestamp",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
            Self::Union { .. } => "union",
            Self::Any(_) => "any",
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Error for a value that does not have the expected kind.
    pub fn mismatch(&self, expected: &str) -> CodecError {
        CodecError::TypeMismatch {
            path: "/".into(),
            expected: expected.into(),
            actual: self.kind().into(),
        }
    }

    pub fn into_object(self) -> Result<Object, CodecError> {
        match self {
            Self::Object(object) => Ok(object),
            other => Err(other.mismatch("object")),
        }
    }

    /// Split a union value into tag and fields.
    pub fn into_union(self) -> Result<(String, Object), CodecError> {
        match self {
            Self::Union { tag, fields } => Ok((tag, fields)),
            other => Err(other.mismatch("union")),
        }
    }
}

/// Fields of a record value, keyed by declared name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Object {
    fields: BTreeMap<String, Value>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Builder-style [`insert`](Object::insert).
    pub fn with(mut self, name: impl Into<String>, value: Value) -> Self {
        self.insert(name, value);
        self
    }

    /// Field value, [`Value::Absent`] when missing.
    pub fn get(&self, name: &str) -> &Value {
        self.fields.get(name).unwrap_or(&Value::Absent)
    }

    /// Move a field out, [`Value::Absent`] when missing.
    pub fn take(&mut self, name: &str) -> Value {
        self.fields.remove(name).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Self::Object(object)
    }
}
