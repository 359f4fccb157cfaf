// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON -> Value.

use super::encode::check_int_range;
use super::{child_path, Codec, CodecError};
use crate::model::{Form, ObjectDef, PrimitiveKind, TypeDef};
use crate::value::{Object, Value};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;

/// Kind label of a JSON value for error messages.
pub(super) fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}

fn mismatch(path: &str, expected: &str, actual: &str) -> CodecError {
    CodecError::TypeMismatch {
        path: path.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}

impl Codec<'_> {
    /// Decode a parsed JSON tree.
    pub fn decode_json(&self, json: Json, def: &TypeDef) -> Result<Value, CodecError> {
        self.decode_node(json, def, "/", 0)
    }

    fn decode_node(
        &self,
        json: Json,
        def: &TypeDef,
        path: &str,
        depth: usize,
    ) -> Result<Value, CodecError> {
        if json.is_null() {
            if def.nullable {
                return Ok(Value::Null);
            }
            if matches!(def.form, Form::Empty) {
                return Ok(Value::Any(Json::Null));
            }
            return Err(CodecError::NullNotAllowed {
                path: path.to_string(),
            });
        }

        match &def.form {
            Form::Ref(name) => self.decode_node(json, self.lookup(name)?, path, depth),
            Form::Empty => Ok(Value::Any(json)),
            Form::Type(kind) => decode_primitive(json, *kind, path),
            Form::Enum(values) => match json {
                Json::String(s) if values.contains(&s) => Ok(Value::String(s)),
                Json::String(s) => Err(CodecError::UnknownEnumValue {
                    path: path.to_string(),
                    value: s,
                }),
                other => Err(mismatch(path, "enum", json_kind(&other))),
            },
            Form::Elements(inner) => match json {
                Json::Array(items) => {
                    let depth = self.enter(depth, path)?;
                    items
                        .into_iter()
                        .enumerate()
                        .map(|(i, item)| {
                            self.decode_node(item, inner, &child_path(path, &i.to_string()), depth)
                        })
                        .collect::<Result<Vec<_>, _>>()
                        .map(Value::Array)
                }
                other => Err(mismatch(path, "array", json_kind(&other))),
            },
            Form::Values(inner) => match json {
                Json::Object(entries) => {
                    let depth = self.enter(depth, path)?;
                    let mut out = BTreeMap::new();
                    for (key, item) in entries {
                        let value = self.decode_node(item, inner, &child_path(path, &key), depth)?;
                        out.insert(key, value);
                    }
                    Ok(Value::Map(out))
                }
                other => Err(mismatch(path, "map", json_kind(&other))),
            },
            Form::Properties(object) => match json {
                Json::Object(entries) => {
                    let depth = self.enter(depth, path)?;
                    self.decode_properties(entries, object, path, depth)
                        .map(Value::Object)
                }
                other => Err(mismatch(path, "object", json_kind(&other))),
            },
            Form::Discriminator(disc) => match json {
                Json::Object(mut entries) => {
                    let key = self.options.key_casing.apply(&disc.key);
                    let tag_path = child_path(path, &key);
                    let tag = match entries.remove(key.as_ref()) {
                        None => return Err(CodecError::MissingField { path: tag_path }),
                        Some(Json::String(tag)) => tag,
                        Some(other) => return Err(mismatch(&tag_path, "string", json_kind(&other))),
                    };
                    let variant = disc.variant(&tag).ok_or_else(|| CodecError::UnknownTag {
                        path: tag_path.clone(),
                        tag: tag.clone(),
                    })?;
                    let depth = self.enter(depth, path)?;
                    let fields = self.decode_properties(entries, variant, path, depth)?;
                    Ok(Value::Union { tag, fields })
                }
                other => Err(mismatch(path, "object", json_kind(&other))),
            },
        }
    }

    /// Declared properties only; remaining wire keys are ignored.
    fn decode_properties(
        &self,
        mut entries: Map<String, Json>,
        object: &ObjectDef,
        path: &str,
        depth: usize,
    ) -> Result<Object, CodecError> {
        let mut out = Object::new();
        for prop in &object.properties {
            let key = self.options.key_casing.apply(&prop.name);
            let field_path = child_path(path, &key);
            match entries.remove(key.as_ref()) {
                None if prop.optional => {}
                None => return Err(CodecError::MissingField { path: field_path }),
                Some(json) => {
                    let value = self.decode_node(json, &prop.def, &field_path, depth)?;
                    out.insert(prop.name.clone(), value);
                }
            }
        }
        Ok(out)
    }
}

fn decode_primitive(json: Json, kind: PrimitiveKind, path: &str) -> Result<Value, CodecError> {
    match (kind, json) {
        (PrimitiveKind::String, Json::String(s)) => Ok(Value::String(s)),
        (PrimitiveKind::Boolean, Json::Bool(b)) => Ok(Value::Bool(b)),
        (PrimitiveKind::Timestamp, Json::String(s)) => parse_timestamp(&s, path),
        (PrimitiveKind::Float32 | PrimitiveKind::Float64, Json::Number(n)) => n
            .as_f64()
            .map(Value::Float)
            .ok_or_else(|| mismatch(path, kind.as_str(), "number")),
        (_, Json::Number(n)) if kind.int_range().is_some() => {
            let parsed = n
                .as_i64()
                .map(i128::from)
                .or_else(|| n.as_u64().map(i128::from))
                .ok_or_else(|| mismatch(path, kind.as_str(), "float"))?;
            integer_value(parsed, kind, path)
        }
        (_, Json::String(s)) if kind.is_stringified() => {
            let parsed: i128 = s
                .parse()
                .map_err(|_| mismatch(path, kind.as_str(), "string"))?;
            integer_value(parsed, kind, path)
        }
        (_, other) => Err(mismatch(path, kind.as_str(), json_kind(&other))),
    }
}

/// Range-check and wrap an integer for `kind`.
pub(super) fn integer_value(n: i128, kind: PrimitiveKind, path: &str) -> Result<Value, CodecError> {
    check_int_range(n, kind, path)?;
    let value = match kind {
        PrimitiveKind::Uint8 | PrimitiveKind::Uint16 | PrimitiveKind::Uint32 | PrimitiveKind::Uint64 => {
            u64::try_from(n).map(Value::Uint)
        }
        _ => i64::try_from(n).map(Value::Int),
    };
    value.map_err(|_| CodecError::InvalidValue {
        path: path.to_string(),
        message: format!("{n} is out of range for {kind}"),
    })
}

pub(super) fn parse_timestamp(s: &str, path: &str) -> Result<Value, CodecError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| Value::Timestamp(t.with_timezone(&Utc)))
        .map_err(|_| mismatch(path, "timestamp", "string"))
}
