// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Value -> JSON.

use super::{child_path, Codec, CodecError};
use crate::model::{Form, ObjectDef, PrimitiveKind, TypeDef};
use crate::value::{Object, Value};
use chrono::SecondsFormat;
use serde_json::{Map, Number, Value as Json};

impl Codec<'_> {
    /// Encode to a JSON tree.
    pub fn encode_json(&self, value: &Value, def: &TypeDef) -> Result<Json, CodecError> {
        self.encode_node(value, def, "/", 0)
    }

    fn encode_node(
        &self,
        value: &Value,
        def: &TypeDef,
        path: &str,
        depth: usize,
    ) -> Result<Json, CodecError> {
        match value {
            Value::Absent => {
                return Err(CodecError::MissingField {
                    path: path.to_string(),
                })
            }
            Value::Null if def.nullable => return Ok(Json::Null),
            Value::Null if !matches!(def.form, Form::Empty) => {
                return Err(CodecError::NullNotAllowed {
                    path: path.to_string(),
                })
            }
            _ => {}
        }

        match &def.form {
            Form::Ref(name) => self.encode_node(value, self.lookup(name)?, path, depth),
            Form::Empty => match value {
                Value::Any(json) => Ok(json.clone()),
                Value::Null => Ok(Json::Null),
                other => Err(mismatch(path, "any", other)),
            },
            Form::Type(kind) => encode_primitive(value, *kind, path),
            Form::Enum(values) => match value {
                Value::String(s) if values.contains(s) => Ok(Json::String(s.clone())),
                Value::String(s) => Err(CodecError::UnknownEnumValue {
                    path: path.to_string(),
                    value: s.clone(),
                }),
                other => Err(mismatch(path, "enum", other)),
            },
            Form::Elements(inner) => match value {
                Value::Array(items) => {
                    let depth = self.enter(depth, path)?;
                    items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| {
                            self.encode_node(item, inner, &child_path(path, &i.to_string()), depth)
                        })
                        .collect::<Result<Vec<_>, _>>()
                        .map(Json::Array)
                }
                other => Err(mismatch(path, "array", other)),
            },
            Form::Values(inner) => match value {
                Value::Map(entries) => {
                    let depth = self.enter(depth, path)?;
                    let mut out = Map::new();
                    for (key, item) in entries {
                        let json = self.encode_node(item, inner, &child_path(path, key), depth)?;
                        out.insert(key.clone(), json);
                    }
                    Ok(Json::Object(out))
                }
                other => Err(mismatch(path, "map", other)),
            },
            Form::Properties(object) => match value {
                Value::Object(fields) => {
                    let depth = self.enter(depth, path)?;
                    let mut out = Map::new();
                    self.encode_properties(fields, object, path, depth, &mut out)?;
                    Ok(Json::Object(out))
                }
                other => Err(mismatch(path, "object", other)),
            },
            Form::Discriminator(disc) => match value {
                Value::Union { tag, fields } => {
                    let variant = disc.variant(tag).ok_or_else(|| CodecError::UnknownTag {
                        path: path.to_string(),
                        tag: tag.clone(),
                    })?;
                    let depth = self.enter(depth, path)?;
                    let mut out = Map::new();
                    out.insert(
                        self.options.key_casing.apply(&disc.key).into_owned(),
                        Json::String(tag.clone()),
                    );
                    self.encode_properties(fields, variant, path, depth, &mut out)?;
                    Ok(Json::Object(out))
                }
                other => Err(mismatch(path, "union", other)),
            },
        }
    }

    fn encode_properties(
        &self,
        fields: &Object,
        object: &ObjectDef,
        path: &str,
        depth: usize,
        out: &mut Map<String, Json>,
    ) -> Result<(), CodecError> {
        for prop in &object.properties {
            let key = self.options.key_casing.apply(&prop.name);
            let field_path = child_path(path, &key);
            let field = fields.get(&prop.name);
            if field.is_absent() {
                if prop.optional {
                    continue;
                }
                return Err(CodecError::MissingField { path: field_path });
            }
            let json = self.encode_node(field, &prop.def, &field_path, depth)?;
            out.insert(key.into_owned(), json);
        }
        Ok(())
    }
}

fn mismatch(path: &str, expected: &str, actual: &Value) -> CodecError {
    CodecError::TypeMismatch {
        path: path.to_string(),
        expected: expected.to_string(),
        actual: actual.kind().to_string(),
    }
}

#[allow(clippy::cast_precision_loss)]
fn encode_primitive(value: &Value, kind: PrimitiveKind, path: &str) -> Result<Json, CodecError> {
    match (kind, value) {
        (PrimitiveKind::String, Value::String(s)) => Ok(Json::String(s.clone())),
        (PrimitiveKind::Boolean, Value::Bool(b)) => Ok(Json::Bool(*b)),
        (PrimitiveKind::Timestamp, Value::Timestamp(t)) => {
            Ok(Json::String(t.to_rfc3339_opts(SecondsFormat::Millis, true)))
        }
        (PrimitiveKind::Float32 | PrimitiveKind::Float64, Value::Float(f)) => encode_float(*f, path),
        (PrimitiveKind::Float32 | PrimitiveKind::Float64, Value::Int(i)) => encode_float(*i as f64, path),
        (PrimitiveKind::Float32 | PrimitiveKind::Float64, Value::Uint(u)) => encode_float(*u as f64, path),
        (_, Value::Int(i)) if kind.int_range().is_some() => encode_integer(i128::from(*i), kind, path),
        (_, Value::Uint(u)) if kind.int_range().is_some() => encode_integer(i128::from(*u), kind, path),
        (_, other) => Err(mismatch(path, kind.as_str(), other)),
    }
}

fn encode_float(f: f64, path: &str) -> Result<Json, CodecError> {
    Number::from_f64(f)
        .map(Json::Number)
        .ok_or_else(|| CodecError::InvalidValue {
            path: path.to_string(),
            message: format!("{f} is not a finite number"),
        })
}

fn encode_integer(n: i128, kind: PrimitiveKind, path: &str) -> Result<Json, CodecError> {
    check_int_range(n, kind, path)?;
    if kind.is_stringified() {
        return Ok(Json::String(n.to_string()));
    }
    let number = match i64::try_from(n) {
        Ok(signed) => Number::from(signed),
        Err(_) => Number::from(u64::try_from(n).map_err(|_| out_of_range(n, kind, path))?),
    };
    Ok(Json::Number(number))
}

fn out_of_range(n: i128, kind: PrimitiveKind, path: &str) -> CodecError {
    CodecError::InvalidValue {
        path: path.to_string(),
        message: format!("{n} is out of range for {kind}"),
    }
}

/// Reject integers outside the range of `kind`.
pub(super) fn check_int_range(n: i128, kind: PrimitiveKind, path: &str) -> Result<(), CodecError> {
    match kind.int_range() {
        Some((min, max)) if n < min || n > max => Err(out_of_range(n, kind, path)),
        _ => Ok(()),
    }
}
