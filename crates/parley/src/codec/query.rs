// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Query-string decoding.
//!
//! Query parameters are flat: each declared property is one key, matched
//! through the key casing. Convention:
//!
//! - scalar: `limit=10`
//! - flat array: `tag=a&tag=b` or `tag[]=a&tag[]=b`
//! - explicit null on a nullable leaf: `cursor=null`
//! - a missing key follows the optional rule
//!
//! Only scalars and flat arrays of scalars are representable;
//! [`check_query_compatible`] rejects everything else at registration.

use super::decode::{integer_value, parse_timestamp};
use super::{child_path, Codec, CodecError};
use crate::model::{Definitions, Form, PrimitiveKind, TypeDef};
use crate::value::{Object, Value};

const NULL_LITERAL: &str = "null";

impl Codec<'_> {
    /// Decode query pairs against a record definition.
    pub fn decode_query(
        &self,
        pairs: &[(String, String)],
        def: &TypeDef,
    ) -> Result<Value, CodecError> {
        let root = self.definitions.resolve(def)?;
        let Form::Properties(object) = &root.form else {
            return Err(CodecError::TypeMismatch {
                path: "/".into(),
                expected: "object".into(),
                actual: root.kind_name(),
            });
        };

        let mut out = Object::new();
        for prop in &object.properties {
            let key = self.options.key_casing.apply(&prop.name);
            let path = child_path("/", &key);
            let raw: Vec<&str> = pairs
                .iter()
                .filter(|(k, _)| k == key.as_ref() || k.strip_suffix("[]") == Some(key.as_ref()))
                .map(|(_, v)| v.as_str())
                .collect();
            if raw.is_empty() {
                if prop.optional {
                    continue;
                }
                return Err(CodecError::MissingField { path });
            }
            let value = self.query_value(&raw, &prop.def, &path)?;
            out.insert(prop.name.clone(), value);
        }
        Ok(Value::Object(out))
    }

    fn query_value(&self, raw: &[&str], def: &TypeDef, path: &str) -> Result<Value, CodecError> {
        let target = self.definitions.resolve(def)?;
        let nullable = def.nullable || target.nullable;
        match &target.form {
            Form::Elements(inner) => {
                if nullable && raw == [NULL_LITERAL] {
                    return Ok(Value::Null);
                }
                raw.iter()
                    .enumerate()
                    .map(|(i, s)| self.query_scalar(s, inner, &child_path(path, &i.to_string())))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Array)
            }
            _ => self.query_scalar(raw[0], def, path),
        }
    }

    fn query_scalar(&self, s: &str, def: &TypeDef, path: &str) -> Result<Value, CodecError> {
        let target = self.definitions.resolve(def)?;
        if s == NULL_LITERAL && (def.nullable || target.nullable) {
            return Ok(Value::Null);
        }
        match &target.form {
            Form::Type(kind) => coerce(s, *kind, path),
            Form::Enum(values) if values.iter().any(|v| v == s) => Ok(Value::String(s.to_string())),
            Form::Enum(_) => Err(CodecError::UnknownEnumValue {
                path: path.to_string(),
                value: s.to_string(),
            }),
            _ => Err(CodecError::TypeMismatch {
                path: path.to_string(),
                expected: target.kind_name(),
                actual: "string".into(),
            }),
        }
    }
}

/// Scalar coercion of one query value.
fn coerce(s: &str, kind: PrimitiveKind, path: &str) -> Result<Value, CodecError> {
    let mismatch = || CodecError::TypeMismatch {
        path: path.to_string(),
        expected: kind.as_str().to_string(),
        actual: "string".into(),
    };
    match kind {
        PrimitiveKind::String => Ok(Value::String(s.to_string())),
        PrimitiveKind::Boolean => match s {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(mismatch()),
        },
        PrimitiveKind::Timestamp => parse_timestamp(s, path),
        PrimitiveKind::Float32 | PrimitiveKind::Float64 => s
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Value::Float)
            .ok_or_else(mismatch),
        _ => {
            let n: i128 = s.parse().map_err(|_| mismatch())?;
            integer_value(n, kind, path)
        }
    }
}

/// Check that `def` can be carried in a query string.
///
/// Returns the instance path of the first property that cannot.
pub fn check_query_compatible(definitions: &Definitions, def: &TypeDef) -> Result<(), String> {
    let root = definitions.resolve(def).map_err(|_| "/".to_string())?;
    let Form::Properties(object) = &root.form else {
        return Err("/".to_string());
    };
    for prop in &object.properties {
        let path = child_path("/", &prop.name);
        let target = definitions.resolve(&prop.def).map_err(|_| path.clone())?;
        let ok = match &target.form {
            Form::Type(_) | Form::Enum(_) => true,
            Form::Elements(inner) => matches!(
                definitions.resolve(inner).map(|d| &d.form),
                Ok(Form::Type(_) | Form::Enum(_))
            ),
            _ => false,
        };
        if !ok {
            return Err(path);
        }
    }
    Ok(())
}
