// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! [`Model`] for standard types.

use super::{Model, Value};
use crate::codec::CodecError;
use crate::introspect::Shape;
use crate::model::PrimitiveKind;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

fn out_of_range(value: impl std::fmt::Display, kind: PrimitiveKind) -> CodecError {
    CodecError::InvalidValue {
        path: "/".into(),
        message: format!("{value} is out of range for {kind}"),
    }
}

macro_rules! impl_signed {
    ($($t:ty => $kind:ident),* $(,)?) => {
        $(
            impl Model for $t {
                fn shape() -> Shape {
                    Shape::Primitive(PrimitiveKind::$kind)
                }

                fn to_value(&self) -> Value {
                    Value::Int(i64::from(*self))
                }

                fn from_value(value: Value) -> Result<Self, CodecError> {
                    match value {
                        Value::Int(v) => <$t>::try_from(v)
                            .map_err(|_| out_of_range(v, PrimitiveKind::$kind)),
                        Value::Uint(v) => <$t>::try_from(v)
                            .map_err(|_| out_of_range(v, PrimitiveKind::$kind)),
                        other => Err(other.mismatch(PrimitiveKind::$kind.as_str())),
                    }
                }
            }
        )*
    };
}

macro_rules! impl_unsigned {
    ($($t:ty => $kind:ident),* $(,)?) => {
        $(
            impl Model for $t {
                fn shape() -> Shape {
                    Shape::Primitive(PrimitiveKind::$kind)
                }

                fn to_value(&self) -> Value {
                    Value::Uint(u64::from(*self))
                }

                fn from_value(value: Value) -> Result<Self, CodecError> {
                    match value {
                        Value::Uint(v) => <$t>::try_from(v)
                            .map_err(|_| out_of_range(v, PrimitiveKind::$kind)),
                        Value::Int(v) => <$t>::try_from(v)
                            .map_err(|_| out_of_range(v, PrimitiveKind::$kind)),
                        other => Err(other.mismatch(PrimitiveKind::$kind.as_str())),
                    }
                }
            }
        )*
    };
}

impl_signed!(i8 => Int8, i16 => Int16, i32 => Int32, i64 => Int64);
impl_unsigned!(u8 => Uint8, u16 => Uint16, u32 => Uint32, u64 => Uint64);

impl Model for f64 {
    fn shape() -> Shape {
        Shape::Primitive(PrimitiveKind::Float64)
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }

    #[allow(clippy::cast_precision_loss)]
    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Int(v) => Ok(v as f64),
            Value::Uint(v) => Ok(v as f64),
            other => Err(other.mismatch("float64")),
        }
    }
}

impl Model for f32 {
    fn shape() -> Shape {
        Shape::Primitive(PrimitiveKind::Float32)
    }

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn from_value(value: Value) -> Result<Self, CodecError> {
        f64::from_value(value).map(|v| v as f32)
    }
}

impl Model for bool {
    fn shape() -> Shape {
        Shape::Primitive(PrimitiveKind::Boolean)
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(other.mismatch("boolean")),
        }
    }
}

impl Model for String {
    fn shape() -> Shape {
        Shape::Primitive(PrimitiveKind::String)
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::String(v) => Ok(v),
            other => Err(other.mismatch("string")),
        }
    }
}

impl Model for DateTime<Utc> {
    fn shape() -> Shape {
        Shape::Primitive(PrimitiveKind::Timestamp)
    }

    fn to_value(&self) -> Value {
        Value::Timestamp(*self)
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Timestamp(v) => Ok(v),
            other => Err(other.mismatch("timestamp")),
        }
    }
}

impl<T: Model> Model for Vec<T> {
    fn shape() -> Shape {
        Shape::Array(Box::new(T::shape()))
    }

    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(Model::to_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| T::from_value(item).map_err(|e| e.at(&i.to_string())))
                .collect(),
            other => Err(other.mismatch("array")),
        }
    }
}

impl<T: Model> Model for BTreeMap<String, T> {
    fn shape() -> Shape {
        Shape::Map(Box::new(T::shape()))
    }

    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_value()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| T::from_value(v).map(|v| (k.clone(), v)).map_err(|e| e.at(&k)))
                .collect(),
            other => Err(other.mismatch("map")),
        }
    }
}

impl<T: Model> Model for HashMap<String, T> {
    fn shape() -> Shape {
        Shape::Map(Box::new(T::shape()))
    }

    fn to_value(&self) -> Value {
        Value::Map(
            self.iter()
                .map(|(k, v)| (k.clone(), v.to_value()))
                .collect(),
        )
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        BTreeMap::<String, T>::from_value(value).map(|m| m.into_iter().collect())
    }
}

impl<T: Model> Model for Box<T> {
    fn shape() -> Shape {
        T::shape()
    }

    fn to_value(&self) -> Value {
        (**self).to_value()
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        T::from_value(value).map(Box::new)
    }
}

/// Opaque JSON passes through the codec untouched.
impl Model for serde_json::Value {
    fn shape() -> Shape {
        Shape::Any
    }

    fn to_value(&self) -> Value {
        Value::Any(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Any(v) => Ok(v),
            Value::Null | Value::Absent => Ok(serde_json::Value::Null),
            other => Err(other.mismatch("any")),
        }
    }
}

/// No params or no response.
impl Model for () {
    fn shape() -> Shape {
        Shape::Unit
    }

    fn to_value(&self) -> Value {
        Value::Absent
    }

    fn from_value(_value: Value) -> Result<Self, CodecError> {
        Ok(())
    }
}

macro_rules! impl_unsupported {
    ($($t:ty),* $(,)?) => {
        $(
            /// No wire mapping; registering a type that contains it fails.
            impl Model for $t {
                fn shape() -> Shape {
                    Shape::Unsupported(stringify!($t))
                }

                fn to_value(&self) -> Value {
                    Value::String(self.to_string())
                }

                fn from_value(value: Value) -> Result<Self, CodecError> {
                    match value {
                        Value::String(s) => s.parse().map_err(|_| CodecError::InvalidValue {
                            path: "/".into(),
                            message: format!("{s:?} is not a valid {}", stringify!($t)),
                        }),
                        other => Err(other.mismatch(stringify!($t))),
                    }
                }
            }
        )*
    };
}

impl_unsupported!(i128, u128);
