// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Presence wrappers for record fields.
//!
//! | Rust field type | wire key may be missing | wire value may be null |
//! |-----------------|-------------------------|------------------------|
//! | `T`             | no                      | no                     |
//! | `Option<T>`     | no                      | yes                    |
//! | `Optional<T>`   | yes                     | no                     |
//! | `Field<T>`      | yes                     | yes                    |

use super::{Model, Value};
use crate::codec::CodecError;
use crate::introspect::Shape;

/// A field whose key may be omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Optional<T> {
    #[default]
    Absent,
    Present(T),
}

impl<T> Optional<T> {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn as_ref(&self) -> Optional<&T> {
        match self {
            Self::Absent => Optional::Absent,
            Self::Present(v) => Optional::Present(v),
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Absent => None,
            Self::Present(v) => Some(v),
        }
    }
}

impl<T> From<T> for Optional<T> {
    fn from(value: T) -> Self {
        Self::Present(value)
    }
}

impl<T: Model> Model for Optional<T> {
    fn shape() -> Shape {
        Shape::Optional(Box::new(T::shape()))
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Absent => Value::Absent,
            Self::Present(v) => v.to_value(),
        }
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Absent => Ok(Self::Absent),
            other => T::from_value(other).map(Self::Present),
        }
    }
}

/// A field that may be omitted, explicitly null, or set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Field<T> {
    #[default]
    Absent,
    Null,
    Present(T),
}

impl<T> Field<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn present(&self) -> Option<&T> {
        match self {
            Self::Present(v) => Some(v),
            _ => None,
        }
    }
}

impl<T> From<T> for Field<T> {
    fn from(value: T) -> Self {
        Self::Present(value)
    }
}

impl<T: Model> Model for Field<T> {
    fn shape() -> Shape {
        Shape::Optional(Box::new(Shape::Nullable(Box::new(T::shape()))))
    }

    fn to_value(&self) -> Value {
        match self {
            Self::Absent => Value::Absent,
            Self::Null => Value::Null,
            Self::Present(v) => v.to_value(),
        }
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Absent => Ok(Self::Absent),
            Value::Null => Ok(Self::Null),
            other => T::from_value(other).map(Self::Present),
        }
    }
}

/// `Option<T>` is the nullable wrapper: `None` travels as `null`.
impl<T: Model> Model for Option<T> {
    fn shape() -> Shape {
        Shape::Nullable(Box::new(T::shape()))
    }

    fn to_value(&self) -> Value {
        match self {
            None => Value::Null,
            Some(v) => v.to_value(),
        }
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        match value {
            Value::Null | Value::Absent => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_states_map_to_values() {
        assert_eq!(Field::<bool>::Absent.to_value(), Value::Absent);
        assert_eq!(Field::<bool>::Null.to_value(), Value::Null);
        assert_eq!(Field::Present(true).to_value(), Value::Bool(true));

        assert_eq!(Field::<bool>::from_value(Value::Absent), Ok(Field::Absent));
        assert_eq!(Field::<bool>::from_value(Value::Null), Ok(Field::Null));
        assert_eq!(
            Field::<bool>::from_value(Value::Bool(false)),
            Ok(Field::Present(false))
        );
    }

    #[test]
    fn test_optional_and_option_shapes() {
        assert!(matches!(Optional::<bool>::shape(), Shape::Optional(_)));
        assert!(matches!(Option::<bool>::shape(), Shape::Nullable(_)));
        match Field::<bool>::shape() {
            Shape::Optional(inner) => assert!(matches!(*inner, Shape::Nullable(_))),
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn test_optional_conversions() {
        let value: Optional<u8> = 3.into();
        assert!(value.is_present());
        assert_eq!(value.as_ref().into_option(), Some(&3));
        assert_eq!(Optional::<u8>::default().into_option(), None);
    }
}
