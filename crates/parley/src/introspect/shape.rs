// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Declared shapes of Rust types.
//!
//! A [`Shape`] is what a type says about itself through
//! [`Model::shape`](crate::Model::shape). Record and union members are
//! produced on demand, so a self-referential type has a finite descriptor:
//! expanding `Node` does not expand the `Node` inside its `children` until
//! the introspector asks for it, and by then it has already seen the type.

use crate::model::PrimitiveKind;
use std::any::TypeId;

/// Identity and documentation of a declared record, union or enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeInfo {
    pub id: TypeId,
    /// `None` marks an anonymous shape.
    pub name: Option<&'static str>,
    pub description: Option<&'static str>,
    pub deprecated: bool,
}

impl TypeInfo {
    /// Anonymous info for `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: None,
            description: None,
            deprecated: false,
        }
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }

    pub fn described(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }
}

/// One named member of a record or union variant.
#[derive(Debug, Clone)]
pub struct FieldShape {
    pub name: &'static str,
    pub shape: Shape,
    pub description: Option<&'static str>,
    pub deprecated: bool,
}

impl FieldShape {
    pub fn new(name: &'static str, shape: Shape) -> Self {
        Self {
            name,
            shape,
            description: None,
            deprecated: false,
        }
    }

    pub fn described(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    pub fn deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }
}

/// String enumeration.
#[derive(Debug, Clone)]
pub struct EnumShape {
    pub info: TypeInfo,
    pub values: Vec<&'static str>,
}

/// Record with named fields.
#[derive(Debug, Clone)]
pub struct RecordShape {
    pub info: TypeInfo,
    pub fields: fn() -> Vec<FieldShape>,
}

/// One tagged alternative of a union.
#[derive(Debug, Clone)]
pub struct VariantShape {
    pub tag: &'static str,
    pub description: Option<&'static str>,
    pub fields: Vec<FieldShape>,
}

/// Discriminated union.
#[derive(Debug, Clone)]
pub struct UnionShape {
    pub info: TypeInfo,
    /// Declared discriminator key, before key casing.
    pub discriminator: &'static str,
    pub variants: fn() -> Vec<VariantShape>,
}

/// Declared structure of a type.
#[derive(Debug, Clone)]
pub enum Shape {
    Primitive(PrimitiveKind),
    Enum(EnumShape),
    Array(Box<Shape>),
    /// String-keyed map.
    Map(Box<Shape>),
    Record(RecordShape),
    Union(UnionShape),
    /// May be absent; only meaningful directly on a record field.
    Optional(Box<Shape>),
    /// May be null.
    Nullable(Box<Shape>),
    /// Opaque JSON.
    Any,
    /// No value at all: a procedure without params or response.
    Unit,
    /// A type with no wire mapping, named for error messages.
    Unsupported(&'static str),
}

impl Shape {
    /// Short label used in registration errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Primitive(kind) => kind.as_str(),
            Self::Enum(_) => "enum",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Record(_) => "record",
            Self::Union(_) => "union",
            Self::Optional(_) => "optional",
            Self::Nullable(_) => "nullable",
            Self::Any => "any",
            Self::Unit => "unit",
            Self::Unsupported(name) => name,
        }
    }

    /// Identity and name of records, unions and enums.
    pub fn info(&self) -> Option<&TypeInfo> {
        match self {
            Self::Record(r) => Some(&r.info),
            Self::Union(u) => Some(&u.info),
            Self::Enum(e) => Some(&e.info),
            _ => None,
        }
    }
}
