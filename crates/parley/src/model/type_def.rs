// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type definitions: the recursive schema node.

use super::ModelError;
use std::collections::HashSet;
use std::fmt;

/// Primitive wire kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Boolean,
    Timestamp,
    Float32,
    Float64,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
}

impl PrimitiveKind {
    /// Schema name of the kind (`"int32"`, `"timestamp"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Timestamp => "timestamp",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Int8 => "int8",
            Self::Uint8 => "uint8",
            Self::Int16 => "int16",
            Self::Uint16 => "uint16",
            Self::Int32 => "int32",
            Self::Uint32 => "uint32",
            Self::Int64 => "int64",
            Self::Uint64 => "uint64",
        }
    }

    /// Inclusive integer range, `None` for non-integer kinds.
    pub fn int_range(&self) -> Option<(i128, i128)> {
        match self {
            Self::Int8 => Some((i8::MIN.into(), i8::MAX.into())),
            Self::Uint8 => Some((0, u8::MAX.into())),
            Self::Int16 => Some((i16::MIN.into(), i16::MAX.into())),
            Self::Uint16 => Some((0, u16::MAX.into())),
            Self::Int32 => Some((i32::MIN.into(), i32::MAX.into())),
            Self::Uint32 => Some((0, u32::MAX.into())),
            Self::Int64 => Some((i64::MIN.into(), i64::MAX.into())),
            Self::Uint64 => Some((0, u64::MAX.into())),
            _ => None,
        }
    }

    /// 64-bit integers travel as JSON strings.
    pub fn is_stringified(&self) -> bool {
        matches!(self, Self::Int64 | Self::Uint64)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive metadata. A shape with no `id` is anonymous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub id: Option<String>,
    pub description: Option<String>,
    pub deprecated: bool,
}

impl Metadata {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.description.is_none() && !self.deprecated
    }
}

/// One property slot of an object shape.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDef {
    /// Declared name, before key casing.
    pub name: String,
    pub def: TypeDef,
    /// The key may be missing from the wire object.
    pub optional: bool,
}

/// Ordered property list of an object shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectDef {
    pub properties: Vec<PropertyDef>,
}

impl ObjectDef {
    /// Build an object, rejecting duplicate property names.
    pub fn new(properties: Vec<PropertyDef>) -> Result<Self, ModelError> {
        let mut seen = HashSet::new();
        for prop in &properties {
            if !seen.insert(prop.name.as_str()) {
                return Err(ModelError::DuplicateProperty(prop.name.clone()));
            }
        }
        Ok(Self { properties })
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Names of the non-optional properties.
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.properties
            .iter()
            .filter(|p| !p.optional)
            .map(|p| p.name.as_str())
    }
}

/// Tagged union flattened into one object beside its discriminator key.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscriminatorDef {
    pub key: String,
    pub mapping: Vec<(String, ObjectDef)>,
}

impl DiscriminatorDef {
    pub fn variant(&self, tag: &str) -> Option<&ObjectDef> {
        self.mapping.iter().find(|(t, _)| t == tag).map(|(_, o)| o)
    }
}

/// Shape kind of a [`TypeDef`]. Exactly one is populated by construction.
#[derive(Debug, Clone, PartialEq)]
pub enum Form {
    /// Any JSON value, passed through untouched.
    Empty,
    Type(PrimitiveKind),
    Enum(Vec<String>),
    Elements(Box<TypeDef>),
    /// String-keyed map.
    Values(Box<TypeDef>),
    Properties(ObjectDef),
    /// Named reference into the definitions table.
    Ref(String),
    Discriminator(DiscriminatorDef),
}

/// The recursive schema node.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub form: Form,
    pub nullable: bool,
    pub metadata: Metadata,
}

impl TypeDef {
    fn of(form: Form) -> Self {
        Self {
            form,
            nullable: false,
            metadata: Metadata::default(),
        }
    }

    pub fn any() -> Self {
        Self::of(Form::Empty)
    }

    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::of(Form::Type(kind))
    }

    /// String enum; values must be non-empty and unique.
    pub fn enumeration<I, S>(values: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(ModelError::EmptyEnum);
        }
        let mut seen = HashSet::new();
        for v in &values {
            if !seen.insert(v.as_str()) {
                return Err(ModelError::DuplicateEnumValue(v.clone()));
            }
        }
        Ok(Self::of(Form::Enum(values)))
    }

    pub fn elements(inner: TypeDef) -> Self {
        Self::of(Form::Elements(Box::new(inner)))
    }

    pub fn values(inner: TypeDef) -> Self {
        Self::of(Form::Values(Box::new(inner)))
    }

    pub fn object(object: ObjectDef) -> Self {
        Self::of(Form::Properties(object))
    }

    pub fn reference(name: impl Into<String>) -> Self {
        Self::of(Form::Ref(name.into()))
    }

    /// Discriminated union. Tags must be unique and no variant may declare
    /// a property named like the discriminator key.
    pub fn discriminator(
        key: impl Into<String>,
        mapping: Vec<(String, ObjectDef)>,
    ) -> Result<Self, ModelError> {
        let key = key.into();
        let mut tags = HashSet::new();
        for (tag, object) in &mapping {
            if !tags.insert(tag.as_str()) {
                return Err(ModelError::DuplicateTag(tag.clone()));
            }
            if object.property(&key).is_some() {
                return Err(ModelError::DiscriminatorCollision {
                    key: key.clone(),
                    tag: tag.clone(),
                });
            }
        }
        Ok(Self::of(Form::Discriminator(DiscriminatorDef { key, mapping })))
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn is_anonymous(&self) -> bool {
        self.metadata.id.is_none()
    }

    /// Name of the referenced definition, if this is a ref.
    pub fn ref_name(&self) -> Option<&str> {
        match &self.form {
            Form::Ref(name) => Some(name),
            _ => None,
        }
    }

    /// Short kind label used in error messages.
    pub fn kind_name(&self) -> String {
        match &self.form {
            Form::Empty => "any".into(),
            Form::Type(kind) => kind.as_str().into(),
            Form::Enum(_) => "enum".into(),
            Form::Elements(_) => "array".into(),
            Form::Values(_) => "map".into(),
            Form::Properties(_) => "object".into(),
            Form::Ref(name) => name.clone(),
            Form::Discriminator(_) => "discriminated union".into(),
        }
    }

    /// Visit every ref name reachable without crossing into other definitions.
    pub(crate) fn collect_refs<'a>(&'a self, out: &mut Vec<&'a str>) {
        match &self.form {
            Form::Ref(name) => out.push(name),
            Form::Elements(inner) | Form::Values(inner) => inner.collect_refs(out),
            Form::Properties(object) => {
                for prop in &object.properties {
                    prop.def.collect_refs(out);
                }
            }
            Form::Discriminator(disc) => {
                for (_, object) in &disc.mapping {
                    for prop in &object.properties {
                        prop.def.collect_refs(out);
                    }
                }
            }
            Form::Empty | Form::Type(_) | Form::Enum(_) => {}
        }
    }
}
