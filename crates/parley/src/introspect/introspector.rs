// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shape -> TypeDef walk.

use super::shape::{FieldShape, RecordShape, Shape, TypeInfo, UnionShape};
use crate::casing::to_pascal;
use crate::model::{Definitions, Metadata, ObjectDef, PropertyDef, TypeDef};
use crate::rpc::RegistrationError;
use std::fmt;
use tracing::debug;

/// Which side of a procedure a root shape describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Params,
    Response,
    /// A standalone definition; nested names carry no role suffix.
    Definition,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Params => f.write_str("Params"),
            Self::Response => f.write_str("Response"),
            Self::Definition => Ok(()),
        }
    }
}

/// Derives type definitions for one procedure root.
///
/// Records and unions are registered once per declared type (keyed by
/// `TypeId`) in the shared table and referenced by name from every use,
/// which is also what terminates recursive types. Anonymous records below
/// the root are named `<Proc><FieldPath><Role>`.
pub struct Introspector<'a> {
    definitions: &'a mut Definitions,
    procedure: &'a str,
    role: Role,
}

impl<'a> Introspector<'a> {
    pub fn new(definitions: &'a mut Definitions, procedure: &'a str, role: Role) -> Self {
        Self {
            definitions,
            procedure,
            role,
        }
    }

    /// Introspect a procedure root.
    ///
    /// Returns the definition name, or `None` for [`Shape::Unit`].
    pub fn root(&mut self, shape: &Shape) -> Result<Option<String>, RegistrationError> {
        let info = match shape {
            Shape::Unit => return Ok(None),
            Shape::Record(RecordShape { info, .. }) | Shape::Union(UnionShape { info, .. }) => {
                info
            }
            other => {
                return Err(RegistrationError::NonRecordRoot {
                    procedure: self.procedure.to_string(),
                    role: self.role,
                    kind: other.kind_name().to_string(),
                })
            }
        };
        if info.name.is_none() && self.definitions.name_of(info.id).is_none() {
            return Err(RegistrationError::AnonymousRoot {
                procedure: self.procedure.to_string(),
                role: self.role,
                suggested: self.synthesized_name(&[]),
            });
        }
        let def = self.walk(shape, &mut Vec::new())?;
        Ok(def.ref_name().map(str::to_string))
    }

    fn synthesized_name(&self, path: &[&str]) -> String {
        let fields: String = path.iter().map(|segment| to_pascal(segment)).collect();
        format!("{}{}{}", to_pascal(self.procedure), fields, self.role)
    }

    fn name_for(&self, info: &TypeInfo, path: &[&'static str]) -> String {
        info.name
            .map_or_else(|| self.synthesized_name(path), str::to_string)
    }

    fn walk(&mut self, shape: &Shape, path: &mut Vec<&'static str>) -> Result<TypeDef, RegistrationError> {
        match shape {
            Shape::Primitive(kind) => Ok(TypeDef::primitive(*kind)),
            Shape::Enum(e) => {
                let def = TypeDef::enumeration(e.values.iter().copied())?;
                Ok(def.with_metadata(metadata(&e.info, e.info.name.map(str::to_string))))
            }
            Shape::Array(inner) => Ok(TypeDef::elements(self.walk(inner, path)?)),
            Shape::Map(inner) => Ok(TypeDef::values(self.walk(inner, path)?)),
            Shape::Nullable(inner) => Ok(self.walk(inner, path)?.with_nullable(true)),
            Shape::Any => Ok(TypeDef::any()),
            Shape::Record(record) => self.record(record, path),
            Shape::Union(union) => self.union(union, path),
            Shape::Optional(_) => Err(RegistrationError::MisplacedOptional {
                path: display_path(path),
            }),
            Shape::Unit => Err(RegistrationError::Unsupported {
                kind: "()".into(),
                path: display_path(path),
            }),
            Shape::Unsupported(kind) => Err(RegistrationError::Unsupported {
                kind: (*kind).to_string(),
                path: display_path(path),
            }),
        }
    }

    fn record(
        &mut self,
        record: &RecordShape,
        path: &mut Vec<&'static str>,
    ) -> Result<TypeDef, RegistrationError> {
        if let Some(name) = self.definitions.name_of(record.info.id) {
            return Ok(TypeDef::reference(name));
        }
        let name = self.name_for(&record.info, path);
        self.definitions.reserve(&name, Some(record.info.id))?;

        let object = self.object(&(record.fields)(), path)?;
        let def = TypeDef::object(object).with_metadata(metadata(&record.info, Some(name.clone())));
        self.definitions.insert(&name, def, Some(record.info.id))?;
        debug!("Introspector: registered record '{}'", name);
        Ok(TypeDef::reference(name))
    }

    fn union(
        &mut self,
        union: &UnionShape,
        path: &mut Vec<&'static str>,
    ) -> Result<TypeDef, RegistrationError> {
        if let Some(name) = self.definitions.name_of(union.info.id) {
            return Ok(TypeDef::reference(name));
        }
        let name = self.name_for(&union.info, path);
        self.definitions.reserve(&name, Some(union.info.id))?;

        let mut mapping = Vec::new();
        for variant in (union.variants)() {
            path.push(variant.tag);
            let object = self.object(&variant.fields, path);
            path.pop();
            mapping.push((variant.tag.to_string(), object?));
        }
        let def = TypeDef::discriminator(union.discriminator, mapping)?
            .with_metadata(metadata(&union.info, Some(name.clone())));
        self.definitions.insert(&name, def, Some(union.info.id))?;
        debug!("Introspector: registered union '{}'", name);
        Ok(TypeDef::reference(name))
    }

    fn object(
        &mut self,
        fields: &[FieldShape],
        path: &mut Vec<&'static str>,
    ) -> Result<ObjectDef, RegistrationError> {
        let mut properties = Vec::with_capacity(fields.len());
        for field in fields {
            let (shape, optional) = match &field.shape {
                Shape::Optional(inner) => (inner.as_ref(), true),
                other => (other, false),
            };
            path.push(field.name);
            let def = self.walk(shape, path);
            path.pop();

            let mut def = def?;
            if let Some(description) = field.description {
                def.metadata.description = Some(description.to_string());
            }
            def.metadata.deprecated |= field.deprecated;
            properties.push(PropertyDef {
                name: field.name.to_string(),
                def,
                optional,
            });
        }
        Ok(ObjectDef::new(properties)?)
    }
}

fn metadata(info: &TypeInfo, id: Option<String>) -> Metadata {
    Metadata {
        id,
        description: info.description.map(str::to_string),
        deprecated: info.deprecated,
    }
}

fn display_path(path: &[&str]) -> String {
    format!("/{}", path.join("/"))
}
