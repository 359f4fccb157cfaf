// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON schema rendering of type definitions.

use super::{Form, ObjectDef, TypeDef};
use crate::casing::KeyCasing;
use serde_json::{json, Map, Value};

impl TypeDef {
    /// Render as a JSON type definition document.
    ///
    /// Property names and discriminator keys go through `casing` so the
    /// schema describes exactly what travels on the wire.
    pub fn to_schema(&self, casing: KeyCasing) -> Value {
        let mut out = Map::new();
        match &self.form {
            Form::Empty => {}
            Form::Type(kind) => {
                out.insert("type".into(), json!(kind.as_str()));
            }
            Form::Enum(values) => {
                out.insert("enum".into(), json!(values));
            }
            Form::Elements(inner) => {
                out.insert("elements".into(), inner.to_schema(casing));
            }
            Form::Values(inner) => {
                out.insert("values".into(), inner.to_schema(casing));
            }
            Form::Properties(object) => write_object(object, casing, &mut out),
            Form::Ref(name) => {
                out.insert("ref".into(), json!(name));
            }
            Form::Discriminator(disc) => {
                out.insert("discriminator".into(), json!(casing.apply(&disc.key)));
                let mut mapping = Map::new();
                for (tag, object) in &disc.mapping {
                    let mut variant = Map::new();
                    write_object(object, casing, &mut variant);
                    mapping.insert(tag.clone(), Value::Object(variant));
                }
                out.insert("mapping".into(), Value::Object(mapping));
            }
        }
        if self.nullable {
            out.insert("nullable".into(), Value::Bool(true));
        }
        if !self.metadata.is_empty() {
            let mut meta = Map::new();
            if let Some(id) = &self.metadata.id {
                meta.insert("id".into(), json!(id));
            }
            if let Some(description) = &self.metadata.description {
                meta.insert("description".into(), json!(description));
            }
            if self.metadata.deprecated {
                meta.insert("isDeprecated".into(), Value::Bool(true));
            }
            out.insert("metadata".into(), Value::Object(meta));
        }
        Value::Object(out)
    }
}

fn write_object(object: &ObjectDef, casing: KeyCasing, out: &mut Map<String, Value>) {
    let mut required = Map::new();
    let mut optional = Map::new();
    for prop in &object.properties {
        let key = casing.apply(&prop.name).into_owned();
        let schema = prop.def.to_schema(casing);
        if prop.optional {
            optional.insert(key, schema);
        } else {
            required.insert(key, schema);
        }
    }
    out.insert("properties".into(), Value::Object(required));
    if !optional.is_empty() {
        out.insert("optionalProperties".into(), Value::Object(optional));
    }
}
