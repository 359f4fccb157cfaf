// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Procedure registry and schema export.

use super::error::RegistrationError;
use super::procedure::{HttpMethod, ProcedureDef};
use crate::casing::KeyCasing;
use crate::codec::check_query_compatible;
use crate::introspect::{Introspector, Role, Shape};
use crate::model::{Definitions, ModelError, TypeDef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Schema format version written into every export.
pub const SCHEMA_VERSION: &str = "0.0.1";

/// Descriptive application info carried in the schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppInfo {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: String,
}

/// Snapshot of every procedure and definition, consumed by client
/// generators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSchema {
    pub schema_version: String,
    pub info: AppInfo,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub route_prefix: String,
    pub procedures: BTreeMap<String, serde_json::Value>,
    pub definitions: BTreeMap<String, serde_json::Value>,
}

impl AppSchema {
    pub fn to_json(&self) -> serde_json::Value {
        // Every field is plain data; serializing cannot fail.
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Procedures plus the shared definitions table.
///
/// Populated during startup and read-only afterwards.
#[derive(Debug, Default)]
pub struct Registry {
    definitions: Definitions,
    procedures: BTreeMap<String, ProcedureDef>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a procedure, introspecting its params and response shapes.
    ///
    /// The definition's `params`/`response` names are filled in from the
    /// introspection result. GET procedures additionally require a params
    /// record that can be read from a query string.
    pub fn register(
        &mut self,
        mut def: ProcedureDef,
        params: &Shape,
        response: &Shape,
    ) -> Result<&ProcedureDef, RegistrationError> {
        if self.procedures.contains_key(&def.name) {
            return Err(RegistrationError::DuplicateProcedure(def.name));
        }
        if let Some(existing) = self.procedures.values().find(|p| p.path == def.path) {
            return Err(RegistrationError::DuplicateRoute {
                path: def.path,
                existing: existing.name.clone(),
            });
        }

        def.params = Introspector::new(&mut self.definitions, &def.name, Role::Params).root(params)?;
        def.response =
            Introspector::new(&mut self.definitions, &def.name, Role::Response).root(response)?;

        if def.method == HttpMethod::Get {
            if let Some(params) = &def.params {
                check_query_compatible(&self.definitions, &TypeDef::reference(params.as_str()))
                    .map_err(|path| RegistrationError::NestedQueryParameter {
                        procedure: def.name.clone(),
                        path,
                    })?;
            }
        }

        debug!(
            "Registry: registered '{}' as {} {}",
            def.name, def.method, def.path
        );
        let name = def.name.clone();
        Ok(self.procedures.entry(name).or_insert(def))
    }

    /// Publish a named record or union that no procedure mentions.
    ///
    /// Returns the definition name. Registering a type that is already
    /// known is a no-op.
    pub fn register_definition(&mut self, shape: &Shape) -> Result<String, RegistrationError> {
        let name = match shape {
            Shape::Record(_) | Shape::Union(_) => shape.info().and_then(|info| info.name),
            _ => None,
        };
        let Some(name) = name else {
            let kind = match shape {
                Shape::Record(_) | Shape::Union(_) => format!("anonymous {}", shape.kind_name()),
                other => other.kind_name().to_string(),
            };
            return Err(RegistrationError::InvalidDefinition { kind });
        };
        let registered = Introspector::new(&mut self.definitions, name, Role::Definition)
            .root(shape)?
            .unwrap_or_else(|| name.to_string());
        debug!("Registry: registered definition '{}'", registered);
        Ok(registered)
    }

    /// Every reference must point at a completed definition.
    pub fn validate(&self) -> Result<(), RegistrationError> {
        match self.definitions.unresolved_refs().into_iter().next() {
            Some(name) => Err(ModelError::UnresolvedRef(name).into()),
            None => Ok(()),
        }
    }

    pub fn definitions(&self) -> &Definitions {
        &self.definitions
    }

    pub fn procedure(&self, name: &str) -> Option<&ProcedureDef> {
        self.procedures.get(name)
    }

    /// Procedures in name order.
    pub fn procedures(&self) -> impl Iterator<Item = &ProcedureDef> {
        self.procedures.values()
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }

    /// Export the application schema.
    pub fn export_schema(&self, info: &AppInfo, route_prefix: &str, casing: KeyCasing) -> AppSchema {
        AppSchema {
            schema_version: SCHEMA_VERSION.to_string(),
            info: info.clone(),
            route_prefix: route_prefix.to_string(),
            procedures: self
                .procedures
                .iter()
                .map(|(name, def)| (name.clone(), def.to_schema()))
                .collect(),
            definitions: self
                .definitions
                .iter()
                .map(|(name, def)| (name.to_string(), def.to_schema(casing)))
                .collect(),
        }
    }
}
