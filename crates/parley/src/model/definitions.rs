// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Name-keyed definitions arena.
//!
//! Record shapes live here once and are referenced by name everywhere else,
//! so recursive types never own each other. Entries are append-only: a name
//! may be reserved before its body exists (cycles point at it meanwhile) and
//! is then filled exactly once.

use super::{ModelError, TypeDef};
use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
struct Entry {
    def: Option<TypeDef>,
    owner: Option<TypeId>,
}

/// Shared definitions table of one application.
#[derive(Debug, Clone, Default)]
pub struct Definitions {
    entries: BTreeMap<String, Entry>,
    owners: HashMap<TypeId, String>,
}

impl Definitions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `name` for `owner` before its body is built.
    ///
    /// Re-reserving for the same owner is a no-op.
    pub fn reserve(&mut self, name: &str, owner: Option<TypeId>) -> Result<(), ModelError> {
        if let Some(entry) = self.entries.get(name) {
            if owner.is_some() && entry.owner == owner {
                return Ok(());
            }
            return Err(ModelError::NameCollision(name.to_string()));
        }
        self.entries
            .insert(name.to_string(), Entry { def: None, owner });
        if let Some(id) = owner {
            self.owners.insert(id, name.to_string());
        }
        Ok(())
    }

    /// Store the body of `name`.
    ///
    /// Inserting again for the same owner, or inserting an identical
    /// definition without owner, is accepted; anything else collides.
    pub fn insert(
        &mut self,
        name: &str,
        def: TypeDef,
        owner: Option<TypeId>,
    ) -> Result<(), ModelError> {
        match self.entries.get_mut(name) {
            None => {
                self.entries.insert(
                    name.to_string(),
                    Entry {
                        def: Some(def),
                        owner,
                    },
                );
                if let Some(id) = owner {
                    self.owners.insert(id, name.to_string());
                }
                Ok(())
            }
            Some(entry) => {
                let same_owner = owner.is_some() && entry.owner == owner;
                match &entry.def {
                    None if same_owner => {
                        entry.def = Some(def);
                        Ok(())
                    }
                    Some(_) if same_owner => Ok(()),
                    Some(existing) if owner.is_none() && entry.owner.is_none() && *existing == def => {
                        Ok(())
                    }
                    _ => Err(ModelError::NameCollision(name.to_string())),
                }
            }
        }
    }

    /// Name registered for a declared type, if any.
    pub fn name_of(&self, owner: TypeId) -> Option<&str> {
        self.owners.get(&owner).map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.entries.get(name).and_then(|e| e.def.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Follow refs until a non-ref definition is reached.
    ///
    /// The referencing node's nullability is applied by callers, not here.
    pub fn resolve<'a>(&'a self, def: &'a TypeDef) -> Result<&'a TypeDef, ModelError> {
        let mut current = def;
        for _ in 0..=self.entries.len() {
            match current.ref_name() {
                None => return Ok(current),
                Some(name) => {
                    current = self
                        .get(name)
                        .ok_or_else(|| ModelError::UnresolvedRef(name.to_string()))?;
                }
            }
        }
        Err(ModelError::UnresolvedRef(
            def.ref_name().unwrap_or_default().to_string(),
        ))
    }

    /// Completed definitions in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeDef)> {
        self.entries
            .iter()
            .filter_map(|(name, e)| e.def.as_ref().map(|d| (name.as_str(), d)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names that are referenced or reserved but have no body.
    pub fn unresolved_refs(&self) -> Vec<String> {
        let mut missing: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| e.def.is_none())
            .map(|(name, _)| name.clone())
            .collect();
        for (_, def) in self.iter() {
            let mut refs = Vec::new();
            def.collect_refs(&mut refs);
            for name in refs {
                if !self.entries.contains_key(name) && !missing.iter().any(|m| m == name) {
                    missing.push(name.to_string());
                }
            }
        }
        missing.sort();
        missing
    }
}
