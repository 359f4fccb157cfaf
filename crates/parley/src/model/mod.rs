// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type model
//!
//! The schema representation shared by introspection, the codec and the
//! exported application contract.
//!
//! - **TypeDef**: one shape kind plus orthogonal `nullable` flag and metadata
//! - **PropertyDef**: a property slot; the slot, not the type, carries `optional`
//! - **Definitions**: the append-only, name-keyed table that record refs point into
//!
//! # Example
//!
//! ```rust
//! use parley::model::{ObjectDef, PrimitiveKind, PropertyDef, TypeDef};
//!
//! let user = TypeDef::object(ObjectDef::new(vec![
//!     PropertyDef { name: "id".into(), def: TypeDef::primitive(PrimitiveKind::String), optional: false },
//!     PropertyDef {
//!         name: "nickname".into(),
//!         def: TypeDef::primitive(PrimitiveKind::String).with_nullable(true),
//!         optional: true,
//!     },
//! ]).unwrap());
//! assert_eq!(user.kind_name(), "object");
//! ```

mod definitions;
mod export;
mod type_def;

pub use definitions::Definitions;
pub use type_def::{DiscriminatorDef, Form, Metadata, ObjectDef, PrimitiveKind, PropertyDef, TypeDef};

use thiserror::Error;

/// Structural violations of the type model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("enum must declare at least one value")]
    EmptyEnum,

    #[error("duplicate enum value {0:?}")]
    DuplicateEnumValue(String),

    #[error("duplicate property {0:?}")]
    DuplicateProperty(String),

    #[error("duplicate union tag {0:?}")]
    DuplicateTag(String),

    #[error("union variant {tag:?} declares a property named like its discriminator {key:?}")]
    DiscriminatorCollision { key: String, tag: String },

    #[error("definition name {0:?} is already used by a different type")]
    NameCollision(String),

    #[error("unresolved type reference {0:?}")]
    UnresolvedRef(String),
}
