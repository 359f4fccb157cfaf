// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Introspection of declared shapes into the type model.
//!
//! Runs once per procedure at registration. Everything that can go wrong
//! here is a configuration error the service author has to fix, so the
//! walk reports [`RegistrationError`](crate::rpc::RegistrationError) and
//! never runs on the request path.

mod introspector;
mod shape;

pub use introspector::{Introspector, Role};
pub use shape::{EnumShape, FieldShape, RecordShape, Shape, TypeInfo, UnionShape, VariantShape};

#[cfg(test)]
mod tests;
