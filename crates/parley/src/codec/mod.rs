// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! JSON codec driven by type definitions.
//!
//! # Wire rules
//!
//! - Optional properties whose value is absent are omitted; nullable ones
//!   that are null are written as `null`.
//! - Record refs are transparent: the referenced definition is encoded inline.
//! - A discriminated union is one object: the discriminator key followed by
//!   the selected variant's own properties.
//! - `int64` / `uint64` travel as decimal strings, timestamps as RFC 3339.
//! - Unknown keys are ignored on decode.
//!
//! # Example
//!
//! ```rust
//! use parley::codec::{Codec, CodecOptions};
//! use parley::model::{Definitions, PrimitiveKind, TypeDef};
//! use parley::Value;
//!
//! let defs = Definitions::new();
//! let options = CodecOptions::default();
//! let codec = Codec::new(&defs, &options);
//! let def = TypeDef::primitive(PrimitiveKind::Int64);
//!
//! let bytes = codec.encode(&Value::Int(42), &def).unwrap();
//! assert_eq!(bytes, b"\"42\"");
//! assert_eq!(codec.decode(&bytes, &def).unwrap(), Value::Int(42));
//! ```

mod decode;
mod encode;
mod error;
mod query;

pub use error::CodecError;
pub use query::check_query_compatible;

pub(crate) use error::child_path;

use crate::casing::KeyCasing;
use crate::model::{Definitions, TypeDef};
use crate::value::{Model, Value};
use serde::{Deserialize, Serialize};

/// Default bound on container nesting while decoding.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Codec options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecOptions {
    pub key_casing: KeyCasing,
    /// Maximum number of nested containers (arrays, maps, objects).
    pub max_depth: usize,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            key_casing: KeyCasing::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Encoder/decoder bound to one definitions table and option set.
#[derive(Debug, Clone, Copy)]
pub struct Codec<'a> {
    definitions: &'a Definitions,
    options: &'a CodecOptions,
}

impl<'a> Codec<'a> {
    pub fn new(definitions: &'a Definitions, options: &'a CodecOptions) -> Self {
        Self {
            definitions,
            options,
        }
    }

    pub fn options(&self) -> &CodecOptions {
        self.options
    }

    /// Encode to JSON bytes.
    pub fn encode(&self, value: &Value, def: &TypeDef) -> Result<Vec<u8>, CodecError> {
        let json = self.encode_json(value, def)?;
        Ok(serde_json::to_vec(&json)?)
    }

    /// Decode JSON bytes.
    pub fn decode(&self, bytes: &[u8], def: &TypeDef) -> Result<Value, CodecError> {
        let json: serde_json::Value = serde_json::from_slice(bytes)?;
        self.decode_json(json, def)
    }

    /// Encode a typed value.
    pub fn encode_model<T: Model>(&self, value: &T, def: &TypeDef) -> Result<Vec<u8>, CodecError> {
        self.encode(&value.to_value(), def)
    }

    /// Decode into a typed value.
    pub fn decode_model<T: Model>(&self, bytes: &[u8], def: &TypeDef) -> Result<T, CodecError> {
        T::from_value(self.decode(bytes, def)?)
    }

    fn lookup(&self, name: &str) -> Result<&'a TypeDef, CodecError> {
        self.definitions
            .get(name)
            .ok_or_else(|| CodecError::UnresolvedRef(name.to_string()))
    }

    /// Depth after entering one more container at `path`.
    fn enter(&self, depth: usize, path: &str) -> Result<usize, CodecError> {
        let next = depth + 1;
        if next > self.options.max_depth {
            return Err(CodecError::DepthExceeded {
                path: path.to_string(),
                max: self.options.max_depth,
            });
        }
        Ok(next)
    }
}
