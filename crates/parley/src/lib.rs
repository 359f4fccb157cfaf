// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # Parley - schema-driven RPC over HTTP
//!
//! Procedures are plain async functions over typed params and responses.
//! At startup every type is introspected into a JSON Type Definition style
//! model; at request time a JSON codec driven by that model decodes params,
//! encodes responses and streams server-sent events.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parley::{App, AppOptions, Model, RpcError, RpcOptions};
//!
//! #[derive(Model)]
//! struct GetNoteParams {
//!     id: String,
//! }
//!
//! #[derive(Model)]
//! struct Note {
//!     id: String,
//!     title: String,
//! }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut app: App<()> = App::new(AppOptions::default());
//! app.procedure("notes.getNote", RpcOptions::new(), |params: GetNoteParams, _ctx: ()| async move {
//!     Ok::<_, RpcError>(Note { id: params.id, title: "hello".into() })
//! })?;
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//! axum::serve(listener, app.into_router()?).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------+
//! |  App            register procedures, hooks, build the router  |
//! +---------------------------------------------------------------+
//! |  Dispatcher     route -> context -> hooks -> decode -> handler |
//! |  StreamController  SSE frames, pings, close                    |
//! +---------------------------------------------------------------+
//! |  Registry / Introspector   Shape -> TypeDef + definitions      |
//! +---------------------------------------------------------------+
//! |  Codec          JSON <-> Value, guided by TypeDef              |
//! +---------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Model`] | A type with a declared shape, usually derived |
//! | [`App`] | Registration surface and router builder |
//! | [`TypeDef`] | One node of the type model |
//! | [`Codec`] | JSON encoder/decoder over a definitions table |
//! | [`StreamController`] | Handle for pushing server-sent events |

extern crate self as parley;

mod app;
mod casing;
pub mod codec;
mod config;
pub mod introspect;
pub mod model;
pub mod rpc;
mod value;

pub use app::App;
pub use casing::KeyCasing;
pub use codec::{Codec, CodecError, CodecOptions};
pub use config::{AppOptions, ConfigError};
pub use introspect::Shape;
pub use model::{Definitions, ModelError, TypeDef};
pub use rpc::{
    HttpMethod, Hooks, RegistrationError, RpcError, RpcOptions, RpcRequest, RpcResult,
    StreamController, StreamError,
};
pub use value::{Field, Model, Object, Optional, Value};

/// `#[derive(Model)]`
pub use parley_codegen::Model;
