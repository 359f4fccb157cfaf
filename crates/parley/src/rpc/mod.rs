// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Procedures, registry, dispatch and event streams.
//!
//! Startup registers procedures into a [`Registry`]; each registration
//! introspects the params and response types into the shared definitions
//! table. The finished registry is frozen behind an `Arc` and the
//! [`Dispatcher`] serves requests against it.

mod dispatch;
mod error;
mod handler;
mod hooks;
mod procedure;
mod registry;
mod stream;

pub use dispatch::Dispatcher;
pub use error::{RegistrationError, RpcError, RpcResult};
pub use handler::{Handler, StreamHandler};
pub use hooks::{
    AfterResponseHook, ContextFactory, ErrorHook, Hooks, Middleware, RequestHook, ResponseHook,
    RpcRequest,
};
pub use procedure::{procedure_path, validate_name, HttpMethod, ProcedureDef, RpcOptions};
pub use registry::{AppInfo, AppSchema, Registry, SCHEMA_VERSION};
pub use stream::{
    StreamController, StreamError, StreamState, DEFAULT_PING_INTERVAL, DONE_FRAME, PING_FRAME,
};

pub(crate) use dispatch::{DispatchOptions, Route};
pub(crate) use handler::{stream as stream_endpoint, unary as unary_endpoint, Endpoint};
