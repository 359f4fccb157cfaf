// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Request view and lifecycle hooks.

use super::error::RpcError;
use axum::http::{request::Parts, HeaderMap, Method, Uri, Version};
use chrono::{DateTime, Utc};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::error;

/// Read-only view of an incoming request, passed to every hook.
#[derive(Debug, Clone)]
pub struct RpcRequest {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    procedure: Option<String>,
    received_at: DateTime<Utc>,
}

impl RpcRequest {
    pub(crate) fn from_parts(parts: &Parts) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            version: parts.version,
            headers: parts.headers.clone(),
            procedure: None,
            received_at: Utc::now(),
        }
    }

    pub(crate) fn set_procedure(&mut self, name: &str) {
        self.procedure = Some(name.to_string());
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Matched procedure; `None` until routing succeeds.
    pub fn procedure(&self) -> Option<&str> {
        self.procedure.as_deref()
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

pub type ContextFactory<C> = Arc<dyn Fn(&RpcRequest) -> Result<C, RpcError> + Send + Sync>;
pub type RequestHook<C> = Arc<dyn Fn(&RpcRequest, &mut C) -> Result<(), RpcError> + Send + Sync>;
pub type ResponseHook<C> =
    Arc<dyn Fn(&RpcRequest, &C, &serde_json::Value) -> Result<(), RpcError> + Send + Sync>;
pub type AfterResponseHook<C> = Arc<dyn Fn(&RpcRequest, &C, &serde_json::Value) + Send + Sync>;
pub type ErrorHook<C> = Arc<dyn Fn(&RpcRequest, Option<&C>, &RpcError) + Send + Sync>;
pub type Middleware<C> = Arc<dyn Fn(&RpcRequest, &mut C, &str) -> Result<(), RpcError> + Send + Sync>;

/// Lifecycle hooks run by the dispatcher.
///
/// Order per request: context factory, `on_request`, method check,
/// middleware (in registration order), params decode, handler,
/// `on_before_response`, write, `on_after_response`. `on_error` sees
/// every failure with whatever context existed at the time.
///
/// Stream procedures skip `on_before_response`. Their `on_after_response`
/// runs with `null` once the handler returns successfully.
pub struct Hooks<C> {
    pub(crate) create_context: ContextFactory<C>,
    pub(crate) on_request: RequestHook<C>,
    pub(crate) on_before_response: ResponseHook<C>,
    pub(crate) on_after_response: AfterResponseHook<C>,
    pub(crate) on_error: ErrorHook<C>,
    pub(crate) middleware: Vec<Middleware<C>>,
}

impl<C: 'static> Hooks<C> {
    pub fn new<F>(create_context: F) -> Self
    where
        F: Fn(&RpcRequest) -> Result<C, RpcError> + Send + Sync + 'static,
    {
        Self {
            create_context: Arc::new(create_context),
            on_request: Arc::new(accept_request::<C>),
            on_before_response: Arc::new(accept_response::<C>),
            on_after_response: Arc::new(ignore_response::<C>),
            on_error: Arc::new(ignore_error::<C>),
            middleware: Vec::new(),
        }
    }

    pub fn on_request<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&RpcRequest, &mut C) -> Result<(), RpcError> + Send + Sync + 'static,
    {
        self.on_request = Arc::new(hook);
        self
    }

    /// Runs after a unary handler succeeds, before the response is written.
    pub fn on_before_response<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&RpcRequest, &C, &serde_json::Value) -> Result<(), RpcError> + Send + Sync + 'static,
    {
        self.on_before_response = Arc::new(hook);
        self
    }

    pub fn on_after_response<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&RpcRequest, &C, &serde_json::Value) + Send + Sync + 'static,
    {
        self.on_after_response = Arc::new(hook);
        self
    }

    /// Observer for failures. A panic inside the hook is logged and dropped.
    pub fn on_error<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&RpcRequest, Option<&C>, &RpcError) + Send + Sync + 'static,
    {
        self.on_error = Arc::new(hook);
        self
    }

    /// Append a middleware; receives the matched procedure name.
    pub fn middleware<F>(&mut self, middleware: F) -> &mut Self
    where
        F: Fn(&RpcRequest, &mut C, &str) -> Result<(), RpcError> + Send + Sync + 'static,
    {
        self.middleware.push(Arc::new(middleware));
        self
    }
}

fn accept_request<C>(_: &RpcRequest, _: &mut C) -> Result<(), RpcError> {
    Ok(())
}

fn accept_response<C>(_: &RpcRequest, _: &C, _: &serde_json::Value) -> Result<(), RpcError> {
    Ok(())
}

fn ignore_response<C>(_: &RpcRequest, _: &C, _: &serde_json::Value) {}

fn ignore_error<C>(_: &RpcRequest, _: Option<&C>, _: &RpcError) {}

impl<C: Default + 'static> Default for Hooks<C> {
    fn default() -> Self {
        Self::new(|_| Ok(C::default()))
    }
}

/// Invoke `on_error`, containing any panic it raises.
pub(crate) fn report_error<C>(hook: &ErrorHook<C>, request: &RpcRequest, ctx: Option<&C>, err: &RpcError) {
    if catch_unwind(AssertUnwindSafe(|| hook(request, ctx, err))).is_err() {
        error!(
            "on_error hook panicked while reporting '{}' for {}",
            err.message,
            request.path()
        );
    }
}
