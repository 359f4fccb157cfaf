// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Request pipeline.

use super::error::RpcError;
use super::handler::{Endpoint, StreamFn, UnaryFn};
use super::hooks::{report_error, Hooks, RpcRequest};
use super::registry::Registry;
use super::stream::{
    sse_response, EventEncoder, PendingStream, StreamCore, StreamParts, StreamState,
};
use crate::codec::{Codec, CodecOptions};
use crate::model::TypeDef;
use crate::value::Value;
use axum::body::Body;
use axum::extract::{Query, Request};
use axum::http::{request::Parts, Method};
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinError;
use tracing::{debug, error, warn};

/// One routable procedure.
pub(crate) struct Route<C> {
    pub(crate) procedure: String,
    pub(crate) method: Method,
    pub(crate) params: Option<TypeDef>,
    pub(crate) response: Option<TypeDef>,
    pub(crate) endpoint: Endpoint<C>,
}

/// Dispatch settings taken from the app options.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DispatchOptions {
    pub(crate) codec: CodecOptions,
    pub(crate) ping_interval: Duration,
    pub(crate) max_body_bytes: usize,
}

/// Routes requests by path and runs the procedure pipeline.
pub struct Dispatcher<C> {
    registry: Arc<Registry>,
    routes: HashMap<String, Route<C>>,
    hooks: Hooks<C>,
    options: DispatchOptions,
}

impl<C> Dispatcher<C>
where
    C: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        registry: Arc<Registry>,
        routes: HashMap<String, Route<C>>,
        hooks: Hooks<C>,
        options: DispatchOptions,
    ) -> Self {
        Self {
            registry,
            routes,
            hooks,
            options,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Run one request through the pipeline.
    ///
    /// Every failure ends as a `{code, message, data?}` JSON response and
    /// is reported to `on_error`, except failures inside an event stream
    /// that already sent its headers, which are logged and reported only.
    pub async fn dispatch(&self, request: Request) -> Response {
        let (parts, body) = request.into_parts();
        let mut rpc = RpcRequest::from_parts(&parts);

        let Some(route) = self.routes.get(parts.uri.path()) else {
            return self.fail(&rpc, None, RpcError::not_found());
        };
        rpc.set_procedure(&route.procedure);

        let mut ctx = match (self.hooks.create_context)(&rpc) {
            Ok(ctx) => ctx,
            Err(err) => return self.fail(&rpc, None, err),
        };
        if let Err(err) = (self.hooks.on_request)(&rpc, &mut ctx) {
            return self.fail(&rpc, Some(&ctx), err);
        }
        if parts.method != route.method {
            return self.fail(&rpc, Some(&ctx), RpcError::not_found());
        }
        for middleware in &self.hooks.middleware {
            if let Err(err) = middleware(&rpc, &mut ctx, &route.procedure) {
                return self.fail(&rpc, Some(&ctx), err);
            }
        }

        let params = match self.decode_params(route, &parts, body).await {
            Ok(params) => params,
            Err(err) => return self.fail(&rpc, Some(&ctx), err),
        };

        match &route.endpoint {
            Endpoint::Unary(handler) => self.run_unary(handler, route, params, rpc, ctx).await,
            Endpoint::Stream(handler) => self.run_stream(handler, route, params, rpc, ctx).await,
        }
    }

    async fn decode_params(
        &self,
        route: &Route<C>,
        parts: &Parts,
        body: Body,
    ) -> Result<Value, RpcError> {
        let Some(def) = &route.params else {
            return Ok(Value::Absent);
        };
        let codec = Codec::new(self.registry.definitions(), &self.options.codec);
        if route.method == Method::GET {
            let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
                .map_err(|rejection| RpcError::bad_request(rejection.body_text()))?;
            return Ok(codec.decode_query(&pairs, def)?);
        }

        let bytes = axum::body::to_bytes(body, self.options.max_body_bytes)
            .await
            .map_err(|err| RpcError::bad_request(format!("Failed to read request body: {err}")))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(codec.decode(b"{}", def)?);
        }
        Ok(codec.decode(&bytes, def)?)
    }

    async fn run_unary(
        &self,
        handler: &UnaryFn<C>,
        route: &Route<C>,
        params: Value,
        rpc: RpcRequest,
        ctx: C,
    ) -> Response {
        let outcome = AssertUnwindSafe(handler(params, ctx.clone()))
            .catch_unwind()
            .await;
        let value = match outcome {
            Ok(Ok(value)) => value,
            Ok(Err(err)) => return self.fail(&rpc, Some(&ctx), err),
            Err(_) => {
                error!("Dispatcher: handler for '{}' panicked", route.procedure);
                return self.fail(&rpc, Some(&ctx), RpcError::internal());
            }
        };

        let json = match &route.response {
            Some(def) => {
                let codec = Codec::new(self.registry.definitions(), &self.options.codec);
                match codec.encode_json(&value, def) {
                    Ok(json) => json,
                    Err(err) => {
                        error!(
                            "Dispatcher: failed to encode response of '{}': {}",
                            route.procedure, err
                        );
                        return self.fail(&rpc, Some(&ctx), RpcError::internal());
                    }
                }
            }
            None => serde_json::json!({}),
        };

        if let Err(err) = (self.hooks.on_before_response)(&rpc, &ctx, &json) {
            return self.fail(&rpc, Some(&ctx), err);
        }
        let response = Json(&json).into_response();
        (self.hooks.on_after_response)(&rpc, &ctx, &json);
        debug!("Dispatcher: {} {} -> 200", rpc.method(), rpc.path());
        response
    }

    async fn run_stream(
        &self,
        handler: &StreamFn<C>,
        route: &Route<C>,
        params: Value,
        rpc: RpcRequest,
        ctx: C,
    ) -> Response {
        let encoder = EventEncoder::new(
            Arc::clone(&self.registry),
            self.options.codec,
            route.response.clone(),
        );
        let (core, StreamParts { frames, started }) =
            StreamCore::new(&route.procedure, encoder, self.options.ping_interval);
        let version = rpc.version();
        let pending = PendingStream::new(core.clone());
        let mut task = tokio::spawn(handler(params, core.clone(), ctx.clone()));

        tokio::select! {
            biased;
            _ = started => {}
            joined = &mut task => {
                match flatten(&route.procedure, joined) {
                    Err(err) if core.state() == StreamState::Idle => {
                        core.abandon();
                        pending.disarm();
                        return self.fail(&rpc, Some(&ctx), err);
                    }
                    Err(err) => self.stream_failed(&rpc, &ctx, &core, &err),
                    Ok(()) => {
                        (self.hooks.on_after_response)(&rpc, &ctx, &serde_json::Value::Null)
                    }
                }
                core.close(false).await;
                pending.disarm();
                return sse_response(frames, core, version);
            }
        }

        let on_error = Arc::clone(&self.hooks.on_error);
        let on_after = Arc::clone(&self.hooks.on_after_response);
        let watched = core.clone();
        let procedure = route.procedure.clone();
        tokio::spawn(async move {
            match flatten(&procedure, task.await) {
                Ok(()) => on_after(&rpc, &ctx, &serde_json::Value::Null),
                Err(err) if watched.peer_gone() => {
                    debug!("Dispatcher: stream '{}' ended after disconnect: {}", procedure, err);
                }
                Err(err) => {
                    warn!("Dispatcher: stream '{}' failed: {}", procedure, err);
                    report_error(&on_error, &rpc, Some(&ctx), &err);
                }
            }
            watched.close(false).await;
        });
        pending.disarm();
        sse_response(frames, core, version)
    }

    fn stream_failed(&self, rpc: &RpcRequest, ctx: &C, core: &StreamCore, err: &RpcError) {
        if core.peer_gone() {
            debug!("Dispatcher: stream '{}' ended after disconnect: {}", rpc.path(), err);
            return;
        }
        warn!("Dispatcher: stream at {} failed: {}", rpc.path(), err);
        report_error(&self.hooks.on_error, rpc, Some(ctx), err);
    }

    fn fail(&self, rpc: &RpcRequest, ctx: Option<&C>, err: RpcError) -> Response {
        if err.status().is_server_error() {
            error!("Dispatcher: {} {} -> {}", rpc.method(), rpc.path(), err);
        } else {
            warn!("Dispatcher: {} {} -> {}", rpc.method(), rpc.path(), err);
        }
        report_error(&self.hooks.on_error, rpc, ctx, &err);
        err.into_response()
    }
}

fn flatten(procedure: &str, joined: Result<Result<(), RpcError>, JoinError>) -> Result<(), RpcError> {
    match joined {
        Ok(outcome) => outcome,
        Err(err) => {
            error!("Dispatcher: stream handler for '{}' aborted: {}", procedure, err);
            Err(RpcError::internal())
        }
    }
}
