// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Procedure handler traits.
//!
//! Handlers are plain async functions or closures; the blanket impls below
//! make `|params: P, ctx: C| async move { ... }` usable directly.

use super::error::RpcError;
use super::stream::{StreamController, StreamCore};
use crate::value::{Model, Value};
use futures::future::{self, BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;

/// Unary procedure handler.
pub trait Handler<C, P, R>: Send + Sync + 'static {
    type Future: Future<Output = Result<R, RpcError>> + Send + 'static;

    fn call(&self, params: P, ctx: C) -> Self::Future;
}

impl<F, Fut, C, P, R> Handler<C, P, R> for F
where
    F: Fn(P, C) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, RpcError>> + Send + 'static,
{
    type Future = Fut;

    fn call(&self, params: P, ctx: C) -> Self::Future {
        self(params, ctx)
    }
}

/// Event-stream procedure handler.
///
/// Returning closes the stream (without a `done` event unless the handler
/// already closed it). An error returned before the first event becomes a
/// normal JSON error response.
pub trait StreamHandler<C, P, E>: Send + Sync + 'static {
    type Future: Future<Output = Result<(), RpcError>> + Send + 'static;

    fn call(&self, params: P, stream: StreamController<E>, ctx: C) -> Self::Future;
}

impl<F, Fut, C, P, E> StreamHandler<C, P, E> for F
where
    F: Fn(P, StreamController<E>, C) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), RpcError>> + Send + 'static,
{
    type Future = Fut;

    fn call(&self, params: P, stream: StreamController<E>, ctx: C) -> Self::Future {
        self(params, stream, ctx)
    }
}

pub(crate) type UnaryFn<C> =
    Arc<dyn Fn(Value, C) -> BoxFuture<'static, Result<Value, RpcError>> + Send + Sync>;
pub(crate) type StreamFn<C> =
    Arc<dyn Fn(Value, StreamCore, C) -> BoxFuture<'static, Result<(), RpcError>> + Send + Sync>;

/// Type-erased handler stored by the dispatcher.
pub(crate) enum Endpoint<C> {
    Unary(UnaryFn<C>),
    Stream(StreamFn<C>),
}

impl<C> Clone for Endpoint<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Unary(f) => Self::Unary(f.clone()),
            Self::Stream(f) => Self::Stream(f.clone()),
        }
    }
}

pub(crate) fn unary<C, P, R, H>(handler: H) -> Endpoint<C>
where
    C: Send + 'static,
    P: Model,
    R: Model,
    H: Handler<C, P, R>,
{
    Endpoint::Unary(Arc::new(move |params: Value, ctx: C| {
        match P::from_value(params) {
            Ok(params) => handler
                .call(params, ctx)
                .map(|result| result.map(|response| response.to_value()))
                .boxed(),
            Err(err) => future::ready(Err(err.into())).boxed(),
        }
    }))
}

pub(crate) fn stream<C, P, E, H>(handler: H) -> Endpoint<C>
where
    C: Send + 'static,
    P: Model,
    E: Model,
    H: StreamHandler<C, P, E>,
{
    Endpoint::Stream(Arc::new(move |params: Value, core: StreamCore, ctx: C| {
        match P::from_value(params) {
            Ok(params) => handler
                .call(params, StreamController::from_core(core), ctx)
                .boxed(),
            Err(err) => future::ready(Err(err.into())).boxed(),
        }
    }))
}
