// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Application builder.

use crate::config::AppOptions;
use crate::model::TypeDef;
use crate::rpc::{
    procedure_path, stream_endpoint, unary_endpoint, AppSchema, DispatchOptions, Dispatcher,
    Endpoint, Handler, Hooks, ProcedureDef, RegistrationError, Registry, Route, RpcError,
    RpcOptions, RpcRequest, StreamHandler,
};
use crate::value::Model;
use axum::extract::Request;
use axum::routing::get;
use axum::{Json, Router};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// RPC application: procedures, hooks and options.
///
/// `C` is the per-request context produced by the context factory and
/// handed (by value) to each handler.
///
/// ```
/// use parley::{App, AppOptions, RpcError, RpcOptions};
///
/// #[derive(parley::Model)]
/// struct Greeting {
///     message: String,
/// }
///
/// let mut app: App<()> = App::new(AppOptions::default());
/// app.procedure("utils.hello", RpcOptions::new(), |_: (), _ctx: ()| async {
///     Ok::<_, RpcError>(Greeting { message: "hi".into() })
/// })
/// .expect("register");
/// assert!(app.schema().procedures.contains_key("utils.hello"));
/// ```
pub struct App<C> {
    options: AppOptions,
    registry: Registry,
    hooks: Hooks<C>,
    routes: HashMap<String, Route<C>>,
}

impl<C> App<C>
where
    C: Default + Clone + Send + Sync + 'static,
{
    /// App whose context is `C::default()` for every request.
    pub fn new(options: AppOptions) -> Self {
        Self::with_hooks(options, Hooks::default())
    }
}

impl<C> App<C>
where
    C: Clone + Send + Sync + 'static,
{
    /// App with a custom context factory.
    pub fn with_context<F>(options: AppOptions, factory: F) -> Self
    where
        F: Fn(&RpcRequest) -> Result<C, RpcError> + Send + Sync + 'static,
    {
        Self::with_hooks(options, Hooks::new(factory))
    }

    pub fn with_hooks(options: AppOptions, hooks: Hooks<C>) -> Self {
        Self {
            options,
            registry: Registry::new(),
            hooks,
            routes: HashMap::new(),
        }
    }

    pub fn options(&self) -> &AppOptions {
        &self.options
    }

    pub fn hooks_mut(&mut self) -> &mut Hooks<C> {
        &mut self.hooks
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Register a request/response procedure.
    pub fn procedure<P, R, H>(
        &mut self,
        name: &str,
        options: RpcOptions,
        handler: H,
    ) -> Result<&mut Self, RegistrationError>
    where
        P: Model,
        R: Model,
        H: Handler<C, P, R>,
    {
        let def = self.procedure_def(name, options, false)?;
        let def = self
            .registry
            .register(def, &P::shape(), &R::shape())?
            .clone();
        self.add_route(&def, unary_endpoint(handler));
        Ok(self)
    }

    /// Register an event-stream procedure emitting `E` events.
    pub fn event_stream<P, E, H>(
        &mut self,
        name: &str,
        options: RpcOptions,
        handler: H,
    ) -> Result<&mut Self, RegistrationError>
    where
        P: Model,
        E: Model,
        H: StreamHandler<C, P, E>,
    {
        let def = self.procedure_def(name, options, true)?;
        let def = self
            .registry
            .register(def, &P::shape(), &E::shape())?
            .clone();
        self.add_route(&def, stream_endpoint(handler));
        Ok(self)
    }

    /// Publish `T` in the schema without attaching it to a procedure.
    pub fn register_model<T: Model>(&mut self) -> Result<&mut Self, RegistrationError> {
        self.registry.register_definition(&T::shape())?;
        Ok(self)
    }

    fn procedure_def(
        &self,
        name: &str,
        options: RpcOptions,
        event_stream: bool,
    ) -> Result<ProcedureDef, RegistrationError> {
        let path = procedure_path(&self.options.route_prefix, name, options.path.as_deref())?;
        let schema_path = self.schema_path();
        if schema_path.as_deref() == Some(path.as_str()) {
            return Err(RegistrationError::DuplicateRoute {
                path,
                existing: "schema".into(),
            });
        }
        let mut def = ProcedureDef::new(
            name,
            options.method.unwrap_or(self.options.default_method),
            path,
        );
        def.event_stream = event_stream;
        def.description = options.description;
        def.deprecated = options.deprecated;
        Ok(def)
    }

    fn add_route(&mut self, def: &ProcedureDef, endpoint: Endpoint<C>) {
        self.routes.insert(
            def.path.clone(),
            Route {
                procedure: def.name.clone(),
                method: def.method.to_http(),
                params: def.params.as_deref().map(TypeDef::reference),
                response: def.response.as_deref().map(TypeDef::reference),
                endpoint,
            },
        );
    }

    fn schema_path(&self) -> Option<String> {
        (!self.options.definition_path.is_empty())
            .then(|| format!("{}{}", self.options.route_prefix, self.options.definition_path))
    }

    /// Snapshot of every registered procedure and definition.
    pub fn schema(&self) -> AppSchema {
        self.registry.export_schema(
            &self.options.info(),
            &self.options.route_prefix,
            self.options.key_casing,
        )
    }

    /// Freeze the registry into a dispatcher.
    pub fn into_dispatcher(self) -> Result<Dispatcher<C>, RegistrationError> {
        self.registry.validate()?;
        let options = DispatchOptions {
            codec: self.options.codec_options(),
            ping_interval: self.options.ping_interval(),
            max_body_bytes: self.options.max_body_bytes,
        };
        Ok(Dispatcher::new(
            Arc::new(self.registry),
            self.routes,
            self.hooks,
            options,
        ))
    }

    /// Build the axum router: the schema route plus a fallback that
    /// dispatches every other request.
    pub fn into_router(self) -> Result<Router, RegistrationError> {
        let schema_path = self.schema_path();
        let schema = Arc::new(self.schema().to_json());
        let name = self.options.name.clone();
        let dispatcher = Arc::new(self.into_dispatcher()?);
        info!(
            "App '{}': {} procedures, {} definitions",
            name,
            dispatcher.registry().len(),
            dispatcher.registry().definitions().len()
        );

        let mut router = Router::new();
        if let Some(path) = schema_path {
            router = router.route(
                &path,
                get(move || {
                    let schema = Arc::clone(&schema);
                    async move { Json(schema.as_ref().clone()) }
                }),
            );
        }
        Ok(router.fallback(move |request: Request| {
            let dispatcher = Arc::clone(&dispatcher);
            async move { dispatcher.dispatch(request).await }
        }))
    }
}
