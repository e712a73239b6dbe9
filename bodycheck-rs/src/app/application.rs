//! Application: collects endpoints at startup, then serves them through the core dispatcher.

use std::future::Future;
use std::sync::Arc;

use bodycheck_core::{
    handler_fn, http, CoreError, Dispatcher, Handler, HandlerError, OpenApiService, Registry,
    Request, Response, RouteId, Schema, ServerConfig, Service,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::module::Module;

/// Handler over a typed body: the validated value is deserialized into `T`,
/// the handler's `R` is serialized back as the response body.
/// For a nullable schema use `Option<T>`; no body arrives as `None`.
pub fn typed_handler<T, R, F, Fut>(handler: F) -> Handler
where
    T: DeserializeOwned + Send + 'static,
    R: Serialize + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
{
    let handler = Arc::new(handler);
    handler_fn(move |body: Value| {
        let handler = Arc::clone(&handler);
        async move {
            let typed: T = serde_json::from_value(body)?;
            let out = handler(typed).await?;
            Ok::<Value, HandlerError>(serde_json::to_value(out)?)
        }
    })
}

/// Endpoint table plus helpers to register, dispatch and serve.
///
/// The table is shared with every dispatcher handed out; registering after that
/// copies it first, so running dispatchers keep their snapshot.
#[derive(Default)]
pub struct Application {
    registry: Arc<Registry>,
}

impl Application {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an endpoint. A (method, path) pair already taken is a `Conflict`.
    pub fn route(
        &mut self,
        method: &str,
        path: &str,
        schema: Schema,
        handler: Handler,
    ) -> Result<RouteId, CoreError> {
        Arc::make_mut(&mut self.registry).register(method, path, schema, handler)
    }

    /// Same as `route`, tagged for OpenAPI (module name).
    pub fn route_tagged(
        &mut self,
        method: &str,
        path: &str,
        schema: Schema,
        handler: Handler,
        openapi_tag: Option<&str>,
    ) -> Result<RouteId, CoreError> {
        let registry = Arc::make_mut(&mut self.registry);
        registry.register_tagged(method, path, schema, handler, openapi_tag)
    }

    /// POST endpoint with an untyped handler (validated JSON in, JSON out).
    pub fn post<F, Fut>(&mut self, path: &str, schema: Schema, handler: F) -> Result<RouteId, CoreError>
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
    {
        self.route("POST", path, schema, handler_fn(handler))
    }

    /// POST endpoint with a typed handler, see `typed_handler`.
    pub fn post_typed<T, R, F, Fut>(
        &mut self,
        path: &str,
        schema: Schema,
        handler: F,
    ) -> Result<RouteId, CoreError>
    where
        T: DeserializeOwned + Send + 'static,
        R: Serialize + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
    {
        self.route("POST", path, schema, typed_handler(handler))
    }

    /// Register a module (group of endpoints).
    pub fn register(&mut self, module: &mut dyn Module) -> Result<(), CoreError> {
        module.register_into(self)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Dispatcher over a snapshot of the current endpoints. Shares the table, no copy.
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher::from_shared(Arc::clone(&self.registry))
    }

    pub async fn handle(&self, req: Request) -> Response {
        self.dispatcher().dispatch(&req).await
    }

    /// Handle one request without HTTP, blocking the calling thread. Used by tests.
    /// Must not be called from inside a tokio runtime.
    pub fn handle_request(
        &self,
        method: &str,
        path: &str,
        body: &[u8],
    ) -> Result<Response, CoreError> {
        let req = Request::new(method, path).with_body(body.to_vec());
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(rt.block_on(self.handle(req)))
    }

    pub fn openapi_spec(&self, title: &str, version: &str) -> Value {
        bodycheck_core::openapi_spec(&self.registry, title, version)
    }

    /// Freeze the endpoints into a service (dispatcher + GET /openapi.json).
    pub fn into_service(self, openapi_title: &str, openapi_version: &str) -> Arc<dyn Service> {
        Arc::new(OpenApiService::new(
            Dispatcher::from_shared(self.registry),
            openapi_title,
            openapi_version,
        ))
    }

    /// Run the HTTP server (blocks until Ctrl-C).
    pub fn run(
        self,
        config: &ServerConfig,
        openapi_title: &str,
        openapi_version: &str,
    ) -> Result<(), CoreError> {
        for endpoint in self.registry.endpoints() {
            tracing::info!(method = %endpoint.method, path = %format!("/{}", endpoint.path), "route");
        }
        http::run(self.into_service(openapi_title, openapi_version), config)
    }
}
