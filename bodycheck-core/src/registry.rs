//! Endpoint registry: (method, path) -> schema + handler.
//!
//! Filled at startup, then shared read-only (behind an `Arc`) by every request.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;

use crate::router::{normalize_path, RouteId, Router};
use crate::schema::Schema;
use crate::CoreError;

/// Error returned by application handlers. Reported to clients as a plain 500.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, HandlerError>> + Send>>;

/// Async handler: receives the validated body, returns the response body.
pub type Handler = Arc<dyn Fn(Value) -> HandlerFuture + Send + Sync>;

/// Wrap an async closure as a `Handler`.
pub fn handler_fn<F, Fut>(f: F) -> Handler
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    Arc::new(move |body| -> HandlerFuture { Box::pin(f(body)) })
}

/// Registered endpoint: method, path, body schema, handler, optional OpenAPI tag.
#[derive(Clone)]
pub struct Endpoint {
    pub id: RouteId,
    pub method: String,
    pub path: String,
    pub schema: Schema,
    pub handler: Handler,
    pub openapi_tag: Option<String>,
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("id", &self.id)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("schema", &self.schema)
            .field("openapi_tag", &self.openapi_tag)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, Default)]
pub struct Registry {
    router: Router,
    endpoints: Vec<Endpoint>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an endpoint. Fails with `Conflict` if (method, path) is taken.
    pub fn register(
        &mut self,
        method: &str,
        path: &str,
        schema: Schema,
        handler: Handler,
    ) -> Result<RouteId, CoreError> {
        self.register_tagged(method, path, schema, handler, None)
    }

    /// Same as `register`, with an OpenAPI tag (e.g. module name).
    pub fn register_tagged(
        &mut self,
        method: &str,
        path: &str,
        schema: Schema,
        handler: Handler,
        openapi_tag: Option<&str>,
    ) -> Result<RouteId, CoreError> {
        let method = method.to_uppercase();
        let path = normalize_path(path).to_owned();
        let id = RouteId(self.endpoints.len() as u32);
        if self.router.add(&method, &path, id).is_some() {
            return Err(CoreError::Conflict { method, path });
        }
        tracing::debug!(%method, %path, schema = schema.type_name(), "registered endpoint");
        self.endpoints.push(Endpoint {
            id,
            method,
            path,
            schema,
            handler,
            openapi_tag: openapi_tag.map(String::from),
        });
        Ok(id)
    }

    /// Register with the body schema given as JSON Schema.
    pub fn register_json(
        &mut self,
        method: &str,
        path: &str,
        schema: &Value,
        handler: Handler,
    ) -> Result<RouteId, CoreError> {
        let schema = Schema::from_json(schema)?;
        self.register(method, path, schema, handler)
    }

    pub fn resolve(&self, method: &str, path: &str) -> Result<&Endpoint, CoreError> {
        self.router
            .match_route(method, path)
            .and_then(|id| self.get(id))
            .ok_or_else(|| CoreError::NotFound {
                method: method.to_owned(),
                path: path.to_owned(),
            })
    }

    /// True if (method, path) is already registered.
    pub fn contains(&self, method: &str, path: &str) -> bool {
        self.router.match_route(method, path).is_some()
    }

    pub fn get(&self, id: RouteId) -> Option<&Endpoint> {
        self.endpoints.get(id.0 as usize)
    }

    /// Endpoints in registration order.
    pub fn endpoints(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
