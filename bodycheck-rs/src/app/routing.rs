//! HttpModule: endpoints grouped under a path prefix.

use std::collections::HashSet;
use std::future::Future;

use bodycheck_core::router::normalize_path;
use bodycheck_core::{handler_fn, CoreError, Handler, HandlerError, Schema};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::application::{typed_handler, Application};
use super::Module;

struct PendingRoute {
    method: String,
    path: String,
    schema: Schema,
    handler: Handler,
}

/// Named group of endpoints. Attach via `app.register(&mut module)`; the name becomes the OpenAPI tag.
pub struct HttpModule {
    pub name: String,
    pub prefix: String,
    routes: Vec<PendingRoute>,
}

impl HttpModule {
    /// Prefix defaults to `/{name}`.
    pub fn new(name: &str, prefix: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            prefix: prefix
                .map(String::from)
                .unwrap_or_else(|| format!("/{}", name)),
            routes: Vec::new(),
        }
    }

    /// Add an endpoint for each of `methods`. `path` is relative to the prefix.
    pub fn route(mut self, path: &str, schema: Schema, handler: Handler, methods: &[&str]) -> Self {
        let full_path = format!(
            "{}/{}",
            self.prefix.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        for method in methods {
            self.routes.push(PendingRoute {
                method: method.to_string(),
                path: full_path.clone(),
                schema: schema.clone(),
                handler: handler.clone(),
            });
        }
        self
    }

    pub fn post<F, Fut>(self, path: &str, schema: Schema, handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
    {
        self.route(path, schema, handler_fn(handler), &["POST"])
    }

    pub fn post_typed<T, R, F, Fut>(self, path: &str, schema: Schema, handler: F) -> Self
    where
        T: DeserializeOwned + Send + 'static,
        R: Serialize + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, HandlerError>> + Send + 'static,
    {
        self.route(path, schema, typed_handler(handler), &["POST"])
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl HttpModule {
    /// First route that is taken in `app` or repeated within this module.
    fn find_conflict(&self, app: &Application) -> Option<CoreError> {
        let mut seen = HashSet::new();
        self.routes.iter().find_map(|route| {
            let method = route.method.to_uppercase();
            let path = normalize_path(&route.path).to_owned();
            let taken = app.registry().contains(&method, &path);
            if taken || !seen.insert((method.clone(), path.clone())) {
                Some(CoreError::Conflict { method, path })
            } else {
                None
            }
        })
    }
}

impl Module for HttpModule {
    /// All or nothing: on `Conflict` the app is unchanged and the module keeps its routes.
    fn register_into(&mut self, app: &mut Application) -> Result<(), CoreError> {
        if let Some(conflict) = self.find_conflict(app) {
            return Err(conflict);
        }
        for route in self.routes.drain(..) {
            app.route_tagged(
                &route.method,
                &route.path,
                route.schema,
                route.handler,
                Some(&self.name),
            )?;
        }
        Ok(())
    }
}
