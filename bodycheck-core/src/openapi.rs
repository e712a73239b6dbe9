//! OpenAPI document built from registered endpoints, served at GET /openapi.json.

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::dispatch::Dispatcher;
use crate::registry::Registry;
use crate::router::normalize_path;
use crate::service::Service;
use crate::{Request, Response};

pub const OPENAPI_PATH: &str = "openapi.json";

/// 3.1 aligns with JSON Schema, so nullable bodies stay `anyOf [.., {"type":"null"}]`.
pub const OPENAPI_VERSION: &str = "3.1.0";

/// Minimal OpenAPI document: one operation per endpoint, request body schema when it accepts one.
pub fn openapi_spec(registry: &Registry, title: &str, version: &str) -> Value {
    let mut paths: Map<String, Value> = Map::new();
    for endpoint in registry.endpoints() {
        let key = format!("/{}", endpoint.path);
        let mut op = Map::new();
        let tags = endpoint
            .openapi_tag
            .as_ref()
            .map(|t| json!([t.as_str()]))
            .unwrap_or(json!([]));
        op.insert("tags".into(), tags);
        op.insert(
            "requestBody".into(),
            json!({
                "required": !endpoint.schema.accepts_absent(),
                "content": { "application/json": { "schema": endpoint.schema.to_json() } }
            }),
        );
        op.insert(
            "responses".into(),
            json!({
                "200": { "description": "OK" },
                "400": { "description": "Bad Request" }
            }),
        );
        let entry = paths.entry(key).or_insert_with(|| json!({}));
        if let Value::Object(methods) = entry {
            methods.insert(endpoint.method.to_lowercase(), Value::Object(op));
        }
    }
    json!({
        "openapi": OPENAPI_VERSION,
        "info": { "title": title, "version": version },
        "paths": paths
    })
}

/// Dispatcher plus GET /openapi.json. The document is built once, at construction.
/// An endpoint registered at GET /openapi.json takes precedence over the document.
pub struct OpenApiService {
    dispatcher: Dispatcher,
    document: Value,
}

impl OpenApiService {
    pub fn new(dispatcher: Dispatcher, title: &str, version: &str) -> Self {
        let document = openapi_spec(dispatcher.registry(), title, version);
        Self {
            dispatcher,
            document,
        }
    }

    pub fn document(&self) -> &Value {
        &self.document
    }
}

#[async_trait]
impl Service for OpenApiService {
    async fn call(&self, req: Request) -> Response {
        let is_document = req.method.eq_ignore_ascii_case("GET")
            && normalize_path(&req.path) == OPENAPI_PATH
            && self.dispatcher.registry().resolve(&req.method, &req.path).is_err();
        if is_document {
            return Response::ok(self.document.clone());
        }
        self.dispatcher.dispatch(&req).await
    }
}
