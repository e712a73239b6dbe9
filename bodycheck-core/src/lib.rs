//! bodycheck core: request body schemas, validation, endpoint registry, dispatch, HTTP server.

pub mod config;
pub mod dispatch;
pub mod http;
pub mod openapi;
pub mod registry;
pub mod router;
pub mod schema;
pub mod service;
pub mod validate;

pub use config::ServerConfig;
pub use dispatch::{parse_body, Dispatcher};
pub use openapi::{openapi_spec, OpenApiService};
pub use registry::{handler_fn, Endpoint, Handler, HandlerError, HandlerFuture, Registry};
pub use router::{RouteId, Router};
pub use schema::{Field, ObjectSchema, Schema};
pub use service::Service;
pub use validate::{validate, ValidationResult, Violation, ViolationKind};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("route not found: {method} {path}")]
    NotFound { method: String, path: String },
    #[error("route already registered: {method} {path}")]
    Conflict { method: String, path: String },
    #[error("body is malformed: {0}")]
    MalformedBody(#[source] serde_json::Error),
    #[error("validation error: {0}")]
    Validation(#[from] Violation),
    #[error("handler fault: {0}")]
    HandlerFault(String),
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// HTTP status reported to the client for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            CoreError::NotFound { .. } => 404,
            CoreError::MalformedBody(_) | CoreError::Validation(_) => 400,
            CoreError::HandlerFault(_)
            | CoreError::Conflict { .. }
            | CoreError::InvalidSchema(_)
            | CoreError::Io(_) => 500,
        }
    }

    /// Error envelope sent to the client. Server-side detail never leaks into a 500.
    pub fn to_response(&self) -> Response {
        let status = self.status_code();
        match self {
            CoreError::NotFound { method, path } => {
                let path = router::normalize_path(path);
                let message = format!("Route {}:/{} not found", method.to_uppercase(), path);
                Response::error(status, message)
            }
            CoreError::MalformedBody(_) => Response::error(status, "body is malformed"),
            CoreError::Validation(violation) => violation.to_response(),
            _ => Response::error(status, reason_phrase(status)),
        }
    }
}

/// Request handed to the core by the HTTP layer. An empty body is the same as no body.
#[derive(Clone, Debug, Default)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub body: Option<Bytes>,
}

impl Request {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// Body of every error response. Field names and order are part of the wire contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub status_code: u16,
    pub error: String,
    pub message: String,
}

/// Result of one dispatch: status plus body, serialized by the HTTP layer.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    pub status_code: u16,
    pub body: Value,
}

impl Response {
    /// 200 with the handler's value as-is.
    pub fn ok(body: Value) -> Self {
        Self {
            status_code: 200,
            body,
        }
    }

    /// `{ statusCode, error, message }` envelope.
    pub fn error(status_code: u16, message: impl Into<String>) -> Self {
        let envelope = ErrorBody {
            status_code,
            error: reason_phrase(status_code).to_owned(),
            message: message.into(),
        };
        Self {
            status_code,
            body: serde_json::to_value(envelope).unwrap_or_default(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Bare strings go out as plain text; everything else as JSON.
    pub fn content_type(&self) -> &'static str {
        match self.body {
            Value::String(_) => "text/plain; charset=utf-8",
            _ => "application/json",
        }
    }

    /// Wire bytes for the body (see `content_type`).
    pub fn to_bytes(&self) -> Vec<u8> {
        match &self.body {
            Value::String(s) => s.as_bytes().to_vec(),
            other => serde_json::to_vec(other).unwrap_or_default(),
        }
    }
}

fn reason_phrase(status_code: u16) -> &'static str {
    ::http::StatusCode::from_u16(status_code)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
}
