//! Validating dispatcher: resolve endpoint -> parse body -> validate -> invoke handler.
//!
//! Every outcome becomes a `Response`; nothing a request does can take the process down.
//! The handler only ever sees a body that passed its endpoint's schema.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use serde_json::Value;
use tracing::Instrument;

use crate::registry::{Handler, Registry};
use crate::validate::validate;
use crate::{CoreError, Request, Response};

#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<Registry>,
}

impl Dispatcher {
    pub fn new(registry: Registry) -> Self {
        Self::from_shared(Arc::new(registry))
    }

    pub fn from_shared(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Handle one request. Never fails: errors map to 400/404/500 responses.
    pub async fn dispatch(&self, req: &Request) -> Response {
        let span = tracing::info_span!("request", method = %req.method, path = %req.path);
        async {
            match self.try_dispatch(req).await {
                Ok(response) => {
                    tracing::debug!(status = response.status_code, "handled");
                    response
                }
                Err(err) => {
                    let response = err.to_response();
                    match &err {
                        CoreError::HandlerFault(detail) => {
                            tracing::error!(%detail, "handler fault")
                        }
                        _ => tracing::debug!(status = response.status_code, error = %err, "rejected"),
                    }
                    response
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn try_dispatch(&self, req: &Request) -> Result<Response, CoreError> {
        let endpoint = self.registry.resolve(&req.method, &req.path)?;
        let body = parse_body(req.body.as_deref())?;
        let value = validate(&endpoint.schema, &body)?;
        let out = invoke(&endpoint.handler, value).await?;
        Ok(Response::ok(out))
    }
}

/// Raw body to JSON. No body or an empty one is `Value::Null`.
pub fn parse_body(raw: Option<&[u8]>) -> Result<Value, CoreError> {
    match raw {
        None => Ok(Value::Null),
        Some(bytes) if bytes.is_empty() => Ok(Value::Null),
        Some(bytes) => serde_json::from_slice(bytes).map_err(CoreError::MalformedBody),
    }
}

// Catches errors and panics, both while building the future and while polling it.
async fn invoke(handler: &Handler, value: Value) -> Result<Value, CoreError> {
    let future = std::panic::catch_unwind(AssertUnwindSafe(|| handler(value)))
        .map_err(|payload| CoreError::HandlerFault(panic_message(payload.as_ref())))?;
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(Ok(out)) => Ok(out),
        Ok(Err(err)) => Err(CoreError::HandlerFault(err.to_string())),
        Err(payload) => Err(CoreError::HandlerFault(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_is_absent() {
        assert_eq!(parse_body(None).unwrap(), Value::Null);
        assert_eq!(parse_body(Some(b"")).unwrap(), Value::Null);
        assert_eq!(parse_body(Some(b"null")).unwrap(), Value::Null);
    }

    #[test]
    fn garbage_is_malformed() {
        match parse_body(Some(b"{\"name\":")) {
            Err(CoreError::MalformedBody(_)) => {}
            other => panic!("expected MalformedBody, got {:?}", other),
        }
    }

    #[test]
    fn panic_payloads_are_described() {
        assert_eq!(panic_message(&"boom"), "panic: boom");
        assert_eq!(panic_message(&String::from("bang")), "panic: bang");
        assert_eq!(panic_message(&42u8), "panic");
    }
}
