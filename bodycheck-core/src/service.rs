//! Service seam between the HTTP listener and the core: request in, response out.
//! Any listener (the built-in hyper one, a test harness, another server) drives a `Service`.

use async_trait::async_trait;

use crate::dispatch::Dispatcher;
use crate::{Request, Response};

#[async_trait]
pub trait Service: Send + Sync {
    /// Handle one request. Errors are already folded into the response.
    async fn call(&self, req: Request) -> Response;
}

#[async_trait]
impl Service for Dispatcher {
    async fn call(&self, req: Request) -> Response {
        self.dispatch(&req).await
    }
}
