//! Async HTTP server: tokio + hyper (http1). Converts each request into a core `Request`,
//! calls the `Service`, writes the `Response` back.
//! One task per connection; Ctrl-C stops the accept loop.

use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::StatusCode;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::service::Service;
use crate::{CoreError, Request, Response};

/// Build a multi-thread runtime and serve until Ctrl-C (blocks).
pub fn run(service: Arc<dyn Service>, config: &ServerConfig) -> Result<(), CoreError> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(serve(service, config))
}

/// Bind `config.addr()` and serve until Ctrl-C.
pub async fn serve(service: Arc<dyn Service>, config: &ServerConfig) -> Result<(), CoreError> {
    let listener = TcpListener::bind(config.addr()).await?;
    serve_with_shutdown(service, listener, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

/// Accept loop on an already bound listener; returns once `shutdown` completes.
pub async fn serve_with_shutdown<F>(
    service: Arc<dyn Service>,
    listener: TcpListener,
    shutdown: F,
) -> Result<(), CoreError>
where
    F: Future<Output = ()>,
{
    let local = listener.local_addr()?;
    tracing::info!(addr = %local, "listening");
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!(addr = %local, "shutting down");
                return Ok(());
            }
            accept_result = listener.accept() => {
                let (stream, peer) = match accept_result {
                    Ok(x) => x,
                    Err(e) => {
                        tracing::warn!(error = %e, "accept error");
                        continue;
                    }
                };
                let io = TokioIo::new(stream);
                let service = Arc::clone(&service);
                tokio::task::spawn(async move {
                    let svc = service_fn(move |req: hyper::Request<Incoming>| {
                        let service = Arc::clone(&service);
                        async move { handle(service, req).await }
                    });
                    if let Err(e) = http1::Builder::new().serve_connection(io, svc).await {
                        tracing::warn!(%peer, error = %e, "serve_connection error");
                    }
                });
            }
        }
    }
}

async fn handle(
    service: Arc<dyn Service>,
    req: hyper::Request<Incoming>,
) -> Result<hyper::Response<Full<Bytes>>, Infallible> {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::warn!(error = %e, "failed reading request body");
            return Ok(to_hyper(&Response::error(400, "body is malformed")));
        }
    };
    let request = Request {
        method,
        path,
        body: Some(body),
    };
    let response = service.call(request).await;
    Ok(to_hyper(&response))
}

fn to_hyper(response: &Response) -> hyper::Response<Full<Bytes>> {
    let mut out = hyper::Response::new(Full::new(Bytes::from(response.to_bytes())));
    *out.status_mut() =
        StatusCode::from_u16(response.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    out.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(response.content_type()));
    out
}
