//! Over-the-wire check: hyper listener + OpenApiService on an ephemeral port.

use std::sync::Arc;

use bodycheck_core::http::serve_with_shutdown;
use bodycheck_core::{
    handler_fn, Dispatcher, HandlerError, ObjectSchema, OpenApiService, Registry, Schema, Service,
};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

async fn greet(body: Value) -> Result<Value, HandlerError> {
    Ok(body.get("name").cloned().unwrap_or(json!("DEFAULT")))
}

async fn raw_request(addr: std::net::SocketAddr, head: &str, body: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "{head} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut out = String::new();
    stream.read_to_string(&mut out).await.unwrap();
    out
}

#[tokio::test]
async fn serves_validated_requests() {
    let name = Schema::object(ObjectSchema::new().field("name", Schema::string()));
    let mut registry = Registry::new();
    registry
        .register("POST", "/non-null", name.clone(), handler_fn(greet))
        .unwrap();
    registry
        .register("POST", "/nullable", Schema::nullable(name), handler_fn(greet))
        .unwrap();
    let service: Arc<dyn Service> = Arc::new(OpenApiService::new(
        Dispatcher::new(registry),
        "names",
        "0.1.0",
    ));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(serve_with_shutdown(service, listener, async move {
        let _ = stop_rx.await;
    }));

    let res = raw_request(addr, "POST /non-null", "").await;
    assert!(res.starts_with("HTTP/1.1 400"), "{}", res);
    assert!(
        res.ends_with(r#"{"statusCode":400,"error":"Bad Request","message":"body should be object"}"#),
        "{}",
        res
    );

    let res = raw_request(addr, "POST /non-null", r#"{"name":"Oleg"}"#).await;
    assert!(res.starts_with("HTTP/1.1 200"), "{}", res);
    assert!(res.to_ascii_lowercase().contains("content-type: text/plain"), "{}", res);
    assert!(res.ends_with("\r\n\r\nOleg"), "{}", res);

    let res = raw_request(addr, "POST /nullable", "").await;
    assert!(res.starts_with("HTTP/1.1 200"), "{}", res);
    assert!(res.ends_with("\r\n\r\nDEFAULT"), "{}", res);

    let res = raw_request(addr, "GET /openapi.json", "").await;
    assert!(res.starts_with("HTTP/1.1 200"), "{}", res);
    assert!(res.contains("\"openapi\":\"3.1.0\""), "{}", res);

    stop_tx.send(()).unwrap();
    server.await.unwrap().unwrap();
}
