//! One-shot requests against the router.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    bearer: Option<&str>,
) -> (StatusCode, Value) {
    match body {
        Some(json) => send_raw(app, method, uri, &json.to_string(), bearer).await,
        None => dispatch(app, request(method, uri, bearer).body(Body::empty())).await,
    }
}

/// Send `body` verbatim as `application/json`, well-formed or not.
pub async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    body: &str,
    bearer: Option<&str>,
) -> (StatusCode, Value) {
    let request = request(method, uri, bearer)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()));
    dispatch(app, request).await
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None, None).await
}

fn request(method: Method, uri: &str, bearer: Option<&str>) -> axum::http::request::Builder {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    request
}

async fn dispatch(
    app: &Router,
    request: Result<Request<Body>, axum::http::Error>,
) -> (StatusCode, Value) {
    let request = request.expect("valid request");
    let response = app.clone().oneshot(request).await.expect("router is infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}
