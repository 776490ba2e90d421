use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, Method, Request};
use axum::{body::Body, middleware::Next, response::IntoResponse, response::Response};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::server::error::ApiError;

/// Admin API key check
///
/// Reads are public except under `/api/admin`; every other method needs
/// `Authorization: Bearer <ADMIN_API_KEY>`. Without a configured key the
/// API is open.
pub async fn admin_auth_middleware(
    admin_key: Option<Arc<SecretString>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = admin_key else {
        return next.run(request).await;
    };

    if !requires_admin(request.method(), request.uri().path()) {
        return next.run(request).await;
    }

    match bearer_token(&request) {
        Some(token) if keys_match(token, expected.expose_secret()) => next.run(request).await,
        _ => {
            debug!(method = %request.method(), path = %request.uri().path(), "Rejected request without admin key");
            ApiError::Unauthorized.into_response()
        }
    }
}

/// Mutations and the admin surface; chat search is a read despite being a POST.
pub fn requires_admin(method: &Method, path: &str) -> bool {
    if path.starts_with("/api/admin") {
        return true;
    }
    if path == "/api/chat/search" || !path.starts_with("/api/") {
        return false;
    }
    !matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

fn bearer_token(request: &Request<Body>) -> Option<&str> {
    let header = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    header.strip_prefix("Bearer ").map(str::trim)
}

// Length leaks, contents don't
fn keys_match(given: &str, expected: &str) -> bool {
    given.len() == expected.len()
        && given
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
