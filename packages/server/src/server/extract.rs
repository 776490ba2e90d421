//! Request extractors that reject with the JSON error body.

use std::str::FromStr;

use axum::async_trait;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path};
use axum::http::request::Parts;
use axum::http::StatusCode;

use crate::server::error::ApiError;

/// JSON request body; malformed bodies get the `{"error": ...}` shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string; bad parameters get the `{"error": ...}` shape.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // Well-formed JSON of the wrong shape is a 422, everything else a 400
        if rejection.status() == StatusCode::UNPROCESSABLE_ENTITY {
            ApiError::Unprocessable(rejection.body_text())
        } else {
            ApiError::BadRequest(rejection.body_text())
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Typed id from the `:id` path segment, e.g. `PathId<ProductId>`.
pub struct PathId<I>(pub I);

#[async_trait]
impl<S, I> FromRequestParts<S> for PathId<I>
where
    S: Send + Sync,
    I: FromStr + Send,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        raw.parse()
            .map(PathId)
            .map_err(|_| ApiError::BadRequest(format!("Invalid id: {}", raw)))
    }
}
