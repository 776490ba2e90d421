//! JSON error responses for the REST API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::domains::catalog::CatalogError;

// Postgres SQLSTATE codes
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized,
    NotFound(String),
    Conflict(String),
    Unprocessable(String),
    Internal(anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound(format!("{} not found", what))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::BadRequest(m)
            | ApiError::NotFound(m)
            | ApiError::Conflict(m)
            | ApiError::Unprocessable(m) => m.clone(),
            ApiError::Unauthorized => "Missing or invalid API key".to_string(),
            ApiError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        let message = e.to_string();
        match e {
            CatalogError::Validation(_) => ApiError::BadRequest(message),
            CatalogError::UnknownManufacturer(_) | CatalogError::UnknownCategory(_) => {
                ApiError::Unprocessable(message)
            }
            CatalogError::CategoryCycle | CatalogError::CategoryHasChildren(_) => {
                ApiError::Conflict(message)
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        let e = match e.downcast::<CatalogError>() {
            Ok(catalog) => return catalog.into(),
            Err(e) => e,
        };

        if let Some(sqlx::Error::Database(db)) = e.downcast_ref::<sqlx::Error>() {
            match db.code().as_deref() {
                Some(UNIQUE_VIOLATION) => {
                    return ApiError::Conflict("A record with these values already exists".to_string())
                }
                Some(FOREIGN_KEY_VIOLATION) => {
                    return ApiError::Unprocessable("Referenced record does not exist".to_string())
                }
                _ => {}
            }
        }

        ApiError::Internal(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(e) = &self {
            error!(error = ?e, "request failed");
        }
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ManufacturerId;

    #[test]
    fn test_catalog_errors_map_to_client_statuses() {
        let cases = [
            (CatalogError::Validation("name is required".into()), StatusCode::BAD_REQUEST),
            (
                CatalogError::UnknownManufacturer(ManufacturerId::new()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (CatalogError::CategoryCycle, StatusCode::CONFLICT),
            (CatalogError::CategoryHasChildren(2), StatusCode::CONFLICT),
        ];
        for (error, status) in cases {
            let api: ApiError = anyhow::Error::from(error).into();
            assert_eq!(api.status(), status);
        }
    }

    #[test]
    fn test_context_does_not_hide_catalog_error() {
        let error = anyhow::Error::from(CatalogError::CategoryCycle).context("updating category");
        let api: ApiError = error.into();
        assert_eq!(api.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let api: ApiError = anyhow::anyhow!("connection refused on 10.0.0.3").into();
        assert_eq!(api.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message(), "Internal server error");
    }
}
