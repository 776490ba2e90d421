use axum::extract::Extension;
use axum::http::StatusCode;
use axum::Json;

use crate::common::ManufacturerId;
use crate::domains::catalog::models::{Manufacturer, ManufacturerInput};
use crate::server::app::AppState;
use crate::server::error::{ApiError, ApiResult};
use crate::server::extract::{ApiJson, PathId};

pub async fn list_manufacturers(
    Extension(state): Extension<AppState>,
) -> ApiResult<Json<Vec<Manufacturer>>> {
    Ok(Json(Manufacturer::find_all(&state.deps.db_pool).await?))
}

pub async fn get_manufacturer(
    Extension(state): Extension<AppState>,
    PathId(id): PathId<ManufacturerId>,
) -> ApiResult<Json<Manufacturer>> {
    Manufacturer::find_by_id(id, &state.deps.db_pool)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Manufacturer"))
}

pub async fn create_manufacturer(
    Extension(state): Extension<AppState>,
    ApiJson(input): ApiJson<ManufacturerInput>,
) -> ApiResult<(StatusCode, Json<Manufacturer>)> {
    let manufacturer = Manufacturer::create(input, &state.deps.db_pool).await?;
    Ok((StatusCode::CREATED, Json(manufacturer)))
}

pub async fn update_manufacturer(
    Extension(state): Extension<AppState>,
    PathId(id): PathId<ManufacturerId>,
    ApiJson(input): ApiJson<ManufacturerInput>,
) -> ApiResult<Json<Manufacturer>> {
    Manufacturer::update(id, input, &state.deps.db_pool)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Manufacturer"))
}

/// Removes the manufacturer's products as well.
pub async fn delete_manufacturer(
    Extension(state): Extension<AppState>,
    PathId(id): PathId<ManufacturerId>,
) -> ApiResult<StatusCode> {
    if Manufacturer::delete(id, &state.deps.db_pool).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Manufacturer"))
    }
}
