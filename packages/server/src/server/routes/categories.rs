use axum::extract::Extension;
use axum::http::StatusCode;
use axum::Json;

use crate::common::CategoryId;
use crate::domains::catalog::models::{build_tree, Category, CategoryInput, CategoryNode};
use crate::server::app::AppState;
use crate::server::error::{ApiError, ApiResult};
use crate::server::extract::{ApiJson, PathId};

pub async fn list_categories(
    Extension(state): Extension<AppState>,
) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(Category::find_all(&state.deps.db_pool).await?))
}

/// Whole hierarchy, roots first, children sorted by name.
pub async fn category_tree(
    Extension(state): Extension<AppState>,
) -> ApiResult<Json<Vec<CategoryNode>>> {
    let categories = Category::find_all(&state.deps.db_pool).await?;
    Ok(Json(build_tree(categories)))
}

pub async fn get_category(
    Extension(state): Extension<AppState>,
    PathId(id): PathId<CategoryId>,
) -> ApiResult<Json<Category>> {
    Category::find_by_id(id, &state.deps.db_pool)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Category"))
}

pub async fn create_category(
    Extension(state): Extension<AppState>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = Category::create(input, &state.deps.db_pool).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    Extension(state): Extension<AppState>,
    PathId(id): PathId<CategoryId>,
    ApiJson(input): ApiJson<CategoryInput>,
) -> ApiResult<Json<Category>> {
    Category::update(id, input, &state.deps.db_pool)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Category"))
}

pub async fn delete_category(
    Extension(state): Extension<AppState>,
    PathId(id): PathId<CategoryId>,
) -> ApiResult<StatusCode> {
    if Category::delete(id, &state.deps.db_pool).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Category"))
    }
}
