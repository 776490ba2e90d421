use axum::extract::Extension;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::common::{CategoryId, JobId, ManufacturerId, Page, PaginationArgs, ProductId};
use crate::domains::catalog::models::{ExtractionRun, Product, ProductFilter, ProductInput};
use crate::kernel::jobs::JobCommand;
use crate::server::app::AppState;
use crate::server::error::{ApiError, ApiResult};
use crate::server::extract::{ApiJson, ApiQuery, PathId};

#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub manufacturer_id: Option<ManufacturerId>,
    pub category_id: Option<CategoryId>,
    pub q: Option<String>,
    pub first: Option<i32>,
    pub after: Option<String>,
}

/// `GET /api/products?manufacturer_id=&category_id=&q=&first=&after=`
pub async fn list_products(
    Extension(state): Extension<AppState>,
    ApiQuery(query): ApiQuery<ProductListQuery>,
) -> ApiResult<Json<Page<Product>>> {
    let args = PaginationArgs {
        first: query.first,
        after: query.after,
    }
    .validate()
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let filter = ProductFilter {
        manufacturer_id: query.manufacturer_id,
        category_id: query.category_id,
        q: query.q,
    };

    let rows = Product::find_paginated(&filter, &args, &state.deps.db_pool).await?;
    Ok(Json(Page::from_rows(rows, &args, |p| p.id.into_uuid())))
}

pub async fn get_product(
    Extension(state): Extension<AppState>,
    PathId(id): PathId<ProductId>,
) -> ApiResult<Json<Product>> {
    Product::find_by_id(id, &state.deps.db_pool)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product"))
}

pub async fn create_product(
    Extension(state): Extension<AppState>,
    ApiJson(input): ApiJson<ProductInput>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = Product::create(input, &state.deps.db_pool).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    Extension(state): Extension<AppState>,
    PathId(id): PathId<ProductId>,
    ApiJson(input): ApiJson<ProductInput>,
) -> ApiResult<Json<Product>> {
    Product::update(id, input, &state.deps.db_pool)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product"))
}

pub async fn delete_product(
    Extension(state): Extension<AppState>,
    PathId(id): PathId<ProductId>,
) -> ApiResult<StatusCode> {
    if Product::delete(id, &state.deps.db_pool).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Product"))
    }
}

/// Extraction history, newest first.
pub async fn list_product_extractions(
    Extension(state): Extension<AppState>,
    PathId(id): PathId<ProductId>,
) -> ApiResult<Json<Vec<ExtractionRun>>> {
    if Product::find_by_id(id, &state.deps.db_pool).await?.is_none() {
        return Err(ApiError::not_found("Product"));
    }
    Ok(Json(ExtractionRun::find_for_product(id, &state.deps.db_pool).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct ExtractQuery {
    /// Re-run even when the datasheet is unchanged
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
pub struct QueuedJob {
    pub job_id: JobId,
    /// False when an identical job was already pending or running
    pub created: bool,
}

/// `POST /api/products/:id/extract?force=true`
pub async fn extract_product(
    Extension(state): Extension<AppState>,
    PathId(id): PathId<ProductId>,
    ApiQuery(query): ApiQuery<ExtractQuery>,
) -> ApiResult<(StatusCode, Json<QueuedJob>)> {
    let product = Product::find_by_id(id, &state.deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Product"))?;
    if product.pdf_url.is_none() {
        return Err(ApiError::Unprocessable(
            "Product has no datasheet to extract".to_string(),
        ));
    }

    let result = state
        .deps
        .jobs
        .enqueue(&JobCommand::ExtractProduct {
            product_id: id,
            force: query.force,
        })
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(QueuedJob {
            job_id: result.job_id(),
            created: result.is_created(),
        }),
    ))
}
