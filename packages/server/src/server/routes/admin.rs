use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::common::JobId;
use crate::domains::catalog::models::{ConflictReport, ExtractionRun, Overview, Product};
use crate::kernel::jobs::{Job, JobCommand};
use crate::server::app::AppState;
use crate::server::error::{ApiError, ApiResult};
use crate::server::extract::{ApiJson, ApiQuery, PathId};
use crate::server::routes::products::QueuedJob;

const DEFAULT_SEARCH_LIMIT: i64 = 25;
const MAX_SEARCH_LIMIT: i64 = 100;

/// Catalog totals, per-manufacturer coverage and job counts.
pub async fn overview(Extension(state): Extension<AppState>) -> ApiResult<Json<Overview>> {
    Ok(Json(Overview::load(&state.deps.db_pool).await?))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub limit: Option<i64>,
}

/// Keyword search over product names and datasheet text.
pub async fn search(
    Extension(state): Extension<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let q = query.q.trim();
    if q.is_empty() {
        return Err(ApiError::BadRequest("q is required".to_string()));
    }
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);

    Ok(Json(Product::keyword_search(q, limit, &state.deps.db_pool).await?))
}

#[derive(Debug, Deserialize)]
pub struct ConflictsQuery {
    pub limit: Option<i64>,
}

/// Products whose latest extraction disagreed between strategies.
pub async fn conflicts(
    Extension(state): Extension<AppState>,
    ApiQuery(query): ApiQuery<ConflictsQuery>,
) -> ApiResult<Json<Vec<ConflictReport>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);
    Ok(Json(
        ExtractionRun::find_open_conflicts(limit, &state.deps.db_pool).await?,
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct ScrapeRequest {
    pub max_products: Option<usize>,
}

/// `POST /api/admin/scrape/:manufacturer` queues a catalogue scrape.
pub async fn scrape(
    Extension(state): Extension<AppState>,
    Path(manufacturer): Path<String>,
    body: Option<ApiJson<ScrapeRequest>>,
) -> ApiResult<(StatusCode, Json<QueuedJob>)> {
    let slug = manufacturer.trim().to_lowercase();
    if !state.deps.sources.slugs().contains(&slug) {
        return Err(ApiError::NotFound(format!(
            "No scraper for manufacturer '{}'",
            manufacturer
        )));
    }

    let max_products = body.and_then(|ApiJson(request)| request.max_products);
    let result = state
        .deps
        .jobs
        .enqueue(&JobCommand::ScrapeManufacturer { slug, max_products })
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(QueuedJob {
            job_id: result.job_id(),
            created: result.is_created(),
        }),
    ))
}

pub async fn get_job(
    Extension(state): Extension<AppState>,
    PathId(id): PathId<JobId>,
) -> ApiResult<Json<Job>> {
    Job::find_by_id(id, &state.deps.db_pool)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Job"))
}
