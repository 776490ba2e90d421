use axum::extract::Extension;
use axum::Json;

use crate::domains::chat::{chat_search, ChatSearchRequest, ChatSearchResponse};
use crate::server::app::AppState;
use crate::server::error::ApiResult;
use crate::server::extract::ApiJson;

/// `POST /api/chat/search {query, limit}`
pub async fn chat_search_handler(
    Extension(state): Extension<AppState>,
    ApiJson(request): ApiJson<ChatSearchRequest>,
) -> ApiResult<Json<ChatSearchResponse>> {
    Ok(Json(chat_search(request, &state.deps).await?))
}
