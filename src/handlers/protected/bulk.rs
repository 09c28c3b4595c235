use axum::extract::{Extension, State};

use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody};
use crate::services::{BulkCreate, BulkPatch, BulkSummary};
use crate::state::AppState;

/// POST /api/bulk - create many rows of many kinds in one transaction
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(request): JsonBody<BulkCreate>,
) -> ApiResult<BulkSummary> {
    Ok(ApiResponse::created(state.bulk().create(request, user.user_id).await?))
}

/// PATCH /api/bulk - update, or delete entries flagged `_delete`
pub async fn patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(request): JsonBody<BulkPatch>,
) -> ApiResult<BulkSummary> {
    Ok(ApiResponse::success(state.bulk().patch(request, user.user_id).await?))
}
