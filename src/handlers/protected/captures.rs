use axum::extract::{Extension, Path, State};

use crate::database::models::{Capture, CaptureCreate, CaptureDetailed, CaptureUpdate};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidatedJson};
use crate::state::AppState;

use super::utils::parse_id;

/// POST /api/captures - nested capture/release locations are created with it
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<CaptureCreate>,
) -> ApiResult<CaptureDetailed> {
    Ok(ApiResponse::created(state.captures().create(payload, user.user_id).await?))
}

/// GET /api/captures/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<CaptureDetailed> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.captures().get(id).await?))
}

/// GET /api/captures/critter/:id
pub async fn list_by_critter(
    State(state): State<AppState>,
    Path(critter_id): Path<String>,
) -> ApiResult<Vec<CaptureDetailed>> {
    let critter_id = parse_id(&critter_id)?;
    Ok(ApiResponse::success(state.captures().list_by_critter(critter_id).await?))
}

/// PATCH /api/captures/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<CaptureUpdate>,
) -> ApiResult<CaptureDetailed> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.captures().update(id, payload, user.user_id).await?))
}

/// DELETE /api/captures/:id - its locations go with it
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Capture> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.captures().delete(id).await?))
}
