use axum::extract::{Extension, Path, State};

use crate::database::models::marking::MarkingVerify;
use crate::database::models::{Marking, MarkingCreate, MarkingUpdate, Verification};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody, ValidatedJson};
use crate::state::AppState;

use super::utils::parse_id;

/// POST /api/markings
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<MarkingCreate>,
) -> ApiResult<Marking> {
    Ok(ApiResponse::created(state.markings().create(payload, user.user_id).await?))
}

/// POST /api/markings/verify - check body locations against critter taxa
pub async fn verify(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<MarkingVerify>,
) -> ApiResult<Verification> {
    Ok(ApiResponse::success(state.markings().verify(&request).await?))
}

/// GET /api/markings/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Marking> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.markings().get(id).await?))
}

/// GET /api/markings/critter/:id
pub async fn list_by_critter(State(state): State<AppState>, Path(critter_id): Path<String>) -> ApiResult<Vec<Marking>> {
    let critter_id = parse_id(&critter_id)?;
    Ok(ApiResponse::success(state.markings().list_by_critter(critter_id).await?))
}

/// PATCH /api/markings/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<MarkingUpdate>,
) -> ApiResult<Marking> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.markings().update(id, payload, user.user_id).await?))
}

/// DELETE /api/markings/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Marking> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.markings().delete(id).await?))
}
