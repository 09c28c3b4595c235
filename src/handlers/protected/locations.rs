use axum::extract::{Extension, Path, State};

use crate::database::models::{Location, LocationCreate, LocationUpdate};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidatedJson};
use crate::state::AppState;

use super::utils::parse_id;

/// GET /api/locations
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Location>> {
    Ok(ApiResponse::success(state.locations().list().await?))
}

/// POST /api/locations
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<LocationCreate>,
) -> ApiResult<Location> {
    Ok(ApiResponse::created(state.locations().create(payload, user.user_id).await?))
}

/// GET /api/locations/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Location> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.locations().get(id).await?))
}

/// PATCH /api/locations/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<LocationUpdate>,
) -> ApiResult<Location> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.locations().update(id, payload, user.user_id).await?))
}

/// DELETE /api/locations/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Location> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.locations().delete(id).await?))
}
