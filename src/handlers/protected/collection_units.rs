use axum::extract::{Extension, Path, State};

use crate::database::models::{CritterCollectionUnit, CritterCollectionUnitCreate, CritterCollectionUnitUpdate};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidatedJson};
use crate::state::AppState;

use super::utils::parse_id;

/// POST /api/collection-units
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<CritterCollectionUnitCreate>,
) -> ApiResult<CritterCollectionUnit> {
    Ok(ApiResponse::created(state.collection_units().create(payload, user.user_id).await?))
}

/// GET /api/collection-units/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<CritterCollectionUnit> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.collection_units().get(id).await?))
}

/// GET /api/collection-units/critter/:id
pub async fn list_by_critter(
    State(state): State<AppState>,
    Path(critter_id): Path<String>,
) -> ApiResult<Vec<CritterCollectionUnit>> {
    let critter_id = parse_id(&critter_id)?;
    Ok(ApiResponse::success(state.collection_units().list_by_critter(critter_id).await?))
}

/// PATCH /api/collection-units/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<CritterCollectionUnitUpdate>,
) -> ApiResult<CritterCollectionUnit> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.collection_units().update(id, payload, user.user_id).await?))
}

/// DELETE /api/collection-units/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<CritterCollectionUnit> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.collection_units().delete(id).await?))
}
