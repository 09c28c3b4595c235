use axum::extract::{Extension, Path, State};

use crate::database::models::{Mortality, MortalityCreate, MortalityDetailed, MortalityUpdate};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidatedJson};
use crate::state::AppState;

use super::utils::parse_id;

/// POST /api/mortality
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<MortalityCreate>,
) -> ApiResult<MortalityDetailed> {
    Ok(ApiResponse::created(state.mortalities().create(payload, user.user_id).await?))
}

/// GET /api/mortality/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<MortalityDetailed> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.mortalities().get(id).await?))
}

/// GET /api/mortality/critter/:id
pub async fn list_by_critter(
    State(state): State<AppState>,
    Path(critter_id): Path<String>,
) -> ApiResult<Vec<MortalityDetailed>> {
    let critter_id = parse_id(&critter_id)?;
    Ok(ApiResponse::success(state.mortalities().list_by_critter(critter_id).await?))
}

/// PATCH /api/mortality/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<MortalityUpdate>,
) -> ApiResult<MortalityDetailed> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.mortalities().update(id, payload, user.user_id).await?))
}

/// DELETE /api/mortality/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Mortality> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.mortalities().delete(id).await?))
}
