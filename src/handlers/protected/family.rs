use axum::extract::{Extension, Path, State};

use crate::database::models::{
    Family, FamilyChild, FamilyChildLink, FamilyCreate, FamilyDetailed, FamilyParent, FamilyParentLink, FamilyUpdate,
    ImmediateFamily,
};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody, ValidatedJson};
use crate::state::AppState;

use super::utils::parse_id;

/// GET /api/family
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Family>> {
    Ok(ApiResponse::success(state.families().list().await?))
}

/// POST /api/family
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<FamilyCreate>,
) -> ApiResult<Family> {
    Ok(ApiResponse::created(state.families().create(payload, user.user_id).await?))
}

/// GET /api/family/:id - the family with its parent and child critters
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<FamilyDetailed> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.families().get(id).await?))
}

/// PATCH /api/family/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<FamilyUpdate>,
) -> ApiResult<Family> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.families().update(id, payload, user.user_id).await?))
}

/// DELETE /api/family/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Family> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.families().delete(id).await?))
}

/// GET /api/family/parents
pub async fn list_parents(State(state): State<AppState>) -> ApiResult<Vec<FamilyParent>> {
    Ok(ApiResponse::success(state.families().list_parents().await?))
}

/// POST /api/family/parents
pub async fn add_parent(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(link): JsonBody<FamilyParentLink>,
) -> ApiResult<FamilyParent> {
    Ok(ApiResponse::created(state.families().add_parent(link, user.user_id).await?))
}

/// DELETE /api/family/parents
pub async fn remove_parent(
    State(state): State<AppState>,
    JsonBody(link): JsonBody<FamilyParentLink>,
) -> ApiResult<()> {
    state.families().remove_parent(link).await?;
    Ok(ApiResponse::no_content())
}

/// GET /api/family/children
pub async fn list_children(State(state): State<AppState>) -> ApiResult<Vec<FamilyChild>> {
    Ok(ApiResponse::success(state.families().list_children().await?))
}

/// POST /api/family/children
pub async fn add_child(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    JsonBody(link): JsonBody<FamilyChildLink>,
) -> ApiResult<FamilyChild> {
    Ok(ApiResponse::created(state.families().add_child(link, user.user_id).await?))
}

/// DELETE /api/family/children
pub async fn remove_child(State(state): State<AppState>, JsonBody(link): JsonBody<FamilyChildLink>) -> ApiResult<()> {
    state.families().remove_child(link).await?;
    Ok(ApiResponse::no_content())
}

/// GET /api/family/critter/:id - every family the critter belongs to
pub async fn list_by_critter(State(state): State<AppState>, Path(critter_id): Path<String>) -> ApiResult<Vec<Family>> {
    let critter_id = parse_id(&critter_id)?;
    Ok(ApiResponse::success(state.families().families_of_critter(critter_id).await?))
}

/// GET /api/family/immediate/:id - parents, siblings and children
pub async fn immediate(State(state): State<AppState>, Path(critter_id): Path<String>) -> ApiResult<ImmediateFamily> {
    let critter_id = parse_id(&critter_id)?;
    Ok(ApiResponse::success(state.families().immediate(critter_id).await?))
}
