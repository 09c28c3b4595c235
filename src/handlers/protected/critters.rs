use axum::extract::{Extension, Path, State};
use serde::{Deserialize, Serialize};

use crate::database::models::{Critter, CritterCreate, CritterDetailed, CritterFilter, CritterSimilar, CritterUpdate};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, JsonBody, QueryParams, ValidatedJson};
use crate::state::AppState;

use super::utils::{parse_id, FormatQuery};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub wlh_id: Option<String>,
}

/// `?format=default|detailed`
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CritterView {
    Default(Critter),
    Detailed(Box<CritterDetailed>),
}

/// GET /api/critters - all critters, or those with `?wlh_id=`
pub async fn list(State(state): State<AppState>, QueryParams(query): QueryParams<ListQuery>) -> ApiResult<Vec<Critter>> {
    let critters = state.critters().list(query.wlh_id.as_deref()).await?;
    Ok(ApiResponse::success(critters))
}

/// POST /api/critters
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<CritterCreate>,
) -> ApiResult<Critter> {
    let critter = state.critters().create(payload, user.user_id).await?;
    Ok(ApiResponse::created(critter))
}

/// POST /api/critters/filter
pub async fn filter(
    State(state): State<AppState>,
    ValidatedJson(filter): ValidatedJson<CritterFilter>,
) -> ApiResult<Vec<Critter>> {
    Ok(ApiResponse::success(state.critters().filter(&filter).await?))
}

/// POST /api/critters/unique - critters that may be the same animal
pub async fn unique(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CritterSimilar>,
) -> ApiResult<Vec<Critter>> {
    Ok(ApiResponse::success(state.critters().similar(&request).await?))
}

/// GET /api/critters/:id
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
    QueryParams(query): QueryParams<FormatQuery>,
) -> ApiResult<CritterView> {
    let id = parse_id(&id)?;
    let view = if query.is("detailed") {
        CritterView::Detailed(Box::new(state.critters().get_detailed(id).await?))
    } else {
        CritterView::Default(state.critters().get(id).await?)
    };
    Ok(ApiResponse::success(view))
}

/// PATCH /api/critters/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<CritterUpdate>,
) -> ApiResult<Critter> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.critters().update(id, payload, user.user_id).await?))
}

/// DELETE /api/critters/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Critter> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.critters().delete(id).await?))
}
