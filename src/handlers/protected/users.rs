use axum::extract::{Extension, Path, State};

use crate::database::models::{User, UserCreate, UserUpdate};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidatedJson};
use crate::state::AppState;

use super::utils::parse_id;

/// GET /api/users
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    Ok(ApiResponse::success(state.users().list().await?))
}

/// POST /api/users
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<UserCreate>,
) -> ApiResult<User> {
    Ok(ApiResponse::created(state.users().create(payload, user.user_id).await?))
}

/// GET /api/users/me - the user the request acts as
pub async fn me(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<User> {
    Ok(ApiResponse::success(state.users().get(user.user_id).await?))
}

/// GET /api/users/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<User> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.users().get(id).await?))
}

/// PATCH /api/users/:id
pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UserUpdate>,
) -> ApiResult<User> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.users().update(id, payload, user.user_id).await?))
}

/// DELETE /api/users/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<User> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.users().delete(id).await?))
}
