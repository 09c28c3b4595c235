use axum::extract::{Extension, Path, State};

use crate::database::models::measurement::MeasurementVerify;
use crate::database::models::{
    CritterMeasurements, QualitativeMeasurement, QualitativeMeasurementCreate, QualitativeMeasurementUpdate,
    QuantitativeMeasurement, QuantitativeMeasurementCreate, QuantitativeMeasurementUpdate, Verification,
};
use crate::middleware::{ApiResponse, ApiResult, AuthUser, ValidatedJson};
use crate::state::AppState;

use super::utils::parse_id;

/// GET /api/measurements/critter/:id - both kinds for one critter
pub async fn list_by_critter(
    State(state): State<AppState>,
    Path(critter_id): Path<String>,
) -> ApiResult<CritterMeasurements> {
    let critter_id = parse_id(&critter_id)?;
    Ok(ApiResponse::success(state.measurements().list_by_critter(critter_id).await?))
}

/// POST /api/measurements/verify
pub async fn verify(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<MeasurementVerify>,
) -> ApiResult<Verification> {
    Ok(ApiResponse::success(state.measurements().verify(&request).await?))
}

/// POST /api/measurements/qualitative
pub async fn create_qualitative(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<QualitativeMeasurementCreate>,
) -> ApiResult<QualitativeMeasurement> {
    let created = state.measurements().create_qualitative(payload, user.user_id).await?;
    Ok(ApiResponse::created(created))
}

/// GET /api/measurements/qualitative/:id
pub async fn get_qualitative(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<QualitativeMeasurement> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.measurements().get_qualitative(id).await?))
}

/// PATCH /api/measurements/qualitative/:id
pub async fn update_qualitative(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<QualitativeMeasurementUpdate>,
) -> ApiResult<QualitativeMeasurement> {
    let id = parse_id(&id)?;
    let updated = state.measurements().update_qualitative(id, payload, user.user_id).await?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/measurements/qualitative/:id
pub async fn delete_qualitative(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<QualitativeMeasurement> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.measurements().delete_qualitative(id).await?))
}

/// POST /api/measurements/quantitative
pub async fn create_quantitative(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    ValidatedJson(payload): ValidatedJson<QuantitativeMeasurementCreate>,
) -> ApiResult<QuantitativeMeasurement> {
    let created = state.measurements().create_quantitative(payload, user.user_id).await?;
    Ok(ApiResponse::created(created))
}

/// GET /api/measurements/quantitative/:id
pub async fn get_quantitative(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<QuantitativeMeasurement> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.measurements().get_quantitative(id).await?))
}

/// PATCH /api/measurements/quantitative/:id
pub async fn update_quantitative(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<QuantitativeMeasurementUpdate>,
) -> ApiResult<QuantitativeMeasurement> {
    let id = parse_id(&id)?;
    let updated = state.measurements().update_quantitative(id, payload, user.user_id).await?;
    Ok(ApiResponse::success(updated))
}

/// DELETE /api/measurements/quantitative/:id
pub async fn delete_quantitative(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<QuantitativeMeasurement> {
    let id = parse_id(&id)?;
    Ok(ApiResponse::success(state.measurements().delete_quantitative(id).await?))
}
