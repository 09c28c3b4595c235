use axum::extract::{Path, State};
use serde::Deserialize;

use crate::database::models::xref::{
    CollectionCategoryForTaxon, CollectionUnit, QualitativeMeasurementWithOptions, QualitativeOption,
    TaxonMarkingBodyLocation, TaxonMeasurements, TaxonQuantitativeMeasurement,
};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, QueryParams};
use crate::state::AppState;

use super::utils::parse_id;

#[derive(Debug, Deserialize)]
pub struct TsnQuery {
    pub tsn: Option<i32>,
}

impl TsnQuery {
    fn tsn(&self) -> Result<i32, ApiError> {
        match self.tsn {
            Some(tsn) if tsn > 0 => Ok(tsn),
            Some(_) => Err(ApiError::bad_request("tsn must be a positive integer")),
            None => Err(ApiError::bad_request("tsn query parameter is required")),
        }
    }
}

/// GET /api/xref/taxon-collection-categories?tsn=
pub async fn collection_categories(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<TsnQuery>,
) -> ApiResult<Vec<CollectionCategoryForTaxon>> {
    Ok(ApiResponse::success(state.xref().collection_categories(query.tsn()?).await?))
}

/// GET /api/xref/collection-units/:category_id
pub async fn collection_units(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
) -> ApiResult<Vec<CollectionUnit>> {
    let category_id = parse_id(&category_id)?;
    Ok(ApiResponse::success(state.xref().collection_units(category_id).await?))
}

/// GET /api/xref/taxon-marking-body-locations?tsn=
pub async fn marking_body_locations(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<TsnQuery>,
) -> ApiResult<Vec<TaxonMarkingBodyLocation>> {
    Ok(ApiResponse::success(state.xref().marking_body_locations(query.tsn()?).await?))
}

/// GET /api/xref/taxon-qualitative-measurements?tsn=
pub async fn qualitative_measurements(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<TsnQuery>,
) -> ApiResult<Vec<QualitativeMeasurementWithOptions>> {
    Ok(ApiResponse::success(state.xref().qualitative_measurements(query.tsn()?).await?))
}

/// GET /api/xref/taxon-qualitative-measurement-options/:taxon_measurement_id
pub async fn qualitative_options(
    State(state): State<AppState>,
    Path(taxon_measurement_id): Path<String>,
) -> ApiResult<Vec<QualitativeOption>> {
    let taxon_measurement_id = parse_id(&taxon_measurement_id)?;
    Ok(ApiResponse::success(state.xref().qualitative_options(taxon_measurement_id).await?))
}

/// GET /api/xref/taxon-quantitative-measurements?tsn=
pub async fn quantitative_measurements(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<TsnQuery>,
) -> ApiResult<Vec<TaxonQuantitativeMeasurement>> {
    Ok(ApiResponse::success(state.xref().quantitative_measurements(query.tsn()?).await?))
}

/// GET /api/xref/taxon-measurements?tsn=
pub async fn measurements(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<TsnQuery>,
) -> ApiResult<TaxonMeasurements> {
    Ok(ApiResponse::success(state.xref().measurements(query.tsn()?).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tsn_is_required_and_positive() {
        assert_eq!(TsnQuery { tsn: Some(180703) }.tsn().unwrap(), 180703);
        assert_eq!(TsnQuery { tsn: Some(0) }.tsn().unwrap_err().status_code(), 400);
        assert_eq!(TsnQuery { tsn: None }.tsn().unwrap_err().status_code(), 400);
    }
}
