use axum::extract::{Path, State};
use serde_json::Value;

use crate::middleware::{ApiResponse, ApiResult, QueryParams};
use crate::state::AppState;

use super::utils::FormatQuery;

const AS_SELECT: &str = "asSelect";

/// GET /api/lookups/enum/:name - allowed values of an enumerated column
pub async fn enum_values(
    State(state): State<AppState>,
    Path(name): Path<String>,
    QueryParams(query): QueryParams<FormatQuery>,
) -> ApiResult<Value> {
    Ok(ApiResponse::success(state.lookups().enum_values(&name, query.is(AS_SELECT))?))
}

/// GET /api/lookups/:table - rows of a lookup table
pub async fn table(
    State(state): State<AppState>,
    Path(table): Path<String>,
    QueryParams(query): QueryParams<FormatQuery>,
) -> ApiResult<Value> {
    Ok(ApiResponse::success(state.lookups().table(&table, query.is(AS_SELECT)).await?))
}
