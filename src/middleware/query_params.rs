use axum::{
    async_trait,
    extract::{rejection::QueryRejection, FromRequestParts, Query},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Query string extractor whose rejections use the API error shape
#[derive(Debug, Clone)]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection: QueryRejection| ApiError::bad_request(rejection.body_text()))?;
        Ok(QueryParams(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Params {
        tsn: Option<i32>,
    }

    async fn extract(uri: &str) -> Result<QueryParams<Params>, ApiError> {
        let (mut parts, _) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        QueryParams::<Params>::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn parses_query_string() {
        let QueryParams(params) = extract("/xref?tsn=180703").await.unwrap();
        assert_eq!(params.tsn, Some(180703));
    }

    #[tokio::test]
    async fn malformed_values_are_bad_requests() {
        let err = extract("/xref?tsn=abc").await.unwrap_err();
        assert_eq!(err.status_code(), 400);
        let body = err.to_json();
        assert_eq!(body["error"], true);
        assert_eq!(body["code"], "BAD_REQUEST");
        assert!(body["message"].as_str().unwrap().contains("invalid digit"));
    }
}
