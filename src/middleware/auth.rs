use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::{acting_principal, bearer_token, AuthError};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated user context resolved from the Keycloak token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub keycloak_uuid: String,
    pub username: String,
    pub client: Option<String>,
}

/// Keycloak authentication middleware: verifies the bearer token, resolves
/// the acting user (registering it on first sight) and injects `AuthUser`
pub async fn keycloak_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let authorization = header_str(&headers, "authorization")?;
    let token = bearer_token(authorization)?;

    let principal = state.verifier.verify(token).await?;
    let user_header = header_str(&headers, "user")?;
    let principal = acting_principal(principal, user_header, &state.service_clients)?;

    let user = state
        .users()
        .upsert_by_keycloak(&principal.keycloak_uuid, &principal.username)
        .await?;

    tracing::debug!(
        "Authenticated {} ({}) via {}",
        user.user_identifier,
        user.user_id,
        principal.client.as_deref().unwrap_or("unknown client")
    );

    request.extensions_mut().insert(AuthUser {
        user_id: user.user_id,
        keycloak_uuid: principal.keycloak_uuid,
        username: user.user_identifier,
        client: principal.client,
    });

    Ok(next.run(request).await)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, AuthError> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => value.to_str().map(Some).map_err(|_| AuthError::MalformedHeader),
    }
}
