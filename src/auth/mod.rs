//! Keycloak token verification.
//!
//! Tokens are RS256 JWTs signed by the realm. Public keys come from the
//! realm's JWKS endpoint and are cached by `kid`; an unseen `kid` triggers a
//! refresh, at most once per `jwks_refresh_secs`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use jsonwebtoken::jwk::{JwkSet, PublicKeyUse};
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::AuthConfig;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingToken,

    #[error("Authorization header must use Bearer token format")]
    MalformedHeader,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token signed with unknown key '{0}'")]
    UnknownKey(String),

    #[error("Invalid user header: {0}")]
    InvalidUserHeader(String),

    #[error("Unable to load signing keys: {0}")]
    Jwks(String),
}

/// Claims Critterbase reads from a Keycloak access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeycloakClaims {
    pub sub: String,
    pub exp: i64,
    #[serde(default)]
    pub azp: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub idir_user_guid: Option<String>,
    #[serde(default)]
    pub idir_username: Option<String>,
    #[serde(default)]
    pub bceid_user_guid: Option<String>,
    #[serde(default)]
    pub bceid_username: Option<String>,
}

/// Who a verified token speaks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub keycloak_uuid: String,
    pub username: String,
    pub client: Option<String>,
}

impl From<KeycloakClaims> for Principal {
    fn from(claims: KeycloakClaims) -> Self {
        let keycloak_uuid = claims
            .idir_user_guid
            .clone()
            .or_else(|| claims.bceid_user_guid.clone())
            .unwrap_or_else(|| claims.sub.clone());
        let username = claims
            .idir_username
            .or(claims.bceid_username)
            .or(claims.preferred_username)
            .unwrap_or(claims.sub);
        Self {
            keycloak_uuid,
            username,
            client: claims.azp,
        }
    }
}

/// Contents of the `user` header a service client sends when acting for a user
#[derive(Debug, Clone, Deserialize)]
struct ActingUser {
    keycloak_guid: String,
    username: String,
}

/// Resolve the principal a request acts as. Only configured service clients
/// may name another user through the `user` header.
pub fn acting_principal(
    principal: Principal,
    user_header: Option<&str>,
    service_clients: &[String],
) -> Result<Principal, AuthError> {
    let is_service = principal
        .client
        .as_ref()
        .is_some_and(|client| service_clients.iter().any(|c| c == client));

    match user_header {
        Some(raw) if is_service => {
            let acting: ActingUser =
                serde_json::from_str(raw).map_err(|e| AuthError::InvalidUserHeader(e.to_string()))?;
            if acting.keycloak_guid.trim().is_empty() || acting.username.trim().is_empty() {
                return Err(AuthError::InvalidUserHeader("keycloak_guid and username are required".into()));
            }
            Ok(Principal {
                keycloak_uuid: acting.keycloak_guid,
                username: acting.username,
                client: principal.client,
            })
        }
        _ => Ok(principal),
    }
}

/// Extract the token from an `Authorization: Bearer <token>` value
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingToken)?;
    let token = value.strip_prefix("Bearer ").ok_or(AuthError::MalformedHeader)?.trim();
    if token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }
    Ok(token)
}

struct KeyCache {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Option<Instant>,
}

pub struct KeycloakVerifier {
    jwks_url: String,
    validation: Validation,
    refresh_interval: Duration,
    client: reqwest::Client,
    cache: RwLock<KeyCache>,
}

impl KeycloakVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[config.issuer()]);
        if config.audiences.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(&config.audiences);
        }

        Self {
            jwks_url: config.jwks_url(),
            validation,
            refresh_interval: Duration::from_secs(config.jwks_refresh_secs),
            client: reqwest::Client::new(),
            cache: RwLock::new(KeyCache {
                keys: HashMap::new(),
                fetched_at: None,
            }),
        }
    }

    /// Verifier seeded with a known key set; the set counts as freshly fetched
    pub fn with_keys(config: &AuthConfig, jwks: &JwkSet) -> Self {
        let verifier = Self::new(config);
        let keys = decoding_keys(jwks);
        // Nothing else holds the lock yet
        if let Ok(mut cache) = verifier.cache.try_write() {
            cache.keys = keys;
            cache.fetched_at = Some(Instant::now());
        }
        verifier
    }

    pub async fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let header = decode_header(token).map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let kid = header
            .kid
            .ok_or_else(|| AuthError::InvalidToken("token has no key id".to_string()))?;

        let key = match self.cached_key(&kid).await {
            Some(key) => key,
            None => {
                self.refresh().await?;
                self.cached_key(&kid).await.ok_or_else(|| AuthError::UnknownKey(kid.clone()))?
            }
        };

        let data = decode::<KeycloakClaims>(token, &key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(data.claims.into())
    }

    async fn cached_key(&self, kid: &str) -> Option<DecodingKey> {
        self.cache.read().await.keys.get(kid).cloned()
    }

    /// Refetch the key set unless it was fetched within the refresh interval
    async fn refresh(&self) -> Result<(), AuthError> {
        let mut cache = self.cache.write().await;
        if let Some(fetched_at) = cache.fetched_at {
            if fetched_at.elapsed() < self.refresh_interval {
                debug!("JWKS fetched {:?} ago, not refreshing", fetched_at.elapsed());
                return Ok(());
            }
        }

        let jwks: JwkSet = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AuthError::Jwks(e.to_string()))?
            .json()
            .await
            .map_err(|e| AuthError::Jwks(e.to_string()))?;

        cache.keys = decoding_keys(&jwks);
        cache.fetched_at = Some(Instant::now());
        info!("Loaded {} signing keys from {}", cache.keys.len(), self.jwks_url);
        Ok(())
    }
}

fn decoding_keys(jwks: &JwkSet) -> HashMap<String, DecodingKey> {
    let mut keys = HashMap::new();
    for jwk in &jwks.keys {
        if matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption)) {
            continue;
        }
        let Some(kid) = jwk.common.key_id.clone() else {
            continue;
        };
        match DecodingKey::from_jwk(jwk) {
            Ok(key) => {
                keys.insert(kid, key);
            }
            Err(e) => warn!("Skipping JWK '{}': {}", kid, e),
        }
    }
    keys
}
