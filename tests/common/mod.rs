#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use critterbase::auth::KeycloakVerifier;
use critterbase::config::{AppConfig, AuthConfig};
use critterbase::database::Database;
use critterbase::itis::StaticTaxonomy;
use critterbase::state::AppState;

pub const TEST_KEY: &[u8] = include_bytes!("../fixtures/keycloak_test_key.pem");
pub const TEST_N: &str = "kdsRhOQ4Inel6NJhTGRha9ZS_P-6LdnUqdT8yxb3lxFXk4mjGcJmIQS-Y52OEt3mKqdPAaT2cjCt2TIMlhy9NdmONKwKhzXW1txEafUwmqSSYZ-mANzhb51ti01FRSZ5qWdLmEBy6ywQoHh0rdhmn5hrUaK9DKUZJY4i-c-ZvaMh9JQOh2PKFq7hbYiVbRA17v8fKkTm4l0FagY9ewW3izKVp7UJbQ7oDNSMAuhyka-XAsnkjDXuBBv76VoDCbRU52h_f5dvzX6uIAHF33GotUCAxKBLMgD7gnZFCDsaUCthzbqBABqSOtWK-oyObmCHE5HmunTPOatlXFcz05L-Mw";
pub const KEY_ID: &str = "test-key";
pub const SERVICE_CLIENT: &str = "sims-service";

/// Config pointed at a database nobody listens on and a fixed Keycloak realm
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::from_env();
    config.database.url = "postgres://critterbase@127.0.0.1:1/critterbase".to_string();
    config.database.max_connections = 1;
    config.database.acquire_timeout_secs = 1;
    config.auth = AuthConfig {
        keycloak_host: "https://auth.example.test".to_string(),
        keycloak_realm: "standard".to_string(),
        audiences: vec!["critterbase-4700".to_string()],
        service_clients: vec![SERVICE_CLIENT.to_string()],
        jwks_refresh_secs: 300,
    };
    config
}

pub fn jwks() -> JwkSet {
    serde_json::from_value(json!({
        "keys": [{
            "kty": "RSA",
            "kid": KEY_ID,
            "use": "sig",
            "alg": "RS256",
            "n": TEST_N,
            "e": "AQAB"
        }]
    }))
    .expect("valid JWKS")
}

pub fn state(config: &AppConfig) -> AppState {
    let db = Database::connect_lazy(&config.database).expect("lazy pool");
    state_with(db, config)
}

pub fn state_with(db: Database, config: &AppConfig) -> AppState {
    let taxonomy = StaticTaxonomy::new()
        .with_taxon(180703, "Alces alces", &[202423, 914154, 180692, 180703])
        .with_taxon(180692, "Cervidae", &[202423, 914154, 180692]);
    AppState::new(
        db,
        KeycloakVerifier::with_keys(&config.auth, &jwks()),
        Arc::new(taxonomy),
        config.auth.service_clients.clone(),
    )
}

pub fn app_with(config: &AppConfig) -> Router {
    critterbase::app(state(config), config)
}

pub fn app() -> Router {
    app_with(&test_config())
}

pub fn claims(extra: Value) -> Value {
    let mut claims = json!({
        "sub": "f3b1a2c4@idir",
        "iss": "https://auth.example.test/realms/standard",
        "aud": "critterbase-4700",
        "azp": "critterbase-4700",
        "exp": chrono::Utc::now().timestamp() + 300,
        "idir_user_guid": "F3B1A2C4D5E6",
        "idir_username": "JDOE"
    });
    if let (Some(base), Some(extra)) = (claims.as_object_mut(), extra.as_object()) {
        base.extend(extra.clone());
    }
    claims
}

pub fn sign(kid: &str, claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(kid.to_string());
    encode(&header, claims, &EncodingKey::from_rsa_pem(TEST_KEY).expect("test key")).expect("signed token")
}

pub fn token() -> String {
    sign(KEY_ID, &claims(json!({})))
}

pub async fn send(app: Router, request: Request<Body>) -> Result<Response<Body>> {
    Ok(app.oneshot(request).await?)
}

pub async fn body_json(response: Response<Body>) -> Result<Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub fn token_for(guid: &str, username: &str) -> String {
    sign(KEY_ID, &claims(json!({ "idir_user_guid": guid, "idir_username": username })))
}

/// Unique text for columns with unique constraints
pub fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// Router over a real, migrated database
pub struct Live {
    pub db: Database,
    pub app: Router,
}

/// Connects to `TEST_DATABASE_URL` (or `DATABASE_URL`) and applies the
/// migrations. Returns `None` when neither is set so the caller can skip.
pub async fn live() -> Result<Option<Live>> {
    let Some(url) = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .filter(|url| !url.trim().is_empty())
    else {
        eprintln!("skipping: set TEST_DATABASE_URL to run database tests");
        return Ok(None);
    };
    let mut config = test_config();
    config.database.url = url;
    config.database.max_connections = 5;
    config.database.acquire_timeout_secs = 10;
    let db = Database::connect(&config.database).await?;
    db.migrate().await?;
    let app = critterbase::app(state_with(db.clone(), &config), &config);
    Ok(Some(Live { db, app }))
}

impl Live {
    pub async fn call(&self, method: &str, uri: &str, token: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {}", token));
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = self.app.clone().oneshot(builder.body(body)?).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, json))
    }

    pub async fn get(&self, uri: &str) -> Result<(StatusCode, Value)> {
        self.call("GET", uri, &token(), None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.call("POST", uri, &token(), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.call("PATCH", uri, &token(), Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> Result<(StatusCode, Value)> {
        self.call("DELETE", uri, &token(), None).await
    }

    /// A female moose (TSN 180703); `extra` overrides the defaults
    pub async fn critter(&self, extra: Value) -> Result<Value> {
        let mut body = json!({ "itis_tsn": 180703, "sex": "Female", "animal_id": unique("moose") });
        if let (Some(base), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            base.extend(extra.clone());
        }
        let (status, json) = self.post("/api/critters", body).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "critter create failed: {} {}", status, json);
        Ok(json["data"].clone())
    }

    pub async fn body_location(&self, tsn: i32) -> Result<Uuid> {
        Ok(sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO xref_taxon_marking_body_location (itis_tsn, body_location) VALUES ($1, $2) \
             RETURNING taxon_marking_body_location_id",
        )
        .bind(tsn)
        .bind(unique("ear"))
        .fetch_one(self.db.pool())
        .await?)
    }

    pub async fn quantitative_measurement(&self, tsn: i32, min: f64, max: f64) -> Result<Uuid> {
        Ok(sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO xref_taxon_measurement_quantitative (itis_tsn, measurement_name, min_value, max_value, unit) \
             VALUES ($1, $2, $3, $4, 'kilogram') RETURNING taxon_measurement_id",
        )
        .bind(tsn)
        .bind(unique("weight"))
        .bind(min)
        .bind(max)
        .fetch_one(self.db.pool())
        .await?)
    }

    /// A collection unit in a new category, available to `tsn` when given
    pub async fn collection_unit(&self, tsn: Option<i32>) -> Result<Uuid> {
        let category = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO lk_collection_category (category_name) VALUES ($1) RETURNING collection_category_id",
        )
        .bind(unique("herd"))
        .fetch_one(self.db.pool())
        .await?;
        if let Some(tsn) = tsn {
            sqlx::query("INSERT INTO xref_taxon_collection_category (collection_category_id, itis_tsn) VALUES ($1, $2)")
                .bind(category)
                .bind(tsn)
                .execute(self.db.pool())
                .await?;
        }
        Ok(sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO xref_collection_unit (collection_category_id, unit_name) VALUES ($1, $2) \
             RETURNING collection_unit_id",
        )
        .bind(category)
        .bind(unique("unit"))
        .fetch_one(self.db.pool())
        .await?)
    }

    pub async fn cause_of_death(&self) -> Result<Uuid> {
        Ok(sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO lk_cause_of_death (cod_category, cod_reason) VALUES ($1, 'test') RETURNING cod_id",
        )
        .bind(unique("Predation"))
        .fetch_one(self.db.pool())
        .await?)
    }

    pub async fn location_exists(&self, id: &Value) -> Result<bool> {
        let id = Uuid::parse_str(id.as_str().unwrap_or_default())?;
        let found = sqlx::query_scalar::<_, Uuid>("SELECT location_id FROM location WHERE location_id = $1")
            .bind(id)
            .fetch_optional(self.db.pool())
            .await?;
        Ok(found.is_some())
    }
}
