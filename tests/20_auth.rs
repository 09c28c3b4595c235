mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;

fn get(uri: &str, token: Option<&str>) -> Result<Request<Body>> {
    let mut builder = Request::get(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    Ok(builder.body(Body::empty())?)
}

#[tokio::test]
async fn missing_token_is_unauthorized() -> Result<()> {
    let res = common::send(common::app(), get("/api/critters", None)?).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body = common::body_json(res).await?;
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn every_api_route_requires_a_token() -> Result<()> {
    for uri in [
        "/api/users/me",
        "/api/lookups/colours",
        "/api/lookups/enum/sex",
        "/api/xref/taxon-measurements?tsn=180703",
        "/api/family/immediate/0b7a8c2e-5b7f-4d7e-9b38-1f6f1b6f2b11",
    ] {
        let res = common::send(common::app(), get(uri, None)?).await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }
    Ok(())
}

#[tokio::test]
async fn non_bearer_scheme_is_unauthorized() -> Result<()> {
    let req = Request::get("/api/critters")
        .header("authorization", "Basic dXNlcjpwYXNz")
        .body(Body::empty())?;
    let res = common::send(common::app(), req).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn garbage_token_is_unauthorized() -> Result<()> {
    let res = common::send(common::app(), get("/api/critters", Some("not-a-jwt"))?).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn expired_token_is_unauthorized() -> Result<()> {
    let token = common::sign(
        common::KEY_ID,
        &common::claims(json!({ "exp": chrono::Utc::now().timestamp() - 3600 })),
    );
    let res = common::send(common::app(), get("/api/critters", Some(&token))?).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn unknown_signing_key_is_unauthorized() -> Result<()> {
    // The seeded key set is fresh, so the unknown kid does not trigger a fetch
    let token = common::sign("rotated-key", &common::claims(json!({})));
    let res = common::send(common::app(), get("/api/critters", Some(&token))?).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body = common::body_json(res).await?;
    assert!(body["message"].as_str().unwrap_or_default().contains("rotated-key"));
    Ok(())
}

#[tokio::test]
async fn wrong_audience_is_unauthorized() -> Result<()> {
    let token = common::sign(common::KEY_ID, &common::claims(json!({ "aud": "someone-else" })));
    let res = common::send(common::app(), get("/api/critters", Some(&token))?).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn service_client_with_malformed_user_header_is_unauthorized() -> Result<()> {
    let token = common::sign(common::KEY_ID, &common::claims(json!({ "azp": common::SERVICE_CLIENT })));
    let req = Request::get("/api/critters")
        .header("authorization", format!("Bearer {}", token))
        .header("user", "not json")
        .body(Body::empty())?;
    let res = common::send(common::app(), req).await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn valid_token_reaches_user_registration() -> Result<()> {
    // Verification passes; registering the user needs the database, which is down
    let res = common::send(common::app(), get("/api/users/me", Some(&common::token()))?).await?;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = common::body_json(res).await?;
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    Ok(())
}
