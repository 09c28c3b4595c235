mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn malformed_query_strings_use_the_error_envelope() -> Result<()> {
    let Some(live) = common::live().await? else { return Ok(()) };

    for uri in [
        "/api/xref/taxon-measurements?tsn=abc",
        "/api/xref/taxon-marking-body-locations?tsn=1.5",
        "/api/critters?wlh_id=a&wlh_id=b",
    ] {
        let (status, body) = live.get(uri).await?;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"], true, "{}", uri);
        assert_eq!(body["code"], "BAD_REQUEST", "{}", uri);
        assert!(body["message"].is_string(), "{}", uri);
    }

    let (status, body) = live.get("/api/xref/taxon-measurements?tsn=0").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "tsn must be a positive integer");
    Ok(())
}

#[tokio::test]
async fn xref_rows_follow_the_taxon_hierarchy() -> Result<()> {
    let Some(live) = common::live().await? else { return Ok(()) };
    let ear = live.body_location(180692).await?;

    let (status, body) = live.get("/api/xref/taxon-marking-body-locations?tsn=180703").await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let ids: Vec<_> = body["data"]
        .as_array()
        .into_iter()
        .flatten()
        .map(|row| row["taxon_marking_body_location_id"].clone())
        .collect();
    assert!(ids.contains(&json!(ear)));
    Ok(())
}

#[tokio::test]
async fn verify_reports_critters_with_unknown_taxa_per_entry() -> Result<()> {
    let Some(live) = common::live().await? else { return Ok(()) };
    let ear = live.body_location(180692).await?;
    let moose = live.critter(json!({})).await?;
    // stored before the taxon was retired from ITIS
    let stray = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO critter (itis_tsn, itis_scientific_name, sex) VALUES (999999, 'Retired taxon', 'Unknown') \
         RETURNING critter_id",
    )
    .fetch_one(live.db.pool())
    .await?;

    let (status, body) = live
        .post(
            "/api/markings/verify",
            json!({
                "markings": [
                    { "critter_id": moose["critter_id"], "taxon_marking_body_location_id": ear },
                    { "critter_id": stray, "taxon_marking_body_location_id": ear }
                ]
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["verified"], false);
    let invalid = body["data"]["invalid"].as_array().cloned().unwrap_or_default();
    assert_eq!(invalid.len(), 1);
    assert_eq!(invalid[0]["index"], 1);
    assert!(invalid[0]["reason"].as_str().unwrap_or_default().contains("999999"));
    Ok(())
}

#[tokio::test]
async fn identities_may_share_a_username() -> Result<()> {
    let Some(live) = common::live().await? else { return Ok(()) };
    let username = common::unique("JSMITH");
    let first = common::token_for(&common::unique("GUID"), &username);
    let second = common::token_for(&common::unique("GUID"), &username);

    let (status, a) = live.call("GET", "/api/users/me", &first, None).await?;
    assert_eq!(status, StatusCode::OK, "{}", a);
    let (status, b) = live.call("GET", "/api/users/me", &second, None).await?;
    assert_eq!(status, StatusCode::OK, "{}", b);

    assert_eq!(a["data"]["user_identifier"], json!(username));
    assert_eq!(b["data"]["user_identifier"], json!(username));
    assert_ne!(a["data"]["user_id"], b["data"]["user_id"]);

    let (_, again) = live.call("GET", "/api/users/me", &first, None).await?;
    assert_eq!(again["data"]["user_id"], a["data"]["user_id"]);
    Ok(())
}
