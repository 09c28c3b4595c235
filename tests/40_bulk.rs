mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn bulk_create_links_entries_by_client_ids() -> Result<()> {
    let Some(live) = common::live().await? else { return Ok(()) };
    let ear = live.body_location(180692).await?;
    let critter_id = Uuid::new_v4();
    let family_id = Uuid::new_v4();

    let (status, body) = live
        .post(
            "/api/bulk",
            json!({
                "critters": [{ "critter_id": critter_id, "itis_tsn": 180703, "sex": "Female", "animal_id": common::unique("cow") }],
                "captures": [{
                    "critter_id": critter_id,
                    "capture_timestamp": "2024-02-01T10:00:00Z",
                    "capture_location": { "latitude": 54.1 }
                }],
                "markings": [{ "critter_id": critter_id, "taxon_marking_body_location_id": ear, "identifier": "A12" }],
                "families": [{ "family_id": family_id, "family_label": common::unique("cow 12") }],
                "family_parents": [{ "family_id": family_id, "parent_critter_id": critter_id }]
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(
        body["data"]["created"],
        json!({ "captures": 1, "critters": 1, "families": 1, "family_parents": 1, "markings": 1 })
    );

    let (status, detailed) = live.get(&format!("/api/critters/{}?format=detailed", critter_id)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detailed["data"]["markings"][0]["identifier"], "A12");
    assert_eq!(detailed["data"]["captures"][0]["capture_location"]["latitude"], 54.1);
    assert_eq!(detailed["data"]["family_parent"][0]["family_id"], json!(family_id));
    Ok(())
}

#[tokio::test]
async fn bulk_create_rolls_back_on_a_bad_entry() -> Result<()> {
    let Some(live) = common::live().await? else { return Ok(()) };
    let critter_id = Uuid::new_v4();
    let location_id = Uuid::new_v4();

    let (status, body) = live
        .post(
            "/api/bulk",
            json!({
                "locations": [{ "location_id": location_id, "latitude": 53.0 }],
                "critters": [{ "critter_id": critter_id, "itis_tsn": 180703, "sex": "Male" }],
                "markings": [{ "critter_id": critter_id, "taxon_marking_body_location_id": Uuid::new_v4() }]
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(
        body["field_errors"]["markings[0].taxon_marking_body_location_id"].is_string(),
        "{}",
        body
    );

    assert_eq!(live.get(&format!("/api/critters/{}", critter_id)).await?.0, StatusCode::NOT_FOUND);
    assert!(!live.location_exists(&json!(location_id)).await?);
    Ok(())
}

#[tokio::test]
async fn bulk_patch_rolls_back_on_a_conflict() -> Result<()> {
    let Some(live) = common::live().await? else { return Ok(()) };
    let critter = live.critter(json!({ "critter_comment": "original" })).await?;
    let (_, family) = live.post("/api/family", json!({ "family_label": common::unique("herd") })).await?;
    let family_id = family["data"]["family_id"].clone();
    let (status, _) = live
        .post(
            "/api/family/parents",
            json!({ "family_id": family_id, "parent_critter_id": critter["critter_id"] }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = live
        .patch(
            "/api/bulk",
            json!({
                "critters": [{ "critter_id": critter["critter_id"], "critter_comment": "changed" }],
                "family_children": [{ "family_id": family_id, "child_critter_id": critter["critter_id"] }]
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::CONFLICT, "{}", body);
    assert!(body["message"].as_str().unwrap_or_default().starts_with("family_children[0]"));

    let (_, after) = live.get(&format!("/api/critters/{}", critter["critter_id"].as_str().unwrap())).await?;
    assert_eq!(after["data"]["critter_comment"], "original");
    Ok(())
}

#[tokio::test]
async fn bulk_patch_updates_and_deletes() -> Result<()> {
    let Some(live) = common::live().await? else { return Ok(()) };
    let critter = live.critter(json!({})).await?;
    let (_, capture) = live
        .post(
            "/api/captures",
            json!({
                "critter_id": critter["critter_id"],
                "capture_timestamp": "2024-02-01T10:00:00Z",
                "capture_location": { "latitude": 54.1 }
            }),
        )
        .await?;
    let capture = &capture["data"];

    let (status, body) = live
        .patch(
            "/api/bulk",
            json!({
                "critters": [{ "critter_id": critter["critter_id"], "sex": "Unknown" }],
                "captures": [{ "capture_id": capture["capture_id"], "_delete": true }]
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["updated"], json!({ "critters": 1 }));
    assert_eq!(body["data"]["deleted"], json!({ "captures": 1 }));

    let (_, after) = live.get(&format!("/api/critters/{}", critter["critter_id"].as_str().unwrap())).await?;
    assert_eq!(after["data"]["sex"], "Unknown");
    assert!(!live.location_exists(&capture["capture_location_id"]).await?);
    Ok(())
}
