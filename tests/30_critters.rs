mod common;

use anyhow::Result;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

fn timestamp(value: &Value) -> DateTime<Utc> {
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| panic!("not a timestamp: {}", value))
}

#[tokio::test]
async fn update_records_the_editing_user() -> Result<()> {
    let Some(live) = common::live().await? else { return Ok(()) };

    let (status, creator) = live.get("/api/users/me").await?;
    assert_eq!(status, StatusCode::OK, "{}", creator);
    let critter = live.critter(json!({ "wlh_id": "17-10779" })).await?;
    assert_eq!(critter["create_user"], creator["data"]["user_id"]);
    assert_eq!(critter["itis_scientific_name"], "Alces alces");

    let editor_token = common::token_for(&common::unique("GUID"), "EDITOR");
    let (_, editor) = live.call("GET", "/api/users/me", &editor_token, None).await?;

    let uri = format!("/api/critters/{}", critter["critter_id"].as_str().unwrap());
    let (status, updated) = live
        .call("PATCH", &uri, &editor_token, Some(json!({ "critter_comment": "collared" })))
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", updated);

    let updated = &updated["data"];
    assert_eq!(updated["critter_comment"], "collared");
    assert_eq!(updated["create_user"], creator["data"]["user_id"]);
    assert_eq!(updated["update_user"], editor["data"]["user_id"]);
    assert_eq!(updated["create_timestamp"], critter["create_timestamp"]);
    assert!(timestamp(&updated["update_timestamp"]) >= timestamp(&critter["update_timestamp"]));
    Ok(())
}

#[tokio::test]
async fn capture_locations_are_created_and_patched_in_place() -> Result<()> {
    let Some(live) = common::live().await? else { return Ok(()) };
    let critter = live.critter(json!({})).await?;

    let (status, created) = live
        .post(
            "/api/captures",
            json!({
                "critter_id": critter["critter_id"],
                "capture_timestamp": "2024-02-01T10:00:00Z",
                "release_timestamp": "2024-02-01T11:30:00Z",
                "capture_location": { "latitude": 54.1, "longitude": -122.5, "location_comment": "north ridge" }
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    let capture = &created["data"];
    let location_id = capture["capture_location"]["location_id"].clone();
    assert_eq!(capture["capture_location_id"], location_id);
    assert_eq!(capture["capture_location"]["latitude"], 54.1);
    assert!(capture["release_location"].is_null());

    let uri = format!("/api/captures/{}", capture["capture_id"].as_str().unwrap());
    let (status, patched) = live
        .patch(
            &uri,
            json!({
                "capture_location": { "latitude": 54.3 },
                "release_location": { "latitude": 54.0, "longitude": -122.0 }
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::OK, "{}", patched);
    let patched = &patched["data"];
    assert_eq!(patched["capture_location"]["location_id"], location_id);
    assert_eq!(patched["capture_location"]["latitude"], 54.3);
    assert_eq!(patched["capture_location"]["longitude"], -122.5);
    assert_eq!(patched["capture_location"]["location_comment"], "north ridge");
    assert_eq!(patched["release_location_id"], patched["release_location"]["location_id"]);
    assert!(live.location_exists(&patched["release_location_id"]).await?);
    Ok(())
}

#[tokio::test]
async fn release_before_capture_is_rejected() -> Result<()> {
    let Some(live) = common::live().await? else { return Ok(()) };
    let critter = live.critter(json!({})).await?;

    let (status, body) = live
        .post(
            "/api/captures",
            json!({
                "critter_id": critter["critter_id"],
                "capture_timestamp": "2024-02-01T10:00:00Z",
                "release_timestamp": "2024-01-31T10:00:00Z"
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["release_timestamp"].is_string(), "{}", body);
    Ok(())
}

#[tokio::test]
async fn mortality_location_is_created_and_patched_in_place() -> Result<()> {
    let Some(live) = common::live().await? else { return Ok(()) };
    let critter = live.critter(json!({})).await?;
    let cod = live.cause_of_death().await?;

    let (status, created) = live
        .post(
            "/api/mortality",
            json!({
                "critter_id": critter["critter_id"],
                "mortality_timestamp": "2024-03-05T00:00:00Z",
                "proximate_cause_of_death_id": cod,
                "proximate_cause_of_death_confidence": "Probable",
                "location": { "latitude": 53.2, "longitude": -121.9 }
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    let mortality = &created["data"];
    assert_eq!(mortality["location_id"], mortality["location"]["location_id"]);

    let uri = format!("/api/mortality/{}", mortality["mortality_id"].as_str().unwrap());
    let (status, patched) = live.patch(&uri, json!({ "location": { "elevation": 1210.0 } })).await?;
    assert_eq!(status, StatusCode::OK, "{}", patched);
    assert_eq!(patched["data"]["location"]["location_id"], mortality["location_id"]);
    assert_eq!(patched["data"]["location"]["elevation"], 1210.0);
    assert_eq!(patched["data"]["location"]["latitude"], 53.2);
    Ok(())
}

#[tokio::test]
async fn deleting_a_critter_removes_its_event_locations() -> Result<()> {
    let Some(live) = common::live().await? else { return Ok(()) };
    let critter = live.critter(json!({})).await?;
    let cod = live.cause_of_death().await?;

    let (_, capture) = live
        .post(
            "/api/captures",
            json!({
                "critter_id": critter["critter_id"],
                "capture_timestamp": "2024-02-01T10:00:00Z",
                "capture_location": { "latitude": 54.1 },
                "release_location": { "latitude": 54.2 }
            }),
        )
        .await?;
    let (_, mortality) = live
        .post(
            "/api/mortality",
            json!({
                "critter_id": critter["critter_id"],
                "mortality_timestamp": "2024-03-05T00:00:00Z",
                "proximate_cause_of_death_id": cod,
                "location": { "latitude": 53.2 }
            }),
        )
        .await?;
    let owned = [
        capture["data"]["capture_location_id"].clone(),
        capture["data"]["release_location_id"].clone(),
        mortality["data"]["location_id"].clone(),
    ];
    for id in &owned {
        assert!(live.location_exists(id).await?, "{}", id);
    }

    let uri = format!("/api/critters/{}", critter["critter_id"].as_str().unwrap());
    let (status, deleted) = live.delete(&uri).await?;
    assert_eq!(status, StatusCode::OK, "{}", deleted);
    assert_eq!(deleted["data"]["critter_id"], critter["critter_id"]);

    for id in &owned {
        assert!(!live.location_exists(id).await?, "{} survived", id);
    }
    let capture_uri = format!("/api/captures/{}", capture["data"]["capture_id"].as_str().unwrap());
    assert_eq!(live.get(&capture_uri).await?.0, StatusCode::NOT_FOUND);
    assert_eq!(live.get(&uri).await?.0, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn quantitative_values_must_fall_in_the_measurement_range() -> Result<()> {
    let Some(live) = common::live().await? else { return Ok(()) };
    let critter = live.critter(json!({})).await?;
    // defined on Cervidae, so it applies to the moose
    let weight = live.quantitative_measurement(180692, 100.0, 800.0).await?;

    let (status, body) = live
        .post(
            "/api/measurements/quantitative",
            json!({ "critter_id": critter["critter_id"], "taxon_measurement_id": weight, "value": 950.0 }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["value"].as_str().unwrap_or_default().contains("outside"), "{}", body);

    let (status, created) = live
        .post(
            "/api/measurements/quantitative",
            json!({ "critter_id": critter["critter_id"], "taxon_measurement_id": weight, "value": 410.5 }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", created);

    let uri = format!(
        "/api/measurements/quantitative/{}",
        created["data"]["measurement_quantitative_id"].as_str().unwrap()
    );
    let (status, body) = live.patch(&uri, json!({ "value": 12.0 })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
    assert!(body["field_errors"]["value"].is_string());
    Ok(())
}

#[tokio::test]
async fn measurements_outside_the_critter_taxon_are_rejected() -> Result<()> {
    let Some(live) = common::live().await? else { return Ok(()) };
    let critter = live.critter(json!({})).await?;
    // a TSN outside the moose hierarchy
    let antler = live.quantitative_measurement(180543, 0.0, 100.0).await?;

    let (status, body) = live
        .post(
            "/api/measurements/quantitative",
            json!({ "critter_id": critter["critter_id"], "taxon_measurement_id": antler, "value": 10.0 }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["taxon_measurement_id"].is_string(), "{}", body);
    Ok(())
}

#[tokio::test]
async fn collection_units_must_be_available_to_the_critter_taxon() -> Result<()> {
    let Some(live) = common::live().await? else { return Ok(()) };
    let critter = live.critter(json!({})).await?;
    let herd = live.collection_unit(Some(180692)).await?;
    let other = live.collection_unit(None).await?;

    let (status, created) = live
        .post(
            "/api/collection-units",
            json!({ "critter_id": critter["critter_id"], "collection_unit_id": herd }),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", created);

    let (status, body) = live
        .post(
            "/api/collection-units",
            json!({ "critter_id": critter["critter_id"], "collection_unit_id": other }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["collection_unit_id"].is_string(), "{}", body);

    let uri = format!("/api/collection-units/critter/{}", critter["critter_id"].as_str().unwrap());
    let (_, listed) = live.get(&uri).await?;
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(1));
    Ok(())
}
