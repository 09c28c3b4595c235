mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::Live;

async fn family(live: &Live) -> Result<Value> {
    let (status, body) = live.post("/api/family", json!({ "family_label": common::unique("family") })).await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    Ok(body["data"]["family_id"].clone())
}

#[tokio::test]
async fn a_critter_cannot_be_parent_and_child_of_one_family() -> Result<()> {
    let Some(live) = common::live().await? else { return Ok(()) };
    let family_id = family(&live).await?;
    let cow = live.critter(json!({})).await?;
    let calf = live.critter(json!({})).await?;

    let (status, _) = live
        .post("/api/family/parents", json!({ "family_id": family_id, "parent_critter_id": cow["critter_id"] }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = live
        .post("/api/family/children", json!({ "family_id": family_id, "child_critter_id": calf["critter_id"] }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = live
        .post("/api/family/children", json!({ "family_id": family_id, "child_critter_id": cow["critter_id"] }))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, _) = live
        .post("/api/family/parents", json!({ "family_id": family_id, "parent_critter_id": calf["critter_id"] }))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    // the same critter may still be a child of a different family
    let other = family(&live).await?;
    let (status, _) = live
        .post("/api/family/children", json!({ "family_id": other, "child_critter_id": cow["critter_id"] }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn concurrent_links_cannot_place_a_critter_on_both_sides() -> Result<()> {
    let Some(live) = common::live().await? else { return Ok(()) };

    for _ in 0..5 {
        let family_id = family(&live).await?;
        let critter = live.critter(json!({})).await?;
        let parent = json!({ "family_id": family_id, "parent_critter_id": critter["critter_id"] });
        let child = json!({ "family_id": family_id, "child_critter_id": critter["critter_id"] });

        let (as_parent, as_child) = tokio::join!(
            live.post("/api/family/parents", parent),
            live.post("/api/family/children", child)
        );
        let mut statuses = [as_parent?.0, as_child?.0];
        statuses.sort();
        assert_eq!(statuses, [StatusCode::CREATED, StatusCode::CONFLICT]);
    }
    Ok(())
}

#[tokio::test]
async fn immediate_family_resolves_parents_siblings_and_children() -> Result<()> {
    let Some(live) = common::live().await? else { return Ok(()) };
    let family_id = family(&live).await?;
    let cow = live.critter(json!({})).await?;
    let calf = live.critter(json!({})).await?;
    let sibling = live.critter(json!({})).await?;

    live.post("/api/family/parents", json!({ "family_id": family_id, "parent_critter_id": cow["critter_id"] }))
        .await?;
    for child in [&calf, &sibling] {
        live.post("/api/family/children", json!({ "family_id": family_id, "child_critter_id": child["critter_id"] }))
            .await?;
    }

    let (status, body) = live
        .get(&format!("/api/family/immediate/{}", calf["critter_id"].as_str().unwrap()))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["parents"][0]["critter_id"], cow["critter_id"]);
    assert_eq!(body["data"]["siblings"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"]["siblings"][0]["critter_id"], sibling["critter_id"]);

    let (_, body) = live
        .get(&format!("/api/family/immediate/{}", cow["critter_id"].as_str().unwrap()))
        .await?;
    assert_eq!(body["data"]["children"].as_array().map(Vec::len), Some(2));

    let (status, _) = live
        .call(
            "DELETE",
            "/api/family/children",
            &common::token(),
            Some(json!({ "family_id": family_id, "child_critter_id": sibling["critter_id"] })),
        )
        .await?;
    assert_eq!(status, StatusCode::NO_CONTENT);
    Ok(())
}
