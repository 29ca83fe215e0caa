//! Category management integration tests.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;

#[tokio::test]
async fn listing_returns_seeded_categories() {
    let harness = TestHarness::new();

    let response = harness.server.get("/api/categories").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();

    // Seeded set, ordered by name
    assert_eq!(names, vec!["Adventure", "Animals", "Fairy Tales", "Science"]);
}

#[tokio::test]
async fn admin_can_create_category() {
    let harness = TestHarness::new();
    let auth = harness.admin_auth_header().await;

    let response = harness
        .server
        .post("/api/categories")
        .add_header("authorization", auth)
        .json(&json!({ "name": "Bedtime", "description": "Stories to fall asleep to" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["name"], "Bedtime");

    let listed: serde_json::Value = harness.server.get("/api/categories").await.json();
    assert_eq!(listed.as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn duplicate_category_name_conflicts() {
    let harness = TestHarness::new();
    let auth = harness.admin_auth_header().await;

    let response = harness
        .server
        .post("/api/categories")
        .add_header("authorization", auth)
        .json(&json!({ "name": "Adventure" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
}

#[tokio::test]
async fn category_creation_requires_admin() {
    let harness = TestHarness::new();
    let auth = harness.parent_auth_header("casey").await;

    let response = harness
        .server
        .post("/api/categories")
        .add_header("authorization", auth)
        .json(&json!({ "name": "Bedtime" }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn update_renames_category() {
    let harness = TestHarness::new();
    let auth = harness.admin_auth_header().await;

    let listed: serde_json::Value = harness.server.get("/api/categories").await.json();
    let id = listed[0]["id"].as_str().unwrap().to_string();

    let response = harness
        .server
        .put(&format!("/api/categories/{id}"))
        .add_header("authorization", auth)
        .json(&json!({ "name": "Expeditions", "description": "Renamed" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["name"], "Expeditions");
}

#[tokio::test]
async fn update_unknown_category_is_not_found() {
    let harness = TestHarness::new();
    let auth = harness.admin_auth_header().await;

    let response = harness
        .server
        .put(&format!("/api/categories/{}", uuid::Uuid::new_v4()))
        .add_header("authorization", auth)
        .json(&json!({ "name": "Ghost" }))
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn delete_removes_category() {
    let harness = TestHarness::new();
    let auth = harness.admin_auth_header().await;

    let listed: serde_json::Value = harness.server.get("/api/categories").await.json();
    let id = listed[0]["id"].as_str().unwrap().to_string();

    harness
        .server
        .delete(&format!("/api/categories/{id}"))
        .add_header("authorization", auth)
        .await
        .assert_status_ok();

    let after: serde_json::Value = harness.server.get("/api/categories").await.json();
    assert_eq!(after.as_array().unwrap().len(), 3);
}
