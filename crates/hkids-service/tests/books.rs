//! Book ingestion, query, update, and delete integration tests.

mod common;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use common::{book_form_with_pages, TestHarness, PNG_BYTES};

// ============================================================================
// Creation without pages
// ============================================================================

#[tokio::test]
async fn create_without_pages_has_no_processing_flag() {
    let harness = TestHarness::new();
    let auth = harness.admin_auth_header().await;

    let body = harness
        .create_book(&auth, MultipartForm::new().add_text("title", "The Little Fox"))
        .await;

    assert_eq!(body["message"], "Book created successfully");
    assert!(body.get("processing").is_none());

    let book_id = body["id"].as_str().unwrap();
    let response = harness.server.get(&format!("/api/books/{book_id}")).await;
    response.assert_status_ok();
    let detail: serde_json::Value = response.json();
    assert_eq!(detail["title"], "The Little Fox");
    assert_eq!(detail["page_count"], 0);
    assert_eq!(detail["pages"].as_array().unwrap().len(), 0);
}

// ============================================================================
// Creation with pages (deferred ingestion)
// ============================================================================

#[tokio::test]
async fn create_with_pages_processes_in_background() {
    let harness = TestHarness::new();
    let auth = harness.admin_auth_header().await;

    let body = harness
        .create_book(&auth, book_form_with_pages("Counting Stars", 3))
        .await;

    assert_eq!(body["processing"], "Pages are being processed...");

    let book_id = body["id"].as_str().unwrap();
    let detail = harness.wait_for_pages(book_id, 3).await;

    assert_eq!(detail["page_count"], 3);
    let numbers: Vec<i64> = detail["pages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["page_number"].as_i64().unwrap())
        .collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[tokio::test]
async fn page_paths_follow_submission_order() {
    let harness = TestHarness::new();
    let auth = harness.admin_auth_header().await;

    let form = MultipartForm::new()
        .add_text("title", "Ordered")
        .add_part(
            "pages",
            Part::bytes(PNG_BYTES.to_vec())
                .file_name("first.png")
                .mime_type("image/png"),
        )
        .add_part(
            "pages",
            Part::bytes(PNG_BYTES.to_vec())
                .file_name("second.png")
                .mime_type("image/png"),
        );

    let body = harness.create_book(&auth, form).await;
    let detail = harness
        .wait_for_pages(body["id"].as_str().unwrap(), 2)
        .await;

    let pages = detail["pages"].as_array().unwrap();
    // Stored names are generated, but order must match submission order.
    assert_eq!(pages[0]["page_number"], 1);
    assert_eq!(pages[1]["page_number"], 2);
    assert_ne!(pages[0]["image_path"], pages[1]["image_path"]);
}

// ============================================================================
// Creation validation
// ============================================================================

#[tokio::test]
async fn missing_title_is_rejected() {
    let harness = TestHarness::new();
    let auth = harness.admin_auth_header().await;

    let response = harness
        .server
        .post("/api/books")
        .add_header("authorization", auth)
        .multipart(MultipartForm::new().add_text("author", "A. Writer"))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn inverted_age_range_is_rejected() {
    let harness = TestHarness::new();
    let auth = harness.admin_auth_header().await;

    let form = MultipartForm::new()
        .add_text("title", "T")
        .add_text("age_group_min", "9")
        .add_text("age_group_max", "4");

    let response = harness
        .server
        .post("/api/books")
        .add_header("authorization", auth)
        .multipart(form)
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn unknown_category_is_not_found() {
    let harness = TestHarness::new();
    let auth = harness.admin_auth_header().await;

    let form = MultipartForm::new()
        .add_text("title", "T")
        .add_text("category_id", uuid::Uuid::new_v4().to_string());

    let response = harness
        .server
        .post("/api/books")
        .add_header("authorization", auth)
        .multipart(form)
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn unsupported_file_type_is_rejected() {
    let harness = TestHarness::new();
    let auth = harness.admin_auth_header().await;

    let form = MultipartForm::new().add_text("title", "T").add_part(
        "pages",
        Part::bytes(b"hello".to_vec())
            .file_name("page.txt")
            .mime_type("text/plain"),
    );

    let response = harness
        .server
        .post("/api/books")
        .add_header("authorization", auth)
        .multipart(form)
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn unexpected_file_field_is_rejected() {
    let harness = TestHarness::new();
    let auth = harness.admin_auth_header().await;

    let form = MultipartForm::new().add_text("title", "T").add_part(
        "poster",
        Part::bytes(PNG_BYTES.to_vec())
            .file_name("poster.png")
            .mime_type("image/png"),
    );

    let response = harness
        .server
        .post("/api/books")
        .add_header("authorization", auth)
        .multipart(form)
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn creation_requires_auth() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/api/books")
        .multipart(MultipartForm::new().add_text("title", "T"))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn creation_requires_admin_role() {
    let harness = TestHarness::new();
    let auth = harness.parent_auth_header("casey").await;

    let response = harness
        .server
        .post("/api/books")
        .add_header("authorization", auth)
        .multipart(MultipartForm::new().add_text("title", "T"))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

// ============================================================================
// Published listing
// ============================================================================

async fn create_published(harness: &TestHarness, auth: &str, title: &str, min: &str, max: &str) {
    let form = MultipartForm::new()
        .add_text("title", title)
        .add_text("age_group_min", min)
        .add_text("age_group_max", max)
        .add_text("is_published", "true");
    harness.create_book(auth, form).await;
}

#[tokio::test]
async fn published_listing_filters_by_age_inclusively() {
    let harness = TestHarness::new();
    let auth = harness.admin_auth_header().await;

    create_published(&harness, &auth, "Toddlers", "2", "4").await;
    create_published(&harness, &auth, "Primary", "5", "8").await;
    // Unpublished book must never appear
    harness
        .create_book(&auth, MultipartForm::new().add_text("title", "Draft"))
        .await;

    let titles = |body: &serde_json::Value| -> Vec<String> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|b| b["title"].as_str().unwrap().to_string())
            .collect()
    };

    let response = harness.server.get("/api/books/published?age_group=4").await;
    response.assert_status_ok();
    assert_eq!(titles(&response.json()), vec!["Toddlers"]);

    // Lower bound is inclusive
    let response = harness.server.get("/api/books/published?age_group=5").await;
    assert_eq!(titles(&response.json()), vec!["Primary"]);

    // Upper bound is inclusive
    let response = harness.server.get("/api/books/published?age_group=8").await;
    assert_eq!(titles(&response.json()), vec!["Primary"]);

    let response = harness.server.get("/api/books/published?age_group=12").await;
    assert!(titles(&response.json()).is_empty());

    // No filter returns every published book
    let response = harness.server.get("/api/books/published").await;
    assert_eq!(titles(&response.json()).len(), 2);
}

#[tokio::test]
async fn published_listing_filters_by_category() {
    let harness = TestHarness::new();
    let auth = harness.admin_auth_header().await;

    let categories: serde_json::Value = harness.server.get("/api/categories").await.json();
    let category_id = categories[0]["id"].as_str().unwrap().to_string();

    let form = MultipartForm::new()
        .add_text("title", "In Category")
        .add_text("category_id", category_id.clone())
        .add_text("is_published", "true");
    harness.create_book(&auth, form).await;
    create_published(&harness, &auth, "No Category", "0", "12").await;

    let response = harness
        .server
        .get(&format!("/api/books/published?category_id={category_id}"))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let books = body.as_array().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["title"], "In Category");
    assert_eq!(
        books[0]["category_name"],
        categories[0]["name"]
    );
}

#[tokio::test]
async fn admin_listing_includes_unpublished() {
    let harness = TestHarness::new();
    let auth = harness.admin_auth_header().await;

    harness
        .create_book(&auth, MultipartForm::new().add_text("title", "Draft"))
        .await;

    let response = harness
        .server
        .get("/api/books")
        .add_header("authorization", auth)
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn unknown_book_is_not_found() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get(&format!("/api/books/{}", uuid::Uuid::new_v4()))
        .await;

    response.assert_status_not_found();
}

// ============================================================================
// Update
// ============================================================================

#[tokio::test]
async fn update_preserves_omitted_fields() {
    let harness = TestHarness::new();
    let auth = harness.admin_auth_header().await;

    let form = MultipartForm::new()
        .add_text("title", "Original")
        .add_text("author", "A. Writer")
        .add_text("description", "First edition");
    let body = harness.create_book(&auth, form).await;
    let book_id = body["id"].as_str().unwrap().to_string();

    // Update only the description; author and title must survive.
    let response = harness
        .server
        .put(&format!("/api/books/{book_id}"))
        .add_header("authorization", auth)
        .multipart(MultipartForm::new().add_text("description", "Second edition"))
        .await;
    response.assert_status_ok();

    let detail: serde_json::Value = harness
        .server
        .get(&format!("/api/books/{book_id}"))
        .await
        .json();
    assert_eq!(detail["title"], "Original");
    assert_eq!(detail["author"], "A. Writer");
    assert_eq!(detail["description"], "Second edition");
}

#[tokio::test]
async fn update_replaces_cover_only_when_supplied() {
    let harness = TestHarness::new();
    let auth = harness.admin_auth_header().await;

    let form = MultipartForm::new().add_text("title", "Covered").add_part(
        "cover",
        Part::bytes(PNG_BYTES.to_vec())
            .file_name("cover.png")
            .mime_type("image/png"),
    );
    let body = harness.create_book(&auth, form).await;
    let book_id = body["id"].as_str().unwrap().to_string();

    let original: serde_json::Value = harness
        .server
        .get(&format!("/api/books/{book_id}"))
        .await
        .json();
    let original_cover = original["cover_image"].as_str().unwrap().to_string();

    // Metadata-only update keeps the cover
    harness
        .server
        .put(&format!("/api/books/{book_id}"))
        .add_header("authorization", auth.clone())
        .multipart(MultipartForm::new().add_text("author", "B"))
        .await
        .assert_status_ok();

    let after: serde_json::Value = harness
        .server
        .get(&format!("/api/books/{book_id}"))
        .await
        .json();
    assert_eq!(after["cover_image"], original_cover.as_str());

    // A new cover replaces the stored path
    let form = MultipartForm::new().add_part(
        "cover",
        Part::bytes(PNG_BYTES.to_vec())
            .file_name("new-cover.png")
            .mime_type("image/png"),
    );
    harness
        .server
        .put(&format!("/api/books/{book_id}"))
        .add_header("authorization", auth)
        .multipart(form)
        .await
        .assert_status_ok();

    let replaced: serde_json::Value = harness
        .server
        .get(&format!("/api/books/{book_id}"))
        .await
        .json();
    assert_ne!(replaced["cover_image"], original_cover.as_str());
}

#[tokio::test]
async fn update_unknown_book_is_not_found() {
    let harness = TestHarness::new();
    let auth = harness.admin_auth_header().await;

    let response = harness
        .server
        .put(&format!("/api/books/{}", uuid::Uuid::new_v4()))
        .add_header("authorization", auth)
        .multipart(MultipartForm::new().add_text("title", "X"))
        .await;

    response.assert_status_not_found();
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn delete_cascades_pages() {
    let harness = TestHarness::new();
    let auth = harness.admin_auth_header().await;

    let body = harness
        .create_book(&auth, book_form_with_pages("Ephemeral", 2))
        .await;
    let book_id = body["id"].as_str().unwrap().to_string();
    harness.wait_for_pages(&book_id, 2).await;

    harness
        .server
        .delete(&format!("/api/books/{book_id}"))
        .add_header("authorization", auth)
        .await
        .assert_status_ok();

    harness
        .server
        .get(&format!("/api/books/{book_id}"))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn delete_succeeds_when_cover_file_is_missing() {
    let harness = TestHarness::new();
    let auth = harness.admin_auth_header().await;

    let form = MultipartForm::new().add_text("title", "Lost Cover").add_part(
        "cover",
        Part::bytes(PNG_BYTES.to_vec())
            .file_name("cover.png")
            .mime_type("image/png"),
    );
    let body = harness.create_book(&auth, form).await;
    let book_id = body["id"].as_str().unwrap().to_string();

    // Remove the stored file out from under the service
    let detail: serde_json::Value = harness
        .server
        .get(&format!("/api/books/{book_id}"))
        .await
        .json();
    let cover = detail["cover_image"].as_str().unwrap();
    let file_name = cover.strip_prefix("/uploads/").unwrap();
    std::fs::remove_file(harness.upload_dir.path().join(file_name)).unwrap();

    harness
        .server
        .delete(&format!("/api/books/{book_id}"))
        .add_header("authorization", auth)
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn delete_unknown_book_is_not_found() {
    let harness = TestHarness::new();
    let auth = harness.admin_auth_header().await;

    let response = harness
        .server
        .delete(&format!("/api/books/{}", uuid::Uuid::new_v4()))
        .add_header("authorization", auth)
        .await;

    response.assert_status_not_found();
}
