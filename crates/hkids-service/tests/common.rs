//! Common test utilities for hkids integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use tempfile::TempDir;

use hkids_service::{create_router, AppState, ServiceConfig};
use hkids_store::MemStore;

/// A tiny valid-enough PNG payload for upload tests.
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary upload directory (kept alive for test duration).
    pub upload_dir: TempDir,
}

impl TestHarness {
    /// Create a new test harness over a freshly seeded in-memory store.
    pub fn new() -> Self {
        let upload_dir = TempDir::new().expect("Failed to create temp directory");

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            upload_dir: upload_dir.path().to_string_lossy().to_string(),
            jwt_secret: "test-secret".into(),
            token_ttl_hours: 24,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        };

        let state = AppState::new(Arc::new(MemStore::seeded()), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self { server, upload_dir }
    }

    /// Login and return the bearer token.
    pub async fn login(&self, username: &str, password: &str) -> String {
        let response = self
            .server
            .post("/api/auth/login")
            .json(&serde_json::json!({ "username": username, "password": password }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["token"].as_str().expect("token in response").to_string()
    }

    /// Login as the seeded admin account.
    pub async fn admin_auth_header(&self) -> String {
        let token = self.login("admin", "admin123").await;
        format!("Bearer {token}")
    }

    /// Register a parent account and return its auth header.
    pub async fn parent_auth_header(&self, username: &str) -> String {
        self.server
            .post("/api/auth/register")
            .json(&serde_json::json!({ "username": username, "password": "pass-1234" }))
            .await
            .assert_status(axum::http::StatusCode::CREATED);

        let token = self.login(username, "pass-1234").await;
        format!("Bearer {token}")
    }

    /// Create a book through the API, asserting success, and return the
    /// response body.
    pub async fn create_book(
        &self,
        auth: &str,
        form: MultipartForm,
    ) -> serde_json::Value {
        let response = self
            .server
            .post("/api/books")
            .add_header("authorization", auth)
            .multipart(form)
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json()
    }

    /// Poll a book until it reports `expected` pages, panicking after a
    /// couple of seconds. The page batch runs on the ingestion worker, so
    /// tests cannot observe it synchronously.
    pub async fn wait_for_pages(&self, book_id: &str, expected: usize) -> serde_json::Value {
        for _ in 0..200 {
            let response = self.server.get(&format!("/api/books/{book_id}")).await;
            let body: serde_json::Value = response.json();
            if body["pages"].as_array().map(Vec::len) == Some(expected) {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("book {book_id} never reached {expected} pages");
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// A multipart form with a title and `pages` page files attached.
pub fn book_form_with_pages(title: &str, pages: usize) -> MultipartForm {
    let mut form = MultipartForm::new().add_text("title", title);
    for n in 1..=pages {
        form = form.add_part(
            "pages",
            Part::bytes(PNG_BYTES.to_vec())
                .file_name(format!("page-{n}.png"))
                .mime_type("image/png"),
        );
    }
    form
}
