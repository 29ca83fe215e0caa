//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{auth, books, categories, health, kids};
use crate::state::AppState;

// ============================================================================
// Concurrency Limiting Constants
// ============================================================================

/// Maximum concurrent requests for library endpoints.
/// Multipart book uploads are the heaviest requests the service takes.
const LIBRARY_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Maximum concurrent requests for profile and approval endpoints.
const FAMILY_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /api/books/published` - Published books (age/category filters)
/// - `GET /api/books/:id` - Book with pages
/// - `GET /api/categories` - Category list
/// - `POST /api/auth/register` - Create a parent account
/// - `POST /api/auth/login` - Issue a token
/// - `/uploads/*` - Stored covers and pages, served verbatim
///
/// ## Library (admin JWT)
/// - `GET /api/books` - All books, including unpublished
/// - `POST /api/books` - Create book (multipart, deferred page ingestion)
/// - `PUT /api/books/:id` - Partial update (multipart)
/// - `DELETE /api/books/:id` - Delete book and cover file
/// - `POST/PUT/DELETE /api/categories[...]` - Category management
///
/// ## Family (parent JWT)
/// - `GET/POST /api/kids` - Kid profiles
/// - `PUT/DELETE /api/kids/:id` - Kid profile management
/// - `GET/PUT /api/kids/:id/approvals[...]` - Category approvals
/// - `GET /api/kids/:id/books` - Approved published books
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;
    let upload_dir = state.config.upload_dir.clone();

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me));

    // Library routes carry the multipart write path, so they get their own
    // concurrency limit.
    let library_routes = Router::new()
        .route("/books", get(books::list_books).post(books::create_book))
        .route("/books/published", get(books::list_published))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        .route(
            "/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/categories/:id",
            put(categories::update_category).delete(categories::delete_category),
        )
        .layer(ConcurrencyLimitLayer::new(LIBRARY_MAX_CONCURRENT_REQUESTS));

    let family_routes = Router::new()
        .route("/kids", get(kids::list_profiles).post(kids::create_profile))
        .route(
            "/kids/:id",
            put(kids::update_profile).delete(kids::delete_profile),
        )
        .route("/kids/:id/approvals", get(kids::list_approvals))
        .route("/kids/:id/approvals/:category_id", put(kids::set_approval))
        .route("/kids/:id/books", get(kids::list_approved_books))
        .layer(ConcurrencyLimitLayer::new(FAMILY_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // API routes
        .nest(
            "/api",
            auth_routes.merge(library_routes).merge(family_routes),
        )
        // Uploaded covers and pages, served verbatim
        .nest_service("/uploads", ServeDir::new(upload_dir))
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
