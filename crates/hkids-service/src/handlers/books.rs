//! Book handlers: the ingestion write path, queries, update, delete.

use std::path::Path as FsPath;
use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use hkids_core::{Book, BookId, BookPage, CategoryId, NewPage};
use hkids_store::{BookSummary, PublishedFilter, Store};

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::ingest::PageBatch;
use crate::state::AppState;
use crate::upload::collect_book_upload;

/// Message returned alongside a fresh book ID.
const BOOK_CREATED_MESSAGE: &str = "Book created successfully";

/// Flag returned when page files were handed to the ingestion queue.
const PAGES_PROCESSING_MESSAGE: &str = "Pages are being processed...";

/// Simple message response.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable outcome.
    pub message: &'static str,
}

/// Response to a book creation.
#[derive(Debug, Serialize)]
pub struct CreateBookResponse {
    /// The new book ID.
    pub id: String,
    /// Human-readable outcome.
    pub message: &'static str,
    /// Present only when page files are being inserted in the background.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing: Option<&'static str>,
}

/// A book with its pages.
#[derive(Debug, Serialize)]
pub struct BookDetailResponse {
    /// The book row.
    #[serde(flatten)]
    pub book: Book,
    /// Pages ordered by page number. Empty until the page batch commits.
    pub pages: Vec<BookPage>,
}

/// Create a book from a multipart upload.
///
/// The book row commits and the response leaves before any page rows
/// exist; supplied page files are inserted afterwards by the ingestion
/// worker. The caller learns about a failed page batch only through
/// `page_count` staying at zero.
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CreateBookResponse>), ApiError> {
    let upload = collect_book_upload(
        multipart,
        FsPath::new(&state.config.upload_dir),
        state.config.max_body_bytes,
    )
    .await?;

    let title = upload
        .fields
        .get("title")
        .map(|s| s.trim())
        .unwrap_or_default();
    if title.is_empty() {
        return Err(ApiError::BadRequest("title is required".into()));
    }

    let mut book = Book::new(title.to_string());
    apply_metadata(&mut book, &upload.fields, &state).await?;
    book.cover_image = upload.cover.as_ref().map(|f| f.path.clone());

    state.store.create_book(&book).await?;

    tracing::info!(
        book_id = %book.id,
        admin = %admin.username,
        pages = upload.pages.len(),
        "book created"
    );

    let processing = if upload.pages.is_empty() {
        None
    } else {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let pages: Vec<NewPage> = upload
            .pages
            .iter()
            .enumerate()
            .map(|(index, file)| NewPage {
                page_number: index as i32 + 1,
                image_path: file.path.clone(),
                content: None,
            })
            .collect();

        state.ingest.enqueue(PageBatch {
            book_id: book.id,
            pages,
        });
        Some(PAGES_PROCESSING_MESSAGE)
    };

    Ok((
        StatusCode::CREATED,
        Json(CreateBookResponse {
            id: book.id.to_string(),
            message: BOOK_CREATED_MESSAGE,
            processing,
        }),
    ))
}

/// Get a book with its pages.
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<BookId>,
) -> Result<Json<BookDetailResponse>, ApiError> {
    let book = state
        .store
        .get_book(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("book not found: {id}")))?;
    let pages = state.store.list_pages(&id).await?;

    Ok(Json(BookDetailResponse { book, pages }))
}

/// List every book, including unpublished ones.
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<Json<Vec<BookSummary>>, ApiError> {
    Ok(Json(state.store.list_books().await?))
}

/// Filters accepted by the published listing.
#[derive(Debug, Deserialize)]
pub struct PublishedParams {
    /// Match books whose age range contains this age.
    pub age_group: Option<i16>,
    /// Match books in this category.
    pub category_id: Option<CategoryId>,
}

/// List published books, newest first. The full result set is returned;
/// there is no pagination.
pub async fn list_published(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PublishedParams>,
) -> Result<Json<Vec<BookSummary>>, ApiError> {
    let filter = PublishedFilter {
        age_group: params.age_group,
        category_id: params.category_id,
    };

    Ok(Json(state.store.list_published(&filter).await?))
}

/// Partially update a book from a multipart upload.
///
/// The stored row is fetched first; every omitted field keeps its stored
/// value. A new cover replaces the stored path, omission preserves it.
/// Page files are not part of this flow.
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<BookId>,
    multipart: Multipart,
) -> Result<Json<MessageResponse>, ApiError> {
    let upload = collect_book_upload(
        multipart,
        FsPath::new(&state.config.upload_dir),
        state.config.max_body_bytes,
    )
    .await?;

    let mut book = state
        .store
        .get_book(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("book not found: {id}")))?;

    if let Some(title) = upload.fields.get("title") {
        let title = title.trim();
        if title.is_empty() {
            return Err(ApiError::BadRequest("title cannot be empty".into()));
        }
        book.title = title.to_string();
    }

    apply_metadata(&mut book, &upload.fields, &state).await?;

    if let Some(cover) = upload.cover {
        book.cover_image = Some(cover.path);
    }

    if !upload.pages.is_empty() {
        tracing::warn!(book_id = %id, "page files are ignored on update");
    }

    book.updated_at = Utc::now();

    if !state.store.update_book(&book).await? {
        return Err(ApiError::NotFound(format!("book not found: {id}")));
    }

    tracing::info!(book_id = %id, admin = %admin.username, "book updated");

    Ok(Json(MessageResponse {
        message: "Book updated successfully",
    }))
}

/// Delete a book.
///
/// Page rows cascade with the book row; the cover file is unlinked from
/// disk best-effort, and a missing file does not fail the request.
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<BookId>,
) -> Result<Json<MessageResponse>, ApiError> {
    let book = state
        .store
        .delete_book(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("book not found: {id}")))?;

    if let Some(cover) = &book.cover_image {
        remove_upload(&state.config.upload_dir, cover).await;
    }

    tracing::info!(book_id = %id, admin = %admin.username, "book deleted");

    Ok(Json(MessageResponse {
        message: "Book deleted successfully",
    }))
}

/// Apply optional metadata fields onto a book, validating as it goes.
///
/// Fields absent from the map leave the book untouched, which is what
/// gives the update path its coalesce semantics.
async fn apply_metadata(
    book: &mut Book,
    fields: &std::collections::HashMap<String, String>,
    state: &AppState,
) -> Result<(), ApiError> {
    if let Some(author) = fields.get("author") {
        book.author = optional_text(author);
    }
    if let Some(description) = fields.get("description") {
        book.description = optional_text(description);
    }

    if let Some(raw) = fields.get("category_id") {
        if raw.trim().is_empty() {
            book.category_id = None;
        } else {
            let category_id: CategoryId = raw
                .trim()
                .parse()
                .map_err(|_| ApiError::BadRequest(format!("invalid category_id: {raw}")))?;
            state
                .store
                .get_category(&category_id)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("category not found: {category_id}")))?;
            book.category_id = Some(category_id);
        }
    }

    if let Some(raw) = fields.get("age_group_min") {
        book.age_group_min = parse_age(raw, "age_group_min")?;
    }
    if let Some(raw) = fields.get("age_group_max") {
        book.age_group_max = parse_age(raw, "age_group_max")?;
    }
    if book.age_group_min > book.age_group_max {
        return Err(ApiError::BadRequest(format!(
            "invalid age range: min={} exceeds max={}",
            book.age_group_min, book.age_group_max
        )));
    }

    if let Some(raw) = fields.get("is_published") {
        book.is_published = parse_flag(raw)?;
    }

    Ok(())
}

fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_age(value: &str, field: &str) -> Result<i16, ApiError> {
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid {field}: {value}")))
}

fn parse_flag(value: &str) -> Result<bool, ApiError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(ApiError::BadRequest(format!(
            "invalid is_published: {other}"
        ))),
    }
}

/// Best-effort removal of a stored upload by its public path.
async fn remove_upload(upload_dir: &str, public_path: &str) {
    let Some(file_name) = public_path.strip_prefix("/uploads/") else {
        return;
    };
    let path = FsPath::new(upload_dir).join(file_name);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        tracing::debug!(path = %path.display(), error = %e, "upload removal failed");
    }
}
