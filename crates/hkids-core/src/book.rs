//! Book and page types.
//!
//! A book is created in two phases: the metadata row is written
//! synchronously with `page_count = 0`, and the page rows are inserted later
//! by the ingestion worker in a single batch. Until that batch commits (or
//! fails), a freshly created book legitimately reports zero pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{BookId, CategoryId};

/// Maximum number of page files accepted per book upload.
pub const MAX_PAGE_FILES: usize = 50;

/// Fixed value written to `file_path` on every book row.
///
/// The column is NOT NULL but nothing reads it back; the value is vestigial
/// and carries no meaning beyond satisfying the constraint.
pub const PAGE_FILE_SENTINEL: &str = "uploaded";

/// A book in the library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// The book ID.
    pub id: BookId,

    /// Title. Required at creation.
    pub title: String,

    /// Author, if known.
    pub author: Option<String>,

    /// Short description shown in listings.
    pub description: Option<String>,

    /// Stored path of the cover image, if one was uploaded.
    pub cover_image: Option<String>,

    /// Vestigial NOT NULL column, always `PAGE_FILE_SENTINEL`.
    pub file_path: String,

    /// Category, if assigned.
    pub category_id: Option<CategoryId>,

    /// Inclusive lower bound of the target age range.
    pub age_group_min: i16,

    /// Inclusive upper bound of the target age range.
    pub age_group_max: i16,

    /// Number of pages. Zero until the page batch commits.
    pub page_count: i32,

    /// Whether the book is visible on the published listing.
    pub is_published: bool,

    /// When the book was created.
    pub created_at: DateTime<Utc>,

    /// When the book was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Create a new unpublished book with no pages.
    #[must_use]
    pub fn new(title: String) -> Self {
        let now = Utc::now();
        Self {
            id: BookId::generate(),
            title,
            author: None,
            description: None,
            cover_image: None,
            file_path: PAGE_FILE_SENTINEL.to_string(),
            category_id: None,
            age_group_min: 0,
            age_group_max: 12,
            page_count: 0,
            is_published: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether a reader of `age` falls inside the book's age range.
    #[must_use]
    pub const fn matches_age(&self, age: i16) -> bool {
        self.age_group_min <= age && age <= self.age_group_max
    }
}

/// A single stored page of a book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookPage {
    /// The page ID.
    pub id: uuid::Uuid,

    /// The owning book. Deleting the book cascades to its pages.
    pub book_id: BookId,

    /// 1-based position, assigned from file submission order.
    pub page_number: i32,

    /// Stored path of the page image.
    pub image_path: String,

    /// Extracted text content, if any.
    pub content: Option<String>,
}

/// A page awaiting insertion by the ingestion worker.
#[derive(Debug, Clone)]
pub struct NewPage {
    /// 1-based position.
    pub page_number: i32,

    /// Stored path of the page image.
    pub image_path: String,

    /// Extracted text content, if any.
    pub content: Option<String>,
}
