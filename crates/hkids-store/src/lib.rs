//! Storage layer for HKids.
//!
//! This crate provides persistent storage for users, books, pages,
//! categories, kid profiles, and parental approvals.
//!
//! # Backends
//!
//! - [`PgStore`]: PostgreSQL over a shared `sqlx` connection pool. Connection
//!   configuration is resolved from the environment by [`config::resolve`],
//!   which refuses to construct a pool when no usable password is present.
//! - [`MemStore`]: in-memory implementation of the same [`Store`] trait,
//!   seeded identically to the schema initializer. Used by the service's
//!   integration tests.
//!
//! # Two-phase book writes
//!
//! `create_book` and `insert_pages` are intentionally separate operations
//! with separate transactions: the book row commits (and the HTTP response
//! leaves) before the page batch runs. A failed page batch rolls back and
//! leaves the book with `page_count = 0` and no page rows.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod schema;

pub use config::{resolve, DbEnv, ResolvedDb};
pub use error::{Result, StoreError};
pub use memory::MemStore;
pub use postgres::PgStore;

use serde::Serialize;

use hkids_core::{
    Book, BookId, BookPage, Category, CategoryId, KidProfile, KidProfileId, NewPage,
    ParentApproval, User, UserId,
};

/// A book joined with its category name, as returned by listing queries.
#[derive(Debug, Clone, Serialize)]
pub struct BookSummary {
    /// The book row.
    #[serde(flatten)]
    pub book: Book,

    /// Name of the assigned category, if any.
    pub category_name: Option<String>,
}

/// Filters for the published-books listing.
#[derive(Debug, Clone, Default)]
pub struct PublishedFilter {
    /// Match books whose age range contains this age (inclusive both ends).
    pub age_group: Option<i16>,

    /// Match books assigned to this category.
    pub category_id: Option<CategoryId>,
}

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations (PostgreSQL in production, in-memory for testing).
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // =========================================================================
    // User Operations
    // =========================================================================

    /// Insert a user record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the username is taken.
    async fn create_user(&self, user: &User) -> Result<()>;

    /// Get a user by login name.
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Get a user by ID.
    async fn get_user(&self, id: &UserId) -> Result<Option<User>>;

    // =========================================================================
    // Category Operations
    // =========================================================================

    /// List all categories, ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>>;

    /// Get a category by ID.
    async fn get_category(&self, id: &CategoryId) -> Result<Option<Category>>;

    /// Insert a category.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the name is taken.
    async fn create_category(&self, category: &Category) -> Result<()>;

    /// Update a category's name and description.
    ///
    /// Returns the updated row, or `None` if the ID is unknown.
    async fn update_category(&self, category: &Category) -> Result<Option<Category>>;

    /// Delete a category. Books keep their rows with `category_id` cleared.
    ///
    /// Returns whether a row was deleted.
    async fn delete_category(&self, id: &CategoryId) -> Result<bool>;

    // =========================================================================
    // Book Operations
    // =========================================================================

    /// Insert a book row. Committed independently of any page batch.
    async fn create_book(&self, book: &Book) -> Result<()>;

    /// Get a book by ID.
    async fn get_book(&self, id: &BookId) -> Result<Option<Book>>;

    /// List all books with category names, newest first.
    async fn list_books(&self) -> Result<Vec<BookSummary>>;

    /// List published books matching the filter, newest first.
    async fn list_published(&self, filter: &PublishedFilter) -> Result<Vec<BookSummary>>;

    /// Write every field of an existing book row.
    ///
    /// Callers fetch the row first and coalesce omitted inputs against it,
    /// so a full-row write is the correct primitive here.
    ///
    /// Returns whether the row existed.
    async fn update_book(&self, book: &Book) -> Result<bool>;

    /// Delete a book, cascading to its pages.
    ///
    /// Returns the deleted row (for cover-file cleanup), or `None` if the
    /// ID is unknown.
    async fn delete_book(&self, id: &BookId) -> Result<Option<Book>>;

    // =========================================================================
    // Page Operations
    // =========================================================================

    /// Insert a page batch and set the book's `page_count`, atomically.
    ///
    /// Runs in its own transaction; on failure nothing is inserted and the
    /// count stays at its previous value.
    async fn insert_pages(&self, book_id: &BookId, pages: &[NewPage]) -> Result<()>;

    /// List a book's pages ordered by page number.
    async fn list_pages(&self, book_id: &BookId) -> Result<Vec<BookPage>>;

    // =========================================================================
    // Kid Profile Operations
    // =========================================================================

    /// Insert a kid profile.
    async fn create_kid_profile(&self, profile: &KidProfile) -> Result<()>;

    /// List a parent's profiles, oldest first.
    async fn list_kid_profiles(&self, parent_id: &UserId) -> Result<Vec<KidProfile>>;

    /// Get a profile by ID.
    async fn get_kid_profile(&self, id: &KidProfileId) -> Result<Option<KidProfile>>;

    /// Write every field of an existing profile.
    ///
    /// Returns whether the row existed.
    async fn update_kid_profile(&self, profile: &KidProfile) -> Result<bool>;

    /// Delete a profile, cascading to its approvals.
    ///
    /// Returns whether a row was deleted.
    async fn delete_kid_profile(&self, id: &KidProfileId) -> Result<bool>;

    // =========================================================================
    // Approval Operations
    // =========================================================================

    /// Insert or update an approval for a (profile, category) pair.
    async fn set_approval(&self, approval: &ParentApproval) -> Result<()>;

    /// List a profile's approvals.
    async fn list_approvals(&self, kid_profile_id: &KidProfileId) -> Result<Vec<ParentApproval>>;

    /// List published books in categories approved for a profile,
    /// newest first.
    async fn list_approved_books(&self, kid_profile_id: &KidProfileId)
        -> Result<Vec<BookSummary>>;
}
