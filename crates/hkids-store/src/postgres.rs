//! PostgreSQL storage backend.
//!
//! `PgStore` wraps one shared `sqlx` connection pool. Database rows are
//! mapped through private row structs (deriving `sqlx::FromRow`) and then
//! converted into the domain types, keeping the schema representation
//! separate from the API surface.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, QueryBuilder};
use uuid::Uuid;

use hkids_core::{
    hash_password, Book, BookId, BookPage, Category, CategoryId, KidProfile, KidProfileId,
    NewPage, ParentApproval, Role, User, UserId, DEFAULT_CATEGORIES,
};

use crate::config::ResolvedDb;
use crate::error::{classify_connect_error, Result, StoreError};
use crate::schema;
use crate::{BookSummary, PublishedFilter, Store};

/// Maximum pooled connections. One pool is shared by all request handlers
/// and the ingestion worker; exhaustion shows up as queuing, not errors.
const MAX_POOL_CONNECTIONS: u32 = 10;

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to PostgreSQL using a resolved configuration.
    ///
    /// A connection-string configuration is handed to the driver verbatim;
    /// discrete fields are assembled into connect options.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` with a classified diagnostic when the
    /// connection cannot be established.
    pub async fn connect(resolved: &ResolvedDb) -> Result<Self> {
        let options = PgPoolOptions::new().max_connections(MAX_POOL_CONNECTIONS);

        let pool = match resolved {
            ResolvedDb::Url(url) => options.connect(url).await,
            ResolvedDb::Discrete { .. } => {
                options.connect_with(resolved.connect_options()?).await
            }
        }
        .map_err(|e| StoreError::Database(classify_connect_error(&e)))?;

        Ok(Self { pool })
    }

    /// Build a store from an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create all tables and seed reference data, idempotently.
    ///
    /// Tables, the four default categories, and the default admin account
    /// are created with insert-or-do-nothing semantics inside a single
    /// transaction; any failure rolls the whole batch back.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` with a classified diagnostic.
    pub async fn init_schema(&self) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StoreError::Database(classify_connect_error(&e)))?;

        for statement in schema::CREATE_TABLES {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::Database(classify_connect_error(&e)))?;
        }

        for (name, description) in DEFAULT_CATEGORIES {
            sqlx::query(schema::SEED_CATEGORY)
                .bind(Uuid::new_v4())
                .bind(name)
                .bind(description)
                .execute(&mut *tx)
                .await
                .map_err(|e| StoreError::Database(classify_connect_error(&e)))?;
        }

        let admin_hash = hash_password(schema::DEFAULT_ADMIN_PASSWORD)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        sqlx::query(schema::SEED_ADMIN)
            .bind(Uuid::new_v4())
            .bind(schema::DEFAULT_ADMIN_USERNAME)
            .bind(admin_hash)
            .bind(Role::Admin.as_str())
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Database(classify_connect_error(&e)))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::Database(classify_connect_error(&e)))?;

        tracing::info!("database schema initialized");
        Ok(())
    }
}

// ============================================================================
// Row types
// ============================================================================

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    role: String,
    kid_profile_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User> {
        let role: Role = self
            .role
            .parse()
            .map_err(|_| StoreError::Database(format!("corrupt role column: {}", self.role)))?;
        Ok(User {
            id: UserId::from_uuid(self.id),
            username: self.username,
            password_hash: self.password_hash,
            role,
            kid_profile_id: self.kid_profile_id.map(KidProfileId::from_uuid),
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: Uuid,
    name: String,
    description: Option<String>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::from_uuid(row.id),
            name: row.name,
            description: row.description,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BookRow {
    id: Uuid,
    title: String,
    author: Option<String>,
    description: Option<String>,
    cover_image: Option<String>,
    file_path: String,
    category_id: Option<Uuid>,
    age_group_min: i16,
    age_group_max: i16,
    page_count: i32,
    is_published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Self {
            id: BookId::from_uuid(row.id),
            title: row.title,
            author: row.author,
            description: row.description,
            cover_image: row.cover_image,
            file_path: row.file_path,
            category_id: row.category_id.map(CategoryId::from_uuid),
            age_group_min: row.age_group_min,
            age_group_max: row.age_group_max,
            page_count: row.page_count,
            is_published: row.is_published,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BookSummaryRow {
    #[sqlx(flatten)]
    book: BookRow,
    category_name: Option<String>,
}

impl From<BookSummaryRow> for BookSummary {
    fn from(row: BookSummaryRow) -> Self {
        Self {
            book: row.book.into(),
            category_name: row.category_name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PageRow {
    id: Uuid,
    book_id: Uuid,
    page_number: i32,
    image_path: String,
    content: Option<String>,
}

impl From<PageRow> for BookPage {
    fn from(row: PageRow) -> Self {
        Self {
            id: row.id,
            book_id: BookId::from_uuid(row.book_id),
            page_number: row.page_number,
            image_path: row.image_path,
            content: row.content,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    parent_id: Uuid,
    name: String,
    avatar: Option<String>,
    age: Option<i16>,
    created_at: DateTime<Utc>,
}

impl From<ProfileRow> for KidProfile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: KidProfileId::from_uuid(row.id),
            parent_id: UserId::from_uuid(row.parent_id),
            name: row.name,
            avatar: row.avatar,
            age: row.age,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ApprovalRow {
    kid_profile_id: Uuid,
    category_id: Uuid,
    approved: bool,
    updated_at: DateTime<Utc>,
}

impl From<ApprovalRow> for ParentApproval {
    fn from(row: ApprovalRow) -> Self {
        Self {
            kid_profile_id: KidProfileId::from_uuid(row.kid_profile_id),
            category_id: CategoryId::from_uuid(row.category_id),
            approved: row.approved,
            updated_at: row.updated_at,
        }
    }
}

const BOOK_SUMMARY_SELECT: &str = "SELECT b.*, c.name AS category_name \
     FROM books b LEFT JOIN categories c ON b.category_id = c.id";

// ============================================================================
// Store implementation
// ============================================================================

#[async_trait::async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, username, password_hash, role, kid_profile_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(*user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.kid_profile_id.map(|id| *id.as_uuid()))
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.map(UserRow::into_user).transpose()
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(UserRow::into_user).transpose()
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let rows: Vec<CategoryRow> = sqlx::query_as("SELECT * FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_category(&self, id: &CategoryId) -> Result<Option<Category>> {
        let row: Option<CategoryRow> = sqlx::query_as("SELECT * FROM categories WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn create_category(&self, category: &Category) -> Result<()> {
        sqlx::query("INSERT INTO categories (id, name, description) VALUES ($1, $2, $3)")
            .bind(*category.id.as_uuid())
            .bind(&category.name)
            .bind(&category.description)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_category(&self, category: &Category) -> Result<Option<Category>> {
        let row: Option<CategoryRow> = sqlx::query_as(
            "UPDATE categories SET name = $2, description = $3 WHERE id = $1 RETURNING *",
        )
        .bind(*category.id.as_uuid())
        .bind(&category.name)
        .bind(&category.description)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn delete_category(&self, id: &CategoryId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_book(&self, book: &Book) -> Result<()> {
        sqlx::query(
            "INSERT INTO books (id, title, author, description, cover_image, file_path, \
             category_id, age_group_min, age_group_max, page_count, is_published, \
             created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(*book.id.as_uuid())
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.description)
        .bind(&book.cover_image)
        .bind(&book.file_path)
        .bind(book.category_id.map(|id| *id.as_uuid()))
        .bind(book.age_group_min)
        .bind(book.age_group_max)
        .bind(book.page_count)
        .bind(book.is_published)
        .bind(book.created_at)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_book(&self, id: &BookId) -> Result<Option<Book>> {
        let row: Option<BookRow> = sqlx::query_as("SELECT * FROM books WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn list_books(&self) -> Result<Vec<BookSummary>> {
        let rows: Vec<BookSummaryRow> =
            sqlx::query_as(&format!("{BOOK_SUMMARY_SELECT} ORDER BY b.created_at DESC"))
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_published(&self, filter: &PublishedFilter) -> Result<Vec<BookSummary>> {
        let mut query = QueryBuilder::new(BOOK_SUMMARY_SELECT);
        query.push(" WHERE b.is_published = TRUE");

        if let Some(age) = filter.age_group {
            query
                .push(" AND b.age_group_min <= ")
                .push_bind(age)
                .push(" AND b.age_group_max >= ")
                .push_bind(age);
        }
        if let Some(category_id) = &filter.category_id {
            query
                .push(" AND b.category_id = ")
                .push_bind(*category_id.as_uuid());
        }
        query.push(" ORDER BY b.created_at DESC");

        let rows: Vec<BookSummaryRow> = query.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_book(&self, book: &Book) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE books SET title = $2, author = $3, description = $4, cover_image = $5, \
             file_path = $6, category_id = $7, age_group_min = $8, age_group_max = $9, \
             page_count = $10, is_published = $11, updated_at = $12 WHERE id = $1",
        )
        .bind(*book.id.as_uuid())
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.description)
        .bind(&book.cover_image)
        .bind(&book.file_path)
        .bind(book.category_id.map(|id| *id.as_uuid()))
        .bind(book.age_group_min)
        .bind(book.age_group_max)
        .bind(book.page_count)
        .bind(book.is_published)
        .bind(book.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_book(&self, id: &BookId) -> Result<Option<Book>> {
        let row: Option<BookRow> = sqlx::query_as("DELETE FROM books WHERE id = $1 RETURNING *")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn insert_pages(&self, book_id: &BookId, pages: &[NewPage]) -> Result<()> {
        if pages.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        let mut insert = QueryBuilder::new(
            "INSERT INTO book_pages (id, book_id, page_number, image_path, content) ",
        );
        insert.push_values(pages, |mut row, page| {
            row.push_bind(Uuid::new_v4())
                .push_bind(*book_id.as_uuid())
                .push_bind(page.page_number)
                .push_bind(&page.image_path)
                .push_bind(&page.content);
        });
        insert.build().execute(&mut *tx).await?;

        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let count = pages.len() as i32;
        sqlx::query("UPDATE books SET page_count = $2, updated_at = $3 WHERE id = $1")
            .bind(*book_id.as_uuid())
            .bind(count)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn list_pages(&self, book_id: &BookId) -> Result<Vec<BookPage>> {
        let rows: Vec<PageRow> =
            sqlx::query_as("SELECT * FROM book_pages WHERE book_id = $1 ORDER BY page_number")
                .bind(*book_id.as_uuid())
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create_kid_profile(&self, profile: &KidProfile) -> Result<()> {
        sqlx::query(
            "INSERT INTO kids_profiles (id, parent_id, name, avatar, age, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(*profile.id.as_uuid())
        .bind(*profile.parent_id.as_uuid())
        .bind(&profile.name)
        .bind(&profile.avatar)
        .bind(profile.age)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_kid_profiles(&self, parent_id: &UserId) -> Result<Vec<KidProfile>> {
        let rows: Vec<ProfileRow> =
            sqlx::query_as("SELECT * FROM kids_profiles WHERE parent_id = $1 ORDER BY created_at")
                .bind(*parent_id.as_uuid())
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_kid_profile(&self, id: &KidProfileId) -> Result<Option<KidProfile>> {
        let row: Option<ProfileRow> = sqlx::query_as("SELECT * FROM kids_profiles WHERE id = $1")
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn update_kid_profile(&self, profile: &KidProfile) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE kids_profiles SET name = $2, avatar = $3, age = $4 WHERE id = $1",
        )
        .bind(*profile.id.as_uuid())
        .bind(&profile.name)
        .bind(&profile.avatar)
        .bind(profile.age)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_kid_profile(&self, id: &KidProfileId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM kids_profiles WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_approval(&self, approval: &ParentApproval) -> Result<()> {
        sqlx::query(
            "INSERT INTO parent_approvals (kid_profile_id, category_id, approved, updated_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (kid_profile_id, category_id) \
             DO UPDATE SET approved = EXCLUDED.approved, updated_at = EXCLUDED.updated_at",
        )
        .bind(*approval.kid_profile_id.as_uuid())
        .bind(*approval.category_id.as_uuid())
        .bind(approval.approved)
        .bind(approval.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_approvals(&self, kid_profile_id: &KidProfileId) -> Result<Vec<ParentApproval>> {
        let rows: Vec<ApprovalRow> =
            sqlx::query_as("SELECT * FROM parent_approvals WHERE kid_profile_id = $1")
                .bind(*kid_profile_id.as_uuid())
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_approved_books(
        &self,
        kid_profile_id: &KidProfileId,
    ) -> Result<Vec<BookSummary>> {
        let rows: Vec<BookSummaryRow> = sqlx::query_as(
            "SELECT b.*, c.name AS category_name \
             FROM books b \
             JOIN categories c ON b.category_id = c.id \
             JOIN parent_approvals pa ON pa.category_id = b.category_id \
             WHERE pa.kid_profile_id = $1 AND pa.approved = TRUE AND b.is_published = TRUE \
             ORDER BY b.created_at DESC",
        )
        .bind(*kid_profile_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}
