//! In-memory storage backend.
//!
//! Mirrors the PostgreSQL backend's behavior (seeding, conflict rules,
//! cascade semantics, ordering) so the service's integration tests can run
//! against the `Store` trait without a database.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use hkids_core::{
    hash_password, Book, BookId, BookPage, Category, CategoryId, KidProfile, KidProfileId,
    NewPage, ParentApproval, Role, User, UserId, DEFAULT_CATEGORIES,
};

use crate::error::{Result, StoreError};
use crate::schema;
use crate::{BookSummary, PublishedFilter, Store};

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, User>,
    categories: HashMap<CategoryId, Category>,
    books: HashMap<BookId, Book>,
    pages: Vec<BookPage>,
    profiles: HashMap<KidProfileId, KidProfile>,
    approvals: HashMap<(KidProfileId, CategoryId), ParentApproval>,
}

impl Inner {
    fn summarize(&self, book: &Book) -> BookSummary {
        let category_name = book
            .category_id
            .and_then(|id| self.categories.get(&id))
            .map(|c| c.name.clone());
        BookSummary {
            book: book.clone(),
            category_name,
        }
    }

    fn newest_first(&self, mut books: Vec<BookSummary>) -> Vec<BookSummary> {
        books.sort_by(|a, b| b.book.created_at.cmp(&a.book.created_at));
        books
    }
}

/// In-memory store for tests.
pub struct MemStore {
    inner: RwLock<Inner>,
}

impl MemStore {
    /// Create a store seeded with the default categories and admin account,
    /// like a freshly initialized database.
    ///
    /// # Panics
    ///
    /// Panics if password hashing fails, which would indicate a broken
    /// argon2 build rather than a runtime condition.
    #[must_use]
    pub fn seeded() -> Self {
        let mut inner = Inner::default();

        for (name, description) in DEFAULT_CATEGORIES {
            let category = Category::new(name.to_string(), Some(description.to_string()));
            inner.categories.insert(category.id, category);
        }

        let admin_hash =
            hash_password(schema::DEFAULT_ADMIN_PASSWORD).expect("argon2 hashing is infallible");
        let admin = User::new(
            schema::DEFAULT_ADMIN_USERNAME.to_string(),
            admin_hash,
            Role::Admin,
        );
        inner.users.insert(admin.id, admin);

        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Create an empty store with no seed data.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

#[async_trait::async_trait]
impl Store for MemStore {
    async fn create_user(&self, user: &User) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(format!(
                "username already taken: {}",
                user.username
            )));
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(id).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let inner = self.inner.read().await;
        let mut categories: Vec<_> = inner.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(&self, id: &CategoryId) -> Result<Option<Category>> {
        let inner = self.inner.read().await;
        Ok(inner.categories.get(id).cloned())
    }

    async fn create_category(&self, category: &Category) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.categories.values().any(|c| c.name == category.name) {
            return Err(StoreError::Conflict(format!(
                "category name already taken: {}",
                category.name
            )));
        }
        inner.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn update_category(&self, category: &Category) -> Result<Option<Category>> {
        let mut inner = self.inner.write().await;
        if !inner.categories.contains_key(&category.id) {
            return Ok(None);
        }
        inner.categories.insert(category.id, category.clone());
        Ok(Some(category.clone()))
    }

    async fn delete_category(&self, id: &CategoryId) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let removed = inner.categories.remove(id).is_some();
        if removed {
            // ON DELETE SET NULL
            for book in inner.books.values_mut() {
                if book.category_id == Some(*id) {
                    book.category_id = None;
                }
            }
            // ON DELETE CASCADE
            inner.approvals.retain(|(_, category_id), _| category_id != id);
        }
        Ok(removed)
    }

    async fn create_book(&self, book: &Book) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.books.insert(book.id, book.clone());
        Ok(())
    }

    async fn get_book(&self, id: &BookId) -> Result<Option<Book>> {
        let inner = self.inner.read().await;
        Ok(inner.books.get(id).cloned())
    }

    async fn list_books(&self) -> Result<Vec<BookSummary>> {
        let inner = self.inner.read().await;
        let books = inner.books.values().map(|b| inner.summarize(b)).collect();
        Ok(inner.newest_first(books))
    }

    async fn list_published(&self, filter: &PublishedFilter) -> Result<Vec<BookSummary>> {
        let inner = self.inner.read().await;
        let books = inner
            .books
            .values()
            .filter(|b| b.is_published)
            .filter(|b| filter.age_group.map_or(true, |age| b.matches_age(age)))
            .filter(|b| {
                filter
                    .category_id
                    .map_or(true, |category| b.category_id == Some(category))
            })
            .map(|b| inner.summarize(b))
            .collect();
        Ok(inner.newest_first(books))
    }

    async fn update_book(&self, book: &Book) -> Result<bool> {
        let mut inner = self.inner.write().await;
        if !inner.books.contains_key(&book.id) {
            return Ok(false);
        }
        inner.books.insert(book.id, book.clone());
        Ok(true)
    }

    async fn delete_book(&self, id: &BookId) -> Result<Option<Book>> {
        let mut inner = self.inner.write().await;
        let removed = inner.books.remove(id);
        if removed.is_some() {
            inner.pages.retain(|p| p.book_id != *id);
        }
        Ok(removed)
    }

    async fn insert_pages(&self, book_id: &BookId, pages: &[NewPage]) -> Result<()> {
        if pages.is_empty() {
            return Ok(());
        }

        let mut inner = self.inner.write().await;
        // Mirror the FK constraint: a missing book aborts the whole batch.
        if !inner.books.contains_key(book_id) {
            return Err(StoreError::Database(format!(
                "foreign key violation: book {book_id} does not exist"
            )));
        }

        for page in pages {
            inner.pages.push(BookPage {
                id: Uuid::new_v4(),
                book_id: *book_id,
                page_number: page.page_number,
                image_path: page.image_path.clone(),
                content: page.content.clone(),
            });
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let count = pages.len() as i32;
        if let Some(book) = inner.books.get_mut(book_id) {
            book.page_count = count;
            book.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn list_pages(&self, book_id: &BookId) -> Result<Vec<BookPage>> {
        let inner = self.inner.read().await;
        let mut pages: Vec<_> = inner
            .pages
            .iter()
            .filter(|p| p.book_id == *book_id)
            .cloned()
            .collect();
        pages.sort_by_key(|p| p.page_number);
        Ok(pages)
    }

    async fn create_kid_profile(&self, profile: &KidProfile) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.profiles.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn list_kid_profiles(&self, parent_id: &UserId) -> Result<Vec<KidProfile>> {
        let inner = self.inner.read().await;
        let mut profiles: Vec<_> = inner
            .profiles
            .values()
            .filter(|p| p.parent_id == *parent_id)
            .cloned()
            .collect();
        profiles.sort_by_key(|p| p.created_at);
        Ok(profiles)
    }

    async fn get_kid_profile(&self, id: &KidProfileId) -> Result<Option<KidProfile>> {
        let inner = self.inner.read().await;
        Ok(inner.profiles.get(id).cloned())
    }

    async fn update_kid_profile(&self, profile: &KidProfile) -> Result<bool> {
        let mut inner = self.inner.write().await;
        if !inner.profiles.contains_key(&profile.id) {
            return Ok(false);
        }
        inner.profiles.insert(profile.id, profile.clone());
        Ok(true)
    }

    async fn delete_kid_profile(&self, id: &KidProfileId) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let removed = inner.profiles.remove(id).is_some();
        if removed {
            inner.approvals.retain(|(profile_id, _), _| profile_id != id);
        }
        Ok(removed)
    }

    async fn set_approval(&self, approval: &ParentApproval) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.approvals.insert(
            (approval.kid_profile_id, approval.category_id),
            approval.clone(),
        );
        Ok(())
    }

    async fn list_approvals(&self, kid_profile_id: &KidProfileId) -> Result<Vec<ParentApproval>> {
        let inner = self.inner.read().await;
        Ok(inner
            .approvals
            .values()
            .filter(|a| a.kid_profile_id == *kid_profile_id)
            .cloned()
            .collect())
    }

    async fn list_approved_books(
        &self,
        kid_profile_id: &KidProfileId,
    ) -> Result<Vec<BookSummary>> {
        let inner = self.inner.read().await;
        let books = inner
            .books
            .values()
            .filter(|b| b.is_published)
            .filter(|b| {
                b.category_id.is_some_and(|category| {
                    inner
                        .approvals
                        .get(&(*kid_profile_id, category))
                        .is_some_and(|a| a.approved)
                })
            })
            .map(|b| inner.summarize(b))
            .collect();
        Ok(inner.newest_first(books))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn seeded_store_has_defaults() {
        let store = MemStore::seeded();
        assert_eq!(store.list_categories().await.unwrap().len(), 4);
        let admin = store.get_user_by_username("admin").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
    }

    #[tokio::test]
    async fn duplicate_username_conflicts() {
        let store = MemStore::empty();
        let first = User::new("pat".into(), "hash".into(), Role::Parent);
        let second = User::new("pat".into(), "hash".into(), Role::Parent);
        store.create_user(&first).await.unwrap();
        assert!(matches!(
            store.create_user(&second).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn page_batch_sets_count_and_preserves_order() {
        let store = MemStore::empty();
        let book = Book::new("T".into());
        store.create_book(&book).await.unwrap();

        let pages: Vec<NewPage> = (1..=3)
            .map(|n| NewPage {
                page_number: n,
                image_path: format!("/uploads/p{n}.png"),
                content: None,
            })
            .collect();
        store.insert_pages(&book.id, &pages).await.unwrap();

        let stored = store.get_book(&book.id).await.unwrap().unwrap();
        assert_eq!(stored.page_count, 3);

        let listed = store.list_pages(&book.id).await.unwrap();
        let numbers: Vec<_> = listed.iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn deleting_book_cascades_pages() {
        let store = MemStore::empty();
        let book = Book::new("T".into());
        store.create_book(&book).await.unwrap();
        store
            .insert_pages(
                &book.id,
                &[NewPage {
                    page_number: 1,
                    image_path: "/uploads/p1.png".into(),
                    content: None,
                }],
            )
            .await
            .unwrap();

        store.delete_book(&book.id).await.unwrap();
        assert!(store.list_pages(&book.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn approval_upsert_updates_in_place() {
        let store = MemStore::empty();
        let profile_id = KidProfileId::generate();
        let category_id = CategoryId::generate();

        let mut approval = ParentApproval {
            kid_profile_id: profile_id,
            category_id,
            approved: true,
            updated_at: Utc::now(),
        };
        store.set_approval(&approval).await.unwrap();

        approval.approved = false;
        store.set_approval(&approval).await.unwrap();

        let listed = store.list_approvals(&profile_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(!listed[0].approved);
    }
}
