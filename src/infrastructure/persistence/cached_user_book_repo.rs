//! Cached UserBook Repository - 仓储缓存装饰器
//!
//! 缓存单本书籍、用户书籍列表和按状态的列表，其余查询直接回源。
//! 任何写操作都会清除该用户的列表缓存。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::application::ports::{
    cache_keys, CachePort, Page, PagedQuery, RepositoryError, UserBookRepositoryPort,
};
use crate::domain::library::{ReadingStatus, UserBook, UserBookId};

/// 带缓存的 UserBook 仓储
pub struct CachedUserBookRepository {
    inner: Arc<dyn UserBookRepositoryPort>,
    books: Arc<dyn CachePort<UserBook>>,
    lists: Arc<dyn CachePort<Vec<UserBook>>>,
    /// 每个用户的列表缓存代数，写操作递增
    generations: DashMap<Uuid, u64>,
    ttl: Option<Duration>,
}

impl CachedUserBookRepository {
    pub fn new(
        inner: Arc<dyn UserBookRepositoryPort>,
        books: Arc<dyn CachePort<UserBook>>,
        lists: Arc<dyn CachePort<Vec<UserBook>>>,
    ) -> Self {
        Self {
            inner,
            books,
            lists,
            generations: DashMap::new(),
            ttl: None,
        }
    }

    /// 覆盖缓存默认过期时间
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    fn generation(&self, user_id: &Uuid) -> u64 {
        self.generations.get(user_id).map(|g| *g).unwrap_or(0)
    }

    /// 回源期间该用户发生过写操作则不写入列表缓存
    fn store_list(&self, user_id: &Uuid, key: &str, books: &[UserBook], observed: u64) -> bool {
        let current = self.generations.entry(*user_id).or_insert(0);
        if *current != observed {
            tracing::debug!(user_id = %user_id, key = %key, "Stale list not cached");
            return false;
        }
        self.lists.set(key, books.to_vec(), self.ttl);
        true
    }

    fn invalidate_user(&self, user_id: &Uuid) {
        *self.generations.entry(*user_id).or_insert(0) += 1;
        let removed = self
            .lists
            .remove_by_prefix(&cache_keys::user_books_prefix(user_id));
        tracing::debug!(user_id = %user_id, removed = removed, "User book caches invalidated");
    }
}

#[async_trait]
impl UserBookRepositoryPort for CachedUserBookRepository {
    async fn get_by_id(&self, id: UserBookId) -> Result<Option<UserBook>, RepositoryError> {
        let key = cache_keys::user_book(id.as_uuid());
        if let Some(book) = self.books.get(&key) {
            return Ok(Some(book));
        }

        let book = self.inner.get_by_id(id).await?;
        if let Some(book) = &book {
            self.books.set(&key, book.clone(), self.ttl);
        }
        Ok(book)
    }

    async fn get_by_user_and_book(
        &self,
        user_id: Uuid,
        book_id: &str,
    ) -> Result<Option<UserBook>, RepositoryError> {
        self.inner.get_by_user_and_book(user_id, book_id).await
    }

    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<UserBook>, RepositoryError> {
        let key = cache_keys::user_books(&user_id);
        if let Some(books) = self.lists.get(&key) {
            return Ok(books);
        }

        let observed = self.generation(&user_id);
        let books = self.inner.find_by_user(user_id).await?;
        self.store_list(&user_id, &key, &books, observed);
        Ok(books)
    }

    async fn add(&self, book: &UserBook) -> Result<(), RepositoryError> {
        self.inner.add(book).await?;

        let user_id = *book.user_id().as_uuid();
        self.invalidate_user(&user_id);

        let mut cached = book.clone();
        cached.clear_domain_events();
        self.books
            .set(&cache_keys::user_book(book.id().as_uuid()), cached, self.ttl);
        Ok(())
    }

    async fn update(&self, book: &UserBook) -> Result<(), RepositoryError> {
        let key = cache_keys::user_book(book.id().as_uuid());
        let result = self.inner.update(book).await;

        // 无论成功与否都丢弃单本缓存：成功时版本号已变，冲突时缓存已过期
        self.books.remove(&key);
        if result.is_ok() {
            self.invalidate_user(book.user_id().as_uuid());
        }
        result
    }

    async fn delete(&self, id: UserBookId) -> Result<(), RepositoryError> {
        let owner = self.inner.get_by_id(id).await?.map(|b| *b.user_id().as_uuid());

        self.inner.delete(id).await?;

        self.books.remove(&cache_keys::user_book(id.as_uuid()));
        if let Some(user_id) = owner {
            self.invalidate_user(&user_id);
        }
        Ok(())
    }

    async fn find_by_status(
        &self,
        user_id: Uuid,
        status: ReadingStatus,
    ) -> Result<Vec<UserBook>, RepositoryError> {
        let key = cache_keys::user_books_by_status(&user_id, status);
        if let Some(books) = self.lists.get(&key) {
            return Ok(books);
        }

        let observed = self.generation(&user_id);
        let books = self.inner.find_by_status(user_id, status).await?;
        self.store_list(&user_id, &key, &books, observed);
        Ok(books)
    }

    async fn find_recently_finished(
        &self,
        user_id: Uuid,
        days: u32,
    ) -> Result<Vec<UserBook>, RepositoryError> {
        self.inner.find_recently_finished(user_id, days).await
    }

    async fn find_by_rating(&self, user_id: Uuid, rating: u8) -> Result<Vec<UserBook>, RepositoryError> {
        self.inner.find_by_rating(user_id, rating).await
    }

    async fn search(&self, user_id: Uuid, term: &str) -> Result<Vec<UserBook>, RepositoryError> {
        self.inner.search(user_id, term).await
    }

    async fn find_by_author(&self, user_id: Uuid, author: &str) -> Result<Vec<UserBook>, RepositoryError> {
        self.inner.find_by_author(user_id, author).await
    }

    async fn find_by_date_range(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<UserBook>, RepositoryError> {
        self.inner.find_by_date_range(user_id, from, to).await
    }

    async fn count_by_user(&self, user_id: Uuid) -> Result<u64, RepositoryError> {
        self.inner.count_by_user(user_id).await
    }

    async fn count_by_status(
        &self,
        user_id: Uuid,
        status: ReadingStatus,
    ) -> Result<u64, RepositoryError> {
        self.inner.count_by_status(user_id, status).await
    }

    async fn exists(&self, user_id: Uuid, book_id: &str) -> Result<bool, RepositoryError> {
        self.inner.exists(user_id, book_id).await
    }

    async fn find_paged(
        &self,
        user_id: Uuid,
        query: &PagedQuery,
    ) -> Result<Page<UserBook>, RepositoryError> {
        self.inner.find_paged(user_id, query).await
    }
}
