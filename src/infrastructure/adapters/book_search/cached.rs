//! Cached Book Search - 书目检索缓存装饰器

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{
    cache_keys, normalize_isbn, BookSearchError, BookSearchPort, CachePort,
};
use crate::domain::library::BookInfo;

pub const DEFAULT_SEARCH_TTL: Duration = Duration::from_secs(2 * 60 * 60);
pub const DEFAULT_ISBN_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// 带缓存的书目检索
///
/// 搜索结果（包括空结果）按查询缓存；ISBN 只缓存找到的书籍
pub struct CachedBookSearch {
    inner: Arc<dyn BookSearchPort>,
    searches: Arc<dyn CachePort<Vec<BookInfo>>>,
    isbns: Arc<dyn CachePort<BookInfo>>,
    search_ttl: Duration,
    isbn_ttl: Duration,
}

impl CachedBookSearch {
    pub fn new(
        inner: Arc<dyn BookSearchPort>,
        searches: Arc<dyn CachePort<Vec<BookInfo>>>,
        isbns: Arc<dyn CachePort<BookInfo>>,
    ) -> Self {
        Self {
            inner,
            searches,
            isbns,
            search_ttl: DEFAULT_SEARCH_TTL,
            isbn_ttl: DEFAULT_ISBN_TTL,
        }
    }

    pub fn with_ttls(mut self, search_ttl: Duration, isbn_ttl: Duration) -> Self {
        self.search_ttl = search_ttl;
        self.isbn_ttl = isbn_ttl;
        self
    }
}

#[async_trait]
impl BookSearchPort for CachedBookSearch {
    async fn search_books(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<BookInfo>, BookSearchError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let key = cache_keys::book_search(query, max_results);
        if let Some(books) = self.searches.get(&key) {
            tracing::debug!(query = %query.trim(), "Book search served from cache");
            return Ok(books);
        }

        let books = self.inner.search_books(query, max_results).await?;
        self.searches.set(&key, books.clone(), Some(self.search_ttl));
        Ok(books)
    }

    async fn get_book_by_isbn(&self, isbn: &str) -> Result<Option<BookInfo>, BookSearchError> {
        let isbn = normalize_isbn(isbn);
        if isbn.is_empty() {
            return Ok(None);
        }

        let key = cache_keys::book_isbn(&isbn);
        if let Some(book) = self.isbns.get(&key) {
            return Ok(Some(book));
        }

        let book = self.inner.get_book_by_isbn(&isbn).await?;
        if let Some(book) = &book {
            self.isbns.set(&key, book.clone(), Some(self.isbn_ttl));
        }
        Ok(book)
    }
}
