//! Static Book Catalog - 进程内书目
//!
//! 离线环境下的 BookSearchPort 实现，不访问网络

use async_trait::async_trait;

use crate::application::ports::{normalize_isbn, BookSearchError, BookSearchPort};
use crate::domain::library::{BookDetails, BookInfo};
use crate::infrastructure::persistence::sqlite::sample_books;

/// 静态书目
pub struct StaticBookCatalog {
    books: Vec<BookInfo>,
}

impl StaticBookCatalog {
    /// 无效的条目会被忽略
    pub fn new(details: impl IntoIterator<Item = BookDetails>) -> Self {
        let books = details
            .into_iter()
            .filter_map(|d| match BookInfo::new(d) {
                Ok(book) => Some(book),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring invalid catalog entry");
                    None
                }
            })
            .collect();
        Self { books }
    }

    /// 使用示例书目
    pub fn with_sample_books() -> Self {
        Self::new(sample_books())
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

#[async_trait]
impl BookSearchPort for StaticBookCatalog {
    async fn search_books(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<BookInfo>, BookSearchError> {
        let term = query.trim().to_lowercase();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .books
            .iter()
            .filter(|book| {
                book.title().to_lowercase().contains(&term)
                    || book.author().to_lowercase().contains(&term)
                    || book
                        .genre()
                        .is_some_and(|g| g.to_lowercase().contains(&term))
            })
            .take(max_results as usize)
            .cloned()
            .collect())
    }

    async fn get_book_by_isbn(&self, isbn: &str) -> Result<Option<BookInfo>, BookSearchError> {
        let isbn = normalize_isbn(isbn);
        if isbn.is_empty() {
            return Ok(None);
        }

        Ok(self
            .books
            .iter()
            .find(|book| book.isbn().map(normalize_isbn).as_deref() == Some(isbn.as_str()))
            .cloned())
    }
}
