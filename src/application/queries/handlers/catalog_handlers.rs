//! Catalog Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{normalize_isbn, BookSearchPort};
use crate::application::queries::{GetCatalogBookByIsbn, SearchCatalog};
use crate::domain::library::BookInfo;

/// 单次搜索允许的最大结果数
pub const MAX_SEARCH_RESULTS: u32 = 40;

/// SearchCatalog Handler
pub struct SearchCatalogHandler {
    search: Arc<dyn BookSearchPort>,
    default_max_results: u32,
}

impl SearchCatalogHandler {
    pub fn new(search: Arc<dyn BookSearchPort>, default_max_results: u32) -> Self {
        Self {
            search,
            default_max_results: default_max_results.clamp(1, MAX_SEARCH_RESULTS),
        }
    }

    pub async fn handle(&self, query: SearchCatalog) -> Result<Vec<BookInfo>, ApplicationError> {
        let max_results = query.max_results.unwrap_or(self.default_max_results);
        if !(1..=MAX_SEARCH_RESULTS).contains(&max_results) {
            return Err(ApplicationError::validation(format!(
                "Max results must be between 1 and {}",
                MAX_SEARCH_RESULTS
            )));
        }

        let term = query.query.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let books = self.search.search_books(term, max_results).await?;
        tracing::debug!(query = %term, found = books.len(), "Catalog search completed");
        Ok(books)
    }
}

/// GetCatalogBookByIsbn Handler
pub struct GetCatalogBookByIsbnHandler {
    search: Arc<dyn BookSearchPort>,
}

impl GetCatalogBookByIsbnHandler {
    pub fn new(search: Arc<dyn BookSearchPort>) -> Self {
        Self { search }
    }

    pub async fn handle(&self, query: GetCatalogBookByIsbn) -> Result<BookInfo, ApplicationError> {
        let isbn = normalize_isbn(&query.isbn);
        if isbn.is_empty() {
            return Err(ApplicationError::validation("ISBN is required"));
        }

        self.search
            .get_book_by_isbn(&isbn)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Book", isbn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::book_search::StaticBookCatalog;

    fn catalog() -> Arc<dyn BookSearchPort> {
        Arc::new(StaticBookCatalog::with_sample_books())
    }

    #[tokio::test]
    async fn test_search_catalog_validates_max_results() {
        let handler = SearchCatalogHandler::new(catalog(), 10);

        let result = handler
            .handle(SearchCatalog {
                query: "hobbit".to_string(),
                max_results: Some(41),
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::ValidationError(_))));

        let blank = handler
            .handle(SearchCatalog {
                query: "   ".to_string(),
                max_results: None,
            })
            .await
            .unwrap();
        assert!(blank.is_empty());
    }

    #[tokio::test]
    async fn test_search_catalog_finds_books() {
        let handler = SearchCatalogHandler::new(catalog(), 10);

        let books = handler
            .handle(SearchCatalog {
                query: "Hobbit".to_string(),
                max_results: None,
            })
            .await
            .unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].author(), "J.R.R. Tolkien");
    }

    #[tokio::test]
    async fn test_get_by_isbn() {
        let handler = GetCatalogBookByIsbnHandler::new(catalog());

        let book = handler
            .handle(GetCatalogBookByIsbn {
                isbn: "978-0-544-00341-5".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(book.title(), "The Hobbit");

        let missing = handler
            .handle(GetCatalogBookByIsbn {
                isbn: "0000000000".to_string(),
            })
            .await;
        assert!(matches!(missing, Err(ApplicationError::NotFound { .. })));
    }
}
