//! Library Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{Page, PagedQuery, UserBookRepositoryPort};
use crate::application::queries::{
    GetBooksByAuthor, GetBooksByRating, GetBooksByStatus, GetRecentlyFinished, GetUserBook,
    ListUserBooks, SearchLibrary,
};
use crate::domain::library::{UserBook, UserBookId};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

fn normalize_paging(page: Option<u32>, page_size: Option<u32>) -> (u32, u32) {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    (page, page_size)
}

/// GetUserBook Handler
///
/// 其他用户的书籍按不存在处理
pub struct GetUserBookHandler {
    repo: Arc<dyn UserBookRepositoryPort>,
}

impl GetUserBookHandler {
    pub fn new(repo: Arc<dyn UserBookRepositoryPort>) -> Self {
        Self { repo }
    }

    pub async fn handle(&self, query: GetUserBook) -> Result<UserBook, ApplicationError> {
        self.repo
            .get_by_id(UserBookId::from_uuid(query.user_book_id))
            .await?
            .filter(|book| book.belongs_to(&query.user_id))
            .ok_or_else(|| ApplicationError::not_found("UserBook", query.user_book_id))
    }
}

/// ListUserBooks Handler
pub struct ListUserBooksHandler {
    repo: Arc<dyn UserBookRepositoryPort>,
}

impl ListUserBooksHandler {
    pub fn new(repo: Arc<dyn UserBookRepositoryPort>) -> Self {
        Self { repo }
    }

    pub async fn handle(&self, query: ListUserBooks) -> Result<Page<UserBook>, ApplicationError> {
        let (page, page_size) = normalize_paging(query.page, query.page_size);
        let paged = PagedQuery {
            page,
            page_size,
            status: query.status,
            search: query.search,
        };

        Ok(self.repo.find_paged(query.user_id, &paged).await?)
    }
}

/// SearchLibrary Handler
pub struct SearchLibraryHandler {
    repo: Arc<dyn UserBookRepositoryPort>,
}

impl SearchLibraryHandler {
    pub fn new(repo: Arc<dyn UserBookRepositoryPort>) -> Self {
        Self { repo }
    }

    pub async fn handle(&self, query: SearchLibrary) -> Result<Page<UserBook>, ApplicationError> {
        let (page, page_size) = normalize_paging(query.page, query.page_size);

        if query.term.trim().is_empty() {
            return Ok(Page::empty(page, page_size));
        }

        let paged = PagedQuery {
            page,
            page_size,
            status: None,
            search: Some(query.term),
        };

        Ok(self.repo.find_paged(query.user_id, &paged).await?)
    }
}

/// GetBooksByStatus Handler
pub struct GetBooksByStatusHandler {
    repo: Arc<dyn UserBookRepositoryPort>,
}

impl GetBooksByStatusHandler {
    pub fn new(repo: Arc<dyn UserBookRepositoryPort>) -> Self {
        Self { repo }
    }

    pub async fn handle(&self, query: GetBooksByStatus) -> Result<Vec<UserBook>, ApplicationError> {
        Ok(self.repo.find_by_status(query.user_id, query.status).await?)
    }
}

/// GetRecentlyFinished Handler
pub struct GetRecentlyFinishedHandler {
    repo: Arc<dyn UserBookRepositoryPort>,
}

impl GetRecentlyFinishedHandler {
    pub fn new(repo: Arc<dyn UserBookRepositoryPort>) -> Self {
        Self { repo }
    }

    pub async fn handle(&self, query: GetRecentlyFinished) -> Result<Vec<UserBook>, ApplicationError> {
        if !(1..=365).contains(&query.days) {
            return Err(ApplicationError::validation("Days must be between 1 and 365"));
        }
        Ok(self
            .repo
            .find_recently_finished(query.user_id, query.days)
            .await?)
    }
}

/// GetBooksByRating Handler
pub struct GetBooksByRatingHandler {
    repo: Arc<dyn UserBookRepositoryPort>,
}

impl GetBooksByRatingHandler {
    pub fn new(repo: Arc<dyn UserBookRepositoryPort>) -> Self {
        Self { repo }
    }

    pub async fn handle(&self, query: GetBooksByRating) -> Result<Vec<UserBook>, ApplicationError> {
        if !(1..=5).contains(&query.rating) {
            return Err(ApplicationError::validation("Rating must be between 1 and 5"));
        }
        Ok(self.repo.find_by_rating(query.user_id, query.rating).await?)
    }
}

/// GetBooksByAuthor Handler
pub struct GetBooksByAuthorHandler {
    repo: Arc<dyn UserBookRepositoryPort>,
}

impl GetBooksByAuthorHandler {
    pub fn new(repo: Arc<dyn UserBookRepositoryPort>) -> Self {
        Self { repo }
    }

    pub async fn handle(&self, query: GetBooksByAuthor) -> Result<Vec<UserBook>, ApplicationError> {
        let author = query.author.trim();
        if author.is_empty() {
            return Err(ApplicationError::validation("Author name is required"));
        }
        Ok(self.repo.find_by_author(query.user_id, author).await?)
    }
}
