//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;
use uuid::Uuid;

use crate::application::{
    // Command handlers
    AddBookToLibraryHandler, ChangeBookStatusHandler, DeleteBookFromLibraryHandler,
    LogReadingSessionHandler, UpdateBookRatingHandler, UpdatePersonalNotesHandler,
    UpdateReadingProgressHandler,
    // Query handlers
    GetBooksByAuthorHandler, GetBooksByRatingHandler, GetBooksByStatusHandler,
    GetCatalogBookByIsbnHandler, GetReadingStatisticsHandler, GetRecentlyFinishedHandler,
    GetStatisticsCountsHandler, GetUserBookHandler, GetYearlyReportHandler, ListUserBooksHandler,
    SearchCatalogHandler, SearchLibraryHandler,
    // Ports
    BookSearchPort, UserBookRepositoryPort,
};
use crate::infrastructure::events::EventPublisher;

/// 书库相关设置
#[derive(Debug, Clone, Copy)]
pub struct LibrarySettings {
    /// 当前用户（无认证，由配置提供）
    pub current_user_id: Uuid,
    /// 年度阅读目标（本）
    pub yearly_goal: u32,
    /// 书目搜索默认结果数
    pub default_max_results: u32,
}

/// 应用状态
pub struct AppState {
    pub current_user_id: Uuid,

    // ========== Ports ==========
    pub repo: Arc<dyn UserBookRepositoryPort>,
    pub book_search: Arc<dyn BookSearchPort>,
    pub event_publisher: Arc<EventPublisher>,

    // ========== Command Handlers ==========
    pub add_book_handler: AddBookToLibraryHandler,
    pub change_status_handler: ChangeBookStatusHandler,
    pub log_session_handler: LogReadingSessionHandler,
    pub update_progress_handler: UpdateReadingProgressHandler,
    pub update_notes_handler: UpdatePersonalNotesHandler,
    pub update_rating_handler: UpdateBookRatingHandler,
    pub delete_book_handler: DeleteBookFromLibraryHandler,

    // ========== Query Handlers ==========
    pub get_user_book_handler: GetUserBookHandler,
    pub list_user_books_handler: ListUserBooksHandler,
    pub search_library_handler: SearchLibraryHandler,
    pub books_by_status_handler: GetBooksByStatusHandler,
    pub recently_finished_handler: GetRecentlyFinishedHandler,
    pub books_by_rating_handler: GetBooksByRatingHandler,
    pub books_by_author_handler: GetBooksByAuthorHandler,
    pub statistics_handler: GetReadingStatisticsHandler,
    pub yearly_report_handler: GetYearlyReportHandler,
    pub statistics_counts_handler: GetStatisticsCountsHandler,
    pub search_catalog_handler: SearchCatalogHandler,
    pub catalog_isbn_handler: GetCatalogBookByIsbnHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(
        settings: LibrarySettings,
        repo: Arc<dyn UserBookRepositoryPort>,
        book_search: Arc<dyn BookSearchPort>,
        event_publisher: Arc<EventPublisher>,
    ) -> Self {
        let events = event_publisher.clone();

        Self {
            current_user_id: settings.current_user_id,

            // Ports
            repo: repo.clone(),
            book_search: book_search.clone(),
            event_publisher,

            // Command handlers
            add_book_handler: AddBookToLibraryHandler::new(repo.clone(), events.clone()),
            change_status_handler: ChangeBookStatusHandler::new(repo.clone(), events.clone()),
            log_session_handler: LogReadingSessionHandler::new(repo.clone(), events.clone()),
            update_progress_handler: UpdateReadingProgressHandler::new(repo.clone(), events.clone()),
            update_notes_handler: UpdatePersonalNotesHandler::new(repo.clone(), events.clone()),
            update_rating_handler: UpdateBookRatingHandler::new(repo.clone(), events),
            delete_book_handler: DeleteBookFromLibraryHandler::new(repo.clone()),

            // Query handlers
            get_user_book_handler: GetUserBookHandler::new(repo.clone()),
            list_user_books_handler: ListUserBooksHandler::new(repo.clone()),
            search_library_handler: SearchLibraryHandler::new(repo.clone()),
            books_by_status_handler: GetBooksByStatusHandler::new(repo.clone()),
            recently_finished_handler: GetRecentlyFinishedHandler::new(repo.clone()),
            books_by_rating_handler: GetBooksByRatingHandler::new(repo.clone()),
            books_by_author_handler: GetBooksByAuthorHandler::new(repo.clone()),
            statistics_handler: GetReadingStatisticsHandler::new(repo.clone()),
            yearly_report_handler: GetYearlyReportHandler::new(repo.clone(), settings.yearly_goal),
            statistics_counts_handler: GetStatisticsCountsHandler::new(repo),
            search_catalog_handler: SearchCatalogHandler::new(
                book_search.clone(),
                settings.default_max_results,
            ),
            catalog_isbn_handler: GetCatalogBookByIsbnHandler::new(book_search),
        }
    }
}
