//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（UserBookRepository、BookSearch、Cache、DomainEventSink）
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;

// Re-exports
pub use commands::{
    AddBookToLibrary,
    ChangeBookStatus,
    DeleteBookFromLibrary,
    LogReadingSession,
    UpdateBookRating,
    UpdatePersonalNotes,
    UpdateReadingProgress,
    // Handlers
    handlers::{
        AddBookToLibraryHandler, ChangeBookStatusHandler, DeleteBookFromLibraryHandler,
        LogReadingSessionHandler, UpdateBookRatingHandler, UpdatePersonalNotesHandler,
        UpdateReadingProgressHandler,
    },
};

pub use error::ApplicationError;

pub use ports::{
    cache_keys,
    normalize_isbn,
    // Book search
    BookSearchError,
    BookSearchPort,
    // Cache
    CachePort,
    CacheStats,
    // Events
    DomainEventSinkPort,
    // Repositories
    Page,
    PagedQuery,
    RepositoryError,
    UserBookRepositoryPort,
};

pub use queries::{
    // Catalog queries
    GetCatalogBookByIsbn,
    SearchCatalog,
    // Library queries
    GetBooksByAuthor,
    GetBooksByRating,
    GetBooksByStatus,
    GetRecentlyFinished,
    GetUserBook,
    ListUserBooks,
    SearchLibrary,
    // Statistics queries
    GetReadingStatistics,
    GetStatisticsCounts,
    GetYearlyReport,
    // Handlers
    handlers::{
        GetBooksByAuthorHandler, GetBooksByRatingHandler, GetBooksByStatusHandler,
        GetCatalogBookByIsbnHandler, GetReadingStatisticsHandler, GetRecentlyFinishedHandler,
        GetStatisticsCountsHandler, GetUserBookHandler, GetYearlyReportHandler,
        ListUserBooksHandler, MonthlyReading, ReadingGoalProgress, ReadingStatistics,
        SearchCatalogHandler, SearchLibraryHandler, StatisticsCounts, YearlyReport,
    },
};
