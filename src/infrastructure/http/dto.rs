//! Data Transfer Objects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::Page;
use crate::domain::library::{BookDetails, BookInfo, ReadingSession, UserBook};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

/// 空数据响应
#[derive(Debug, Serialize)]
pub struct Empty {}

impl ApiResponse<Empty> {
    /// 成功但无数据
    pub fn ok() -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(Empty {}),
        }
    }
}

/// 分页响应
#[derive(Debug, Serialize)]
pub struct PageResponse<T: Serialize> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T: Serialize> PageResponse<T> {
    pub fn from_page<S>(page: Page<S>, f: impl FnMut(S) -> T) -> Self {
        let total_pages = page.total_pages();
        let has_next = page.has_next();
        let has_previous = page.has_previous();
        let page = page.map(f);
        Self {
            items: page.items,
            total_count: page.total_count,
            page: page.page,
            page_size: page.page_size,
            total_pages,
            has_next,
            has_previous,
        }
    }
}

// ============================================================================
// Book DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct BookInfoResponse {
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub total_pages: Option<i32>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
}

impl From<&BookInfo> for BookInfoResponse {
    fn from(info: &BookInfo) -> Self {
        Self {
            title: info.title().to_string(),
            author: info.author().to_string(),
            isbn: info.isbn().map(str::to_string),
            publisher: info.publisher().map(str::to_string),
            publication_year: info.publication_year(),
            total_pages: info.total_pages(),
            genre: info.genre().map(str::to_string),
            description: info.description().map(str::to_string),
            cover_image_url: info.cover_image_url().map(str::to_string),
        }
    }
}

/// 书籍信息输入
#[derive(Debug, Deserialize)]
pub struct BookInfoRequest {
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    pub publication_year: Option<i32>,
    pub total_pages: Option<i32>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub cover_image_url: Option<String>,
}

impl From<BookInfoRequest> for BookDetails {
    fn from(req: BookInfoRequest) -> Self {
        Self {
            title: req.title,
            author: req.author,
            isbn: req.isbn,
            publisher: req.publisher,
            publication_year: req.publication_year,
            total_pages: req.total_pages,
            genre: req.genre,
            description: req.description,
            cover_image_url: req.cover_image_url,
        }
    }
}

// ============================================================================
// UserBook DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ReadingSessionResponse {
    pub id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub start_page: i32,
    pub end_page: i32,
    pub pages_read: i32,
    pub duration_secs: Option<i64>,
    pub notes: Option<String>,
}

impl From<&ReadingSession> for ReadingSessionResponse {
    fn from(session: &ReadingSession) -> Self {
        Self {
            id: *session.id().as_uuid(),
            start_date: session.start_date(),
            end_date: session.end_date(),
            start_page: session.start_page(),
            end_page: session.end_page(),
            pages_read: session.pages_read(),
            duration_secs: session.duration().map(|d| d.num_seconds()),
            notes: session.notes().map(str::to_string),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserBookResponse {
    pub id: Uuid,
    pub book_id: String,
    pub user_id: Uuid,
    pub book: BookInfoResponse,
    /// 机器可读状态，如 "to_read"
    pub status: String,
    pub status_display: String,
    pub current_page: i32,
    pub progress_percentage: Option<f64>,
    pub added_date: DateTime<Utc>,
    pub started_date: Option<DateTime<Utc>>,
    pub finished_date: Option<DateTime<Utc>>,
    pub personal_notes: Option<String>,
    pub personal_rating: Option<u8>,
    pub total_pages_read: i64,
    pub total_reading_sessions: usize,
    pub total_reading_secs: i64,
    pub last_session_date: Option<DateTime<Utc>>,
    pub version: u64,
    pub sessions: Vec<ReadingSessionResponse>,
}

impl From<&UserBook> for UserBookResponse {
    fn from(book: &UserBook) -> Self {
        Self {
            id: *book.id().as_uuid(),
            book_id: book.book_id().as_str().to_string(),
            user_id: *book.user_id().as_uuid(),
            book: BookInfoResponse::from(book.book_info()),
            status: book.status().as_str().to_string(),
            status_display: book.status().display_name().to_string(),
            current_page: book.current_progress().page_number(),
            progress_percentage: book.current_progress().percentage(),
            added_date: book.added_date(),
            started_date: book.started_date(),
            finished_date: book.finished_date(),
            personal_notes: book.personal_notes().map(str::to_string),
            personal_rating: book.personal_rating(),
            total_pages_read: book.total_pages_read(),
            total_reading_sessions: book.total_reading_sessions(),
            total_reading_secs: book.total_reading_time().num_seconds(),
            last_session_date: book.last_reading_session_date(),
            version: book.version(),
            sessions: book
                .reading_sessions()
                .iter()
                .map(ReadingSessionResponse::from)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AddBookResponse {
    pub id: Uuid,
}

/// 加入书库
///
/// book_id 缺省时使用 ISBN
#[derive(Debug, Deserialize)]
pub struct AddBookRequest {
    pub book_id: Option<String>,
    pub book: BookInfoRequest,
    pub personal_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: String,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProgressRequest {
    pub page_number: i32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNotesRequest {
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRatingRequest {
    pub rating: u8,
}

#[derive(Debug, Deserialize)]
pub struct LogSessionRequest {
    /// 缺省为当前时间
    pub session_date: Option<DateTime<Utc>>,
    pub start_page: i32,
    pub end_page: i32,
    pub end_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListUserBooksParams {
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SearchLibraryParams {
    #[serde(default)]
    pub q: String,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

// ============================================================================
// Statistics / Catalog DTOs
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct YearlyReportParams {
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct RecentlyFinishedParams {
    pub days: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct ByAuthorParams {
    #[serde(default)]
    pub author: String,
}

#[derive(Debug, Deserialize)]
pub struct CatalogSearchRequest {
    #[serde(default)]
    pub query: String,
    pub max_results: Option<u32>,
}
