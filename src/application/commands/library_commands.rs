//! Library Commands - 书库写操作

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::library::{BookDetails, ReadingStatus};

/// 将书籍加入书库
#[derive(Debug, Clone)]
pub struct AddBookToLibrary {
    pub user_id: Uuid,
    /// 外部书籍 ID（通常是 ISBN）
    pub book_id: String,
    pub book: BookDetails,
    pub personal_notes: Option<String>,
}

/// 切换阅读状态
#[derive(Debug, Clone)]
pub struct ChangeBookStatus {
    pub user_id: Uuid,
    pub user_book_id: Uuid,
    pub new_status: ReadingStatus,
    /// 开始/读完日期，缺省为当前时间
    pub date: Option<DateTime<Utc>>,
}

/// 记录一次阅读（想读状态的书会先自动开始阅读）
#[derive(Debug, Clone)]
pub struct LogReadingSession {
    pub user_id: Uuid,
    pub user_book_id: Uuid,
    pub session_date: DateTime<Utc>,
    pub start_page: i32,
    pub end_page: i32,
    pub end_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// 更新当前页码
#[derive(Debug, Clone)]
pub struct UpdateReadingProgress {
    pub user_id: Uuid,
    pub user_book_id: Uuid,
    pub page_number: i32,
}

#[derive(Debug, Clone)]
pub struct UpdatePersonalNotes {
    pub user_id: Uuid,
    pub user_book_id: Uuid,
    pub notes: Option<String>,
}

/// 评分；rating 为 None 时清除评分
#[derive(Debug, Clone)]
pub struct UpdateBookRating {
    pub user_id: Uuid,
    pub user_book_id: Uuid,
    pub rating: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct DeleteBookFromLibrary {
    pub user_id: Uuid,
    pub user_book_id: Uuid,
}
