//! Library Queries - 书库读操作

use uuid::Uuid;

use crate::domain::library::ReadingStatus;

/// 获取单本书籍详情
#[derive(Debug, Clone)]
pub struct GetUserBook {
    pub user_id: Uuid,
    pub user_book_id: Uuid,
}

/// 分页列出书库，可按状态和关键字过滤
#[derive(Debug, Clone)]
pub struct ListUserBooks {
    pub user_id: Uuid,
    pub status: Option<ReadingStatus>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// 在书库中搜索（书名、作者、类型、笔记）
#[derive(Debug, Clone)]
pub struct SearchLibrary {
    pub user_id: Uuid,
    pub term: String,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct GetBooksByStatus {
    pub user_id: Uuid,
    pub status: ReadingStatus,
}

/// 最近 days 天内读完的书籍（1..=365）
#[derive(Debug, Clone)]
pub struct GetRecentlyFinished {
    pub user_id: Uuid,
    pub days: u32,
}

#[derive(Debug, Clone)]
pub struct GetBooksByRating {
    pub user_id: Uuid,
    pub rating: u8,
}

#[derive(Debug, Clone)]
pub struct GetBooksByAuthor {
    pub user_id: Uuid,
    pub author: String,
}
