//! Book Search Port - 外部书目检索抽象
//!
//! 定义书目搜索的抽象接口，具体实现在 infrastructure/adapters 层（Google Books、静态目录、缓存装饰器）

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::library::BookInfo;

/// 书目检索错误
#[derive(Debug, Error)]
pub enum BookSearchError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Book Search Port
#[async_trait]
pub trait BookSearchPort: Send + Sync {
    /// 按关键字搜索书目
    async fn search_books(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<BookInfo>, BookSearchError>;

    /// 按 ISBN 精确查找
    async fn get_book_by_isbn(&self, isbn: &str) -> Result<Option<BookInfo>, BookSearchError>;
}

/// 规范化 ISBN：去掉连字符和空白
pub fn normalize_isbn(isbn: &str) -> String {
    isbn.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}
