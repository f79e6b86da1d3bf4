//! Repository Ports - 出站端口
//!
//! 定义 UserBook 聚合持久化的抽象接口
//! 具体实现在 infrastructure 层（SQLite + 缓存装饰器）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::library::{ReadingStatus, UserBook, UserBookId};

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    Duplicate(String),

    /// 乐观锁冲突：数据已被其他请求修改
    #[error("Concurrent modification: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// 分页查询条件
#[derive(Debug, Clone)]
pub struct PagedQuery {
    /// 从 1 开始
    pub page: u32,
    pub page_size: u32,
    pub status: Option<ReadingStatus>,
    pub search: Option<String>,
}

impl Default for PagedQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 20,
            status: None,
            search: None,
        }
    }
}

impl PagedQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.page_size)
    }

    /// 去除空白后的搜索词（空串视为无）
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
    }
}

/// 分页结果
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: u64, page: u32, page_size: u32) -> Self {
        Self {
            items,
            total_count,
            page,
            page_size,
        }
    }

    pub fn empty(page: u32, page_size: u32) -> Self {
        Self::new(Vec::new(), 0, page, page_size)
    }

    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(u64::from(self.page_size))
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// UserBook Repository Port
///
/// 列表结果默认按加入时间倒序
#[async_trait]
pub trait UserBookRepositoryPort: Send + Sync {
    /// 根据 ID 加载聚合（包含阅读记录）
    async fn get_by_id(&self, id: UserBookId) -> Result<Option<UserBook>, RepositoryError>;

    /// 根据用户和外部书籍 ID 查找
    async fn get_by_user_and_book(
        &self,
        user_id: Uuid,
        book_id: &str,
    ) -> Result<Option<UserBook>, RepositoryError>;

    /// 获取用户的所有书籍
    async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<UserBook>, RepositoryError>;

    /// 新增聚合
    async fn add(&self, book: &UserBook) -> Result<(), RepositoryError>;

    /// 保存聚合，版本号不一致时返回 Conflict
    async fn update(&self, book: &UserBook) -> Result<(), RepositoryError>;

    /// 删除聚合及其阅读记录
    async fn delete(&self, id: UserBookId) -> Result<(), RepositoryError>;

    async fn find_by_status(
        &self,
        user_id: Uuid,
        status: ReadingStatus,
    ) -> Result<Vec<UserBook>, RepositoryError>;

    async fn find_currently_reading(&self, user_id: Uuid) -> Result<Vec<UserBook>, RepositoryError> {
        self.find_by_status(user_id, ReadingStatus::Reading).await
    }

    /// 最近 days 天内读完的书籍，按完成时间倒序
    async fn find_recently_finished(
        &self,
        user_id: Uuid,
        days: u32,
    ) -> Result<Vec<UserBook>, RepositoryError>;

    async fn find_by_rating(&self, user_id: Uuid, rating: u8) -> Result<Vec<UserBook>, RepositoryError>;

    /// 在书名、作者、类型和笔记中搜索（大小写不敏感）
    async fn search(&self, user_id: Uuid, term: &str) -> Result<Vec<UserBook>, RepositoryError>;

    async fn find_by_author(&self, user_id: Uuid, author: &str) -> Result<Vec<UserBook>, RepositoryError>;

    /// 按加入时间区间查找（闭区间）
    async fn find_by_date_range(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<UserBook>, RepositoryError>;

    async fn count_by_user(&self, user_id: Uuid) -> Result<u64, RepositoryError>;

    async fn count_by_status(
        &self,
        user_id: Uuid,
        status: ReadingStatus,
    ) -> Result<u64, RepositoryError>;

    /// 用户书库中是否已有该书
    async fn exists(&self, user_id: Uuid, book_id: &str) -> Result<bool, RepositoryError>;

    async fn find_paged(
        &self,
        user_id: Uuid,
        query: &PagedQuery,
    ) -> Result<Page<UserBook>, RepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_navigation() {
        let page: Page<u32> = Page::new(vec![1, 2], 45, 2, 20);
        assert_eq!(page.total_pages(), 3);
        assert!(page.has_next());
        assert!(page.has_previous());

        let last: Page<u32> = Page::new(vec![], 45, 3, 20);
        assert!(!last.has_next());

        let empty: Page<u32> = Page::empty(1, 20);
        assert_eq!(empty.total_pages(), 0);
        assert!(!empty.has_previous());
    }

    #[test]
    fn test_paged_query_offset_and_search() {
        let query = PagedQuery {
            page: 3,
            page_size: 10,
            status: None,
            search: Some("  Tolkien ".to_string()),
        };
        assert_eq!(query.offset(), 20);
        assert_eq!(query.search_term().as_deref(), Some("tolkien"));

        let blank = PagedQuery {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(blank.search_term(), None);
        assert_eq!(blank.offset(), 0);
    }
}
