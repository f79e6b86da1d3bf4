//! Cache Port - 通用键值缓存
//!
//! 定义带过期时间的缓存抽象，具体实现为 infrastructure/memory 中的内存缓存
//! 仓储和书目检索的缓存装饰器都依赖此端口

use std::time::Duration;

use uuid::Uuid;

use crate::domain::library::ReadingStatus;

/// Cache Port
///
/// 读写均不会失败：缓存只是加速手段，取不到时回源即可
pub trait CachePort<V>: Send + Sync
where
    V: Clone + Send + Sync,
{
    /// 获取缓存值（命中时刷新滑动过期时间）
    fn get(&self, key: &str) -> Option<V>;

    /// 写入缓存，ttl 为 None 时使用默认过期时间
    fn set(&self, key: &str, value: V, ttl: Option<Duration>);

    fn remove(&self, key: &str);

    /// 删除所有以 prefix 开头的条目，返回删除数量
    fn remove_by_prefix(&self, prefix: &str) -> usize;

    fn stats(&self) -> CacheStats;
}

/// 缓存统计信息
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub total_entries: usize,
    pub hit_count: u64,
    pub miss_count: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            return 0.0;
        }
        self.hit_count as f64 / total as f64
    }
}

/// 缓存 key 约定
pub mod cache_keys {
    use super::*;

    /// 用户书籍列表（含按状态的列表）的公共前缀
    pub fn user_books_prefix(user_id: &Uuid) -> String {
        format!("user_books_{}", user_id)
    }

    pub fn user_books(user_id: &Uuid) -> String {
        user_books_prefix(user_id)
    }

    pub fn user_books_by_status(user_id: &Uuid, status: ReadingStatus) -> String {
        format!("{}_{}", user_books_prefix(user_id), status.as_str())
    }

    pub fn user_book(id: &Uuid) -> String {
        format!("user_book_{}", id)
    }

    /// 使用 md5(规范化查询) 作为书目搜索 key
    pub fn book_search(query: &str, max_results: u32) -> String {
        let normalized = query.trim().to_lowercase();
        let digest = md5::compute(normalized.as_bytes());
        format!("book_search_{:x}_{}", digest, max_results)
    }

    pub fn book_isbn(isbn: &str) -> String {
        format!("book_isbn_{}", isbn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_keys_share_user_prefix() {
        let user_id = Uuid::new_v4();
        let key = cache_keys::user_books_by_status(&user_id, ReadingStatus::OnHold);
        assert!(key.starts_with(&cache_keys::user_books_prefix(&user_id)));
        assert!(key.ends_with("_on_hold"));
    }

    #[test]
    fn test_book_search_key_is_normalized() {
        assert_eq!(
            cache_keys::book_search("  Dune ", 10),
            cache_keys::book_search("dune", 10)
        );
        assert_ne!(
            cache_keys::book_search("dune", 10),
            cache_keys::book_search("dune", 20)
        );
    }

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats {
            total_entries: 1,
            hit_count: 3,
            miss_count: 1,
        };
        assert_eq!(stats.hit_rate(), 0.75);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
