//! In-Memory Cache Implementation
//!
//! 绝对过期 + 滑动过期：条目在写入 ttl 后一定失效，
//! 在此之前若超过 sliding 未被访问也会失效

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::application::ports::{CachePort, CacheStats};

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
    last_access: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant, sliding: Option<Duration>) -> bool {
        if now >= self.expires_at {
            return true;
        }
        matches!(sliding, Some(window) if now.duration_since(self.last_access) >= window)
    }
}

/// 内存缓存
pub struct InMemoryCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    default_ttl: Duration,
    sliding: Option<Duration>,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl<V> InMemoryCache<V>
where
    V: Clone + Send + Sync,
{
    pub fn new(default_ttl: Duration, sliding: Option<Duration>) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
            sliding,
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 清理所有过期条目，返回清理数量
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !entry.is_expired(now, self.sliding));
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            tracing::debug!(purged = purged, "Expired cache entries purged");
        }
        purged
    }

    /// 仅在条目仍然过期时删除，期间被重新写入的条目保留
    fn evict_expired(&self, key: &str, now: Instant) -> bool {
        self.entries
            .remove_if(key, |_, entry| entry.is_expired(now, self.sliding))
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for InMemoryCache<V>
where
    V: Clone + Send + Sync,
{
    /// 默认 15 分钟绝对过期、5 分钟滑动过期
    fn default() -> Self {
        Self::new(Duration::from_secs(15 * 60), Some(Duration::from_secs(5 * 60)))
    }
}

impl<V> CachePort<V> for InMemoryCache<V>
where
    V: Clone + Send + Sync,
{
    fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();

        let hit = match self.entries.get_mut(key) {
            Some(mut entry) if !entry.is_expired(now, self.sliding) => {
                entry.last_access = now;
                Some(entry.value.clone())
            }
            Some(_) => None,
            None => {
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(key = %key, "Cache miss");
                return None;
            }
        };

        match hit {
            Some(value) => {
                self.hit_count.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(key = %key, "Cache hit");
                Some(value)
            }
            None => {
                self.evict_expired(key, now);
                self.miss_count.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(key = %key, "Cache entry expired");
                None
            }
        }
    }

    fn set(&self, key: &str, value: V, ttl: Option<Duration>) {
        let now = Instant::now();
        let ttl = ttl.unwrap_or(self.default_ttl);
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: now + ttl,
                last_access: now,
            },
        );
        tracing::trace!(key = %key, ttl_secs = ttl.as_secs(), "Cache set");
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    fn remove_by_prefix(&self, prefix: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.starts_with(prefix));
        before.saturating_sub(self.entries.len())
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            total_entries: self.entries.len(),
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }
}
