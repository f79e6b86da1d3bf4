//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod book_search;
mod cache;
mod event_sink;
mod repositories;

pub use book_search::{normalize_isbn, BookSearchError, BookSearchPort};
pub use cache::{cache_keys, CachePort, CacheStats};
pub use event_sink::DomainEventSinkPort;
pub use repositories::{Page, PagedQuery, RepositoryError, UserBookRepositoryPort};
