//! Persistence Layer - 数据持久化
//!
//! SQLite 存储实现和缓存装饰器

mod cached_user_book_repo;
pub mod sqlite;

pub use cached_user_book_repo::CachedUserBookRepository;
pub use sqlite::SqliteUserBookRepository;
