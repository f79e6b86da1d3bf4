//! Memory Layer - In-Memory State Management
//!
//! 进程内缓存实现，供仓储和书目检索的缓存装饰器使用

mod cache;

pub use cache::InMemoryCache;
