//! Reading Tracker - 个人阅读追踪服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Library Context: UserBook 聚合（阅读状态机、进度、阅读记录）
//! - Reading Goals: 年度目标、连续阅读等领域服务
//!
//! 应用层 (application/):
//! - Ports: 端口定义（UserBookRepository, BookSearch, Cache, DomainEventSink）
//! - Commands: CQRS 命令处理器
//! - Queries: CQRS 查询处理器（书库、统计、书目检索）
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API
//! - Persistence: SQLite 仓储 + 缓存装饰器
//! - Memory: TTL 内存缓存
//! - Adapters: Google Books 客户端、静态书目
//! - Events: 领域事件发布

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
