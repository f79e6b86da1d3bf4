//! Domain Layer - 领域层
//!
//! 包含:
//! - Library Context: 个人书库（UserBook 聚合）
//! - Reading Goals: 阅读目标领域服务

pub mod library;
pub mod reading_goals;
