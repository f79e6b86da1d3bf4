//! Query Handlers 实现
//!
//! 所有 QueryHandler 的具体实现

mod catalog_handlers;
mod library_handlers;
mod statistics_handlers;

pub use catalog_handlers::*;
pub use library_handlers::*;
pub use statistics_handlers::*;
