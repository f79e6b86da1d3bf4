//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod book_search;

pub use book_search::*;
