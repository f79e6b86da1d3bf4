//! Library Context - 个人书库限界上下文
//!
//! 职责:
//! - UserBook 聚合（阅读状态机、进度、阅读记录）
//! - 阅读记录实体
//! - 书籍信息、进度等值对象
//! - 领域事件

mod aggregate;
mod entities;
mod errors;
mod events;
mod value_objects;

pub use aggregate::{UserBook, UserBookSnapshot};
pub use entities::{ReadingSession, SessionSnapshot};
pub use errors::LibraryError;
pub use events::{DomainEvent, LibraryEvent};
pub use value_objects::{
    BookDetails, BookId, BookInfo, Progress, ReadingStatus, SessionId, UserBookId, UserId,
};
