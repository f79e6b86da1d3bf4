//! Library Context - Domain Events
//!
//! 聚合只负责记录事件，由应用层在持久化成功后取出并分发

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::{BookId, BookInfo, Progress, SessionId, UserBookId, UserId};

/// 领域事件信封
#[derive(Debug, Clone, Serialize)]
pub struct DomainEvent {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: LibraryEvent,
}

impl DomainEvent {
    pub fn new(event: LibraryEvent) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            event,
        }
    }

    pub fn name(&self) -> &'static str {
        self.event.name()
    }

    pub fn user_book_id(&self) -> UserBookId {
        self.event.user_book_id()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum LibraryEvent {
    /// 书籍加入书库
    BookAddedToLibrary {
        user_book_id: UserBookId,
        user_id: UserId,
        book_id: BookId,
        book_info: BookInfo,
    },
    /// 记录了一次阅读
    ReadingSessionLogged {
        user_book_id: UserBookId,
        user_id: UserId,
        session_id: SessionId,
        session_date: DateTime<Utc>,
        pages_read: i32,
        new_progress: Progress,
    },
    /// 书籍读完
    BookFinished {
        user_book_id: UserBookId,
        user_id: UserId,
        book_id: BookId,
        book_info: BookInfo,
        finished_date: DateTime<Utc>,
        total_reading_secs: i64,
        total_pages_read: i64,
    },
}

impl LibraryEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LibraryEvent::BookAddedToLibrary { .. } => "BookAddedToLibrary",
            LibraryEvent::ReadingSessionLogged { .. } => "ReadingSessionLogged",
            LibraryEvent::BookFinished { .. } => "BookFinished",
        }
    }

    pub fn user_book_id(&self) -> UserBookId {
        match self {
            LibraryEvent::BookAddedToLibrary { user_book_id, .. }
            | LibraryEvent::ReadingSessionLogged { user_book_id, .. }
            | LibraryEvent::BookFinished { user_book_id, .. } => *user_book_id,
        }
    }
}
