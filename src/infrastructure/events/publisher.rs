//! Event Publisher Implementation
//!
//! 领域事件分发：记录结构化日志并通过广播通道推送给订阅者

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::application::ports::DomainEventSinkPort;
use crate::domain::library::{DomainEvent, LibraryEvent};

/// 广播通道容量，慢订阅者会丢失最旧的事件
const CHANNEL_CAPACITY: usize = 100;

/// 事件发布器
pub struct EventPublisher {
    channel: broadcast::Sender<DomainEvent>,
}

impl EventPublisher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { channel: tx }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅所有领域事件
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.channel.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.channel.receiver_count()
    }

    fn log_event(event: &DomainEvent) {
        match &event.event {
            LibraryEvent::BookAddedToLibrary {
                user_book_id,
                user_id,
                book_info,
                ..
            } => {
                tracing::info!(
                    user_book_id = %user_book_id,
                    user_id = %user_id,
                    title = %book_info.title(),
                    author = %book_info.author(),
                    "Book added to library"
                );
            }
            LibraryEvent::ReadingSessionLogged {
                user_book_id,
                user_id,
                pages_read,
                new_progress,
                ..
            } => {
                tracing::info!(
                    user_book_id = %user_book_id,
                    user_id = %user_id,
                    pages_read = pages_read,
                    progress = %new_progress,
                    "Reading session logged"
                );
            }
            LibraryEvent::BookFinished {
                user_book_id,
                user_id,
                book_info,
                total_pages_read,
                total_reading_secs,
                ..
            } => {
                tracing::info!(
                    user_book_id = %user_book_id,
                    user_id = %user_id,
                    title = %book_info.title(),
                    total_pages_read = total_pages_read,
                    total_reading_secs = total_reading_secs,
                    "Book finished"
                );
            }
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainEventSinkPort for EventPublisher {
    fn dispatch(&self, events: Vec<DomainEvent>) {
        for event in events {
            Self::log_event(&event);

            let name = event.name();
            let event_id = event.event_id;
            if let Err(e) = self.channel.send(event) {
                tracing::debug!(
                    event = name,
                    event_id = %event_id,
                    error = %e,
                    "Failed to publish domain event (no receivers)"
                );
            }
        }
    }
}
