//! Library Command Handlers
//!
//! 统一流程：加载聚合 -> 校验归属 -> 调用领域方法 -> 持久化 -> 分发领域事件

use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{
    AddBookToLibrary, ChangeBookStatus, DeleteBookFromLibrary, LogReadingSession,
    UpdateBookRating, UpdatePersonalNotes, UpdateReadingProgress,
};
use crate::application::error::ApplicationError;
use crate::application::ports::{DomainEventSinkPort, UserBookRepositoryPort};
use crate::domain::library::{BookInfo, ReadingStatus, UserBook, UserBookId};

/// 加载聚合并确认属于当前用户
async fn load_owned_book(
    repo: &dyn UserBookRepositoryPort,
    user_id: Uuid,
    user_book_id: Uuid,
) -> Result<UserBook, ApplicationError> {
    let book = repo
        .get_by_id(UserBookId::from_uuid(user_book_id))
        .await?
        .ok_or_else(|| ApplicationError::not_found("UserBook", user_book_id))?;

    if !book.belongs_to(&user_id) {
        tracing::warn!(
            user_book_id = %user_book_id,
            user_id = %user_id,
            "Attempt to modify a book owned by another user"
        );
        return Err(ApplicationError::forbidden(format!(
            "UserBook {} does not belong to the current user",
            user_book_id
        )));
    }

    Ok(book)
}

/// 保存聚合后再分发事件，保存失败时事件被丢弃
async fn save_and_dispatch(
    repo: &dyn UserBookRepositoryPort,
    events: &dyn DomainEventSinkPort,
    book: &mut UserBook,
) -> Result<(), ApplicationError> {
    repo.update(book).await?;
    events.dispatch(book.take_domain_events());
    Ok(())
}

// ============================================================================
// AddBookToLibrary
// ============================================================================

pub struct AddBookToLibraryHandler {
    repo: Arc<dyn UserBookRepositoryPort>,
    events: Arc<dyn DomainEventSinkPort>,
}

impl AddBookToLibraryHandler {
    pub fn new(repo: Arc<dyn UserBookRepositoryPort>, events: Arc<dyn DomainEventSinkPort>) -> Self {
        Self { repo, events }
    }

    pub async fn handle(&self, command: AddBookToLibrary) -> Result<UserBookId, ApplicationError> {
        let book_id = command.book_id.trim().to_string();

        if self.repo.exists(command.user_id, &book_id).await? {
            return Err(ApplicationError::conflict(format!(
                "Book '{}' is already in the user's library",
                book_id
            )));
        }

        let book_info = BookInfo::new(command.book)?;
        let mut book = UserBook::new(&book_id, command.user_id, book_info, command.personal_notes)?;

        self.repo.add(&book).await?;
        self.events.dispatch(book.take_domain_events());

        tracing::info!(
            user_book_id = %book.id(),
            book_id = %book.book_id(),
            title = %book.book_info().title(),
            "Book added to library"
        );

        Ok(book.id())
    }
}

// ============================================================================
// ChangeBookStatus
// ============================================================================

pub struct ChangeBookStatusHandler {
    repo: Arc<dyn UserBookRepositoryPort>,
    events: Arc<dyn DomainEventSinkPort>,
}

impl ChangeBookStatusHandler {
    pub fn new(repo: Arc<dyn UserBookRepositoryPort>, events: Arc<dyn DomainEventSinkPort>) -> Self {
        Self { repo, events }
    }

    pub async fn handle(&self, command: ChangeBookStatus) -> Result<UserBook, ApplicationError> {
        let mut book =
            load_owned_book(self.repo.as_ref(), command.user_id, command.user_book_id).await?;
        let previous = book.status();

        match command.new_status {
            ReadingStatus::Reading if previous == ReadingStatus::OnHold => book.resume_reading()?,
            ReadingStatus::Reading => book.start_reading(command.date)?,
            ReadingStatus::Finished => book.mark_as_finished(command.date)?,
            ReadingStatus::OnHold => book.put_on_hold()?,
            ReadingStatus::Dropped => book.drop_book()?,
            ReadingStatus::ToRead => {
                return Err(ApplicationError::invalid_state(
                    "Cannot change status back to 'To Read'",
                ))
            }
        }

        save_and_dispatch(self.repo.as_ref(), self.events.as_ref(), &mut book).await?;

        tracing::info!(
            user_book_id = %book.id(),
            from = previous.as_str(),
            to = book.status().as_str(),
            "Reading status changed"
        );

        Ok(book)
    }
}

// ============================================================================
// LogReadingSession
// ============================================================================

pub struct LogReadingSessionHandler {
    repo: Arc<dyn UserBookRepositoryPort>,
    events: Arc<dyn DomainEventSinkPort>,
}

impl LogReadingSessionHandler {
    pub fn new(repo: Arc<dyn UserBookRepositoryPort>, events: Arc<dyn DomainEventSinkPort>) -> Self {
        Self { repo, events }
    }

    pub async fn handle(&self, command: LogReadingSession) -> Result<UserBook, ApplicationError> {
        let mut book =
            load_owned_book(self.repo.as_ref(), command.user_id, command.user_book_id).await?;

        if book.status() == ReadingStatus::ToRead {
            book.start_reading(Some(command.session_date))?;
        }

        book.log_reading_session(
            command.session_date,
            command.start_page,
            command.end_page,
            command.end_time,
            command.notes,
        )?;

        save_and_dispatch(self.repo.as_ref(), self.events.as_ref(), &mut book).await?;

        tracing::info!(
            user_book_id = %book.id(),
            start_page = command.start_page,
            end_page = command.end_page,
            status = book.status().as_str(),
            "Reading session logged"
        );

        Ok(book)
    }
}

// ============================================================================
// UpdateReadingProgress
// ============================================================================

pub struct UpdateReadingProgressHandler {
    repo: Arc<dyn UserBookRepositoryPort>,
    events: Arc<dyn DomainEventSinkPort>,
}

impl UpdateReadingProgressHandler {
    pub fn new(repo: Arc<dyn UserBookRepositoryPort>, events: Arc<dyn DomainEventSinkPort>) -> Self {
        Self { repo, events }
    }

    pub async fn handle(&self, command: UpdateReadingProgress) -> Result<UserBook, ApplicationError> {
        let mut book =
            load_owned_book(self.repo.as_ref(), command.user_id, command.user_book_id).await?;

        if book.status() == ReadingStatus::ToRead {
            book.start_reading(None)?;
        }

        book.update_progress(command.page_number)?;

        save_and_dispatch(self.repo.as_ref(), self.events.as_ref(), &mut book).await?;

        tracing::info!(
            user_book_id = %book.id(),
            page = command.page_number,
            "Reading progress updated"
        );

        Ok(book)
    }
}

// ============================================================================
// UpdatePersonalNotes
// ============================================================================

pub struct UpdatePersonalNotesHandler {
    repo: Arc<dyn UserBookRepositoryPort>,
    events: Arc<dyn DomainEventSinkPort>,
}

impl UpdatePersonalNotesHandler {
    pub fn new(repo: Arc<dyn UserBookRepositoryPort>, events: Arc<dyn DomainEventSinkPort>) -> Self {
        Self { repo, events }
    }

    pub async fn handle(&self, command: UpdatePersonalNotes) -> Result<UserBook, ApplicationError> {
        let mut book =
            load_owned_book(self.repo.as_ref(), command.user_id, command.user_book_id).await?;

        book.update_personal_notes(command.notes);
        save_and_dispatch(self.repo.as_ref(), self.events.as_ref(), &mut book).await?;

        tracing::debug!(user_book_id = %book.id(), "Personal notes updated");

        Ok(book)
    }
}

// ============================================================================
// UpdateBookRating
// ============================================================================

pub struct UpdateBookRatingHandler {
    repo: Arc<dyn UserBookRepositoryPort>,
    events: Arc<dyn DomainEventSinkPort>,
}

impl UpdateBookRatingHandler {
    pub fn new(repo: Arc<dyn UserBookRepositoryPort>, events: Arc<dyn DomainEventSinkPort>) -> Self {
        Self { repo, events }
    }

    pub async fn handle(&self, command: UpdateBookRating) -> Result<UserBook, ApplicationError> {
        let mut book =
            load_owned_book(self.repo.as_ref(), command.user_id, command.user_book_id).await?;

        match command.rating {
            Some(rating) => book.rate_book(rating)?,
            None => book.remove_rating(),
        }

        save_and_dispatch(self.repo.as_ref(), self.events.as_ref(), &mut book).await?;

        tracing::info!(
            user_book_id = %book.id(),
            rating = ?command.rating,
            "Book rating updated"
        );

        Ok(book)
    }
}

// ============================================================================
// DeleteBookFromLibrary
// ============================================================================

pub struct DeleteBookFromLibraryHandler {
    repo: Arc<dyn UserBookRepositoryPort>,
}

impl DeleteBookFromLibraryHandler {
    pub fn new(repo: Arc<dyn UserBookRepositoryPort>) -> Self {
        Self { repo }
    }

    pub async fn handle(&self, command: DeleteBookFromLibrary) -> Result<(), ApplicationError> {
        let book =
            load_owned_book(self.repo.as_ref(), command.user_id, command.user_book_id).await?;

        self.repo.delete(book.id()).await?;

        tracing::info!(
            user_book_id = %book.id(),
            title = %book.book_info().title(),
            "Book removed from library"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::library::{BookDetails, DomainEvent};
    use crate::infrastructure::persistence::sqlite::{
        create_pool, run_migrations, DatabaseConfig, SqliteUserBookRepository,
    };
    use chrono::{Duration, Utc};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<DomainEvent>>,
    }

    impl RecordingSink {
        fn names(&self) -> Vec<&'static str> {
            self.events.lock().unwrap().iter().map(|e| e.name()).collect()
        }
    }

    impl DomainEventSinkPort for RecordingSink {
        fn dispatch(&self, events: Vec<DomainEvent>) {
            self.events.lock().unwrap().extend(events);
        }
    }

    async fn setup() -> (Arc<dyn UserBookRepositoryPort>, Arc<RecordingSink>) {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        (
            Arc::new(SqliteUserBookRepository::new(pool)),
            Arc::new(RecordingSink::default()),
        )
    }

    async fn add_book(
        repo: &Arc<dyn UserBookRepositoryPort>,
        sink: &Arc<RecordingSink>,
        user_id: Uuid,
        pages: i32,
    ) -> Uuid {
        let handler = AddBookToLibraryHandler::new(repo.clone(), sink.clone());
        let id = handler
            .handle(AddBookToLibrary {
                user_id,
                book_id: "978-0-544-00341-5".to_string(),
                book: BookDetails::new("The Hobbit", "J.R.R. Tolkien").with_total_pages(pages),
                personal_notes: None,
            })
            .await
            .unwrap();
        *id.as_uuid()
    }

    #[tokio::test]
    async fn test_add_book_rejects_duplicates() {
        let (repo, sink) = setup().await;
        let user_id = Uuid::new_v4();
        add_book(&repo, &sink, user_id, 310).await;
        assert_eq!(sink.names(), vec!["BookAddedToLibrary"]);

        let handler = AddBookToLibraryHandler::new(repo.clone(), sink.clone());
        let result = handler
            .handle(AddBookToLibrary {
                user_id,
                book_id: " 978-0-544-00341-5 ".to_string(),
                book: BookDetails::new("The Hobbit", "J.R.R. Tolkien"),
                personal_notes: None,
            })
            .await;

        assert!(matches!(result, Err(ApplicationError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_add_book_validates_details() {
        let (repo, sink) = setup().await;
        let handler = AddBookToLibraryHandler::new(repo, sink);
        let result = handler
            .handle(AddBookToLibrary {
                user_id: Uuid::new_v4(),
                book_id: "x".to_string(),
                book: BookDetails::new("", "Someone"),
                personal_notes: None,
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_change_status_resumes_on_hold_book() {
        let (repo, sink) = setup().await;
        let user_id = Uuid::new_v4();
        let id = add_book(&repo, &sink, user_id, 310).await;
        let handler = ChangeBookStatusHandler::new(repo.clone(), sink.clone());

        let change = |status| ChangeBookStatus {
            user_id,
            user_book_id: id,
            new_status: status,
            date: None,
        };

        handler.handle(change(ReadingStatus::Reading)).await.unwrap();
        let started = repo
            .get_by_id(UserBookId::from_uuid(id))
            .await
            .unwrap()
            .unwrap()
            .started_date();

        handler.handle(change(ReadingStatus::OnHold)).await.unwrap();
        let book = handler.handle(change(ReadingStatus::Reading)).await.unwrap();

        assert_eq!(book.status(), ReadingStatus::Reading);
        assert_eq!(book.started_date(), started);
    }

    #[tokio::test]
    async fn test_change_status_back_to_to_read_fails() {
        let (repo, sink) = setup().await;
        let user_id = Uuid::new_v4();
        let id = add_book(&repo, &sink, user_id, 310).await;
        let handler = ChangeBookStatusHandler::new(repo, sink);

        let result = handler
            .handle(ChangeBookStatus {
                user_id,
                user_book_id: id,
                new_status: ReadingStatus::ToRead,
                date: None,
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_commands_check_ownership() {
        let (repo, sink) = setup().await;
        let id = add_book(&repo, &sink, Uuid::new_v4(), 310).await;

        let notes = UpdatePersonalNotesHandler::new(repo.clone(), sink.clone());
        let result = notes
            .handle(UpdatePersonalNotes {
                user_id: Uuid::new_v4(),
                user_book_id: id,
                notes: Some("mine now".to_string()),
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::Forbidden(_))));

        let delete = DeleteBookFromLibraryHandler::new(repo.clone());
        let result = delete
            .handle(DeleteBookFromLibrary {
                user_id: Uuid::new_v4(),
                user_book_id: id,
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::Forbidden(_))));
        assert!(repo.get_by_id(UserBookId::from_uuid(id)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_book_is_not_found() {
        let (repo, sink) = setup().await;
        let handler = UpdateBookRatingHandler::new(repo, sink);
        let result = handler
            .handle(UpdateBookRating {
                user_id: Uuid::new_v4(),
                user_book_id: Uuid::new_v4(),
                rating: Some(4),
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_log_session_auto_starts_and_finishes() {
        let (repo, sink) = setup().await;
        let user_id = Uuid::new_v4();
        let id = add_book(&repo, &sink, user_id, 100).await;
        let handler = LogReadingSessionHandler::new(repo.clone(), sink.clone());

        let first_day = Utc::now() - Duration::days(2);
        let book = handler
            .handle(LogReadingSession {
                user_id,
                user_book_id: id,
                session_date: first_day,
                start_page: 0,
                end_page: 50,
                end_time: Some(first_day + Duration::minutes(40)),
                notes: None,
            })
            .await
            .unwrap();
        assert_eq!(book.status(), ReadingStatus::Reading);
        assert_eq!(book.started_date(), Some(first_day));

        let book = handler
            .handle(LogReadingSession {
                user_id,
                user_book_id: id,
                session_date: Utc::now(),
                start_page: 50,
                end_page: 100,
                end_time: None,
                notes: Some("the end".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(book.status(), ReadingStatus::Finished);

        let stored = repo
            .get_by_id(UserBookId::from_uuid(id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.total_reading_sessions(), 2);
        assert_eq!(stored.total_pages_read(), 100);
        assert_eq!(stored.status(), ReadingStatus::Finished);
        assert_eq!(
            sink.names(),
            vec![
                "BookAddedToLibrary",
                "ReadingSessionLogged",
                "ReadingSessionLogged",
                "BookFinished"
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_session_is_not_persisted() {
        let (repo, sink) = setup().await;
        let user_id = Uuid::new_v4();
        let id = add_book(&repo, &sink, user_id, 100).await;
        let handler = LogReadingSessionHandler::new(repo.clone(), sink.clone());

        let result = handler
            .handle(LogReadingSession {
                user_id,
                user_book_id: id,
                session_date: Utc::now(),
                start_page: 20,
                end_page: 10,
                end_time: None,
                notes: None,
            })
            .await;
        assert!(matches!(result, Err(ApplicationError::ValidationError(_))));

        let stored = repo
            .get_by_id(UserBookId::from_uuid(id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status(), ReadingStatus::ToRead);
        assert!(stored.reading_sessions().is_empty());
    }

    #[tokio::test]
    async fn test_update_progress_auto_starts() {
        let (repo, sink) = setup().await;
        let user_id = Uuid::new_v4();
        let id = add_book(&repo, &sink, user_id, 200).await;
        let handler = UpdateReadingProgressHandler::new(repo, sink);

        let book = handler
            .handle(UpdateReadingProgress {
                user_id,
                user_book_id: id,
                page_number: 80,
            })
            .await
            .unwrap();
        assert_eq!(book.status(), ReadingStatus::Reading);
        assert_eq!(book.current_progress().percentage(), Some(40.0));
    }

    #[tokio::test]
    async fn test_rating_set_and_remove() {
        let (repo, sink) = setup().await;
        let user_id = Uuid::new_v4();
        let id = add_book(&repo, &sink, user_id, 200).await;
        let handler = UpdateBookRatingHandler::new(repo.clone(), sink);

        let rate = |rating| UpdateBookRating {
            user_id,
            user_book_id: id,
            rating,
        };

        assert!(matches!(
            handler.handle(rate(Some(9))).await,
            Err(ApplicationError::ValidationError(_))
        ));
        handler.handle(rate(Some(5))).await.unwrap();
        let stored = repo.get_by_id(UserBookId::from_uuid(id)).await.unwrap().unwrap();
        assert_eq!(stored.personal_rating(), Some(5));

        handler.handle(rate(None)).await.unwrap();
        let stored = repo.get_by_id(UserBookId::from_uuid(id)).await.unwrap().unwrap();
        assert_eq!(stored.personal_rating(), None);
    }

    #[tokio::test]
    async fn test_delete_book() {
        let (repo, sink) = setup().await;
        let user_id = Uuid::new_v4();
        let id = add_book(&repo, &sink, user_id, 200).await;

        DeleteBookFromLibraryHandler::new(repo.clone())
            .handle(DeleteBookFromLibrary {
                user_id,
                user_book_id: id,
            })
            .await
            .unwrap();

        assert!(repo.get_by_id(UserBookId::from_uuid(id)).await.unwrap().is_none());
    }
}
