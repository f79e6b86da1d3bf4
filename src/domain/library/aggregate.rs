//! Library Context - Aggregate Root

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::{
    BookId, BookInfo, DomainEvent, LibraryError, LibraryEvent, Progress, ReadingSession,
    ReadingStatus, SessionSnapshot, UserBookId, UserId,
};

/// UserBook 聚合根 - 用户书库中的一本书
///
/// 状态机:
/// - ToRead -> Reading -> Finished（终态）
/// - Reading <-> OnHold
/// - ToRead / Reading / OnHold -> Dropped
///
/// 不变量:
/// - 已知总页数时 current_progress 不超过总页数
/// - id、book_id、user_id 创建后不变
/// - 任何失败的操作都不会修改聚合
#[derive(Debug, Clone)]
pub struct UserBook {
    id: UserBookId,
    book_id: BookId,
    user_id: UserId,
    book_info: BookInfo,
    status: ReadingStatus,
    current_progress: Progress,
    added_date: DateTime<Utc>,
    started_date: Option<DateTime<Utc>>,
    finished_date: Option<DateTime<Utc>>,
    personal_notes: Option<String>,
    personal_rating: Option<u8>,
    reading_sessions: Vec<ReadingSession>,
    domain_events: Vec<DomainEvent>,
    version: u64,
}

/// 持久化恢复用的原始字段
#[derive(Debug, Clone)]
pub struct UserBookSnapshot {
    pub id: UserBookId,
    pub book_id: String,
    pub user_id: Uuid,
    pub book_info: BookInfo,
    pub status: ReadingStatus,
    pub current_page: i32,
    pub added_date: DateTime<Utc>,
    pub started_date: Option<DateTime<Utc>>,
    pub finished_date: Option<DateTime<Utc>>,
    pub personal_notes: Option<String>,
    pub personal_rating: Option<u8>,
    pub sessions: Vec<SessionSnapshot>,
    pub version: u64,
}

impl UserBook {
    /// 将书籍加入书库，初始状态为 ToRead
    pub fn new(
        book_id: impl AsRef<str>,
        user_id: Uuid,
        book_info: BookInfo,
        personal_notes: Option<String>,
    ) -> Result<Self, LibraryError> {
        let book_id = BookId::new(book_id)?;
        let user_id = UserId::new(user_id)?;
        let current_progress = Progress::with_total(0, book_info.total_pages())?;

        let mut book = Self {
            id: UserBookId::new(),
            book_id,
            user_id,
            book_info,
            status: ReadingStatus::ToRead,
            current_progress,
            added_date: Utc::now(),
            started_date: None,
            finished_date: None,
            personal_notes: trim_notes(personal_notes),
            personal_rating: None,
            reading_sessions: Vec::new(),
            domain_events: Vec::new(),
            version: 0,
        };

        book.record(LibraryEvent::BookAddedToLibrary {
            user_book_id: book.id,
            user_id: book.user_id,
            book_id: book.book_id.clone(),
            book_info: book.book_info.clone(),
        });

        Ok(book)
    }

    /// 从持久化数据恢复，不产生事件
    pub fn restore(snapshot: UserBookSnapshot) -> Result<Self, LibraryError> {
        if let Some(rating) = snapshot.personal_rating {
            validate_rating(rating)?;
        }

        let reading_sessions = snapshot
            .sessions
            .into_iter()
            .map(ReadingSession::restore)
            .collect::<Result<Vec<_>, _>>()?;

        let current_progress =
            Progress::with_total(snapshot.current_page, snapshot.book_info.total_pages())?;

        Ok(Self {
            id: snapshot.id,
            book_id: BookId::new(&snapshot.book_id)?,
            user_id: UserId::new(snapshot.user_id)?,
            book_info: snapshot.book_info,
            status: snapshot.status,
            current_progress,
            added_date: snapshot.added_date,
            started_date: snapshot.started_date,
            finished_date: snapshot.finished_date,
            personal_notes: trim_notes(snapshot.personal_notes),
            personal_rating: snapshot.personal_rating,
            reading_sessions,
            domain_events: Vec::new(),
            version: snapshot.version,
        })
    }

    // ========== 状态迁移 ==========

    pub fn start_reading(&mut self, start_date: Option<DateTime<Utc>>) -> Result<(), LibraryError> {
        match self.status {
            ReadingStatus::Reading => Err(LibraryError::invalid_operation("书籍已在阅读中")),
            ReadingStatus::Finished => {
                Err(LibraryError::invalid_operation("已读完的书籍不能重新开始阅读"))
            }
            _ => {
                self.status = ReadingStatus::Reading;
                self.started_date = Some(start_date.unwrap_or_else(Utc::now));
                Ok(())
            }
        }
    }

    /// 记录一次阅读，进度取当前页与结束页中的较大值，读到最后一页时自动读完
    pub fn log_reading_session(
        &mut self,
        session_date: DateTime<Utc>,
        start_page: i32,
        end_page: i32,
        end_time: Option<DateTime<Utc>>,
        notes: Option<String>,
    ) -> Result<(), LibraryError> {
        if self.status != ReadingStatus::Reading {
            return Err(LibraryError::invalid_operation(
                "只有在读的书籍才能记录阅读",
            ));
        }

        let session = ReadingSession::new(session_date, start_page, end_page, end_time, notes)?;
        let highest_page = self.current_progress.page_number().max(end_page);
        let progress = Progress::with_total(highest_page, self.book_info.total_pages())?;

        let session_id = session.id();
        let pages_read = session.pages_read();
        self.reading_sessions.push(session);
        self.current_progress = progress;

        self.record(LibraryEvent::ReadingSessionLogged {
            user_book_id: self.id,
            user_id: self.user_id,
            session_id,
            session_date,
            pages_read,
            new_progress: progress,
        });

        if self.current_progress.is_complete() {
            self.finish(None);
        }

        Ok(())
    }

    pub fn update_progress(&mut self, page_number: i32) -> Result<(), LibraryError> {
        if self.status != ReadingStatus::Reading {
            return Err(LibraryError::invalid_operation(
                "只有在读的书籍才能更新进度",
            ));
        }

        self.current_progress = Progress::with_total(page_number, self.book_info.total_pages())?;

        if self.current_progress.is_complete() {
            self.finish(None);
        }

        Ok(())
    }

    pub fn mark_as_finished(
        &mut self,
        finished_date: Option<DateTime<Utc>>,
    ) -> Result<(), LibraryError> {
        if self.status == ReadingStatus::Finished {
            return Err(LibraryError::invalid_operation("书籍已经读完"));
        }
        self.finish(finished_date);
        Ok(())
    }

    pub fn put_on_hold(&mut self) -> Result<(), LibraryError> {
        if self.status == ReadingStatus::Finished {
            return Err(LibraryError::invalid_operation("已读完的书籍不能搁置"));
        }
        self.status = ReadingStatus::OnHold;
        Ok(())
    }

    pub fn drop_book(&mut self) -> Result<(), LibraryError> {
        if self.status == ReadingStatus::Finished {
            return Err(LibraryError::invalid_operation("已读完的书籍不能弃读"));
        }
        self.status = ReadingStatus::Dropped;
        Ok(())
    }

    pub fn resume_reading(&mut self) -> Result<(), LibraryError> {
        if self.status != ReadingStatus::OnHold {
            return Err(LibraryError::invalid_operation("只能继续阅读已搁置的书籍"));
        }
        self.status = ReadingStatus::Reading;
        Ok(())
    }

    // ========== 个人信息 ==========

    pub fn rate_book(&mut self, rating: u8) -> Result<(), LibraryError> {
        validate_rating(rating)?;
        self.personal_rating = Some(rating);
        Ok(())
    }

    pub fn remove_rating(&mut self) {
        self.personal_rating = None;
    }

    pub fn update_personal_notes(&mut self, notes: Option<String>) {
        self.personal_notes = trim_notes(notes);
    }

    // ========== 领域事件 ==========

    pub fn domain_events(&self) -> &[DomainEvent] {
        &self.domain_events
    }

    /// 取出并清空待分发的事件
    pub fn take_domain_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.domain_events)
    }

    pub fn clear_domain_events(&mut self) {
        self.domain_events.clear();
    }

    // ========== 统计 ==========

    pub fn total_pages_read(&self) -> i64 {
        self.reading_sessions
            .iter()
            .map(|s| i64::from(s.pages_read()))
            .sum()
    }

    /// 没有结束时间的阅读记录不计入
    pub fn total_reading_time(&self) -> Duration {
        self.reading_sessions
            .iter()
            .filter_map(|s| s.duration())
            .fold(Duration::zero(), |acc, d| acc + d)
    }

    pub fn total_reading_sessions(&self) -> usize {
        self.reading_sessions.len()
    }

    pub fn last_reading_session_date(&self) -> Option<DateTime<Utc>> {
        self.reading_sessions.iter().map(|s| s.start_date()).max()
    }

    pub fn time_since_last_session(&self) -> Option<Duration> {
        self.time_since_last_session_at(Utc::now())
    }

    pub fn time_since_last_session_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_reading_session_date().map(|last| now - last)
    }

    // Getters
    pub fn id(&self) -> UserBookId {
        self.id
    }

    pub fn book_id(&self) -> &BookId {
        &self.book_id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn book_info(&self) -> &BookInfo {
        &self.book_info
    }

    pub fn status(&self) -> ReadingStatus {
        self.status
    }

    pub fn current_progress(&self) -> &Progress {
        &self.current_progress
    }

    pub fn added_date(&self) -> DateTime<Utc> {
        self.added_date
    }

    pub fn started_date(&self) -> Option<DateTime<Utc>> {
        self.started_date
    }

    pub fn finished_date(&self) -> Option<DateTime<Utc>> {
        self.finished_date
    }

    pub fn personal_notes(&self) -> Option<&str> {
        self.personal_notes.as_deref()
    }

    pub fn personal_rating(&self) -> Option<u8> {
        self.personal_rating
    }

    pub fn reading_sessions(&self) -> &[ReadingSession] {
        &self.reading_sessions
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn belongs_to(&self, user_id: &Uuid) -> bool {
        self.user_id.as_uuid() == user_id
    }

    fn finish(&mut self, finished_date: Option<DateTime<Utc>>) {
        let finished_date = finished_date.unwrap_or_else(Utc::now);
        self.status = ReadingStatus::Finished;
        self.finished_date = Some(finished_date);

        if let Some(completed) = self
            .book_info
            .total_pages()
            .and_then(|total| Progress::from_page_of(total, total).ok())
        {
            self.current_progress = completed;
        }

        self.record(LibraryEvent::BookFinished {
            user_book_id: self.id,
            user_id: self.user_id,
            book_id: self.book_id.clone(),
            book_info: self.book_info.clone(),
            finished_date,
            total_reading_secs: self.total_reading_time().num_seconds(),
            total_pages_read: self.total_pages_read(),
        });
    }

    fn record(&mut self, event: LibraryEvent) {
        self.domain_events.push(DomainEvent::new(event));
    }
}

impl std::fmt::Display for UserBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {} ({})",
            self.book_info.title(),
            self.status,
            self.current_progress
        )
    }
}

fn validate_rating(rating: u8) -> Result<(), LibraryError> {
    if !(1..=5).contains(&rating) {
        return Err(LibraryError::invalid_argument("评分必须在 1 到 5 之间"));
    }
    Ok(())
}

fn trim_notes(notes: Option<String>) -> Option<String> {
    notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::library::BookDetails;

    fn user() -> Uuid {
        Uuid::parse_str("12345678-1234-1234-1234-123456789012").unwrap()
    }

    fn book_with_pages(pages: Option<i32>) -> UserBook {
        let mut details = BookDetails::new("The Hobbit", "J.R.R. Tolkien");
        details.total_pages = pages;
        UserBook::new("978-1", user(), BookInfo::new(details).unwrap(), None).unwrap()
    }

    fn reading_book(pages: Option<i32>) -> UserBook {
        let mut book = book_with_pages(pages);
        book.start_reading(None).unwrap();
        book
    }

    #[test]
    fn test_new_book_defaults() {
        let book = book_with_pages(Some(100));

        assert_eq!(book.status(), ReadingStatus::ToRead);
        assert_eq!(book.current_progress().page_number(), 0);
        assert_eq!(book.current_progress().total_pages(), Some(100));
        assert!(book.reading_sessions().is_empty());
        assert_eq!(book.domain_events().len(), 1);
        assert_eq!(book.domain_events()[0].name(), "BookAddedToLibrary");
        assert_eq!(book.version(), 0);
    }

    #[test]
    fn test_new_book_validation() {
        let info = BookInfo::new(BookDetails::new("T", "A")).unwrap();
        assert!(matches!(
            UserBook::new("  ", user(), info.clone(), None),
            Err(LibraryError::InvalidArgument(_))
        ));
        assert!(matches!(
            UserBook::new("978-1", Uuid::nil(), info, None),
            Err(LibraryError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_start_reading_transitions() {
        let mut book = book_with_pages(Some(100));
        let started = Utc::now() - Duration::days(3);
        book.start_reading(Some(started)).unwrap();
        assert_eq!(book.status(), ReadingStatus::Reading);
        assert_eq!(book.started_date(), Some(started));

        assert!(matches!(
            book.start_reading(None),
            Err(LibraryError::InvalidOperation(_))
        ));

        book.mark_as_finished(None).unwrap();
        assert!(matches!(
            book.start_reading(None),
            Err(LibraryError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_log_session_requires_reading() {
        let mut book = book_with_pages(Some(100));
        let result = book.log_reading_session(Utc::now(), 0, 10, None, None);
        assert!(matches!(result, Err(LibraryError::InvalidOperation(_))));

        book.start_reading(None).unwrap();
        book.put_on_hold().unwrap();
        let result = book.log_reading_session(Utc::now(), 0, 10, None, None);
        assert!(matches!(result, Err(LibraryError::InvalidOperation(_))));
        assert!(book.reading_sessions().is_empty());
    }

    #[test]
    fn test_log_session_keeps_highest_page() {
        let mut book = reading_book(Some(300));
        book.log_reading_session(Utc::now(), 0, 120, None, None).unwrap();
        book.log_reading_session(Utc::now(), 40, 60, None, None).unwrap();

        assert_eq!(book.current_progress().page_number(), 120);
        assert_eq!(book.total_pages_read(), 140);
        assert_eq!(book.total_reading_sessions(), 2);
    }

    #[test]
    fn test_session_reaching_last_page_finishes_book() {
        let mut book = reading_book(Some(100));
        book.clear_domain_events();

        book.log_reading_session(Utc::now(), 0, 100, None, None).unwrap();

        assert_eq!(book.status(), ReadingStatus::Finished);
        assert!(book.finished_date().is_some());
        let names: Vec<_> = book.domain_events().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["ReadingSessionLogged", "BookFinished"]);
    }

    #[test]
    fn test_session_past_last_page_is_rejected_atomically() {
        let mut book = reading_book(Some(100));
        book.clear_domain_events();

        let result = book.log_reading_session(Utc::now(), 90, 150, None, None);

        assert!(matches!(result, Err(LibraryError::InvalidArgument(_))));
        assert!(book.reading_sessions().is_empty());
        assert_eq!(book.current_progress().page_number(), 0);
        assert!(book.domain_events().is_empty());
    }

    #[test]
    fn test_update_progress() {
        let mut book = book_with_pages(Some(200));
        assert!(book.update_progress(10).is_err());

        book.start_reading(None).unwrap();
        book.update_progress(150).unwrap();
        assert_eq!(book.current_progress().percentage(), Some(75.0));

        assert!(book.update_progress(201).is_err());
        assert_eq!(book.current_progress().page_number(), 150);

        book.update_progress(200).unwrap();
        assert_eq!(book.status(), ReadingStatus::Finished);
    }

    #[test]
    fn test_unknown_total_never_auto_finishes() {
        let mut book = reading_book(None);
        book.update_progress(5000).unwrap();
        book.log_reading_session(Utc::now(), 5000, 5200, None, None).unwrap();
        assert_eq!(book.status(), ReadingStatus::Reading);
        assert_eq!(book.current_progress().page_number(), 5200);
    }

    #[test]
    fn test_mark_as_finished_forces_full_progress() {
        let mut book = reading_book(Some(320));
        book.update_progress(12).unwrap();
        let date = Utc::now() - Duration::days(1);
        book.mark_as_finished(Some(date)).unwrap();

        assert_eq!(book.finished_date(), Some(date));
        assert_eq!(book.current_progress().page_number(), 320);
        assert!(matches!(
            book.mark_as_finished(None),
            Err(LibraryError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_drop_book() {
        let mut to_read = book_with_pages(Some(10));
        to_read.drop_book().unwrap();
        assert_eq!(to_read.status(), ReadingStatus::Dropped);

        let mut reading = reading_book(Some(10));
        reading.drop_book().unwrap();

        let mut on_hold = reading_book(Some(10));
        on_hold.put_on_hold().unwrap();
        on_hold.drop_book().unwrap();

        let mut finished = reading_book(Some(10));
        finished.mark_as_finished(None).unwrap();
        assert!(matches!(
            finished.drop_book(),
            Err(LibraryError::InvalidOperation(_))
        ));
        assert!(finished.put_on_hold().is_err());
    }

    #[test]
    fn test_resume_only_from_on_hold() {
        let mut book = book_with_pages(Some(10));
        assert!(book.resume_reading().is_err());

        book.start_reading(None).unwrap();
        assert!(book.resume_reading().is_err());

        book.put_on_hold().unwrap();
        book.resume_reading().unwrap();
        assert_eq!(book.status(), ReadingStatus::Reading);
    }

    #[test]
    fn test_dropped_book_can_be_started_again() {
        let mut book = book_with_pages(Some(10));
        book.drop_book().unwrap();
        book.start_reading(None).unwrap();
        assert_eq!(book.status(), ReadingStatus::Reading);
    }

    #[test]
    fn test_rating() {
        let mut book = book_with_pages(None);
        assert!(matches!(book.rate_book(0), Err(LibraryError::InvalidArgument(_))));
        assert!(matches!(book.rate_book(6), Err(LibraryError::InvalidArgument(_))));

        book.rate_book(3).unwrap();
        assert_eq!(book.personal_rating(), Some(3));
        book.remove_rating();
        assert_eq!(book.personal_rating(), None);
    }

    #[test]
    fn test_personal_notes_are_trimmed() {
        let mut book = book_with_pages(None);
        book.update_personal_notes(Some("  loved it  ".to_string()));
        assert_eq!(book.personal_notes(), Some("loved it"));
        book.update_personal_notes(Some("   ".to_string()));
        assert_eq!(book.personal_notes(), None);
    }

    #[test]
    fn test_reading_statistics() {
        let mut book = reading_book(Some(500));
        let first = Utc::now() - Duration::days(2);
        let second = Utc::now() - Duration::days(1);
        book.log_reading_session(first, 0, 30, Some(first + Duration::minutes(45)), None)
            .unwrap();
        book.log_reading_session(second, 30, 50, None, None).unwrap();

        assert_eq!(book.total_reading_time(), Duration::minutes(45));
        assert_eq!(book.last_reading_session_date(), Some(second));
        assert_eq!(
            book.time_since_last_session_at(second + Duration::hours(5)),
            Some(Duration::hours(5))
        );
    }

    #[test]
    fn test_full_reading_flow() {
        let info =
            BookInfo::new(BookDetails::new("T", "A").with_total_pages(100)).unwrap();
        let mut book = UserBook::new("978-1", user(), info, None).unwrap();

        book.start_reading(None).unwrap();
        book.log_reading_session(Utc::now(), 0, 50, None, None).unwrap();
        assert_eq!(book.current_progress().page_number(), 50);
        assert_eq!(book.status(), ReadingStatus::Reading);

        book.log_reading_session(Utc::now(), 50, 100, None, None).unwrap();
        assert_eq!(book.status(), ReadingStatus::Finished);
        assert_eq!(book.total_pages_read(), 100);
        assert_eq!(book.total_reading_sessions(), 2);

        let events = book.take_domain_events();
        assert_eq!(events.len(), 4);
        assert!(book.domain_events().is_empty());
    }

    #[test]
    fn test_total_pages_read_does_not_overflow() {
        let mut book = reading_book(None);
        book.log_reading_session(Utc::now(), 0, i32::MAX, None, None)
            .unwrap();
        book.log_reading_session(Utc::now(), 0, i32::MAX, None, None)
            .unwrap();

        assert_eq!(book.total_pages_read(), 2 * i64::from(i32::MAX));
        assert_eq!(book.status(), ReadingStatus::Reading);
    }

    #[test]
    fn test_restore_rejects_inconsistent_progress() {
        let book = reading_book(Some(100));
        let snapshot = UserBookSnapshot {
            id: book.id(),
            book_id: book.book_id().to_string(),
            user_id: *book.user_id().as_uuid(),
            book_info: book.book_info().clone(),
            status: book.status(),
            current_page: 101,
            added_date: book.added_date(),
            started_date: book.started_date(),
            finished_date: None,
            personal_notes: None,
            personal_rating: None,
            sessions: Vec::new(),
            version: 3,
        };
        assert!(UserBook::restore(snapshot.clone()).is_err());

        let restored = UserBook::restore(UserBookSnapshot {
            current_page: 40,
            ..snapshot
        })
        .unwrap();
        assert_eq!(restored.version(), 3);
        assert!(restored.domain_events().is_empty());
    }
}
