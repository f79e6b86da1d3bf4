//! Library Context - Entities

use chrono::{DateTime, Duration, Utc};

use super::{LibraryError, SessionId};

/// 阅读记录 - 一次阅读的页码区间和时间区间
///
/// 不变量:
/// - start_page >= 0 且 end_page >= start_page
/// - end_date（若存在）不早于 start_date
/// - 创建后不可修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingSession {
    id: SessionId,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    start_page: i32,
    end_page: i32,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

/// 持久化恢复用的原始字段
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub start_page: i32,
    pub end_page: i32,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ReadingSession {
    pub fn new(
        start_date: DateTime<Utc>,
        start_page: i32,
        end_page: i32,
        end_date: Option<DateTime<Utc>>,
        notes: Option<String>,
    ) -> Result<Self, LibraryError> {
        Self::restore(SessionSnapshot {
            id: SessionId::new(),
            start_date,
            end_date,
            start_page,
            end_page,
            notes,
            created_at: Utc::now(),
        })
    }

    pub fn restore(snapshot: SessionSnapshot) -> Result<Self, LibraryError> {
        if snapshot.start_page < 0 {
            return Err(LibraryError::invalid_argument("起始页不能为负数"));
        }
        if snapshot.end_page < snapshot.start_page {
            return Err(LibraryError::invalid_argument("结束页不能小于起始页"));
        }
        if matches!(snapshot.end_date, Some(end) if end < snapshot.start_date) {
            return Err(LibraryError::invalid_argument("结束时间不能早于开始时间"));
        }

        Ok(Self {
            id: snapshot.id,
            start_date: snapshot.start_date,
            end_date: snapshot.end_date,
            start_page: snapshot.start_page,
            end_page: snapshot.end_page,
            notes: snapshot
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            created_at: snapshot.created_at,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }

    pub fn start_page(&self) -> i32 {
        self.start_page
    }

    pub fn end_page(&self) -> i32 {
        self.end_page
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn duration(&self) -> Option<Duration> {
        self.end_date.map(|end| end - self.start_date)
    }

    pub fn pages_read(&self) -> i32 {
        self.end_page - self.start_page
    }
}

impl std::fmt::Display for ReadingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let duration = match self.duration() {
            Some(d) => format!("{:02}:{:02}", d.num_hours(), d.num_minutes() % 60),
            None => "open".to_string(),
        };
        write!(
            f,
            "Session on {}: {} pages ({})",
            self.start_date.format("%Y-%m-%d"),
            self.pages_read(),
            duration
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_creation() {
        let start = Utc::now() - Duration::hours(2);
        let end = start + Duration::minutes(90);
        let session =
            ReadingSession::new(start, 10, 42, Some(end), Some("  good chapter ".to_string()))
                .unwrap();

        assert_eq!(session.pages_read(), 32);
        assert_eq!(session.duration(), Some(Duration::minutes(90)));
        assert_eq!(session.notes(), Some("good chapter"));
    }

    #[test]
    fn test_session_without_end_has_no_duration() {
        let session = ReadingSession::new(Utc::now(), 5, 5, None, None).unwrap();
        assert_eq!(session.pages_read(), 0);
        assert_eq!(session.duration(), None);
    }

    #[test]
    fn test_session_validation() {
        let now = Utc::now();
        assert!(ReadingSession::new(now, -1, 5, None, None).is_err());
        assert!(ReadingSession::new(now, 10, 9, None, None).is_err());
        assert!(ReadingSession::new(now, 0, 9, Some(now - Duration::seconds(1)), None).is_err());
    }
}
