//! Reading Goals - 阅读目标领域服务
//!
//! 基于用户全部书籍计算年度目标、连续阅读和日均阅读时长

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

use super::library::{ReadingStatus, UserBook};

/// 连续阅读允许的最大间隔（天）
const STREAK_GAP_DAYS: i64 = 7;

/// 指定年份读完的书籍数
pub fn books_finished_in(books: &[UserBook], year: i32) -> usize {
    books
        .iter()
        .filter(|book| book.status() == ReadingStatus::Finished)
        .filter(|book| matches!(book.finished_date(), Some(date) if date.year() == year))
        .count()
}

pub fn is_goal_met(books: &[UserBook], target_books: u32, year: i32) -> bool {
    books_finished_in(books, year) >= target_books as usize
}

/// 连续读完的书籍数
///
/// 从 today 开始按完成日期倒序遍历，相邻两本间隔超过 7 天即中断
pub fn reading_streak(books: &[UserBook], today: NaiveDate) -> u32 {
    let mut finished: Vec<NaiveDate> = books
        .iter()
        .filter(|book| book.status() == ReadingStatus::Finished)
        .filter_map(|book| book.finished_date())
        .map(|date| date.date_naive())
        .collect();
    finished.sort_unstable_by(|a, b| b.cmp(a));

    let mut streak = 0;
    let mut cursor = today;
    for date in finished {
        if (cursor - date).num_days() > STREAK_GAP_DAYS {
            break;
        }
        streak += 1;
        cursor = date;
    }
    streak
}

/// 最近 days 天内的阅读总时长平均到每一天（包括没有阅读的日子）
pub fn average_reading_time_per_day(books: &[UserBook], days: u32, now: DateTime<Utc>) -> Duration {
    if days == 0 {
        return Duration::zero();
    }

    let cutoff = now - Duration::days(i64::from(days));
    let total_secs: i64 = books
        .iter()
        .flat_map(|book| book.reading_sessions())
        .filter(|session| session.start_date() >= cutoff)
        .filter_map(|session| session.duration())
        .map(|duration| duration.num_seconds())
        .sum();

    Duration::seconds(total_secs / i64::from(days))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::library::{BookDetails, BookInfo};
    use uuid::Uuid;

    fn finished_on(date: DateTime<Utc>) -> UserBook {
        let info = BookInfo::new(BookDetails::new("T", "A").with_total_pages(10)).unwrap();
        let mut book = UserBook::new("id", Uuid::new_v4(), info, None).unwrap();
        book.start_reading(Some(date - Duration::days(1))).unwrap();
        book.mark_as_finished(Some(date)).unwrap();
        book
    }

    #[test]
    fn test_books_finished_in_year() {
        let now = Utc::now();
        let books = vec![
            finished_on(now),
            finished_on(now - Duration::days(400)),
        ];
        assert_eq!(books_finished_in(&books, now.year()), 1);
        assert!(is_goal_met(&books, 1, now.year()));
        assert!(!is_goal_met(&books, 2, now.year()));
    }

    #[test]
    fn test_reading_streak_breaks_on_gap() {
        let now = Utc::now();
        let books = vec![
            finished_on(now - Duration::days(2)),
            finished_on(now - Duration::days(8)),
            finished_on(now - Duration::days(30)),
        ];
        assert_eq!(reading_streak(&books, now.date_naive()), 2);
    }

    #[test]
    fn test_reading_streak_empty_when_last_book_is_old() {
        let now = Utc::now();
        let books = vec![finished_on(now - Duration::days(9))];
        assert_eq!(reading_streak(&books, now.date_naive()), 0);
        assert_eq!(reading_streak(&[], now.date_naive()), 0);
    }

    #[test]
    fn test_average_reading_time_spreads_over_window() {
        let now = Utc::now();
        let info = BookInfo::new(BookDetails::new("T", "A")).unwrap();
        let mut book = UserBook::new("id", Uuid::new_v4(), info, None).unwrap();
        book.start_reading(None).unwrap();

        let recent = now - Duration::days(3);
        book.log_reading_session(recent, 0, 10, Some(recent + Duration::hours(5)), None)
            .unwrap();
        let old = now - Duration::days(45);
        book.log_reading_session(old, 10, 20, Some(old + Duration::hours(9)), None)
            .unwrap();

        let average = average_reading_time_per_day(&[book], 30, now);
        assert_eq!(average, Duration::minutes(10));
        assert_eq!(average_reading_time_per_day(&[], 0, now), Duration::zero());
    }
}
