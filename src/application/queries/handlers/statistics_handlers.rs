//! Statistics Query Handlers
//!
//! 阅读统计在用户全部书籍上计算，不单独持久化

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;

use crate::application::error::ApplicationError;
use crate::application::ports::UserBookRepositoryPort;
use crate::application::queries::{GetReadingStatistics, GetStatisticsCounts, GetYearlyReport};
use crate::domain::library::{ReadingStatus, UserBook};
use crate::domain::reading_goals;

/// "最近"统计窗口（天）
const RECENT_WINDOW_DAYS: u32 = 30;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

// ============================================================================
// Read models
// ============================================================================

/// 阅读总览
#[derive(Debug, Clone, Serialize)]
pub struct ReadingStatistics {
    pub total_books: usize,
    pub to_read: usize,
    pub currently_reading: usize,
    pub finished: usize,
    pub on_hold: usize,
    pub dropped: usize,
    pub total_pages_read: i64,
    pub total_reading_sessions: usize,
    pub total_reading_secs: i64,
    pub rated_books: usize,
    /// 保留两位小数
    pub average_rating: Option<f64>,
    pub last_session_date: Option<DateTime<Utc>>,
    pub reading_streak: u32,
    pub average_daily_reading_secs: i64,
    pub recently_finished: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadingGoalProgress {
    pub target_books: u32,
    pub completed_books: usize,
    /// 0..=100
    pub progress_percentage: f64,
    pub is_achieved: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReading {
    pub month: u32,
    pub month_name: &'static str,
    pub books_finished: usize,
    pub pages_read: i64,
    pub reading_secs: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearlyReport {
    pub year: i32,
    pub goal: ReadingGoalProgress,
    pub months: Vec<MonthlyReading>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct StatisticsCounts {
    pub total: u64,
    pub to_read: u64,
    pub reading: u64,
    pub finished: u64,
    pub on_hold: u64,
    pub dropped: u64,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 按时刻 now 汇总阅读总览
pub fn summarize(books: &[UserBook], now: DateTime<Utc>) -> ReadingStatistics {
    let count = |status: ReadingStatus| books.iter().filter(|b| b.status() == status).count();

    let ratings: Vec<u8> = books.iter().filter_map(|b| b.personal_rating()).collect();
    let average_rating = if ratings.is_empty() {
        None
    } else {
        let sum: u32 = ratings.iter().map(|&r| u32::from(r)).sum();
        Some(round2(f64::from(sum) / ratings.len() as f64))
    };

    let cutoff = now - Duration::days(i64::from(RECENT_WINDOW_DAYS));
    let recently_finished = books
        .iter()
        .filter(|b| b.status() == ReadingStatus::Finished)
        .filter(|b| matches!(b.finished_date(), Some(date) if date >= cutoff))
        .count();

    ReadingStatistics {
        total_books: books.len(),
        to_read: count(ReadingStatus::ToRead),
        currently_reading: count(ReadingStatus::Reading),
        finished: count(ReadingStatus::Finished),
        on_hold: count(ReadingStatus::OnHold),
        dropped: count(ReadingStatus::Dropped),
        total_pages_read: books.iter().map(|b| b.total_pages_read()).sum(),
        total_reading_sessions: books.iter().map(|b| b.total_reading_sessions()).sum(),
        total_reading_secs: books
            .iter()
            .map(|b| b.total_reading_time().num_seconds())
            .sum(),
        rated_books: ratings.len(),
        average_rating,
        last_session_date: books.iter().filter_map(|b| b.last_reading_session_date()).max(),
        reading_streak: reading_goals::reading_streak(books, now.date_naive()),
        average_daily_reading_secs: reading_goals::average_reading_time_per_day(
            books,
            RECENT_WINDOW_DAYS,
            now,
        )
        .num_seconds(),
        recently_finished,
    }
}

/// 生成年度报告：目标进度和 12 个月的完成情况
pub fn yearly_report(books: &[UserBook], year: i32, target_books: u32) -> YearlyReport {
    let completed_books = reading_goals::books_finished_in(books, year);
    let progress_percentage = if target_books == 0 {
        100.0
    } else {
        round2((completed_books as f64 / f64::from(target_books) * 100.0).min(100.0))
    };

    let months = (1..=12u32)
        .map(|month| {
            let finished: Vec<&UserBook> = books
                .iter()
                .filter(|b| b.status() == ReadingStatus::Finished)
                .filter(|b| {
                    matches!(b.finished_date(), Some(d) if d.year() == year && d.month() == month)
                })
                .collect();

            MonthlyReading {
                month,
                month_name: MONTH_NAMES[(month - 1) as usize],
                books_finished: finished.len(),
                pages_read: finished.iter().map(|b| b.total_pages_read()).sum(),
                reading_secs: finished
                    .iter()
                    .map(|b| b.total_reading_time().num_seconds())
                    .sum(),
            }
        })
        .collect();

    YearlyReport {
        year,
        goal: ReadingGoalProgress {
            target_books,
            completed_books,
            progress_percentage,
            is_achieved: reading_goals::is_goal_met(books, target_books, year),
        },
        months,
    }
}

// ============================================================================
// GetReadingStatisticsHandler
// ============================================================================

pub struct GetReadingStatisticsHandler {
    repo: Arc<dyn UserBookRepositoryPort>,
}

impl GetReadingStatisticsHandler {
    pub fn new(repo: Arc<dyn UserBookRepositoryPort>) -> Self {
        Self { repo }
    }

    pub async fn handle(&self, query: GetReadingStatistics) -> Result<ReadingStatistics, ApplicationError> {
        let books = self.repo.find_by_user(query.user_id).await?;
        Ok(summarize(&books, Utc::now()))
    }
}

// ============================================================================
// GetYearlyReportHandler
// ============================================================================

pub struct GetYearlyReportHandler {
    repo: Arc<dyn UserBookRepositoryPort>,
    yearly_goal: u32,
}

impl GetYearlyReportHandler {
    pub fn new(repo: Arc<dyn UserBookRepositoryPort>, yearly_goal: u32) -> Self {
        Self { repo, yearly_goal }
    }

    pub async fn handle(&self, query: GetYearlyReport) -> Result<YearlyReport, ApplicationError> {
        let year = query.year.unwrap_or_else(|| Utc::now().year());
        if !(1000..=9999).contains(&year) {
            return Err(ApplicationError::validation(format!("Invalid year: {}", year)));
        }

        let books = self.repo.find_by_user(query.user_id).await?;
        Ok(yearly_report(&books, year, self.yearly_goal))
    }
}

// ============================================================================
// GetStatisticsCountsHandler
// ============================================================================

pub struct GetStatisticsCountsHandler {
    repo: Arc<dyn UserBookRepositoryPort>,
}

impl GetStatisticsCountsHandler {
    pub fn new(repo: Arc<dyn UserBookRepositoryPort>) -> Self {
        Self { repo }
    }

    pub async fn handle(&self, query: GetStatisticsCounts) -> Result<StatisticsCounts, ApplicationError> {
        let user_id = query.user_id;
        let mut counts = StatisticsCounts {
            total: self.repo.count_by_user(user_id).await?,
            ..Default::default()
        };

        for status in ReadingStatus::ALL {
            let n = self.repo.count_by_status(user_id, status).await?;
            match status {
                ReadingStatus::ToRead => counts.to_read = n,
                ReadingStatus::Reading => counts.reading = n,
                ReadingStatus::Finished => counts.finished = n,
                ReadingStatus::OnHold => counts.on_hold = n,
                ReadingStatus::Dropped => counts.dropped = n,
            }
        }

        Ok(counts)
    }
}
