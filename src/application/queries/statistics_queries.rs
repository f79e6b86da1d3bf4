//! Statistics Queries - 阅读统计

use uuid::Uuid;

/// 阅读总览
#[derive(Debug, Clone)]
pub struct GetReadingStatistics {
    pub user_id: Uuid,
}

/// 年度报告，year 缺省为今年
#[derive(Debug, Clone)]
pub struct GetYearlyReport {
    pub user_id: Uuid,
    pub year: Option<i32>,
}

/// 各状态书籍数量
#[derive(Debug, Clone)]
pub struct GetStatisticsCounts {
    pub user_id: Uuid,
}
