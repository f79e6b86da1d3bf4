//! Statistics HTTP Handlers - 阅读统计

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::application::{
    GetBooksByAuthor, GetBooksByRating, GetReadingStatistics, GetRecentlyFinished,
    GetStatisticsCounts, GetYearlyReport, ReadingStatistics, StatisticsCounts, YearlyReport,
};
use crate::infrastructure::http::dto::{
    ApiResponse, ByAuthorParams, RecentlyFinishedParams, UserBookResponse, YearlyReportParams,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 最近读完默认统计天数
const DEFAULT_RECENT_DAYS: u32 = 30;

/// 阅读总览
pub async fn get_statistics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ReadingStatistics>>, ApiError> {
    let stats = state
        .statistics_handler
        .handle(GetReadingStatistics {
            user_id: state.current_user_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(stats)))
}

pub async fn get_counts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<StatisticsCounts>>, ApiError> {
    let counts = state
        .statistics_counts_handler
        .handle(GetStatisticsCounts {
            user_id: state.current_user_id,
        })
        .await?;

    Ok(Json(ApiResponse::success(counts)))
}

/// 年度报告
pub async fn get_yearly_report(
    State(state): State<Arc<AppState>>,
    Query(params): Query<YearlyReportParams>,
) -> Result<Json<ApiResponse<YearlyReport>>, ApiError> {
    let report = state
        .yearly_report_handler
        .handle(GetYearlyReport {
            user_id: state.current_user_id,
            year: params.year,
        })
        .await?;

    Ok(Json(ApiResponse::success(report)))
}

pub async fn get_recently_finished(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RecentlyFinishedParams>,
) -> Result<Json<ApiResponse<Vec<UserBookResponse>>>, ApiError> {
    let books = state
        .recently_finished_handler
        .handle(GetRecentlyFinished {
            user_id: state.current_user_id,
            days: params.days.unwrap_or(DEFAULT_RECENT_DAYS),
        })
        .await?;

    Ok(Json(ApiResponse::success(
        books.iter().map(UserBookResponse::from).collect(),
    )))
}

pub async fn get_by_rating(
    State(state): State<Arc<AppState>>,
    Path(rating): Path<u8>,
) -> Result<Json<ApiResponse<Vec<UserBookResponse>>>, ApiError> {
    let books = state
        .books_by_rating_handler
        .handle(GetBooksByRating {
            user_id: state.current_user_id,
            rating,
        })
        .await?;

    Ok(Json(ApiResponse::success(
        books.iter().map(UserBookResponse::from).collect(),
    )))
}

pub async fn get_by_author(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ByAuthorParams>,
) -> Result<Json<ApiResponse<Vec<UserBookResponse>>>, ApiError> {
    let books = state
        .books_by_author_handler
        .handle(GetBooksByAuthor {
            user_id: state.current_user_id,
            author: params.author,
        })
        .await?;

    Ok(Json(ApiResponse::success(
        books.iter().map(UserBookResponse::from).collect(),
    )))
}
