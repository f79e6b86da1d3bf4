//! UserBook HTTP Handlers - 个人书库

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::{
    AddBookToLibrary, ChangeBookStatus, DeleteBookFromLibrary, GetBooksByStatus, GetUserBook,
    ListUserBooks, LogReadingSession, SearchLibrary, UpdateBookRating, UpdatePersonalNotes,
    UpdateReadingProgress,
};
use crate::domain::library::{BookDetails, ReadingStatus};
use crate::infrastructure::http::dto::{
    AddBookRequest, AddBookResponse, ApiResponse, ChangeStatusRequest, Empty,
    ListUserBooksParams, LogSessionRequest, PageResponse, SearchLibraryParams,
    UpdateNotesRequest, UpdateProgressRequest, UpdateRatingRequest, UserBookResponse,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 解析状态字符串（支持别名）
pub(crate) fn parse_status(raw: &str) -> Result<ReadingStatus, ApiError> {
    ReadingStatus::from_str(raw)
        .ok_or_else(|| ApiError::BadRequest(format!("Invalid reading status: {}", raw)))
}

/// 列出书库（分页，可按状态和关键字过滤）
pub async fn list_user_books(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListUserBooksParams>,
) -> Result<Json<ApiResponse<PageResponse<UserBookResponse>>>, ApiError> {
    let status = params
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(parse_status)
        .transpose()?;

    let page = state
        .list_user_books_handler
        .handle(ListUserBooks {
            user_id: state.current_user_id,
            status,
            search: params.search,
            page: params.page,
            page_size: params.page_size,
        })
        .await?;

    Ok(Json(ApiResponse::success(PageResponse::from_page(page, |book| {
        UserBookResponse::from(&book)
    }))))
}

/// 加入书库
pub async fn add_user_book(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddBookRequest>,
) -> Result<Json<ApiResponse<AddBookResponse>>, ApiError> {
    let details = BookDetails::from(req.book);
    let book_id = req
        .book_id
        .filter(|id| !id.trim().is_empty())
        .or_else(|| details.isbn.clone())
        .ok_or_else(|| ApiError::BadRequest("book_id or book.isbn is required".to_string()))?;

    let id = state
        .add_book_handler
        .handle(AddBookToLibrary {
            user_id: state.current_user_id,
            book_id,
            book: details,
            personal_notes: req.personal_notes,
        })
        .await?;

    Ok(Json(ApiResponse::success(AddBookResponse {
        id: *id.as_uuid(),
    })))
}

pub async fn get_user_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserBookResponse>>, ApiError> {
    let book = state
        .get_user_book_handler
        .handle(GetUserBook {
            user_id: state.current_user_id,
            user_book_id: id,
        })
        .await?;

    Ok(Json(ApiResponse::success(UserBookResponse::from(&book))))
}

pub async fn delete_user_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Empty>>, ApiError> {
    state
        .delete_book_handler
        .handle(DeleteBookFromLibrary {
            user_id: state.current_user_id,
            user_book_id: id,
        })
        .await?;

    Ok(Json(ApiResponse::ok()))
}

/// 在书库中搜索
pub async fn search_user_books(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchLibraryParams>,
) -> Result<Json<ApiResponse<PageResponse<UserBookResponse>>>, ApiError> {
    let page = state
        .search_library_handler
        .handle(SearchLibrary {
            user_id: state.current_user_id,
            term: params.q,
            page: params.page,
            page_size: params.page_size,
        })
        .await?;

    Ok(Json(ApiResponse::success(PageResponse::from_page(page, |book| {
        UserBookResponse::from(&book)
    }))))
}

pub async fn list_by_status(
    State(state): State<Arc<AppState>>,
    Path(status): Path<String>,
) -> Result<Json<ApiResponse<Vec<UserBookResponse>>>, ApiError> {
    let status = parse_status(&status)?;
    let books = state
        .books_by_status_handler
        .handle(GetBooksByStatus {
            user_id: state.current_user_id,
            status,
        })
        .await?;

    Ok(Json(ApiResponse::success(
        books.iter().map(UserBookResponse::from).collect(),
    )))
}

pub async fn change_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<ChangeStatusRequest>,
) -> Result<Json<ApiResponse<UserBookResponse>>, ApiError> {
    let new_status = parse_status(&req.status)?;
    let book = state
        .change_status_handler
        .handle(ChangeBookStatus {
            user_id: state.current_user_id,
            user_book_id: id,
            new_status,
            date: req.date,
        })
        .await?;

    Ok(Json(ApiResponse::success(UserBookResponse::from(&book))))
}

pub async fn update_progress(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProgressRequest>,
) -> Result<Json<ApiResponse<UserBookResponse>>, ApiError> {
    let book = state
        .update_progress_handler
        .handle(UpdateReadingProgress {
            user_id: state.current_user_id,
            user_book_id: id,
            page_number: req.page_number,
        })
        .await?;

    Ok(Json(ApiResponse::success(UserBookResponse::from(&book))))
}

pub async fn update_notes(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateNotesRequest>,
) -> Result<Json<ApiResponse<UserBookResponse>>, ApiError> {
    let book = state
        .update_notes_handler
        .handle(UpdatePersonalNotes {
            user_id: state.current_user_id,
            user_book_id: id,
            notes: req.notes,
        })
        .await?;

    Ok(Json(ApiResponse::success(UserBookResponse::from(&book))))
}

/// 记录阅读
pub async fn log_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<LogSessionRequest>,
) -> Result<Json<ApiResponse<UserBookResponse>>, ApiError> {
    let book = state
        .log_session_handler
        .handle(LogReadingSession {
            user_id: state.current_user_id,
            user_book_id: id,
            session_date: req.session_date.unwrap_or_else(Utc::now),
            start_page: req.start_page,
            end_page: req.end_page,
            end_time: req.end_time,
            notes: req.notes,
        })
        .await?;

    Ok(Json(ApiResponse::success(UserBookResponse::from(&book))))
}

pub async fn rate_book(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRatingRequest>,
) -> Result<Json<ApiResponse<UserBookResponse>>, ApiError> {
    let book = state
        .update_rating_handler
        .handle(UpdateBookRating {
            user_id: state.current_user_id,
            user_book_id: id,
            rating: Some(req.rating),
        })
        .await?;

    Ok(Json(ApiResponse::success(UserBookResponse::from(&book))))
}

pub async fn remove_rating(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<UserBookResponse>>, ApiError> {
    let book = state
        .update_rating_handler
        .handle(UpdateBookRating {
            user_id: state.current_user_id,
            user_book_id: id,
            rating: None,
        })
        .await?;

    Ok(Json(ApiResponse::success(UserBookResponse::from(&book))))
}
