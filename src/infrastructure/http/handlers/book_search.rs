//! Book Search HTTP Handlers - 外部书目检索

use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::application::{GetCatalogBookByIsbn, SearchCatalog};
use crate::infrastructure::http::dto::{ApiResponse, BookInfoResponse, CatalogSearchRequest};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

async fn run_search(
    state: &AppState,
    req: CatalogSearchRequest,
) -> Result<Json<ApiResponse<Vec<BookInfoResponse>>>, ApiError> {
    let books = state
        .search_catalog_handler
        .handle(SearchCatalog {
            query: req.query,
            max_results: req.max_results,
        })
        .await?;

    Ok(Json(ApiResponse::success(
        books.iter().map(BookInfoResponse::from).collect(),
    )))
}

/// GET /book-search/search?query=..&max_results=..
pub async fn search_books(
    State(state): State<Arc<AppState>>,
    Query(req): Query<CatalogSearchRequest>,
) -> Result<Json<ApiResponse<Vec<BookInfoResponse>>>, ApiError> {
    run_search(&state, req).await
}

/// POST /book-search/search
pub async fn search_books_post(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CatalogSearchRequest>,
) -> Result<Json<ApiResponse<Vec<BookInfoResponse>>>, ApiError> {
    run_search(&state, req).await
}

pub async fn get_book_by_isbn(
    State(state): State<Arc<AppState>>,
    Path(isbn): Path<String>,
) -> Result<Json<ApiResponse<BookInfoResponse>>, ApiError> {
    let book = state
        .catalog_isbn_handler
        .handle(GetCatalogBookByIsbn { isbn })
        .await?;

    Ok(Json(ApiResponse::success(BookInfoResponse::from(&book))))
}
