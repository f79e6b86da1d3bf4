//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                                  GET    健康检查
//! - /api/user-books                            GET    分页列出书库（status、search、page、page_size）
//! - /api/user-books                            POST   加入书库
//! - /api/user-books/search                     GET    在书库中搜索（q）
//! - /api/user-books/by-status/:status          GET    按状态列出
//! - /api/user-books/:id                        GET    书籍详情
//! - /api/user-books/:id                        DELETE 移出书库
//! - /api/user-books/:id/status                 PUT    切换阅读状态
//! - /api/user-books/:id/progress               PUT    更新进度
//! - /api/user-books/:id/notes                  PUT    更新笔记
//! - /api/user-books/:id/sessions               POST   记录阅读
//! - /api/user-books/:id/rating                 PUT    评分
//! - /api/user-books/:id/rating                 DELETE 清除评分
//! - /api/statistics                            GET    阅读总览
//! - /api/statistics/counts                     GET    各状态数量
//! - /api/statistics/yearly                     GET    年度报告（year）
//! - /api/statistics/recently-finished          GET    最近读完（days）
//! - /api/statistics/by-rating/:rating          GET    按评分列出
//! - /api/statistics/by-author                  GET    按作者列出（author）
//! - /api/book-search/search                    GET    书目搜索（query、max_results）
//! - /api/book-search/search                    POST   书目搜索
//! - /api/book-search/isbn/:isbn                GET    按 ISBN 查找

use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .nest("/user-books", user_book_routes())
        .nest("/statistics", statistics_routes())
        .nest("/book-search", book_search_routes())
}

/// UserBook 路由
fn user_book_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/",
            get(handlers::list_user_books).post(handlers::add_user_book),
        )
        .route("/search", get(handlers::search_user_books))
        .route("/by-status/:status", get(handlers::list_by_status))
        .route(
            "/:id",
            get(handlers::get_user_book).delete(handlers::delete_user_book),
        )
        .route("/:id/status", put(handlers::change_status))
        .route("/:id/progress", put(handlers::update_progress))
        .route("/:id/notes", put(handlers::update_notes))
        .route("/:id/sessions", post(handlers::log_session))
        .route(
            "/:id/rating",
            put(handlers::rate_book).delete(handlers::remove_rating),
        )
}

/// Statistics 路由
fn statistics_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::get_statistics))
        .route("/counts", get(handlers::get_counts))
        .route("/yearly", get(handlers::get_yearly_report))
        .route("/recently-finished", get(handlers::get_recently_finished))
        .route("/by-rating/:rating", get(handlers::get_by_rating))
        .route("/by-author", get(handlers::get_by_author))
}

/// Book search 路由
fn book_search_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/search",
            get(handlers::search_books).post(handlers::search_books_post),
        )
        .route("/isbn/:isbn", get(handlers::get_book_by_isbn))
}
