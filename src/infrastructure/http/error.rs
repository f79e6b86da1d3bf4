//! HTTP Error Handling
//!
//! 业务错误统一以 HTTP 200 + errno 的形式返回

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::ApplicationError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errno: i32,
    pub error: String,
    pub data: Option<()>,
}

impl ErrorResponse {
    pub fn new(errno: i32, error: impl Into<String>) -> Self {
        Self {
            errno,
            error: error.into(),
            data: None,
        }
    }
}

/// 错误码定义
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const FORBIDDEN: i32 = 403;
    pub const NOT_FOUND: i32 = 404;
    pub const CONFLICT: i32 = 409;
    pub const INTERNAL_ERROR: i32 = 500;
    pub const SERVICE_UNAVAILABLE: i32 = 503;
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Forbidden(String),
    Internal(String),
    Conflict(String),
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn errno(&self) -> i32 {
        match self {
            ApiError::NotFound(_) => errno::NOT_FOUND,
            ApiError::BadRequest(_) => errno::BAD_REQUEST,
            ApiError::Forbidden(_) => errno::FORBIDDEN,
            ApiError::Internal(_) => errno::INTERNAL_ERROR,
            ApiError::Conflict(_) => errno::CONFLICT,
            ApiError::ServiceUnavailable(_) => errno::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.errno();
        let message = match self {
            ApiError::NotFound(msg) => {
                tracing::warn!(errno = code, error = %msg, "Resource not found");
                msg
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(errno = code, error = %msg, "Bad request");
                msg
            }
            ApiError::Forbidden(msg) => {
                tracing::warn!(errno = code, error = %msg, "Access denied");
                msg
            }
            ApiError::Internal(msg) => {
                tracing::error!(errno = code, error = %msg, "Internal server error");
                msg
            }
            ApiError::Conflict(msg) => {
                tracing::warn!(errno = code, error = %msg, "Resource conflict");
                msg
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::error!(errno = code, error = %msg, "Service unavailable");
                msg
            }
        };

        (StatusCode::OK, Json(ErrorResponse::new(code, message))).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::NotFound { resource_type, id } => {
                ApiError::NotFound(format!("{} not found: {}", resource_type, id))
            }
            ApplicationError::Forbidden(msg) => ApiError::Forbidden(msg),
            ApplicationError::Conflict(msg) => ApiError::Conflict(msg),
            ApplicationError::ValidationError(msg) => ApiError::BadRequest(msg),
            ApplicationError::InvalidState(msg) => ApiError::BadRequest(msg),
            ApplicationError::RepositoryError(msg) => ApiError::Internal(msg),
            ApplicationError::ExternalServiceError(msg) => ApiError::ServiceUnavailable(msg),
            ApplicationError::InternalError(msg) => ApiError::Internal(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_errors_map_to_errno() {
        let cases = [
            (ApplicationError::not_found("UserBook", "x"), errno::NOT_FOUND),
            (ApplicationError::forbidden("other user"), errno::FORBIDDEN),
            (ApplicationError::conflict("dup"), errno::CONFLICT),
            (ApplicationError::validation("bad"), errno::BAD_REQUEST),
            (ApplicationError::invalid_state("finished"), errno::BAD_REQUEST),
            (
                ApplicationError::ExternalServiceError("timeout".into()),
                errno::SERVICE_UNAVAILABLE,
            ),
            (ApplicationError::internal("boom"), errno::INTERNAL_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).errno(), expected);
        }
    }

    #[test]
    fn test_not_found_message_names_resource() {
        match ApiError::from(ApplicationError::not_found("Book", "978")) {
            ApiError::NotFound(msg) => assert_eq!(msg, "Book not found: 978"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_business_errors_use_http_200() {
        let response = ApiError::Conflict("dup".into()).into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
