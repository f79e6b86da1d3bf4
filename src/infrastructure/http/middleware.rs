//! HTTP Middleware
//!
//! 请求日志：每个请求带一个 X-Request-ID，响应头原样返回

use std::time::Instant;

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// 客户端传入的请求 ID 超过此长度时重新生成
const MAX_REQUEST_ID_LEN: usize = 128;

fn request_id_of(request: &Request) -> HeaderValue {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .filter(|v| !v.is_empty() && v.len() <= MAX_REQUEST_ID_LEN && v.to_str().is_ok())
        .cloned()
        .unwrap_or_else(|| {
            HeaderValue::from_str(&Uuid::new_v4().to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("unknown"))
        })
}

/// 请求日志中间件
///
/// 4xx 记 warn，5xx 记 error，其余 info。
/// 业务错误（errno != 0）由 ApiError 自己记录
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let request_id = request_id_of(&request);
    let span = tracing::info_span!(
        "http_request",
        request_id = request_id.to_str().unwrap_or_default(),
        method = %request.method(),
        uri = %request.uri(),
    );

    async move {
        let started = Instant::now();
        let mut response = next.run(request).await;
        let status = response.status();
        let latency_ms = started.elapsed().as_millis() as u64;

        match status.as_u16() {
            code if status.is_server_error() => {
                tracing::error!(status = code, latency_ms, "Request failed")
            }
            code if status.is_client_error() => {
                tracing::warn!(status = code, latency_ms, "Request rejected")
            }
            code => tracing::info!(status = code, latency_ms, "Request completed"),
        }

        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), request_id);
        response
    }
    .instrument(span)
    .await
}
