//! HTTP Middleware
//!
//! 请求耗时与 HTTP 状态码错误日志

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// 超过该耗时的请求记 info（合成请求通常需要数十秒）
const SLOW_REQUEST_MS: u128 = 5_000;

/// HTTP 状态码错误日志中间件
///
/// 4xx 记 warn，5xx 记 error，慢请求记 info
/// 业务错误（errno != 0）以 200 返回，在 ApiError::into_response() 中记录
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis();

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms,
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms,
            "HTTP client error"
        );
    } else if elapsed_ms >= SLOW_REQUEST_MS {
        tracing::info!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms,
            "Slow request"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        routing::{get, post},
        Router,
    };
    use tower::util::ServiceExt;

    fn router() -> Router {
        Router::new()
            .route("/api/voice/list", get(|| async { "[]" }))
            .route(
                "/api/voice/train",
                post(|| async { StatusCode::PAYLOAD_TOO_LARGE }),
            )
            .route(
                "/api/generate",
                post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
            )
            .layer(axum::middleware::from_fn(error_logging_middleware))
    }

    async fn status_of(method: &str, uri: &str) -> StatusCode {
        let request = HttpRequest::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        router().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_passes_responses_through() {
        assert_eq!(status_of("GET", "/api/voice/list").await, StatusCode::OK);
        assert_eq!(
            status_of("POST", "/api/voice/train").await,
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status_of("POST", "/api/generate").await,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(status_of("GET", "/missing").await, StatusCode::NOT_FOUND);
    }
}
