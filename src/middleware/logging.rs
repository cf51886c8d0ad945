//! Request logging middleware
//!
//! Every request is logged once it has been answered, with its method, path,
//! status and latency. Slow requests get an extra warning.

use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{error, info, warn};

const SLOW_REQUEST: Duration = Duration::from_secs(1);

/// Log method, path, status and latency of each request
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let elapsed = started.elapsed();
    let status = response.status().as_u16();
    let latency_ms = elapsed.as_millis() as u64;

    if response.status().is_server_error() {
        error!(method = %method, path = %path, status, latency_ms, "Request failed");
    } else if response.status().is_client_error() {
        warn!(method = %method, path = %path, status, latency_ms, "Request rejected");
    } else {
        info!(method = %method, path = %path, status, latency_ms, "Request completed");
    }

    if elapsed > SLOW_REQUEST {
        warn!(method = %method, path = %path, latency_ms, "Slow request detected");
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_responses_pass_through_unchanged() {
        let app = Router::new()
            .route("/ok", get(|| async { "fine" }))
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
            .layer(axum::middleware::from_fn(log_requests));

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
